use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Missing credentials for {gateway}: {message}")]
    MissingCredentials { gateway: String, message: String },

    /// Non-success response; `body` is the gateway's text, unmodified
    #[error("Gateway error: gateway={gateway}, status={status:?}, body={body}")]
    GatewayError {
        gateway: String,
        status: Option<u16>,
        body: String,
        retryable: bool,
    },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("{gateway} does not support {operation}")]
    UnsupportedOperation {
        gateway: String,
        operation: &'static str,
    },

    #[error("Webhook verification failed: {message}")]
    WebhookVerificationError { message: String },
}

impl PaymentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::ValidationError { .. } => false,
            PaymentError::MissingCredentials { .. } => false,
            PaymentError::GatewayError { retryable, .. } => *retryable,
            PaymentError::NetworkError { .. } => true,
            PaymentError::UnsupportedOperation { .. } => false,
            PaymentError::WebhookVerificationError { .. } => false,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            PaymentError::ValidationError { .. } => 400,
            PaymentError::MissingCredentials { .. } => 500,
            PaymentError::GatewayError { .. } => 502,
            PaymentError::NetworkError { .. } => 503,
            PaymentError::UnsupportedOperation { .. } => 501,
            PaymentError::WebhookVerificationError { .. } => 400,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PaymentError::ValidationError { message, .. } => message.clone(),
            PaymentError::MissingCredentials { gateway, .. } => {
                format!("Payment gateway '{}' is not configured", gateway)
            }
            PaymentError::GatewayError { body, .. } => body.clone(),
            PaymentError::NetworkError { .. } => {
                "Payment gateway is temporarily unavailable".to_string()
            }
            PaymentError::UnsupportedOperation { gateway, operation } => {
                format!("Gateway '{}' does not support {}", gateway, operation)
            }
            PaymentError::WebhookVerificationError { .. } => {
                "Invalid webhook signature".to_string()
            }
        }
    }

    pub(crate) fn missing_credentials(gateway: &str, message: impl Into<String>) -> Self {
        PaymentError::MissingCredentials {
            gateway: gateway.to_string(),
            message: message.into(),
        }
    }
}

impl From<PaymentError> for crate::error::AppError {
    fn from(err: PaymentError) -> Self {
        use crate::error::{
            AppError, AppErrorKind, ExternalError, InfrastructureError, ValidationError,
        };

        let kind = match err {
            PaymentError::ValidationError { message, field } => match field {
                Some(field) => AppErrorKind::Validation(ValidationError::InvalidField {
                    field,
                    reason: message,
                }),
                None => AppErrorKind::Validation(ValidationError::MalformedBody { reason: message }),
            },
            PaymentError::MissingCredentials { gateway, message } => {
                AppErrorKind::Infrastructure(InfrastructureError::MissingCredentials {
                    gateway,
                    message,
                })
            }
            PaymentError::GatewayError {
                gateway,
                status,
                body,
                retryable,
            } => AppErrorKind::External(ExternalError::Gateway {
                gateway,
                status,
                body,
                is_retryable: retryable,
            }),
            PaymentError::NetworkError { message } => {
                AppErrorKind::External(ExternalError::Network {
                    service: "Payment gateway".to_string(),
                    message,
                })
            }
            PaymentError::UnsupportedOperation { gateway, operation } => {
                AppErrorKind::External(ExternalError::UnsupportedOperation {
                    gateway,
                    operation: operation.to_string(),
                })
            }
            PaymentError::WebhookVerificationError { message } => {
                AppErrorKind::Validation(ValidationError::InvalidField {
                    field: "signature".to_string(),
                    reason: message,
                })
            }
        };
        AppError::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ErrorCode};

    #[test]
    fn error_http_status_mapping_is_correct() {
        assert_eq!(
            PaymentError::ValidationError {
                message: "bad".to_string(),
                field: None
            }
            .http_status_code(),
            400
        );
        assert_eq!(
            PaymentError::missing_credentials("paypal", "PAYPAL_CLIENT_ID is not set")
                .http_status_code(),
            500
        );
        assert_eq!(
            PaymentError::GatewayError {
                gateway: "stripe".to_string(),
                status: Some(402),
                body: "card_declined".to_string(),
                retryable: false,
            }
            .http_status_code(),
            502
        );
    }

    #[test]
    fn retryable_flags_are_set() {
        assert!(PaymentError::NetworkError {
            message: "timeout".to_string()
        }
        .is_retryable());
        assert!(!PaymentError::UnsupportedOperation {
            gateway: "stripe".to_string(),
            operation: "capture",
        }
        .is_retryable());
    }

    #[test]
    fn gateway_error_keeps_raw_body_through_app_error() {
        let raw = r#"{"name":"INSTRUMENT_DECLINED","message":"The instrument presented was declined."}"#;
        let app = AppError::from(PaymentError::GatewayError {
            gateway: "paypal".to_string(),
            status: Some(422),
            body: raw.to_string(),
            retryable: false,
        });
        assert_eq!(app.status_code(), 502);
        assert_eq!(app.error_code(), ErrorCode::GatewayError);
        assert_eq!(app.user_message(), raw);
    }
}
