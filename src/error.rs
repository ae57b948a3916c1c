//! Unified error handling for the marketplace backend
//!
//! Module errors (payments, bookings, order metadata, storage) convert into
//! [`AppError`], which carries the HTTP status mapping, a machine-readable
//! code and the message shown to the user.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bookings::error::BookingError;
use crate::services::checkout::CheckoutError;
use crate::services::payment_orchestrator::OrchestratorError;

/// Error codes for programmatic handling by the client application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "ILLEGAL_TRANSITION")]
    IllegalTransition,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "ALREADY_FINALIZED")]
    AlreadyFinalized,
    #[serde(rename = "FINALIZATION_IN_PROGRESS")]
    FinalizationInProgress,
    #[serde(rename = "CONCURRENT_MODIFICATION")]
    ConcurrentModification,
    #[serde(rename = "INVALID_AMOUNT")]
    InvalidAmount,

    // Infrastructure errors (5xx)
    #[serde(rename = "MISSING_CREDENTIALS")]
    MissingCredentials,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CACHE_ERROR")]
    CacheError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (501, 502, 503)
    #[serde(rename = "GATEWAY_ERROR")]
    GatewayError,
    #[serde(rename = "NETWORK_ERROR")]
    NetworkError,
    #[serde(rename = "UNSUPPORTED_OPERATION")]
    UnsupportedOperation,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
}

/// Business rule violations
#[derive(Debug, Clone)]
pub enum DomainError {
    /// Booking action not permitted from the current state for this role
    IllegalTransition {
        current: String,
        role: String,
        action: String,
    },
    BookingNotFound { booking_id: String },
    OrderMetadataNotFound { order_id: String },
    PaymentNotFound { reference: String },
    /// Authorization was already captured or voided by this service
    AlreadyFinalized { reference: String, status: String },
    FinalizationInProgress { reference: String },
    BookingAlreadyPaid { booking_id: String },
    ConcurrentModification { booking_id: String },
    /// Computed settlement amount is unusable
    InvalidAmount { amount: String, reason: String },
}

/// Infrastructure-level errors (storage, cache, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    Database { message: String, is_retryable: bool },
    Cache { message: String },
    Configuration { message: String },
    /// Gateway credentials absent from the environment
    MissingCredentials { gateway: String, message: String },
}

/// Errors reported by payment gateways and rate providers
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Non-success gateway response, status and body kept verbatim
    Gateway {
        gateway: String,
        status: Option<u16>,
        body: String,
        is_retryable: bool,
    },
    Network { service: String, message: String },
    UnsupportedOperation { gateway: String, operation: String },
}

/// Input validation errors, rejected before any network call
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidAmount { amount: String, reason: String },
    MissingField { field: String },
    InvalidField { field: String, reason: String },
    MalformedBody { reason: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::IllegalTransition { .. } => 409,
                DomainError::BookingNotFound { .. } => 404,
                DomainError::OrderMetadataNotFound { .. } => 404,
                DomainError::PaymentNotFound { .. } => 404,
                DomainError::AlreadyFinalized { .. } => 409,
                DomainError::FinalizationInProgress { .. } => 409,
                DomainError::BookingAlreadyPaid { .. } => 409,
                DomainError::ConcurrentModification { .. } => 409,
                DomainError::InvalidAmount { .. } => 422,
            },
            AppErrorKind::Infrastructure(_) => 500,
            AppErrorKind::External(err) => match err {
                ExternalError::Gateway { .. } => 502,
                ExternalError::Network { .. } => 503,
                ExternalError::UnsupportedOperation { .. } => 501,
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::IllegalTransition { .. } => ErrorCode::IllegalTransition,
                DomainError::BookingNotFound { .. }
                | DomainError::OrderMetadataNotFound { .. }
                | DomainError::PaymentNotFound { .. } => ErrorCode::NotFound,
                DomainError::AlreadyFinalized { .. } | DomainError::BookingAlreadyPaid { .. } => {
                    ErrorCode::AlreadyFinalized
                }
                DomainError::FinalizationInProgress { .. } => ErrorCode::FinalizationInProgress,
                DomainError::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
                DomainError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Cache { .. } => ErrorCode::CacheError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
                InfrastructureError::MissingCredentials { .. } => ErrorCode::MissingCredentials,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::Gateway { .. } => ErrorCode::GatewayError,
                ExternalError::Network { .. } => ErrorCode::NetworkError,
                ExternalError::UnsupportedOperation { .. } => ErrorCode::UnsupportedOperation,
            },
            AppErrorKind::Validation(_) => ErrorCode::InvalidInput,
        }
    }

    /// Message shown to the user. Gateway failures carry the raw gateway
    /// text; booking failures name the state and the rejected action.
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::IllegalTransition {
                    current,
                    role,
                    action,
                } => format!(
                    "Illegal transition: {} cannot {} a booking in state {}",
                    role, action, current
                ),
                DomainError::BookingNotFound { booking_id } => {
                    format!("Booking '{}' not found", booking_id)
                }
                DomainError::OrderMetadataNotFound { order_id } => {
                    format!("No order metadata found for order '{}'", order_id)
                }
                DomainError::PaymentNotFound { reference } => {
                    format!("No payment attempt found for '{}'", reference)
                }
                DomainError::AlreadyFinalized { reference, status } => {
                    format!("Authorization '{}' is already {}", reference, status)
                }
                DomainError::FinalizationInProgress { reference } => format!(
                    "Authorization '{}' is already being finalized. Please retry shortly",
                    reference
                ),
                DomainError::BookingAlreadyPaid { booking_id } => {
                    format!("Booking '{}' already has a captured payment", booking_id)
                }
                DomainError::ConcurrentModification { booking_id } => format!(
                    "Booking '{}' was updated concurrently. Please reload and retry",
                    booking_id
                ),
                DomainError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::MissingCredentials { gateway, .. } => {
                    format!("Payment gateway '{}' is not configured", gateway)
                }
                _ => "Service temporarily unavailable. Please try again later".to_string(),
            },
            AppErrorKind::External(err) => match err {
                ExternalError::Gateway { body, .. } => body.clone(),
                ExternalError::Network { service, .. } => {
                    format!("{} is temporarily unreachable. Please try again", service)
                }
                ExternalError::UnsupportedOperation { gateway, operation } => {
                    format!("Gateway '{}' does not support {}", gateway, operation)
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidField { field, reason } => {
                    format!("Invalid value for '{}': {}", field, reason)
                }
                ValidationError::MalformedBody { reason } => {
                    format!("Malformed request body: {}", reason)
                }
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(err) => matches!(
                err,
                DomainError::FinalizationInProgress { .. }
                    | DomainError::ConcurrentModification { .. }
            ),
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Cache { .. } => true,
                InfrastructureError::Configuration { .. } => false,
                InfrastructureError::MissingCredentials { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::Gateway { is_retryable, .. } => *is_retryable,
                ExternalError::Network { .. } => true,
                ExternalError::UnsupportedOperation { .. } => false,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let kind = match err {
            BookingError::IllegalTransition {
                current,
                role,
                action,
            } => AppErrorKind::Domain(DomainError::IllegalTransition {
                current: current.to_string(),
                role: role.to_string(),
                action: action.to_string(),
            }),
            BookingError::NotFound { booking_id } => {
                AppErrorKind::Domain(DomainError::BookingNotFound {
                    booking_id: booking_id.to_string(),
                })
            }
            BookingError::Validation { message, field } => match field {
                Some(field) => AppErrorKind::Validation(ValidationError::InvalidField {
                    field,
                    reason: message,
                }),
                None => AppErrorKind::Validation(ValidationError::MalformedBody { reason: message }),
            },
            BookingError::ConcurrentModification { booking_id } => {
                AppErrorKind::Domain(DomainError::ConcurrentModification {
                    booking_id: booking_id.to_string(),
                })
            }
            BookingError::Storage {
                message,
                is_retryable,
            } => AppErrorKind::Infrastructure(InfrastructureError::Database {
                message,
                is_retryable,
            }),
        };
        AppError::new(kind)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        let kind = match err {
            OrchestratorError::Payment(payment) => return AppError::from(payment),
            OrchestratorError::InvalidInput { message, field } => {
                AppErrorKind::Validation(ValidationError::InvalidField {
                    field,
                    reason: message,
                })
            }
            OrchestratorError::MissingField { field } => {
                AppErrorKind::Validation(ValidationError::MissingField { field })
            }
            OrchestratorError::InvalidAmount { amount, reason } => {
                AppErrorKind::Domain(DomainError::InvalidAmount { amount, reason })
            }
            OrchestratorError::MetadataNotFound { order_id } => {
                AppErrorKind::Domain(DomainError::OrderMetadataNotFound { order_id })
            }
            OrchestratorError::AttemptNotFound { reference } => {
                AppErrorKind::Domain(DomainError::PaymentNotFound { reference })
            }
            OrchestratorError::AlreadyFinalized {
                authorization_id,
                status,
            } => AppErrorKind::Domain(DomainError::AlreadyFinalized {
                reference: authorization_id,
                status: status.to_string(),
            }),
            OrchestratorError::FinalizationInProgress { authorization_id } => {
                AppErrorKind::Domain(DomainError::FinalizationInProgress {
                    reference: authorization_id,
                })
            }
            OrchestratorError::BookingAlreadyPaid { booking_id } => {
                AppErrorKind::Domain(DomainError::BookingAlreadyPaid {
                    booking_id: booking_id.to_string(),
                })
            }
            OrchestratorError::Metadata(inner) => {
                AppErrorKind::Infrastructure(InfrastructureError::Cache {
                    message: inner.to_string(),
                })
            }
        };
        AppError::new(kind)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Booking(inner) => AppError::from(inner),
            CheckoutError::InvalidPayment(inner) => AppError::from(inner),
            CheckoutError::Payment { booking_id, source } => {
                AppError::from(source).with_context(format!("booking {} abandoned", booking_id))
            }
        }
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::state::{ActorRole, BookingAction, BookingStatus};

    #[test]
    fn test_illegal_transition_error() {
        let error = AppError::from(BookingError::IllegalTransition {
            current: BookingStatus::Completed,
            role: ActorRole::Provider,
            action: BookingAction::Start,
        });

        assert_eq!(error.status_code(), 409);
        assert_eq!(error.error_code(), ErrorCode::IllegalTransition);
        assert!(error.user_message().contains("COMPLETED"));
        assert!(error.user_message().contains("start"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_gateway_error_shows_raw_body() {
        let error = AppError::new(AppErrorKind::External(ExternalError::Gateway {
            gateway: "paypal".to_string(),
            status: Some(422),
            body: r#"{"name":"UNPROCESSABLE_ENTITY"}"#.to_string(),
            is_retryable: false,
        }));

        assert_eq!(error.status_code(), 502);
        assert_eq!(error.error_code(), ErrorCode::GatewayError);
        assert_eq!(error.user_message(), r#"{"name":"UNPROCESSABLE_ENTITY"}"#);
    }

    #[test]
    fn test_missing_credentials_is_server_error() {
        let error = AppError::new(AppErrorKind::Infrastructure(
            InfrastructureError::MissingCredentials {
                gateway: "paypal".to_string(),
                message: "PAYPAL_CLIENT_ID is not set".to_string(),
            },
        ));

        assert_eq!(error.status_code(), 500);
        assert_eq!(error.error_code(), ErrorCode::MissingCredentials);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_validation_error() {
        let error = AppError::new(AppErrorKind::Validation(ValidationError::InvalidAmount {
            amount: "-100".to_string(),
            reason: "Amount must be greater than zero".to_string(),
        }));

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::InvalidInput);
        assert!(!error.is_retryable());
    }
}
