use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::gateway::PaymentGateway;
use crate::payments::types::{
    AuthorizationRef, CaptureResult, GatewayKind, GatewayName, OrderRef, PaymentRequest,
    PaymentStatus,
};
use crate::payments::utils::{gateway_url, HttpAuth, PaymentHttpClient, RequestBody};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
const LIVE_BASE_URL: &str = "https://api-m.paypal.com";

/// Refresh the token this long before PayPal says it expires
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaypalEnvironment {
    Sandbox,
    Live,
}

impl PaypalEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PaypalEnvironment::Sandbox => SANDBOX_BASE_URL,
            PaypalEnvironment::Live => LIVE_BASE_URL,
        }
    }
}

impl FromStr for PaypalEnvironment {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sandbox" => Ok(PaypalEnvironment::Sandbox),
            "live" | "production" => Ok(PaypalEnvironment::Live),
            _ => Err(PaymentError::ValidationError {
                message: format!("PAYPAL_ENVIRONMENT must be sandbox or live, got {}", value),
                field: Some("PAYPAL_ENVIRONMENT".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub environment: PaypalEnvironment,
    pub base_url: Option<String>,
    pub settlement_currency: String,
    pub timeout_secs: u64,
}

impl Default for PaypalConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            environment: PaypalEnvironment::Sandbox,
            base_url: None,
            settlement_currency: "USD".to_string(),
            timeout_secs: 30,
        }
    }
}

impl PaypalConfig {
    /// Missing credentials are not an error here: the gateway is still
    /// built and answers every call with `MissingCredentials`.
    pub fn from_env() -> PaymentResult<Self> {
        let environment = match std::env::var("PAYPAL_ENVIRONMENT") {
            Ok(value) => PaypalEnvironment::from_str(&value)?,
            Err(_) => PaypalEnvironment::Sandbox,
        };

        Ok(Self {
            client_id: non_empty_env("PAYPAL_CLIENT_ID"),
            client_secret: non_empty_env("PAYPAL_CLIENT_SECRET"),
            environment,
            base_url: non_empty_env("PAYPAL_BASE_URL"),
            settlement_currency: std::env::var("SETTLEMENT_CURRENCY")
                .map(|v| v.trim().to_uppercase())
                .unwrap_or_else(|_| "USD".to_string()),
            timeout_secs: std::env::var("PAYPAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        })
    }

    pub fn api_base(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.environment.base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Delayed-capture gateway over the PayPal Orders v2 REST API
pub struct PaypalGateway {
    config: PaypalConfig,
    http: PaymentHttpClient,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalGateway {
    pub fn new(config: PaypalConfig) -> PaymentResult<Self> {
        let http = PaymentHttpClient::new(
            GatewayName::Paypal,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            config,
            http,
            token: Mutex::new(None),
        })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PaypalConfig::from_env()?)
    }

    fn endpoint(&self, segments: &[&str]) -> PaymentResult<Url> {
        gateway_url(&self.config.api_base(), segments)
    }

    fn credentials(&self) -> PaymentResult<(&str, &str)> {
        let client_id = self.config.client_id.as_deref().ok_or_else(|| {
            PaymentError::missing_credentials("paypal", "PAYPAL_CLIENT_ID is not set")
        })?;
        let client_secret = self.config.client_secret.as_deref().ok_or_else(|| {
            PaymentError::missing_credentials("paypal", "PAYPAL_CLIENT_SECRET is not set")
        })?;
        Ok((client_id, client_secret))
    }

    async fn access_token(&self) -> PaymentResult<String> {
        let (client_id, client_secret) = self.credentials()?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let response = match self.fetch_token(client_id, client_secret).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "paypal token request failed, retrying once");
                self.fetch_token(client_id, client_secret).await?
            }
        };

        let lifetime = response.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(response.access_token)
    }

    async fn fetch_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> PaymentResult<PaypalTokenResponse> {
        let form = [("grant_type", "client_credentials".to_string())];
        self.http
            .request_json(
                reqwest::Method::POST,
                self.endpoint(&["v1", "oauth2", "token"])?,
                HttpAuth::Basic {
                    username: client_id,
                    password: client_secret,
                },
                RequestBody::Form(&form),
                &[("Accept", "application/json")],
            )
            .await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        payload: &JsonValue,
    ) -> PaymentResult<T> {
        let url = self.endpoint(segments)?;
        let token = self.access_token().await?;
        let request_id = Uuid::new_v4().to_string();
        self.http
            .request_json(
                reqwest::Method::POST,
                url,
                HttpAuth::Bearer(&token),
                RequestBody::Json(payload),
                &[
                    ("Content-Type", "application/json"),
                    ("PayPal-Request-Id", &request_id),
                ],
            )
            .await
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    fn name(&self) -> GatewayName {
        GatewayName::Paypal
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::DelayedCapture
    }

    fn is_configured(&self) -> bool {
        self.config.has_credentials()
    }

    async fn create_authorization(&self, request: &PaymentRequest) -> PaymentResult<OrderRef> {
        request.amount.validate_positive("amount")?;

        let mut purchase_unit = serde_json::json!({
            "amount": {
                "currency_code": request.amount.currency,
                "value": request.amount.to_major_units_string(),
            }
        });
        if let Some(reference) = &request.reference {
            purchase_unit["custom_id"] = JsonValue::String(reference.clone());
        }
        let payload = serde_json::json!({
            "intent": "AUTHORIZE",
            "purchase_units": [purchase_unit],
        });

        let order: PaypalOrder = self.post_json(&["v2", "checkout", "orders"], &payload).await?;
        info!(
            order_id = %order.id,
            status = %order.status,
            amount = %request.amount.to_major_units_string(),
            currency = %request.amount.currency,
            "paypal order created"
        );

        Ok(OrderRef {
            approval_url: order.approval_url(),
            order_id: order.id,
            status: order.status,
        })
    }

    async fn authorize_order(&self, order_id: &str) -> PaymentResult<AuthorizationRef> {
        let order: PaypalOrder = self
            .post_json(
                &["v2", "checkout", "orders", order_id, "authorize"],
                &serde_json::json!({}),
            )
            .await?;

        let (authorization_id, status) = order
            .first_authorization()
            .map(|a| (a.id.clone(), a.status.clone()))
            .ok_or_else(|| PaymentError::GatewayError {
                gateway: "paypal".to_string(),
                status: None,
                body: format!("order {} returned no authorization", order_id),
                retryable: false,
            })?;
        info!(
            order_id = %order_id,
            authorization_id = %authorization_id,
            "paypal order authorized"
        );

        Ok(AuthorizationRef {
            order_id: order.id,
            authorization_id,
            status,
        })
    }

    async fn capture(&self, authorization_id: &str) -> PaymentResult<CaptureResult> {
        let capture: PaypalStatusResource = self
            .post_json(
                &["v2", "payments", "authorizations", authorization_id, "capture"],
                &serde_json::json!({}),
            )
            .await?;

        let status = capture_status(&capture)?;
        info!(
            authorization_id = %authorization_id,
            capture_id = %capture.id,
            gateway_status = %capture.status,
            "paypal authorization captured"
        );

        Ok(CaptureResult {
            capture_id: capture.id,
            status,
        })
    }

    async fn void(&self, authorization_id: &str) -> PaymentResult<PaymentStatus> {
        let _: JsonValue = self
            .post_json(
                &["v2", "payments", "authorizations", authorization_id, "void"],
                &serde_json::json!({}),
            )
            .await?;
        info!(authorization_id = %authorization_id, "paypal authorization voided");
        Ok(PaymentStatus::Voided)
    }
}

fn capture_status(capture: &PaypalStatusResource) -> PaymentResult<PaymentStatus> {
    match capture.status.as_str() {
        "COMPLETED" | "PENDING" => Ok(PaymentStatus::Captured),
        _ => Err(PaymentError::GatewayError {
            gateway: "paypal".to_string(),
            status: None,
            body: serde_json::json!({ "id": capture.id, "status": capture.status }).to_string(),
            retryable: false,
        }),
    }
}

#[derive(Debug, Deserialize)]
struct PaypalTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct PaypalLink {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct PaypalOrder {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<PaypalLink>,
    #[serde(default)]
    purchase_units: Vec<PaypalPurchaseUnit>,
}

impl PaypalOrder {
    fn approval_url(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone())
    }

    fn first_authorization(&self) -> Option<&PaypalStatusResource> {
        self.purchase_units
            .iter()
            .filter_map(|u| u.payments.as_ref())
            .flat_map(|p| p.authorizations.iter())
            .next()
    }
}

#[derive(Debug, Deserialize)]
struct PaypalPurchaseUnit {
    payments: Option<PaypalPayments>,
}

#[derive(Debug, Deserialize)]
struct PaypalPayments {
    #[serde(default)]
    authorizations: Vec<PaypalStatusResource>,
}

#[derive(Debug, Deserialize)]
struct PaypalStatusResource {
    id: String,
    status: String,
}
