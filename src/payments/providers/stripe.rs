use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::gateway::PaymentGateway;
use crate::payments::types::{
    ChargeIntent, ChargeStatus, GatewayKind, GatewayName, PaymentRequest, WebhookEvent,
    WebhookVerificationResult,
};
use crate::payments::utils::{
    gateway_url, hmac_sha256_hex, secure_eq, HttpAuth, PaymentHttpClient, RequestBody,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Maximum age of a signed webhook, in seconds
    pub webhook_tolerance_secs: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            base_url: "https://api.stripe.com".to_string(),
            timeout_secs: 30,
            webhook_tolerance_secs: 300,
        }
    }
}

impl StripeConfig {
    pub fn from_env() -> PaymentResult<Self> {
        let env = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            secret_key: env("STRIPE_SECRET_KEY"),
            webhook_secret: env("STRIPE_WEBHOOK_SECRET"),
            base_url: env("STRIPE_BASE_URL")
                .unwrap_or_else(|| "https://api.stripe.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: env("STRIPE_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            webhook_tolerance_secs: env("STRIPE_WEBHOOK_TOLERANCE_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(300),
        })
    }
}

/// Immediate-capture gateway over the Stripe PaymentIntents REST API
pub struct StripeGateway {
    config: StripeConfig,
    http: PaymentHttpClient,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let http = PaymentHttpClient::new(
            GatewayName::Stripe,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    fn endpoint(&self, segments: &[&str]) -> PaymentResult<Url> {
        gateway_url(&self.config.base_url, segments)
    }

    fn secret_key(&self) -> PaymentResult<&str> {
        self.config.secret_key.as_deref().ok_or_else(|| {
            PaymentError::missing_credentials("stripe", "STRIPE_SECRET_KEY is not set")
        })
    }

    /// Verify a `Stripe-Signature` header against `now` (unix seconds)
    pub fn verify_signature_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> PaymentResult<WebhookVerificationResult> {
        let secret = self.config.webhook_secret.as_deref().ok_or_else(|| {
            PaymentError::missing_credentials("stripe", "STRIPE_WEBHOOK_SECRET is not set")
        })?;

        let parsed = match SignatureHeader::parse(header) {
            Some(parsed) => parsed,
            None => {
                return Ok(WebhookVerificationResult {
                    valid: false,
                    reason: Some("malformed signature header".to_string()),
                })
            }
        };

        if now.abs_diff(parsed.timestamp) > self.config.webhook_tolerance_secs {
            return Ok(WebhookVerificationResult {
                valid: false,
                reason: Some("timestamp outside tolerance".to_string()),
            });
        }

        let mut signed = format!("{}.", parsed.timestamp).into_bytes();
        signed.extend_from_slice(payload);
        let expected = hmac_sha256_hex(&signed, secret).unwrap_or_default();
        let valid = parsed
            .signatures
            .iter()
            .any(|s| secure_eq(expected.as_bytes(), s.as_bytes()));

        Ok(WebhookVerificationResult {
            valid,
            reason: (!valid).then(|| "signature mismatch".to_string()),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> GatewayName {
        GatewayName::Stripe
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::ImmediateCapture
    }

    fn is_configured(&self) -> bool {
        self.config.secret_key.is_some()
    }

    async fn create_immediate_charge(
        &self,
        request: &PaymentRequest,
    ) -> PaymentResult<ChargeIntent> {
        let secret_key = self.secret_key()?;
        request.amount.validate_positive("amount")?;

        let mut form = vec![
            ("amount", request.amount.to_minor_units()?.to_string()),
            ("currency", request.amount.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(reference) = &request.reference {
            form.push(("metadata[booking_id]", reference.clone()));
        }

        let intent: StripePaymentIntent = self
            .http
            .request_json(
                reqwest::Method::POST,
                self.endpoint(&["v1", "payment_intents"])?,
                HttpAuth::Bearer(secret_key),
                RequestBody::Form(&form),
                &[],
            )
            .await?;
        info!(
            charge_id = %intent.id,
            status = %intent.status,
            currency = %request.amount.currency,
            "stripe payment intent created"
        );

        Ok(intent.into_charge())
    }

    async fn retrieve_charge(&self, charge_id: &str) -> PaymentResult<ChargeIntent> {
        let secret_key = self.secret_key()?;
        let intent: StripePaymentIntent = self
            .http
            .request_json(
                reqwest::Method::GET,
                self.endpoint(&["v1", "payment_intents", charge_id])?,
                HttpAuth::Bearer(secret_key),
                RequestBody::Empty,
                &[],
            )
            .await?;
        Ok(intent.into_charge())
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        self.verify_signature_at(payload, signature, chrono::Utc::now().timestamp())
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let event: StripeEvent =
            serde_json::from_slice(payload).map_err(|e| PaymentError::ValidationError {
                message: format!("invalid stripe webhook payload: {}", e),
                field: Some("body".to_string()),
            })?;
        let raw: JsonValue =
            serde_json::from_slice(payload).map_err(|e| PaymentError::ValidationError {
                message: format!("invalid stripe webhook payload: {}", e),
                field: Some("body".to_string()),
            })?;

        let object = event.data.object;
        Ok(WebhookEvent {
            gateway: GatewayName::Stripe,
            event_id: Some(event.id),
            event_type: event.event_type,
            charge_id: object.id,
            status: object.status.as_deref().map(ChargeStatus::from_gateway),
            payload: raw,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

impl SignatureHeader {
    /// `t=1492774577,v1=5257a869...,v0=...`
    fn parse(header: &str) -> Option<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=')?;
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => signatures.push(value.to_string()),
                _ => {}
            }
        }
        if signatures.is_empty() {
            return None;
        }
        Some(Self {
            timestamp: timestamp?,
            signatures,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
}

impl StripePaymentIntent {
    fn into_charge(self) -> ChargeIntent {
        ChargeIntent {
            status: ChargeStatus::from_gateway(&self.status),
            charge_id: self.id,
            client_secret: self.client_secret,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Debug, Deserialize)]
struct StripeEventObject {
    id: Option<String>,
    status: Option<String>,
}
