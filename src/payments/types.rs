use crate::payments::error::{PaymentError, PaymentResult};
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Currencies whose smallest unit is the major unit
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GatewayName {
    Paypal,
    Stripe,
}

impl GatewayName {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayName::Paypal => "paypal",
            GatewayName::Stripe => "stripe",
        }
    }
}

impl std::fmt::Display for GatewayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GatewayName {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "paypal" => Ok(GatewayName::Paypal),
            "stripe" => Ok(GatewayName::Stripe),
            _ => Err(PaymentError::ValidationError {
                message: format!("unsupported gateway: {}", value),
                field: Some("gateway".to_string()),
            }),
        }
    }
}

/// Settlement protocol a gateway speaks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    /// create order, buyer approval, then capture or void
    DelayedCapture,
    /// payment intent captured automatically on confirmation
    ImmediateCapture,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    pub amount: BigDecimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: BigDecimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().trim().to_uppercase(),
        }
    }

    pub fn validate_positive(&self, field: &str) -> PaymentResult<()> {
        if self.amount <= BigDecimal::from(0) {
            return Err(PaymentError::ValidationError {
                message: "amount must be greater than zero".to_string(),
                field: Some(field.to_string()),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(PaymentError::ValidationError {
                message: "currency is required".to_string(),
                field: Some("currency".to_string()),
            });
        }
        Ok(())
    }

    /// Amount rounded half-up to two decimals, e.g. `27.00`
    pub fn to_major_units_string(&self) -> String {
        round_to_cents(&self.amount).to_string()
    }

    /// Amount in the currency's smallest unit (cents for USD/AED)
    pub fn to_minor_units(&self) -> PaymentResult<i64> {
        let scaled = if is_zero_decimal(&self.currency) {
            self.amount.with_scale_round(0, RoundingMode::HalfUp)
        } else {
            (&self.amount * BigDecimal::from(100)).with_scale_round(0, RoundingMode::HalfUp)
        };
        scaled.to_i64().ok_or(PaymentError::ValidationError {
            message: format!("amount {} is out of range", self.amount),
            field: Some("amount".to_string()),
        })
    }
}

pub fn round_to_cents(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

fn is_zero_decimal(currency: &str) -> bool {
    ZERO_DECIMAL_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(currency.trim()))
}

/// Amount plus an optional caller reference (the booking id when linked)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub reference: Option<String>,
}

/// Payment attempt status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Authorized,
    Captured,
    Voided,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "CREATED",
            PaymentStatus::Authorized => "AUTHORIZED",
            PaymentStatus::Captured => "CAPTURED",
            PaymentStatus::Voided => "VOIDED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, PaymentStatus::Captured | PaymentStatus::Voided)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order created on a delayed-capture gateway, awaiting buyer approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: String,
    pub status: String,
    pub approval_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRef {
    pub order_id: String,
    pub authorization_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub capture_id: String,
    pub status: PaymentStatus,
}

/// Payment intent status as reported by the immediate-capture gateway
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Unknown,
}

impl ChargeStatus {
    pub fn from_gateway(value: &str) -> Self {
        match value {
            "requires_payment_method" => ChargeStatus::RequiresPaymentMethod,
            "requires_confirmation" => ChargeStatus::RequiresConfirmation,
            "requires_action" => ChargeStatus::RequiresAction,
            "processing" => ChargeStatus::Processing,
            "requires_capture" => ChargeStatus::RequiresCapture,
            "canceled" => ChargeStatus::Canceled,
            "succeeded" => ChargeStatus::Succeeded,
            _ => ChargeStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeIntent {
    pub charge_id: String,
    pub client_secret: Option<String>,
    pub status: ChargeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookVerificationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub gateway: GatewayName,
    pub event_id: Option<String>,
    pub event_type: String,
    pub charge_id: Option<String>,
    pub status: Option<ChargeStatus>,
    pub payload: JsonValue,
    pub received_at: String,
}
