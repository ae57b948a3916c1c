//! Payment Authorization Orchestrator
//!
//! Drives a single payment attempt through the gateways:
//! - delayed capture: `CREATED -> AUTHORIZED -> CAPTURED | VOIDED`
//! - immediate capture: `CREATED -> CAPTURED`
//!
//! Owns amount computation, rate resolution, order metadata and error
//! translation. Gateway failures are never retried here.

use crate::bookings::Booking;
use crate::payments::error::PaymentError;
use crate::payments::factory::PaymentGateways;
use crate::payments::types::{
    round_to_cents, ChargeStatus, GatewayKind, GatewayName, Money, PaymentRequest, PaymentStatus,
};
use crate::services::exchange_rate::RateResolver;
use crate::services::order_metadata::{OrderMetadataEntry, OrderMetadataError, OrderMetadataStore};
use crate::services::payment_attempts::{PaymentAttempt, PaymentAttemptStore};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};
use uuid::Uuid;

const MAX_REFERENCE_LEN: usize = 128;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Currency customer amounts are quoted in
    pub local_currency: String,
    /// Currency the delayed-capture gateway settles in
    pub settlement_currency: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            local_currency: "AED".to_string(),
            settlement_currency: "USD".to_string(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Invalid input for {field}: {message}")]
    InvalidInput { message: String, field: String },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("No order metadata for {order_id}")]
    MetadataNotFound { order_id: String },

    #[error("No payment attempt for {reference}")]
    AttemptNotFound { reference: String },

    #[error("Authorization {authorization_id} is already {status}")]
    AlreadyFinalized {
        authorization_id: String,
        status: PaymentStatus,
    },

    #[error("Authorization {authorization_id} is already being finalized")]
    FinalizationInProgress { authorization_id: String },

    #[error("Booking {booking_id} already has a captured payment")]
    BookingAlreadyPaid { booking_id: Uuid },

    #[error(transparent)]
    Metadata(#[from] OrderMetadataError),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub attempt_id: Uuid,
    pub order_id: String,
    pub approval_url: Option<String>,
    pub settlement_amount: BigDecimal,
    pub settlement_currency: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub order_id: String,
    pub authorization_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    pub capture_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCharge {
    pub attempt_id: Uuid,
    pub charge_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeConfirmation {
    pub charge_id: String,
    pub status: PaymentStatus,
    pub gateway_status: ChargeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub event_type: String,
    pub charge_id: Option<String>,
    pub applied: bool,
}

// ============================================================================
// Finalization guard
// ============================================================================

/// Keys (authorization ids, booking ids) with a capture or void in flight.
/// A permit releases its keys on drop, including when the request future
/// is cancelled.
#[derive(Default)]
struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

struct InFlightPermit {
    keys: Arc<Mutex<HashSet<String>>>,
    held: Vec<String>,
}

impl InFlight {
    fn try_acquire(&self, wanted: Vec<String>) -> Option<InFlightPermit> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if wanted.iter().any(|k| keys.contains(k)) {
            return None;
        }
        for key in &wanted {
            keys.insert(key.clone());
        }
        Some(InFlightPermit {
            keys: self.keys.clone(),
            held: wanted,
        })
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        for key in &self.held {
            keys.remove(key);
        }
    }
}

#[derive(Clone, Copy)]
enum Finalization {
    Capture,
    Void,
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct PaymentOrchestrator {
    gateways: PaymentGateways,
    rates: Arc<RateResolver>,
    metadata: Arc<dyn OrderMetadataStore>,
    attempts: Arc<PaymentAttemptStore>,
    config: OrchestratorConfig,
    in_flight: InFlight,
}

impl PaymentOrchestrator {
    pub fn new(
        gateways: PaymentGateways,
        rates: Arc<RateResolver>,
        metadata: Arc<dyn OrderMetadataStore>,
        attempts: Arc<PaymentAttemptStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateways,
            rates,
            metadata,
            attempts,
            config,
            in_flight: InFlight::default(),
        }
    }

    pub fn attempts(&self) -> &PaymentAttemptStore {
        &self.attempts
    }

    // =========================================================================
    // Delayed capture
    // =========================================================================

    /// Convert `amount_local` to the settlement currency and create a
    /// delayed-capture order for it.
    pub async fn quote_and_create(
        &self,
        amount_local: f64,
        booking: Option<&Booking>,
    ) -> OrchestratorResult<CreatedOrder> {
        let amount = parse_local_amount(amount_local)?;
        if let Some(booking) = booking {
            self.ensure_booking_payable(booking).await?;
        }

        let quote = self
            .rates
            .resolve(&self.config.local_currency, &self.config.settlement_currency)
            .await;
        if quote.degraded {
            warn!(
                from = %self.config.local_currency,
                to = %self.config.settlement_currency,
                rate = quote.rate,
                source = %quote.source,
                degraded = true,
                "settlement computed with fallback rate"
            );
        }

        let rate = BigDecimal::from_str(&quote.rate.to_string()).map_err(|_| {
            OrchestratorError::InvalidAmount {
                amount: amount.to_string(),
                reason: format!("unusable rate {}", quote.rate),
            }
        })?;
        let settlement_amount = round_to_cents(&(&amount * &rate));
        if settlement_amount <= BigDecimal::from(0) {
            return Err(OrchestratorError::InvalidAmount {
                amount: settlement_amount.to_string(),
                reason: "settlement amount must be greater than zero".to_string(),
            });
        }

        let gateway = self.gateways.for_kind(GatewayKind::DelayedCapture);
        let request = PaymentRequest {
            amount: Money::new(settlement_amount.clone(), &self.config.settlement_currency),
            reference: booking.map(|b| b.id.to_string()),
        };

        let order = match gateway.create_authorization(&request).await {
            Ok(order) => order,
            Err(e) => {
                self.record_failure(gateway.name(), booking, Some(amount), &e)
                    .await;
                return Err(e.into());
            }
        };

        let entry = OrderMetadataEntry {
            settlement_amount: settlement_amount.clone(),
            settlement_currency: self.config.settlement_currency.clone(),
            rate: quote.rate,
            booking_id: booking.map(|b| b.id),
            created_at: Utc::now(),
        };
        // Advisory only: the gateway holds the authoritative amount
        if let Err(e) = self.metadata.put(&order.order_id, entry).await {
            warn!(order_id = %order.order_id, error = %e, "failed to store order metadata");
        }

        let mut attempt = PaymentAttempt::new(gateway.name(), PaymentStatus::Created);
        link_booking(&mut attempt, booking);
        attempt.gateway_reference = Some(order.order_id.clone());
        attempt.amount_local = Some(amount);
        attempt.settlement_amount = Some(settlement_amount.clone());
        attempt.rate = Some(quote.rate);
        let attempt = self.attempts.insert(attempt).await;

        info!(
            attempt_id = %attempt.id,
            order_id = %order.order_id,
            booking_id = ?attempt.booking_id,
            settlement_amount = %settlement_amount,
            rate = quote.rate,
            "delayed-capture order created"
        );

        Ok(CreatedOrder {
            attempt_id: attempt.id,
            order_id: order.order_id,
            approval_url: order.approval_url,
            settlement_amount,
            settlement_currency: self.config.settlement_currency.clone(),
            rate: quote.rate,
        })
    }

    /// Settlement amount and rate recorded when the order was created
    pub async fn lookup_meta(&self, order_id: &str) -> OrchestratorResult<OrderMetadataEntry> {
        let order_id = require_reference(order_id, "orderId")?;
        self.metadata
            .get(order_id)
            .await?
            .ok_or_else(|| OrchestratorError::MetadataNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// Server-side authorization of an order the buyer has approved
    pub async fn authorize(&self, order_id: &str) -> OrchestratorResult<Authorization> {
        let order_id = require_reference(order_id, "orderId")?;
        let gateway = self.gateways.for_kind(GatewayKind::DelayedCapture);
        let authorization = gateway.authorize_order(order_id).await?;

        match self.attempts.find_by_reference(order_id).await {
            Some(attempt) => {
                self.attempts
                    .update(attempt.id, |a| {
                        a.authorization_id = Some(authorization.authorization_id.clone());
                        a.status = PaymentStatus::Authorized;
                    })
                    .await;
            }
            None => {
                let mut attempt = PaymentAttempt::new(gateway.name(), PaymentStatus::Authorized);
                attempt.gateway_reference = Some(order_id.to_string());
                attempt.authorization_id = Some(authorization.authorization_id.clone());
                self.attempts.insert(attempt).await;
            }
        }

        info!(
            order_id = %order_id,
            authorization_id = %authorization.authorization_id,
            "order authorized"
        );
        Ok(Authorization {
            order_id: authorization.order_id,
            authorization_id: authorization.authorization_id,
            status: PaymentStatus::Authorized,
        })
    }

    /// Capture an authorization. `order_id` links an authorization made
    /// client-side back to the attempt that created the order.
    pub async fn finalize_capture(
        &self,
        authorization_id: &str,
        order_id: Option<&str>,
    ) -> OrchestratorResult<Capture> {
        let authorization_id = require_reference(authorization_id, "authorizationId")?;
        let (attempt, _permit) = self
            .begin_finalization(authorization_id, order_id, Finalization::Capture)
            .await?;
        let gateway = self.gateways.for_kind(GatewayKind::DelayedCapture);

        let capture = match gateway.capture(authorization_id).await {
            Ok(capture) => capture,
            Err(e) => {
                warn!(
                    authorization_id = %authorization_id,
                    error = %e,
                    "capture failed, attempt left unfinalized"
                );
                return Err(e.into());
            }
        };

        self.attempts
            .update(attempt.id, |a| {
                a.status = PaymentStatus::Captured;
                a.capture_id = Some(capture.capture_id.clone());
            })
            .await;
        info!(
            attempt_id = %attempt.id,
            authorization_id = %authorization_id,
            capture_id = %capture.capture_id,
            booking_id = ?attempt.booking_id,
            "authorization captured"
        );

        Ok(Capture {
            capture_id: capture.capture_id,
            status: PaymentStatus::Captured,
        })
    }

    pub async fn finalize_void(
        &self,
        authorization_id: &str,
        order_id: Option<&str>,
    ) -> OrchestratorResult<PaymentStatus> {
        let authorization_id = require_reference(authorization_id, "authorizationId")?;
        let (attempt, _permit) = self
            .begin_finalization(authorization_id, order_id, Finalization::Void)
            .await?;
        let gateway = self.gateways.for_kind(GatewayKind::DelayedCapture);

        if let Err(e) = gateway.void(authorization_id).await {
            warn!(
                authorization_id = %authorization_id,
                error = %e,
                "void failed, attempt left unfinalized"
            );
            return Err(e.into());
        }

        self.attempts
            .update(attempt.id, |a| a.status = PaymentStatus::Voided)
            .await;
        info!(
            attempt_id = %attempt.id,
            authorization_id = %authorization_id,
            "authorization voided"
        );
        Ok(PaymentStatus::Voided)
    }

    /// Resolve the attempt, reject finalized ones and take the in-flight
    /// permit for the authorization (and booking, for captures).
    async fn begin_finalization(
        &self,
        authorization_id: &str,
        order_id: Option<&str>,
        kind: Finalization,
    ) -> OrchestratorResult<(PaymentAttempt, InFlightPermit)> {
        let authorization_id = require_reference(authorization_id, "authorizationId")?;
        let order_id = order_id
            .filter(|o| !o.trim().is_empty())
            .map(|o| require_reference(o, "orderId"))
            .transpose()?;
        let attempt = self.resolve_attempt(authorization_id, order_id).await;
        ensure_not_finalized(authorization_id, &attempt)?;

        let mut keys = vec![format!("auth:{}", authorization_id)];
        if let (Finalization::Capture, Some(booking_id)) = (kind, attempt.booking_id) {
            keys.push(format!("booking:{}", booking_id));
        }
        let permit = self.in_flight.try_acquire(keys).ok_or_else(|| {
            OrchestratorError::FinalizationInProgress {
                authorization_id: authorization_id.to_string(),
            }
        })?;

        // Re-read under the permit: another request may have finished
        // between the first check and acquiring it
        let attempt = self
            .attempts
            .get(attempt.id)
            .await
            .unwrap_or(attempt);
        ensure_not_finalized(authorization_id, &attempt)?;

        if let (Finalization::Capture, Some(booking_id)) = (kind, attempt.booking_id) {
            if self.attempts.captured_for_booking(booking_id).await.is_some() {
                return Err(OrchestratorError::BookingAlreadyPaid { booking_id });
            }
        }

        Ok((attempt, permit))
    }

    /// Find the attempt for an authorization, linking it through `order_id`
    /// on first sight. Authorizations this service has never seen get a
    /// record so that later finalizations are still guarded.
    async fn resolve_attempt(
        &self,
        authorization_id: &str,
        order_id: Option<&str>,
    ) -> PaymentAttempt {
        if let Some(attempt) = self.attempts.find_by_reference(authorization_id).await {
            return attempt;
        }

        let linked = match order_id.map(str::trim).filter(|o| !o.is_empty()) {
            Some(order_id) => self.attempts.find_by_reference(order_id).await,
            None => None,
        };
        if let Some(attempt) = linked {
            if attempt.authorization_id.is_none() {
                let authorization_id = authorization_id.to_string();
                if let Some(updated) = self
                    .attempts
                    .update(attempt.id, |a| {
                        a.authorization_id = Some(authorization_id);
                        if a.status == PaymentStatus::Created {
                            a.status = PaymentStatus::Authorized;
                        }
                    })
                    .await
                {
                    return updated;
                }
            }
        }

        let gateway = self.gateways.for_kind(GatewayKind::DelayedCapture).name();
        let mut attempt = PaymentAttempt::new(gateway, PaymentStatus::Authorized);
        attempt.authorization_id = Some(authorization_id.to_string());
        attempt.gateway_reference = order_id.map(str::to_string);
        self.attempts.insert(attempt).await
    }

    // =========================================================================
    // Immediate capture
    // =========================================================================

    /// Create an immediate-capture charge in the local currency. No rate
    /// resolution is involved.
    pub async fn charge_immediate(
        &self,
        amount_local: f64,
        booking: Option<&Booking>,
    ) -> OrchestratorResult<CreatedCharge> {
        let amount = parse_local_amount(amount_local)?;
        if let Some(booking) = booking {
            self.ensure_booking_payable(booking).await?;
        }

        let gateway = self.gateways.for_kind(GatewayKind::ImmediateCapture);
        let request = PaymentRequest {
            amount: Money::new(amount.clone(), &self.config.local_currency),
            reference: booking.map(|b| b.id.to_string()),
        };

        let charge = match gateway.create_immediate_charge(&request).await {
            Ok(charge) => charge,
            Err(e) => {
                self.record_failure(gateway.name(), booking, Some(amount), &e)
                    .await;
                return Err(e.into());
            }
        };
        let client_secret = charge.client_secret.clone().ok_or_else(|| {
            OrchestratorError::Payment(PaymentError::GatewayError {
                gateway: gateway.name().to_string(),
                status: None,
                body: format!("charge {} returned no client secret", charge.charge_id),
                retryable: false,
            })
        })?;

        let mut attempt = PaymentAttempt::new(gateway.name(), PaymentStatus::Created);
        link_booking(&mut attempt, booking);
        attempt.gateway_reference = Some(charge.charge_id.clone());
        attempt.amount_local = Some(amount);
        let attempt = self.attempts.insert(attempt).await;

        info!(
            attempt_id = %attempt.id,
            charge_id = %charge.charge_id,
            booking_id = ?attempt.booking_id,
            "immediate-capture charge created"
        );

        Ok(CreatedCharge {
            attempt_id: attempt.id,
            charge_id: charge.charge_id,
            client_secret,
        })
    }

    /// Ask the gateway for the charge status. The attempt becomes
    /// `CAPTURED` only when the gateway reports success.
    pub async fn confirm_immediate(&self, charge_id: &str) -> OrchestratorResult<ChargeConfirmation> {
        let charge_id = require_reference(charge_id, "chargeId")?;
        if self.attempts.find_by_reference(charge_id).await.is_none() {
            return Err(OrchestratorError::AttemptNotFound {
                reference: charge_id.to_string(),
            });
        }

        let gateway = self.gateways.for_kind(GatewayKind::ImmediateCapture);
        let charge = gateway.retrieve_charge(charge_id).await?;
        let status = self
            .apply_charge_status(charge_id, charge.status)
            .await
            .unwrap_or(PaymentStatus::Created);

        Ok(ChargeConfirmation {
            charge_id: charge_id.to_string(),
            status,
            gateway_status: charge.status,
        })
    }

    /// Verify and apply a signed immediate-capture gateway event
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> OrchestratorResult<WebhookOutcome> {
        let gateway = self.gateways.for_kind(GatewayKind::ImmediateCapture);
        let verification = gateway.verify_webhook(payload, signature)?;
        if !verification.valid {
            warn!(
                gateway = %gateway.name(),
                reason = ?verification.reason,
                "rejected webhook with invalid signature"
            );
            return Err(PaymentError::WebhookVerificationError {
                message: verification
                    .reason
                    .unwrap_or_else(|| "invalid signature".to_string()),
            }
            .into());
        }

        let event = gateway.parse_webhook_event(payload)?;
        let applied = match event.charge_id.as_deref() {
            Some(charge_id) => match event.event_type.as_str() {
                "payment_intent.succeeded" => self
                    .apply_charge_status(charge_id, ChargeStatus::Succeeded)
                    .await
                    .is_some(),
                "payment_intent.canceled" => self
                    .apply_charge_status(charge_id, ChargeStatus::Canceled)
                    .await
                    .is_some(),
                "payment_intent.payment_failed" => self.mark_charge_failed(charge_id).await,
                _ => false,
            },
            None => false,
        };

        info!(
            event_id = ?event.event_id,
            event_type = %event.event_type,
            charge_id = ?event.charge_id,
            applied,
            "webhook processed"
        );
        Ok(WebhookOutcome {
            event_type: event.event_type,
            charge_id: event.charge_id,
            applied,
        })
    }

    /// Map a gateway charge status onto the attempt. Returns the attempt's
    /// resulting status, or `None` when no attempt carries `charge_id`.
    async fn apply_charge_status(
        &self,
        charge_id: &str,
        gateway_status: ChargeStatus,
    ) -> Option<PaymentStatus> {
        let attempt = match self.attempts.find_by_reference(charge_id).await {
            Some(attempt) => attempt,
            None => {
                warn!(charge_id = %charge_id, "no payment attempt for charge");
                return None;
            }
        };

        let next = match gateway_status {
            ChargeStatus::Succeeded => PaymentStatus::Captured,
            ChargeStatus::Canceled => PaymentStatus::Failed,
            _ => return Some(attempt.status),
        };
        if attempt.status == next || attempt.status == PaymentStatus::Captured {
            return Some(attempt.status);
        }

        if next == PaymentStatus::Captured {
            if let Some(booking_id) = attempt.booking_id {
                if let Some(other) = self.attempts.captured_for_booking(booking_id).await {
                    error!(
                        booking_id = %booking_id,
                        charge_id = %charge_id,
                        captured_attempt_id = %other.id,
                        "second captured payment reported for booking"
                    );
                }
            }
        }

        self.attempts
            .update(attempt.id, |a| a.status = next)
            .await
            .map(|a| {
                info!(charge_id = %charge_id, status = %a.status, "charge status applied");
                a.status
            })
    }

    async fn mark_charge_failed(&self, charge_id: &str) -> bool {
        match self.attempts.find_by_reference(charge_id).await {
            Some(attempt) if attempt.status == PaymentStatus::Created => self
                .attempts
                .update(attempt.id, |a| {
                    a.status = PaymentStatus::Failed;
                    a.failure_reason = Some("payment_intent.payment_failed".to_string());
                })
                .await
                .is_some(),
            _ => false,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn ensure_booking_payable(&self, booking: &Booking) -> OrchestratorResult<()> {
        if booking.status.is_terminal() {
            return Err(OrchestratorError::InvalidInput {
                message: format!(
                    "booking {} is {} and cannot take payments",
                    booking.id, booking.status
                ),
                field: "bookingId".to_string(),
            });
        }
        if self.attempts.captured_for_booking(booking.id).await.is_some() {
            return Err(OrchestratorError::BookingAlreadyPaid {
                booking_id: booking.id,
            });
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        gateway: GatewayName,
        booking: Option<&Booking>,
        amount_local: Option<BigDecimal>,
        cause: &PaymentError,
    ) {
        let mut attempt = PaymentAttempt::new(gateway, PaymentStatus::Failed);
        link_booking(&mut attempt, booking);
        attempt.amount_local = amount_local;
        attempt.failure_reason = Some(cause.to_string());
        let attempt = self.attempts.insert(attempt).await;
        warn!(
            attempt_id = %attempt.id,
            gateway = %gateway,
            booking_id = ?attempt.booking_id,
            error = %cause,
            "payment attempt failed at creation"
        );
    }
}

fn link_booking(attempt: &mut PaymentAttempt, booking: Option<&Booking>) {
    if let Some(booking) = booking {
        attempt.booking_id = Some(booking.id);
        attempt.client_id = Some(booking.client_id.clone());
        attempt.provider_id = Some(booking.provider_id.clone());
    }
}

fn ensure_not_finalized(authorization_id: &str, attempt: &PaymentAttempt) -> OrchestratorResult<()> {
    if attempt.status.is_final() {
        return Err(OrchestratorError::AlreadyFinalized {
            authorization_id: authorization_id.to_string(),
            status: attempt.status,
        });
    }
    Ok(())
}

/// Gateway references travel into gateway URL paths, so only the
/// characters gateways use for ids are accepted.
fn require_reference<'a>(value: &'a str, field: &str) -> OrchestratorResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OrchestratorError::MissingField {
            field: field.to_string(),
        });
    }
    if value.len() > MAX_REFERENCE_LEN
        || !value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(OrchestratorError::InvalidInput {
            message: "must be 1-128 characters of A-Z, a-z, 0-9, '_' or '-'".to_string(),
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// A local-currency amount must be finite and greater than zero
pub fn parse_local_amount(amount: f64) -> OrchestratorResult<BigDecimal> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(OrchestratorError::InvalidInput {
            message: format!("amount must be a finite number greater than zero, got {}", amount),
            field: "amountLocal".to_string(),
        });
    }
    BigDecimal::from_str(&amount.to_string()).map_err(|e| OrchestratorError::InvalidInput {
        message: format!("unparseable amount {}: {}", amount, e),
        field: "amountLocal".to_string(),
    })
}
