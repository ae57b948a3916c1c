//! Checkout: booking creation plus the first payment attempt.
//!
//! The two steps form a compensating transaction. The booking is created
//! `PENDING`, the payment is created against it, and when the payment step
//! fails the booking is moved to `ABANDONED` before the error is returned.

use crate::bookings::{Booking, BookingError, BookingService, BookingStatus, NewBooking};
use crate::services::payment_orchestrator::{
    parse_local_amount, CreatedCharge, CreatedOrder, OrchestratorError, PaymentOrchestrator,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// Rejected before any booking was created
    #[error(transparent)]
    InvalidPayment(OrchestratorError),

    #[error("Payment for booking {booking_id} failed: {source}")]
    Payment {
        booking_id: Uuid,
        source: OrchestratorError,
    },
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayedCheckout {
    pub booking: Booking,
    pub order: CreatedOrder,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmediateCheckout {
    pub booking: Booking,
    pub charge: CreatedCharge,
}

pub struct CheckoutService {
    bookings: Arc<BookingService>,
    orchestrator: Arc<PaymentOrchestrator>,
}

impl CheckoutService {
    pub fn new(bookings: Arc<BookingService>, orchestrator: Arc<PaymentOrchestrator>) -> Self {
        Self {
            bookings,
            orchestrator,
        }
    }

    /// Create the booking and a delayed-capture order for `amount_local`
    pub async fn checkout_delayed(
        &self,
        new_booking: NewBooking,
        amount_local: f64,
    ) -> CheckoutResult<DelayedCheckout> {
        parse_local_amount(amount_local).map_err(CheckoutError::InvalidPayment)?;
        let booking = self.bookings.create_booking(new_booking).await?;
        match self
            .orchestrator
            .quote_and_create(amount_local, Some(&booking))
            .await
        {
            Ok(order) => {
                info!(booking_id = %booking.id, order_id = %order.order_id, "delayed checkout started");
                Ok(DelayedCheckout { booking, order })
            }
            Err(source) => Err(self.compensate(booking.id, source).await),
        }
    }

    /// Create the booking and an immediate-capture charge for `amount_local`
    pub async fn checkout_immediate(
        &self,
        new_booking: NewBooking,
        amount_local: f64,
    ) -> CheckoutResult<ImmediateCheckout> {
        parse_local_amount(amount_local).map_err(CheckoutError::InvalidPayment)?;
        let booking = self.bookings.create_booking(new_booking).await?;
        match self
            .orchestrator
            .charge_immediate(amount_local, Some(&booking))
            .await
        {
            Ok(charge) => {
                info!(booking_id = %booking.id, charge_id = %charge.charge_id, "immediate checkout started");
                Ok(ImmediateCheckout { booking, charge })
            }
            Err(source) => Err(self.compensate(booking.id, source).await),
        }
    }

    async fn compensate(&self, booking_id: Uuid, source: OrchestratorError) -> CheckoutError {
        warn!(booking_id = %booking_id, error = %source, "first payment attempt failed, abandoning booking");
        match self.bookings.abandon(booking_id).await {
            Ok(BookingStatus::Abandoned) => {}
            Ok(status) => {
                warn!(booking_id = %booking_id, status = %status, "booking moved on before it could be abandoned");
            }
            Err(e) => {
                error!(booking_id = %booking_id, error = %e, "failed to abandon booking");
            }
        }
        CheckoutError::Payment { booking_id, source }
    }
}
