use crate::bookings::state::{ActorRole, BookingAction, BookingStatus};
use thiserror::Error;
use uuid::Uuid;

pub type BookingResult<T> = Result<T, BookingError>;

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("Illegal transition: {role} cannot {action} a booking in state {current}")]
    IllegalTransition {
        current: BookingStatus,
        role: ActorRole,
        action: BookingAction,
    },

    #[error("Booking {booking_id} not found")]
    NotFound { booking_id: Uuid },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Booking {booking_id} was modified concurrently")]
    ConcurrentModification { booking_id: Uuid },

    #[error("Booking storage error: {message}")]
    Storage { message: String, is_retryable: bool },
}

impl BookingError {
    pub fn validation(message: impl Into<String>, field: &str) -> Self {
        BookingError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }
}
