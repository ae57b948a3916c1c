use crate::bookings::error::{BookingError, BookingResult};
use crate::bookings::model::Booking;
use crate::bookings::state::BookingStatus;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage port for bookings.
///
/// Once inserted, only the status changes, and only through a
/// compare-and-set.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> BookingResult<Booking>;

    async fn find_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>>;

    /// Move the booking to `next` only if its status is still `expected`.
    ///
    /// Returns the updated booking, or `None` when the status no longer
    /// matches. Fails with `NotFound` for an unknown id.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> BookingResult<Option<Booking>>;
}

/// Thread-safe in-memory booking store.
#[derive(Default, Clone)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored booking, oldest first
    pub async fn list(&self) -> Vec<Booking> {
        let mut all: Vec<Booking> = self.bookings.read().await.values().cloned().collect();
        all.sort_by_key(|b| b.created_at);
        all
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> BookingResult<Booking> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(BookingError::Storage {
                message: format!("booking {} already exists", booking.id),
                is_retryable: false,
            });
        }
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> BookingResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or(BookingError::NotFound { booking_id: id })?;
        if booking.status != expected {
            return Ok(None);
        }
        booking.status = next;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }
}
