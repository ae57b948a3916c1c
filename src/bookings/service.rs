//! Booking service
//!
//! Applies role-gated status transitions. Check-and-apply runs under a
//! per-booking async lock, and the repository write is a compare-and-set,
//! so two concurrent actions on one booking cannot both be applied against
//! the same pre-transition state.

use crate::bookings::error::{BookingError, BookingResult};
use crate::bookings::model::{Booking, NewBooking};
use crate::bookings::repository::BookingRepository;
use crate::bookings::state::{next_status, ActorRole, BookingAction, BookingStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub struct BookingService {
    repository: Arc<dyn BookingRepository>,
    booking_locks: BookingLocks,
}

impl BookingService {
    pub fn new(repository: Arc<dyn BookingRepository>) -> Self {
        Self {
            repository,
            booking_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Create a booking in `PENDING`
    pub async fn create_booking(&self, new_booking: NewBooking) -> BookingResult<Booking> {
        new_booking.validate()?;
        let booking = self.repository.insert(Booking::from_new(new_booking)).await?;
        info!(
            booking_id = %booking.id,
            client_id = %booking.client_id,
            provider_id = %booking.provider_id,
            service_id = %booking.service_id,
            "booking created"
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.repository
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound { booking_id })
    }

    /// Apply `action` performed by `role` and return the new status
    pub async fn update_booking_status(
        &self,
        booking_id: Uuid,
        role: ActorRole,
        action: BookingAction,
    ) -> BookingResult<BookingStatus> {
        self.with_booking_lock(booking_id, || async {
            let booking = self.get_booking(booking_id).await?;
            let next = match next_status(booking.status, role, action) {
                Ok(next) => next,
                Err(e) => {
                    warn!(
                        booking_id = %booking_id,
                        current = %booking.status,
                        role = %role,
                        action = %action,
                        "rejected booking transition"
                    );
                    return Err(e);
                }
            };
            self.apply(booking_id, booking.status, next).await
        })
        .await
    }

    /// Move a `PENDING` booking whose first payment attempt failed to
    /// `ABANDONED`. Not reachable through `update_booking_status`.
    pub async fn abandon(&self, booking_id: Uuid) -> BookingResult<BookingStatus> {
        self.with_booking_lock(booking_id, || async {
            let booking = self.get_booking(booking_id).await?;
            if booking.status != BookingStatus::Pending {
                return Ok(booking.status);
            }
            self.apply(booking_id, BookingStatus::Pending, BookingStatus::Abandoned)
                .await
        })
        .await
    }

    async fn apply(
        &self,
        booking_id: Uuid,
        current: BookingStatus,
        next: BookingStatus,
    ) -> BookingResult<BookingStatus> {
        match self
            .repository
            .compare_and_set_status(booking_id, current, next)
            .await?
        {
            Some(updated) => {
                info!(
                    booking_id = %booking_id,
                    from = %current,
                    to = %updated.status,
                    "booking status updated"
                );
                Ok(updated.status)
            }
            // Another writer (another process sharing the store) got there first
            None => Err(BookingError::ConcurrentModification { booking_id }),
        }
    }

    async fn with_booking_lock<F, Fut, T>(&self, booking_id: Uuid, f: F) -> BookingResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = BookingResult<T>>,
    {
        let entry = self.lock_entry(booking_id);
        let _held = entry.lock.lock().await;
        f().await
    }

    fn lock_entry(&self, booking_id: Uuid) -> BookingLockEntry<'_> {
        let mut locks = lock_map(&self.booking_locks);
        let lock = locks
            .entry(booking_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        BookingLockEntry {
            locks: &self.booking_locks,
            booking_id,
            lock,
        }
    }
}

type BookingLocks = StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>;

fn lock_map(locks: &BookingLocks) -> MutexGuard<'_, HashMap<Uuid, Arc<Mutex<()>>>> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-booking lock handle. Dropping it, including when the request future
/// is cancelled mid-transition, removes the map entry once no other request
/// holds or waits on it.
struct BookingLockEntry<'a> {
    locks: &'a BookingLocks,
    booking_id: Uuid,
    lock: Arc<Mutex<()>>,
}

impl Drop for BookingLockEntry<'_> {
    fn drop(&mut self) {
        let mut locks = lock_map(self.locks);
        // The map holds one reference and this entry the other
        if Arc::strong_count(&self.lock) == 2
            && locks
                .get(&self.booking_id)
                .is_some_and(|existing| Arc::ptr_eq(existing, &self.lock))
        {
            locks.remove(&self.booking_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::model::Schedule;
    use crate::bookings::repository::InMemoryBookingRepository;
    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};

    fn service() -> BookingService {
        BookingService::new(Arc::new(InMemoryBookingRepository::new()))
    }

    fn new_booking() -> NewBooking {
        let start = Utc::now() + Duration::days(2);
        NewBooking {
            client_id: "client_7".to_string(),
            provider_id: "provider_3".to_string(),
            service_id: "svc_plumbing".to_string(),
            schedule: Schedule {
                start,
                end: start + Duration::hours(3),
            },
            price_total: BigDecimal::from(100),
            location: None,
        }
    }

    #[tokio::test]
    async fn abandon_only_moves_pending_bookings() {
        let service = service();
        let booking = service.create_booking(new_booking()).await.unwrap();
        service
            .update_booking_status(booking.id, ActorRole::Provider, BookingAction::Accept)
            .await
            .unwrap();

        let status = service.abandon(booking.id).await.unwrap();
        assert_eq!(status, BookingStatus::Accepted);

        let other = service.create_booking(new_booking()).await.unwrap();
        assert_eq!(
            service.abandon(other.id).await.unwrap(),
            BookingStatus::Abandoned
        );
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let service = service();
        let result = service
            .update_booking_status(Uuid::new_v4(), ActorRole::Client, BookingAction::Cancel)
            .await;
        assert!(matches!(result, Err(BookingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn booking_locks_are_released() {
        let service = service();
        let booking = service.create_booking(new_booking()).await.unwrap();
        service
            .update_booking_status(booking.id, ActorRole::Provider, BookingAction::Reject)
            .await
            .unwrap();
        assert!(lock_map(&service.booking_locks).is_empty());
    }

    /// Repository whose reads never complete
    struct StalledRepository;

    #[async_trait::async_trait]
    impl BookingRepository for StalledRepository {
        async fn insert(&self, booking: Booking) -> BookingResult<Booking> {
            Ok(booking)
        }

        async fn find_by_id(&self, _id: Uuid) -> BookingResult<Option<Booking>> {
            std::future::pending().await
        }

        async fn compare_and_set_status(
            &self,
            _id: Uuid,
            _expected: BookingStatus,
            _next: BookingStatus,
        ) -> BookingResult<Option<Booking>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_transition_releases_its_lock_entry() {
        let service = BookingService::new(Arc::new(StalledRepository));
        let booking_id = Uuid::new_v4();

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            service.update_booking_status(booking_id, ActorRole::Client, BookingAction::Cancel),
        )
        .await;

        assert!(cancelled.is_err());
        assert!(lock_map(&service.booking_locks).is_empty());
    }

    #[tokio::test]
    async fn invalid_booking_is_rejected_before_storage() {
        let service = service();
        let mut input = new_booking();
        input.client_id = " ".to_string();
        assert!(matches!(
            service.create_booking(input).await,
            Err(BookingError::Validation { .. })
        ));
    }
}
