use crate::bookings::error::{BookingError, BookingResult};
use crate::bookings::model::{Booking, Schedule};
use crate::bookings::repository::BookingRepository;
use crate::bookings::state::BookingStatus;
use crate::database::error::DatabaseError;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, client_id, provider_id, service_id, schedule_start, schedule_end, \
     price_total, location, status, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct BookingRow {
    id: Uuid,
    client_id: String,
    provider_id: String,
    service_id: String,
    schedule_start: DateTime<Utc>,
    schedule_end: DateTime<Utc>,
    price_total: BigDecimal,
    location: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<BookingStatus>().map_err(|_| BookingError::Storage {
            message: format!("booking {} has unknown status '{}'", row.id, row.status),
            is_retryable: false,
        })?;
        Ok(Booking {
            id: row.id,
            client_id: row.client_id,
            provider_id: row.provider_id,
            service_id: row.service_id,
            schedule: Schedule {
                start: row.schedule_start,
                end: row.schedule_end,
            },
            price_total: row.price_total,
            location: row.location,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres booking store; status is stored as its wire name
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert(&self, booking: Booking) -> BookingResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO bookings
             (id, client_id, provider_id, service_id, schedule_start, schedule_end,
              price_total, location, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(&booking.client_id)
        .bind(&booking.provider_id)
        .bind(&booking.service_id)
        .bind(booking.schedule.start)
        .bind(booking.schedule.end)
        .bind(&booking.price_total)
        .bind(&booking.location)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        row.map(Booking::try_from).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> BookingResult<Option<Booking>> {
        let updated = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings
             SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = ANY($2)
             RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(expected.stored_names())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        match updated {
            Some(row) => Ok(Some(row.try_into()?)),
            None => match self.find_by_id(id).await? {
                Some(_) => Ok(None),
                None => Err(BookingError::NotFound { booking_id: id }),
            },
        }
    }
}
