use crate::bookings::error::{BookingError, BookingResult};
use crate::bookings::state::BookingStatus;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Input for `create_booking`, as supplied by the booking collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub client_id: String,
    pub provider_id: String,
    pub service_id: String,
    pub schedule: Schedule,
    pub price_total: BigDecimal,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewBooking {
    pub fn validate(&self) -> BookingResult<()> {
        for (field, value) in [
            ("clientId", &self.client_id),
            ("providerId", &self.provider_id),
            ("serviceId", &self.service_id),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::validation(
                    format!("{} is required", field),
                    field,
                ));
            }
        }
        if self.client_id == self.provider_id {
            return Err(BookingError::validation(
                "client and provider must be different parties",
                "providerId",
            ));
        }
        if self.schedule.end <= self.schedule.start {
            return Err(BookingError::validation(
                "schedule end must be after start",
                "schedule",
            ));
        }
        if self.price_total <= BigDecimal::from(0) {
            return Err(BookingError::validation(
                "price total must be greater than zero",
                "priceTotal",
            ));
        }
        Ok(())
    }
}

/// A scheduled engagement between one client and one provider.
///
/// Price and schedule are fixed at creation; only `status` (and
/// `updated_at`) ever change, and only through the booking service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub client_id: String,
    pub provider_id: String,
    pub service_id: String,
    pub schedule: Schedule,
    pub price_total: BigDecimal,
    pub location: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn from_new(new: NewBooking) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            provider_id: new.provider_id,
            service_id: new.service_id,
            schedule: new.schedule,
            price_total: new.price_total,
            location: new.location,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
