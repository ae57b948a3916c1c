//! Booking lifecycle states and the role-gated transition table.

use crate::bookings::error::{BookingError, BookingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking status.
///
/// `CONFIRMED` never behaved differently from `ACCEPTED`, so it is folded
/// into `Accepted`: stored values and request payloads spelling `CONFIRMED`
/// still deserialize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    #[serde(alias = "CONFIRMED")]
    Accepted,
    Rejected,
    InProgress,
    Completed,
    CancelledByClient,
    CancelledByProvider,
    /// Internal: the first payment attempt failed during checkout
    Abandoned,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        BookingStatus::Pending,
        BookingStatus::Accepted,
        BookingStatus::Rejected,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::CancelledByClient,
        BookingStatus::CancelledByProvider,
        BookingStatus::Abandoned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Accepted => "ACCEPTED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::CancelledByClient => "CANCELLED_BY_CLIENT",
            BookingStatus::CancelledByProvider => "CANCELLED_BY_PROVIDER",
            BookingStatus::Abandoned => "ABANDONED",
        }
    }

    /// Every spelling a store may hold for this status
    pub fn stored_names(&self) -> &'static [&'static str] {
        match self {
            BookingStatus::Pending => &["PENDING"],
            BookingStatus::Accepted => &["ACCEPTED", "CONFIRMED"],
            BookingStatus::Rejected => &["REJECTED"],
            BookingStatus::InProgress => &["IN_PROGRESS"],
            BookingStatus::Completed => &["COMPLETED"],
            BookingStatus::CancelledByClient => &["CANCELLED_BY_CLIENT"],
            BookingStatus::CancelledByProvider => &["CANCELLED_BY_PROVIDER"],
            BookingStatus::Abandoned => &["ABANDONED"],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected
                | BookingStatus::Completed
                | BookingStatus::CancelledByClient
                | BookingStatus::CancelledByProvider
                | BookingStatus::Abandoned
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "ACCEPTED" | "CONFIRMED" => Ok(BookingStatus::Accepted),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "IN_PROGRESS" => Ok(BookingStatus::InProgress),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED_BY_CLIENT" => Ok(BookingStatus::CancelledByClient),
            "CANCELLED_BY_PROVIDER" => Ok(BookingStatus::CancelledByProvider),
            "ABANDONED" => Ok(BookingStatus::Abandoned),
            _ => Err(BookingError::Validation {
                message: format!("unknown booking status: {}", value),
                field: Some("status".to_string()),
            }),
        }
    }
}

/// Party performing a booking action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Client,
    Provider,
}

impl ActorRole {
    pub const ALL: [ActorRole; 2] = [ActorRole::Client, ActorRole::Provider];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Client => "client",
            ActorRole::Provider => "provider",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Accept,
    Reject,
    Start,
    Complete,
    Cancel,
}

impl BookingAction {
    pub const ALL: [BookingAction; 5] = [
        BookingAction::Accept,
        BookingAction::Reject,
        BookingAction::Start,
        BookingAction::Complete,
        BookingAction::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Accept => "accept",
            BookingAction::Reject => "reject",
            BookingAction::Start => "start",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolve the status a booking moves to when `role` performs `action`
/// while the booking is in `current`.
pub fn next_status(
    current: BookingStatus,
    role: ActorRole,
    action: BookingAction,
) -> BookingResult<BookingStatus> {
    use ActorRole::{Client, Provider};
    use BookingAction::{Accept, Cancel, Complete, Reject, Start};
    use BookingStatus::*;

    match (current, role, action) {
        (Pending, Provider, Accept) => Ok(Accepted),
        (Pending, Provider, Reject) => Ok(Rejected),
        (Pending, Client, Cancel) => Ok(CancelledByClient),
        (Accepted, Client, Cancel) => Ok(CancelledByClient),
        (Accepted, Provider, Start) => Ok(InProgress),
        (Accepted, Provider, Cancel) => Ok(CancelledByProvider),
        (InProgress, Provider, Complete) => Ok(Completed),
        _ => Err(BookingError::IllegalTransition {
            current,
            role,
            action,
        }),
    }
}
