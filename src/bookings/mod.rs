//! Bookings
//!
//! A booking moves through a fixed, role-gated lifecycle. Clients may only
//! cancel; providers accept, reject, start, complete and cancel.

pub mod error;
pub mod model;
pub mod repository;
pub mod service;
pub mod state;

pub use error::{BookingError, BookingResult};
pub use model::{Booking, NewBooking, Schedule};
pub use repository::{BookingRepository, InMemoryBookingRepository};
pub use service::BookingService;
pub use state::{next_status, ActorRole, BookingAction, BookingStatus};
