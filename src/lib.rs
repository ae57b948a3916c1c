//! Payment authorization orchestrator and booking lifecycle for the
//! service marketplace backend.

pub mod api;
pub mod bookings;
#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod services;
