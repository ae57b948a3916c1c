//! Payment gateways
//!
//! Gateways are spoken to over plain HTTPS REST. PayPal is the
//! delayed-capture gateway, Stripe the immediate-capture one.

pub mod error;
pub mod factory;
pub mod gateway;
pub mod providers;
pub mod types;
pub mod utils;

pub use error::{PaymentError, PaymentResult};
pub use factory::{GatewaysConfig, PaymentGatewayFactory, PaymentGateways};
pub use gateway::PaymentGateway;
