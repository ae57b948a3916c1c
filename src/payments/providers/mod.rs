pub mod paypal;
pub mod stripe;

pub use paypal::{PaypalConfig, PaypalEnvironment, PaypalGateway};
pub use stripe::{StripeConfig, StripeGateway};
