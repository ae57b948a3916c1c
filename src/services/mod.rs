//! Services module for business logic and integrations

pub mod checkout;
pub mod exchange_rate;
pub mod order_metadata;
pub mod payment_attempts;
pub mod payment_orchestrator;
pub mod rate_providers;

pub use checkout::{CheckoutError, CheckoutResult, CheckoutService};
pub use exchange_rate::{RateProvider, RateQuote, RateResolver, RateResolverConfig};
pub use order_metadata::{
    InMemoryOrderMetadataStore, OrderMetadataConfig, OrderMetadataEntry, OrderMetadataStore,
};
pub use payment_attempts::{PaymentAttempt, PaymentAttemptStore};
pub use payment_orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorResult, PaymentOrchestrator,
};
