use crate::payments::error::PaymentResult;
use crate::payments::gateway::PaymentGateway;
use crate::payments::providers::{PaypalConfig, PaypalGateway, StripeConfig, StripeGateway};
use crate::payments::types::{GatewayKind, GatewayName};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct GatewaysConfig {
    pub paypal: PaypalConfig,
    pub stripe: StripeConfig,
}

impl GatewaysConfig {
    pub fn from_env() -> PaymentResult<Self> {
        Ok(Self {
            paypal: PaypalConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
        })
    }
}

/// The gateway used for each settlement protocol
#[derive(Clone)]
pub struct PaymentGateways {
    pub delayed: Arc<dyn PaymentGateway>,
    pub immediate: Arc<dyn PaymentGateway>,
}

impl PaymentGateways {
    pub fn new(delayed: Arc<dyn PaymentGateway>, immediate: Arc<dyn PaymentGateway>) -> Self {
        Self { delayed, immediate }
    }

    pub fn for_kind(&self, kind: GatewayKind) -> Arc<dyn PaymentGateway> {
        match kind {
            GatewayKind::DelayedCapture => self.delayed.clone(),
            GatewayKind::ImmediateCapture => self.immediate.clone(),
        }
    }

    pub fn list_configured(&self) -> Vec<GatewayName> {
        [&self.delayed, &self.immediate]
            .into_iter()
            .filter(|g| g.is_configured())
            .map(|g| g.name())
            .collect()
    }
}

pub struct PaymentGatewayFactory;

impl PaymentGatewayFactory {
    /// Build both gateways. A gateway without credentials is still built so
    /// its endpoints answer `MissingCredentials` while the process runs.
    pub fn build(config: &GatewaysConfig) -> PaymentResult<PaymentGateways> {
        let paypal = PaypalGateway::new(config.paypal.clone())?;
        if !paypal.is_configured() {
            warn!("PAYPAL_CLIENT_ID/PAYPAL_CLIENT_SECRET not set, delayed-capture payments disabled");
        }
        let stripe = StripeGateway::new(config.stripe.clone())?;
        if !stripe.is_configured() {
            warn!("STRIPE_SECRET_KEY not set, immediate-capture payments disabled");
        }

        Ok(PaymentGateways::new(Arc::new(paypal), Arc::new(stripe)))
    }

    pub fn from_env() -> PaymentResult<PaymentGateways> {
        Self::build(&GatewaysConfig::from_env()?)
    }
}
