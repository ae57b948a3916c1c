//! Exchange Rate Resolution
//!
//! Converts between the marketplace's local currency and a gateway's
//! settlement currency. Providers are tried in order; when all of them fail
//! a configured constant is used, so resolution never fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Rate provider error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExchangeRateError {
    #[error("Rate not found for {from} -> {to}")]
    RateNotFound { from: String, to: String },

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Rate provider error: {0}")]
    ProviderError(String),

    #[error("Rate provider {provider} timed out after {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },
}

pub type ExchangeRateResult<T> = Result<T, ExchangeRateError>;

/// Rate provider trait for fetching exchange rates
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Units of `to` per one unit of `from`
    async fn fetch_rate(&self, from: &str, to: &str) -> ExchangeRateResult<f64>;

    fn name(&self) -> &str;
}

/// Resolved rate and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub rate: f64,
    pub source: String,
    /// True when no provider answered and a fallback constant was used
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct RateResolverConfig {
    pub provider_timeout_secs: u64,
    /// Last-resort constants keyed by `(FROM, TO)`
    pub fallback_rates: HashMap<(String, String), f64>,
    /// Used when neither the pair nor its inverse has a constant
    pub default_fallback_rate: f64,
}

impl Default for RateResolverConfig {
    fn default() -> Self {
        let mut fallback_rates = HashMap::new();
        fallback_rates.insert(("AED".to_string(), "USD".to_string()), 0.2723);
        Self {
            provider_timeout_secs: 5,
            fallback_rates,
            default_fallback_rate: 1.0,
        }
    }
}

/// Parse `AED/USD=0.2723,EUR/USD=1.08` into fallback constants
pub fn parse_fallback_rates(raw: &str) -> Result<HashMap<(String, String), f64>, String> {
    let mut rates = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (pair, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected FROM/TO=RATE, got '{}'", entry))?;
        let (from, to) = pair
            .split_once('/')
            .ok_or_else(|| format!("expected FROM/TO, got '{}'", pair))?;
        let rate = value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid rate '{}' for {}", value, pair))?;
        if !is_usable(rate) {
            return Err(format!("rate for {} must be finite and positive", pair));
        }
        rates.insert(
            (from.trim().to_uppercase(), to.trim().to_uppercase()),
            rate,
        );
    }
    Ok(rates)
}

fn is_usable(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

pub struct RateResolver {
    providers: Vec<Arc<dyn RateProvider>>,
    config: RateResolverConfig,
}

impl RateResolver {
    pub fn new(config: RateResolverConfig) -> Self {
        Self {
            providers: Vec::new(),
            config,
        }
    }

    /// Providers are tried in the order they are added
    pub fn add_provider(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn resolve_rate(&self, from: &str, to: &str) -> f64 {
        self.resolve(from, to).await.rate
    }

    pub async fn resolve(&self, from: &str, to: &str) -> RateQuote {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();

        if from == to {
            return RateQuote {
                rate: 1.0,
                source: "identity".to_string(),
                degraded: false,
            };
        }

        let timeout = Duration::from_secs(self.config.provider_timeout_secs);
        for provider in &self.providers {
            let result = match tokio::time::timeout(timeout, provider.fetch_rate(&from, &to)).await
            {
                Ok(result) => result,
                Err(_) => Err(ExchangeRateError::Timeout {
                    provider: provider.name().to_string(),
                    timeout_secs: self.config.provider_timeout_secs,
                }),
            };

            match result {
                Ok(rate) if is_usable(rate) => {
                    debug!(provider = provider.name(), from = %from, to = %to, rate, "rate resolved");
                    return RateQuote {
                        rate,
                        source: provider.name().to_string(),
                        degraded: false,
                    };
                }
                Ok(rate) => {
                    warn!(provider = provider.name(), from = %from, to = %to, rate, "provider returned unusable rate");
                }
                Err(e) => {
                    warn!(provider = provider.name(), from = %from, to = %to, error = %e, "rate provider failed");
                }
            }
        }

        self.fallback(&from, &to)
    }

    fn fallback(&self, from: &str, to: &str) -> RateQuote {
        let pair = (from.to_string(), to.to_string());
        let inverse = (to.to_string(), from.to_string());

        if let Some(rate) = self.config.fallback_rates.get(&pair) {
            warn!(from = %from, to = %to, rate = *rate, degraded = true, "all rate providers failed, using fallback rate");
            return RateQuote {
                rate: *rate,
                source: "fallback".to_string(),
                degraded: true,
            };
        }

        if let Some(inverse_rate) = self.config.fallback_rates.get(&inverse) {
            let rate = 1.0 / inverse_rate;
            if !is_usable(rate) {
                warn!(from = %from, to = %to, inverse_rate = *inverse_rate, "inverted fallback rate is unusable");
                return self.default_fallback(from, to);
            }
            warn!(from = %from, to = %to, rate, degraded = true, "all rate providers failed, using inverted fallback rate");
            return RateQuote {
                rate,
                source: "fallback_inverse".to_string(),
                degraded: true,
            };
        }

        self.default_fallback(from, to)
    }

    fn default_fallback(&self, from: &str, to: &str) -> RateQuote {
        let rate = if is_usable(self.config.default_fallback_rate) {
            self.config.default_fallback_rate
        } else {
            1.0
        };
        error!(from = %from, to = %to, rate, degraded = true, "no fallback rate configured for pair, using default");
        RateQuote {
            rate,
            source: "default".to_string(),
            degraded: true,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock rate provider for testing
    pub struct MockRateProvider {
        pub outcome: Result<f64, ExchangeRateError>,
        pub delay: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl MockRateProvider {
        pub fn returning(rate: f64) -> Self {
            Self {
                outcome: Ok(rate),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                outcome: Err(ExchangeRateError::ProviderError("HTTP 500".to_string())),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        async fn fetch_rate(&self, _from: &str, _to: &str) -> ExchangeRateResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn first_healthy_provider_wins() {
        let failing = Arc::new(MockRateProvider::failing());
        let healthy = Arc::new(MockRateProvider::returning(0.27));
        let unused = Arc::new(MockRateProvider::returning(0.5));
        let resolver = RateResolver::new(RateResolverConfig::default())
            .add_provider(failing.clone())
            .add_provider(healthy.clone())
            .add_provider(unused.clone());

        let quote = resolver.resolve("aed", "usd").await;
        assert_eq!(quote.rate, 0.27);
        assert!(!quote.degraded);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(unused.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unusable_rates_are_skipped() {
        let resolver = RateResolver::new(RateResolverConfig::default())
            .add_provider(Arc::new(MockRateProvider::returning(f64::NAN)))
            .add_provider(Arc::new(MockRateProvider::returning(-3.0)))
            .add_provider(Arc::new(MockRateProvider::returning(0.0)));

        let quote = resolver.resolve("AED", "USD").await;
        assert_eq!(quote.rate, 0.2723);
        assert!(quote.degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_and_falls_through() {
        let slow = MockRateProvider {
            outcome: Ok(0.3),
            delay: Some(Duration::from_secs(60)),
            calls: AtomicUsize::new(0),
        };
        let resolver = RateResolver::new(RateResolverConfig::default())
            .add_provider(Arc::new(slow))
            .add_provider(Arc::new(MockRateProvider::returning(0.27)));

        assert_eq!(resolver.resolve_rate("AED", "USD").await, 0.27);
    }

    #[tokio::test]
    async fn fallback_chain_covers_every_pair() {
        let resolver = RateResolver::new(RateResolverConfig::default())
            .add_provider(Arc::new(MockRateProvider::failing()));

        let inverse = resolver.resolve("USD", "AED").await;
        assert!((inverse.rate - 1.0 / 0.2723).abs() < 1e-9);
        assert_eq!(inverse.source, "fallback_inverse");

        for (from, to) in [("EUR", "JPY"), ("XXX", "YYY"), ("", "USD")] {
            let rate = resolver.resolve_rate(from, to).await;
            assert!(rate.is_finite() && rate > 0.0);
        }
    }

    #[tokio::test]
    async fn same_currency_is_identity() {
        let provider = Arc::new(MockRateProvider::returning(9.0));
        let resolver =
            RateResolver::new(RateResolverConfig::default()).add_provider(provider.clone());
        assert_eq!(resolver.resolve_rate("USD", "usd").await, 1.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fallback_rates_parse() {
        let rates = parse_fallback_rates("aed/usd=0.2723, EUR/USD=1.08").unwrap();
        assert_eq!(rates.get(&("AED".to_string(), "USD".to_string())), Some(&0.2723));
        assert_eq!(rates.len(), 2);

        assert!(parse_fallback_rates("AED-USD=0.27").is_err());
        assert!(parse_fallback_rates("AED/USD=abc").is_err());
        assert!(parse_fallback_rates("AED/USD=0").is_err());
        assert!(parse_fallback_rates("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn unusable_inverse_constant_falls_through_to_default() {
        let mut config = RateResolverConfig::default();
        config
            .fallback_rates
            .insert(("USD".to_string(), "JPY".to_string()), 1e-320);
        config.default_fallback_rate = 0.5;
        let resolver = RateResolver::new(config).add_provider(Arc::new(MockRateProvider::failing()));

        let quote = resolver.resolve("JPY", "USD").await;
        assert_eq!(quote.rate, 0.5);
        assert_eq!(quote.source, "default");
        assert!(quote.degraded);
    }
}
