//! Rate resolution never fails, whatever the providers do

use async_trait::async_trait;
use marketplace_backend::services::exchange_rate::{
    parse_fallback_rates, ExchangeRateError, ExchangeRateResult, RateProvider, RateResolver,
    RateResolverConfig,
};
use std::sync::Arc;
use std::time::Duration;

enum Behavior {
    Fail,
    NotANumber,
    Negative,
    Hang,
}

struct BrokenProvider(Behavior);

#[async_trait]
impl RateProvider for BrokenProvider {
    async fn fetch_rate(&self, from: &str, to: &str) -> ExchangeRateResult<f64> {
        match self.0 {
            Behavior::Fail => Err(ExchangeRateError::RateNotFound {
                from: from.to_string(),
                to: to.to_string(),
            }),
            Behavior::NotANumber => Ok(f64::NAN),
            Behavior::Negative => Ok(-3.67),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(3.67)
            }
        }
    }

    fn name(&self) -> &str {
        match self.0 {
            Behavior::Fail => "failing",
            Behavior::NotANumber => "nan",
            Behavior::Negative => "negative",
            Behavior::Hang => "hanging",
        }
    }
}

fn broken_resolver(config: RateResolverConfig) -> RateResolver {
    RateResolver::new(config)
        .add_provider(Arc::new(BrokenProvider(Behavior::Fail)))
        .add_provider(Arc::new(BrokenProvider(Behavior::NotANumber)))
        .add_provider(Arc::new(BrokenProvider(Behavior::Negative)))
}

#[tokio::test]
async fn every_pair_resolves_to_a_usable_rate() {
    let mut config = RateResolverConfig::default();
    config
        .fallback_rates
        .extend(parse_fallback_rates("EUR/USD=1.08,GBP/USD=1.27").unwrap());
    let resolver = broken_resolver(config);

    let currencies = ["AED", "USD", "EUR", "GBP", "INR", "SAR", "xyz"];
    for from in currencies {
        for to in currencies {
            let quote = resolver.resolve(from, to).await;
            assert!(
                quote.rate.is_finite() && quote.rate > 0.0,
                "{from}->{to} resolved to {}",
                quote.rate
            );
            assert_eq!(quote.degraded, !from.eq_ignore_ascii_case(to));
        }
    }

    assert_eq!(resolver.resolve_rate("AED", "USD").await, 0.2723);
    assert_eq!(resolver.resolve_rate("EUR", "USD").await, 1.08);
    assert!((resolver.resolve_rate("USD", "GBP").await - 1.0 / 1.27).abs() < 1e-12);
    assert_eq!(resolver.resolve_rate("INR", "SAR").await, 1.0);
}

#[tokio::test(start_paused = true)]
async fn hanging_provider_is_cut_off_by_the_timeout() {
    let resolver = RateResolver::new(RateResolverConfig {
        provider_timeout_secs: 2,
        ..RateResolverConfig::default()
    })
    .add_provider(Arc::new(BrokenProvider(Behavior::Hang)));

    let started = tokio::time::Instant::now();
    let quote = resolver.resolve("AED", "USD").await;

    assert_eq!(quote.rate, 0.2723);
    assert_eq!(quote.source, "fallback");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn resolver_without_providers_uses_constants() {
    let resolver = RateResolver::new(RateResolverConfig::default());
    assert!(resolver.provider_names().is_empty());
    let quote = resolver.resolve("usd", "aed").await;
    assert_eq!(quote.source, "fallback_inverse");
    assert!((quote.rate - 1.0 / 0.2723).abs() < 1e-9);
}
