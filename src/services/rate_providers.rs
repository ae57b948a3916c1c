//! Rate providers for fetching exchange rates
//!
//! Both providers are keyless JSON APIs:
//! - OpenErApiProvider: open.er-api.com latest rates
//! - FrankfurterProvider: api.frankfurter.app (ECB reference rates)

use super::exchange_rate::{ExchangeRateError, ExchangeRateResult, RateProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const OPEN_ER_API: &str = "open_er_api";
pub const FRANKFURTER: &str = "frankfurter";

fn http_client(timeout_secs: u64) -> ExchangeRateResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExchangeRateError::ProviderError(format!("HTTP client init failed: {}", e)))
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> ExchangeRateResult<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExchangeRateError::ProviderError(format!("request failed: {}", e)))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ExchangeRateError::ProviderError(format!("HTTP {}", status)));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ExchangeRateError::ProviderError(format!("invalid JSON: {}", e)))
}

fn pick_rate(rates: &HashMap<String, f64>, from: &str, to: &str) -> ExchangeRateResult<f64> {
    rates
        .get(to)
        .copied()
        .ok_or_else(|| ExchangeRateError::RateNotFound {
            from: from.to_string(),
            to: to.to_string(),
        })
}

/// open.er-api.com `GET /v6/latest/{FROM}`
pub struct OpenErApiProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OpenErApiResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl OpenErApiProvider {
    pub fn new(timeout_secs: u64) -> ExchangeRateResult<Self> {
        Self::with_base_url("https://open.er-api.com", timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> ExchangeRateResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    async fn fetch_rate(&self, from: &str, to: &str) -> ExchangeRateResult<f64> {
        let url = format!("{}/v6/latest/{}", self.base_url, from);
        let body: OpenErApiResponse = get_json(&self.client, &url).await?;
        if body.result != "success" {
            return Err(ExchangeRateError::ProviderError(format!(
                "result={}",
                body.result
            )));
        }
        pick_rate(&body.rates, from, to)
    }

    fn name(&self) -> &str {
        OPEN_ER_API
    }
}

/// Frankfurter `GET /latest?from={FROM}&to={TO}`
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl FrankfurterProvider {
    pub fn new(timeout_secs: u64) -> ExchangeRateResult<Self> {
        Self::with_base_url("https://api.frankfurter.app", timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> ExchangeRateResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    async fn fetch_rate(&self, from: &str, to: &str) -> ExchangeRateResult<f64> {
        let url = format!("{}/latest?from={}&to={}", self.base_url, from, to);
        let body: FrankfurterResponse = get_json(&self.client, &url).await?;
        pick_rate(&body.rates, from, to)
    }

    fn name(&self) -> &str {
        FRANKFURTER
    }
}

/// Build providers in the configured order. Unknown names are skipped.
pub fn build_rate_providers(
    names: &[String],
    timeout_secs: u64,
) -> ExchangeRateResult<Vec<Arc<dyn RateProvider>>> {
    let mut providers: Vec<Arc<dyn RateProvider>> = Vec::new();
    for name in names {
        match name.trim().to_lowercase().as_str() {
            OPEN_ER_API => providers.push(Arc::new(OpenErApiProvider::new(timeout_secs)?)),
            FRANKFURTER => providers.push(Arc::new(FrankfurterProvider::new(timeout_secs)?)),
            other => warn!(provider = %other, "unknown rate provider, skipping"),
        }
    }
    Ok(providers)
}
