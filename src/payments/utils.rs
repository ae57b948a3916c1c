use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::GatewayName;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

pub enum HttpAuth<'a> {
    Bearer(&'a str),
    Basic {
        username: &'a str,
        password: &'a str,
    },
}

pub enum RequestBody<'a> {
    Empty,
    Json(&'a JsonValue),
    Form(&'a [(&'a str, String)]),
}

/// Thin JSON-over-HTTPS client shared by the gateway adapters.
///
/// Requests are sent once. A non-success status becomes `GatewayError` with
/// the response body kept verbatim.
#[derive(Clone)]
pub struct PaymentHttpClient {
    client: Client,
    gateway: GatewayName,
    timeout: Duration,
}

impl PaymentHttpClient {
    pub fn new(gateway: GatewayName, timeout: Duration) -> PaymentResult<Self> {
        let client =
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| PaymentError::NetworkError {
                    message: format!("failed to initialize HTTP client: {}", e),
                })?;

        Ok(Self {
            client,
            gateway,
            timeout,
        })
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: Url,
        auth: HttpAuth<'_>,
        body: RequestBody<'_>,
        additional_headers: &[(&str, &str)],
    ) -> PaymentResult<T> {
        let mut request = self.client.request(method.clone(), url.clone());
        request = request.timeout(self.timeout);

        request = match auth {
            HttpAuth::Bearer(token) => request.bearer_auth(token),
            HttpAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
        };
        for (k, v) in additional_headers {
            request = request.header(*k, *v);
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(payload) => request.json(payload),
            RequestBody::Form(fields) => request.form(fields),
        };

        let response = request.send().await.map_err(|e| PaymentError::NetworkError {
            message: if e.is_timeout() {
                format!(
                    "{} request timed out after {}s",
                    self.gateway,
                    self.timeout.as_secs()
                )
            } else {
                format!("{} request failed: {}", self.gateway, e)
            },
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError {
                message: format!("failed to read {} response: {}", self.gateway, e),
            })?;
        debug!(
            gateway = %self.gateway,
            method = %method,
            url = %url,
            status = status.as_u16(),
            "gateway response received"
        );

        if !status.is_success() {
            return Err(PaymentError::GatewayError {
                gateway: self.gateway.to_string(),
                status: Some(status.as_u16()),
                body: text,
                retryable: status.is_server_error() || status.as_u16() == 429,
            });
        }

        // 204 responses (e.g. void) carry no body
        let text = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };
        serde_json::from_str::<T>(text).map_err(|e| PaymentError::GatewayError {
            gateway: self.gateway.to_string(),
            status: Some(status.as_u16()),
            body: format!("invalid {} JSON response: {}", self.gateway, e),
            retryable: false,
        })
    }
}

/// Join path segments onto a gateway base URL. Each segment is
/// percent-encoded, so an id can never add path levels or a query.
pub fn gateway_url(base: &str, segments: &[&str]) -> PaymentResult<Url> {
    let invalid_base = |message: String| PaymentError::ValidationError {
        message,
        field: Some("base_url".to_string()),
    };
    let mut url = Url::parse(base)
        .map_err(|e| invalid_base(format!("invalid gateway base URL {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| invalid_base(format!("gateway base URL {} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn hmac_sha256_hex(payload: &[u8], secret: &str) -> Option<String> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
