//! Request id generation and per-request logging

use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderValue;
use std::time::Instant;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Issues a UUID v4 `x-request-id` for requests that arrive without one
#[derive(Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Logs method, path, status and latency inside a span carrying the request id
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let span = tracing::info_span!("http_request", request_id = %request_id, method = %method, path = %path);
    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| {
        if response.status().is_server_error() {
            warn!(status, latency_ms, "request failed");
        } else {
            info!(status, latency_ms, "request completed");
        }
    });
    response
}
