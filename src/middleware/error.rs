//! Error response formatting middleware
//!
//! Every failed request answers with the same JSON body:
//! `{ "error", "code", "requestId", "timestamp", "retryable" }`.

use crate::error::{AppError, ErrorCode};
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Standardized error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message (raw gateway text for gateway failures)
    pub error: String,

    /// Machine-readable error code
    pub code: ErrorCode,

    /// Request ID for debugging and support
    pub request_id: Option<String>,

    /// ISO 8601 timestamp of the error
    pub timestamp: String,

    /// Whether the client should retry the request
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            error: error.user_message(),
            code: error.error_code(),
            request_id: error.request_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            retryable: error.is_retryable(),
        }
    }
}

/// Renders the JSON body and keeps the error in the response extensions so
/// [`error_response_middleware`] can stamp the request id on it.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(
                error = ?self,
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::warn!(
                error = ?self,
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Client error occurred"
            );
        }

        let body = ErrorResponse::from_app_error(&self);
        let mut response = (status_code, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Re-render error responses that left their handler without a request id
pub async fn error_response_middleware(request: Request, next: axum::middleware::Next) -> Response {
    let request_id = get_request_id_from_headers(request.headers());
    let mut response = next.run(request).await;

    let Some(request_id) = request_id else {
        return response;
    };
    match response.extensions_mut().remove::<AppError>() {
        Some(error) if error.request_id.is_none() => render_with_request_id(error, request_id),
        Some(error) => {
            response.extensions_mut().insert(error);
            response
        }
        None => response,
    }
}

fn render_with_request_id(error: AppError, request_id: String) -> Response {
    let status_code =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let error = error.with_request_id(request_id);
    let body = ErrorResponse::from_app_error(&error);
    let mut response = (status_code, Json(body)).into_response();
    response.extensions_mut().insert(error);
    response
}

/// Helper to extract request ID from request headers
pub fn get_request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
