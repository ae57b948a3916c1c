//! Extractors whose rejections render as [`AppError`] bodies

use crate::error::{AppError, AppErrorKind, ValidationError};
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// `Json<T>` with malformed bodies answered as `400 INVALID_INPUT`
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::new(AppErrorKind::Validation(ValidationError::MalformedBody {
        reason: rejection.body_text(),
    }))
}

/// Parse a path segment as a booking id
pub fn parse_booking_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        AppError::new(AppErrorKind::Validation(ValidationError::InvalidField {
            field: "bookingId".to_string(),
            reason: format!("'{}' is not a valid booking id", raw),
        }))
    })
}
