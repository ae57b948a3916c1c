use crate::api::extract::ApiJson;
use crate::api::AppState;
use crate::bookings::NewBooking;
use crate::error::{AppError, AppErrorKind, AppResult, ValidationError};
use crate::services::checkout::{DelayedCheckout, ImmediateCheckout};
use axum::{extract::State, http::StatusCode, Json};
use bigdecimal::ToPrimitive;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub booking: NewBooking,
    /// Amount to charge now; defaults to the booking's total price
    #[serde(default)]
    pub amount_local: Option<f64>,
}

impl CheckoutRequest {
    fn amount(&self) -> AppResult<f64> {
        match self.amount_local {
            Some(amount) => Ok(amount),
            None => self.booking.price_total.to_f64().ok_or_else(|| {
                AppError::new(AppErrorKind::Validation(ValidationError::InvalidAmount {
                    amount: self.booking.price_total.to_string(),
                    reason: "price total is not representable as an amount".to_string(),
                }))
            }),
        }
    }
}

/// POST /checkout/delayed
pub async fn checkout_delayed(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<DelayedCheckout>)> {
    let amount = request.amount()?;
    let result = state.checkout.checkout_delayed(request.booking, amount).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /checkout/immediate
pub async fn checkout_immediate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ImmediateCheckout>)> {
    let amount = request.amount()?;
    let result = state
        .checkout
        .checkout_immediate(request.booking, amount)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
