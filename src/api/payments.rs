//! Payment endpoints
//!
//! `/payments/delayed/*` drive the delayed-capture gateway,
//! `/payments/immediate/*` the immediate-capture one.

use crate::api::extract::ApiJson;
use crate::api::AppState;
use crate::bookings::Booking;
use crate::error::AppResult;
use crate::payments::types::PaymentStatus;
use crate::services::order_metadata::OrderMetadataEntry;
use crate::services::payment_orchestrator::{
    Authorization, Capture, ChargeConfirmation, CreatedCharge, CreatedOrder,
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub amount_local: f64,
    #[serde(default)]
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub authorization_id: String,
    /// Links a client-side authorization to the order this service created
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub charge_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidResponse {
    pub status: PaymentStatus,
}

async fn linked_booking(state: &AppState, booking_id: Option<Uuid>) -> AppResult<Option<Booking>> {
    match booking_id {
        Some(id) => Ok(Some(state.bookings.get_booking(id).await?)),
        None => Ok(None),
    }
}

/// POST /payments/delayed/create-order
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AmountRequest>,
) -> AppResult<Json<CreatedOrder>> {
    let booking = linked_booking(&state, request.booking_id).await?;
    let order = state
        .orchestrator
        .quote_and_create(request.amount_local, booking.as_ref())
        .await?;
    Ok(Json(order))
}

/// POST /payments/delayed/order-meta
pub async fn order_meta(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> AppResult<Json<OrderMetadataEntry>> {
    Ok(Json(state.orchestrator.lookup_meta(&request.order_id).await?))
}

/// POST /payments/delayed/authorize
pub async fn authorize(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> AppResult<Json<Authorization>> {
    Ok(Json(state.orchestrator.authorize(&request.order_id).await?))
}

/// POST /payments/delayed/capture
pub async fn capture(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AuthorizationRequest>,
) -> AppResult<Json<Capture>> {
    let capture = state
        .orchestrator
        .finalize_capture(&request.authorization_id, request.order_id.as_deref())
        .await?;
    info!(capture_id = %capture.capture_id, "capture completed");
    Ok(Json(capture))
}

/// POST /payments/delayed/void
pub async fn void(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AuthorizationRequest>,
) -> AppResult<Json<VoidResponse>> {
    let status = state
        .orchestrator
        .finalize_void(&request.authorization_id, request.order_id.as_deref())
        .await?;
    Ok(Json(VoidResponse { status }))
}

/// POST /payments/immediate/create-charge
pub async fn create_charge(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AmountRequest>,
) -> AppResult<Json<CreatedCharge>> {
    let booking = linked_booking(&state, request.booking_id).await?;
    let charge = state
        .orchestrator
        .charge_immediate(request.amount_local, booking.as_ref())
        .await?;
    Ok(Json(charge))
}

/// POST /payments/immediate/confirm
pub async fn confirm_charge(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChargeRequest>,
) -> AppResult<Json<ChargeConfirmation>> {
    Ok(Json(
        state.orchestrator.confirm_immediate(&request.charge_id).await?,
    ))
}
