use crate::api::extract::{parse_booking_id, ApiJson};
use crate::api::AppState;
use crate::bookings::{ActorRole, Booking, BookingAction, BookingStatus, NewBooking};
use crate::error::AppResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub actor_role: ActorRole,
    pub action: BookingAction,
}

/// POST /bookings
pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewBooking>,
) -> AppResult<(StatusCode, Json<BookingStatusResponse>)> {
    let booking = state.bookings.create_booking(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingStatusResponse {
            booking_id: booking.id,
            status: booking.status,
        }),
    ))
}

/// GET /bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking_id = parse_booking_id(&id)?;
    Ok(Json(state.bookings.get_booking(booking_id).await?))
}

/// POST /bookings/{id}/status
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusUpdateRequest>,
) -> AppResult<Json<BookingStatusResponse>> {
    let booking_id = parse_booking_id(&id)?;
    let status = state
        .bookings
        .update_booking_status(booking_id, request.actor_role, request.action)
        .await?;
    Ok(Json(BookingStatusResponse { booking_id, status }))
}
