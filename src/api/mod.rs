//! HTTP surface

pub mod bookings;
pub mod checkout;
pub mod extract;
pub mod payments;
pub mod webhooks;

use crate::bookings::BookingService;
use crate::health::{HealthChecker, HealthState, HealthStatus};
use crate::middleware::error::error_response_middleware;
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::services::checkout::CheckoutService;
use crate::services::payment_orchestrator::PaymentOrchestrator;
use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub checkout: Arc<CheckoutService>,
    pub health: HealthChecker,
}

impl AppState {
    pub fn new(
        bookings: Arc<BookingService>,
        orchestrator: Arc<PaymentOrchestrator>,
        health: HealthChecker,
    ) -> Self {
        let checkout = Arc::new(CheckoutService::new(bookings.clone(), orchestrator.clone()));
        Self {
            bookings,
            orchestrator,
            checkout,
            health,
        }
    }
}

/// All routes plus the request-id, logging and error-body layers
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(liveness))
        .route("/payments/delayed/create-order", post(payments::create_order))
        .route("/payments/delayed/order-meta", post(payments::order_meta))
        .route("/payments/delayed/authorize", post(payments::authorize))
        .route("/payments/delayed/capture", post(payments::capture))
        .route("/payments/delayed/void", post(payments::void))
        .route(
            "/payments/immediate/create-charge",
            post(payments::create_charge),
        )
        .route("/payments/immediate/confirm", post(payments::confirm_charge))
        .route("/webhooks/immediate", post(webhooks::handle_immediate_webhook))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/{id}", get(bookings::get_booking))
        .route("/bookings/{id}/status", post(bookings::update_booking_status))
        .route("/checkout/delayed", post(checkout::checkout_delayed))
        .route("/checkout/immediate", post(checkout::checkout_immediate))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(axum::middleware::from_fn(error_response_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// CORS for the configured origins; `*` allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("x-request-id"),
        ])
}

async fn health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, (StatusCode, Json<HealthStatus>)> {
    let health_status = state.health.check_health().await;

    // Return 503 if any component is unhealthy
    if health_status.status == HealthState::Unhealthy {
        error!("❌ Health check failed - service unhealthy");
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(health_status)))
    } else {
        Ok(Json(health_status))
    }
}

/// Liveness probe - checks if the service is alive (basic check)
async fn liveness() -> &'static str {
    "OK"
}
