//! In-process fakes and router helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use marketplace_backend::api::{self, AppState};
use marketplace_backend::bookings::{BookingService, InMemoryBookingRepository};
use marketplace_backend::health::HealthChecker;
use marketplace_backend::payments::error::{PaymentError, PaymentResult};
use marketplace_backend::payments::factory::PaymentGateways;
use marketplace_backend::payments::gateway::PaymentGateway;
use marketplace_backend::payments::types::{
    AuthorizationRef, CaptureResult, ChargeIntent, ChargeStatus, GatewayKind, GatewayName,
    OrderRef, PaymentRequest, PaymentStatus, WebhookEvent, WebhookVerificationResult,
};
use marketplace_backend::services::exchange_rate::{
    ExchangeRateError, ExchangeRateResult, RateProvider, RateResolver, RateResolverConfig,
};
use marketplace_backend::services::order_metadata::InMemoryOrderMetadataStore;
use marketplace_backend::services::payment_attempts::PaymentAttemptStore;
use marketplace_backend::services::payment_orchestrator::{
    OrchestratorConfig, PaymentOrchestrator,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub struct FixedRate(pub Option<f64>);

#[async_trait]
impl RateProvider for FixedRate {
    async fn fetch_rate(&self, _from: &str, _to: &str) -> ExchangeRateResult<f64> {
        self.0
            .ok_or_else(|| ExchangeRateError::ProviderError("HTTP 503".to_string()))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Delayed-capture gateway answering from memory
#[derive(Default)]
pub struct FakePaypal {
    pub reject_orders: AtomicBool,
    pub captures: AtomicUsize,
    pub voids: AtomicUsize,
    pub last_amount: Mutex<Option<String>>,
}

#[async_trait]
impl PaymentGateway for FakePaypal {
    fn name(&self) -> GatewayName {
        GatewayName::Paypal
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::DelayedCapture
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn create_authorization(&self, request: &PaymentRequest) -> PaymentResult<OrderRef> {
        if self.reject_orders.load(Ordering::SeqCst) {
            return Err(PaymentError::GatewayError {
                gateway: "paypal".to_string(),
                status: Some(422),
                body: "CURRENCY_NOT_SUPPORTED".to_string(),
                retryable: false,
            });
        }
        *self.last_amount.lock().unwrap() = Some(request.amount.to_major_units_string());
        let order_id = format!("ORDER-{}", Uuid::new_v4().simple());
        Ok(OrderRef {
            approval_url: Some(format!("https://www.sandbox.paypal.com/checkoutnow?token={order_id}")),
            order_id,
            status: "CREATED".to_string(),
        })
    }

    async fn authorize_order(&self, order_id: &str) -> PaymentResult<AuthorizationRef> {
        Ok(AuthorizationRef {
            order_id: order_id.to_string(),
            authorization_id: format!("AUTH-{order_id}"),
            status: "CREATED".to_string(),
        })
    }

    async fn capture(&self, authorization_id: &str) -> PaymentResult<CaptureResult> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureResult {
            capture_id: format!("CAP-{authorization_id}"),
            status: PaymentStatus::Captured,
        })
    }

    async fn void(&self, _authorization_id: &str) -> PaymentResult<PaymentStatus> {
        self.voids.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentStatus::Voided)
    }
}

/// Immediate-capture gateway whose charges all report `status`
pub struct FakeStripe {
    pub status: Mutex<ChargeStatus>,
    pub reject_charges: AtomicBool,
}

impl Default for FakeStripe {
    fn default() -> Self {
        Self {
            status: Mutex::new(ChargeStatus::RequiresPaymentMethod),
            reject_charges: AtomicBool::new(false),
        }
    }
}

pub const VALID_SIGNATURE: &str = "t=1700000000,v1=valid";

#[async_trait]
impl PaymentGateway for FakeStripe {
    fn name(&self) -> GatewayName {
        GatewayName::Stripe
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::ImmediateCapture
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn create_immediate_charge(&self, _request: &PaymentRequest) -> PaymentResult<ChargeIntent> {
        if self.reject_charges.load(Ordering::SeqCst) {
            return Err(PaymentError::GatewayError {
                gateway: "stripe".to_string(),
                status: Some(402),
                body: "Your card was declined.".to_string(),
                retryable: false,
            });
        }
        let charge_id = format!("pi_{}", Uuid::new_v4().simple());
        Ok(ChargeIntent {
            client_secret: Some(format!("{charge_id}_secret_test")),
            charge_id,
            status: ChargeStatus::RequiresPaymentMethod,
        })
    }

    async fn retrieve_charge(&self, charge_id: &str) -> PaymentResult<ChargeIntent> {
        Ok(ChargeIntent {
            charge_id: charge_id.to_string(),
            client_secret: None,
            status: *self.status.lock().unwrap(),
        })
    }

    fn verify_webhook(&self, _payload: &[u8], signature: &str) -> PaymentResult<WebhookVerificationResult> {
        let valid = signature == VALID_SIGNATURE;
        Ok(WebhookVerificationResult {
            valid,
            reason: (!valid).then(|| "No signatures found matching the expected signature".to_string()),
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let value: Value = serde_json::from_slice(payload).map_err(|e| PaymentError::ValidationError {
            message: e.to_string(),
            field: None,
        })?;
        Ok(WebhookEvent {
            gateway: GatewayName::Stripe,
            event_id: value["id"].as_str().map(str::to_string),
            event_type: value["type"].as_str().unwrap_or_default().to_string(),
            charge_id: value["data"]["object"]["id"].as_str().map(str::to_string),
            status: value["data"]["object"]["status"].as_str().map(ChargeStatus::from_gateway),
            payload: value,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub paypal: Arc<FakePaypal>,
    pub stripe: Arc<FakeStripe>,
    pub bookings: Arc<BookingService>,
    pub repository: InMemoryBookingRepository,
}

pub fn test_app_with_rate(rate: Option<f64>) -> TestApp {
    let paypal = Arc::new(FakePaypal::default());
    let stripe = Arc::new(FakeStripe::default());
    test_app_with_gateways(
        paypal.clone(),
        stripe.clone(),
        rate,
        move |router, bookings, repository| TestApp {
            router,
            paypal,
            stripe,
            bookings,
            repository,
        },
    )
}

pub fn test_app() -> TestApp {
    test_app_with_rate(Some(0.27))
}

/// Router over arbitrary gateways, e.g. real adapters without credentials
pub fn test_router(delayed: Arc<dyn PaymentGateway>, immediate: Arc<dyn PaymentGateway>) -> Router {
    test_app_with_gateways(delayed, immediate, Some(0.27), |router, _, _| router)
}

fn test_app_with_gateways<T>(
    delayed: Arc<dyn PaymentGateway>,
    immediate: Arc<dyn PaymentGateway>,
    rate: Option<f64>,
    finish: impl FnOnce(Router, Arc<BookingService>, InMemoryBookingRepository) -> T,
) -> T {
    let gateways = PaymentGateways::new(delayed, immediate);
    let rates = RateResolver::new(RateResolverConfig::default()).add_provider(Arc::new(FixedRate(rate)));
    let metadata = Arc::new(InMemoryOrderMetadataStore::default());
    let orchestrator = Arc::new(PaymentOrchestrator::new(
        gateways.clone(),
        Arc::new(rates),
        metadata.clone(),
        Arc::new(PaymentAttemptStore::new()),
        OrchestratorConfig::default(),
    ));
    let repository = InMemoryBookingRepository::new();
    let bookings = Arc::new(BookingService::new(Arc::new(repository.clone())));
    let health = HealthChecker::new(metadata, gateways);
    let router = api::router(AppState::new(bookings.clone(), orchestrator, health));
    finish(router, bookings, repository)
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub fn booking_body() -> Value {
    let start = chrono::Utc::now() + chrono::Duration::days(2);
    serde_json::json!({
        "clientId": "client_42",
        "providerId": "provider_7",
        "serviceId": "svc_deep_clean",
        "schedule": {
            "start": start.to_rfc3339(),
            "end": (start + chrono::Duration::hours(3)).to_rfc3339(),
        },
        "priceTotal": 350,
        "location": "Business Bay, Tower B"
    })
}

pub async fn create_booking(router: &Router) -> String {
    let (status, body) = post_json(router, "/bookings", booking_body()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["bookingId"].as_str().unwrap().to_string()
}
