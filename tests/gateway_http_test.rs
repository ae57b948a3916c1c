//! Real gateway adapters against a local HTTP stub of the gateway APIs.

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use marketplace_backend::payments::providers::{PaypalConfig, PaypalGateway, StripeConfig, StripeGateway};
use marketplace_backend::payments::types::{ChargeStatus, PaymentStatus};
use marketplace_backend::payments::{PaymentError, PaymentGateway};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const DECLINED_BODY: &str = r#"{"name":"UNPROCESSABLE_ENTITY","details":[{"issue":"INSTRUMENT_DECLINED"}]}"#;

struct GatewayStub {
    /// `"METHOD path?query"` exactly as received, still percent-encoded
    requests: Mutex<Vec<String>>,
    bearer_tokens: Mutex<Vec<String>>,
    token_failures: AtomicUsize,
    tokens_issued: AtomicUsize,
    expires_in: u64,
}

impl GatewayStub {
    fn new(expires_in: u64, token_failures: usize) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            bearer_tokens: Mutex::new(Vec::new()),
            token_failures: AtomicUsize::new(token_failures),
            tokens_issued: AtomicUsize::new(0),
            expires_in,
        })
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn token_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.as_str() == "POST /v1/oauth2/token")
            .count()
    }
}

async fn gateway_stub(
    State(stub): State<Arc<GatewayStub>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    stub.requests.lock().unwrap().push(format!("{method} {uri}"));
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            stub.bearer_tokens.lock().unwrap().push(token.to_string());
        }
    }

    let path = uri.path();
    match (method, path) {
        (Method::POST, "/v1/oauth2/token") => {
            let failing = stub
                .token_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return (StatusCode::SERVICE_UNAVAILABLE, "token service unavailable").into_response();
            }
            let n = stub.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
            Json(json!({
                "access_token": format!("TOKEN-{n}"),
                "token_type": "Bearer",
                "expires_in": stub.expires_in,
            }))
            .into_response()
        }
        (Method::POST, p) if p.starts_with("/v2/payments/authorizations/") && p.ends_with("/capture") => {
            if p.contains("AUTH-DECLINED") {
                return (StatusCode::UNPROCESSABLE_ENTITY, DECLINED_BODY).into_response();
            }
            (
                StatusCode::CREATED,
                Json(json!({ "id": "CAP-1", "status": "COMPLETED" })),
            )
                .into_response()
        }
        (Method::POST, p) if p.starts_with("/v2/payments/authorizations/") && p.ends_with("/void") => {
            StatusCode::NO_CONTENT.into_response()
        }
        (Method::GET, p) if p.starts_with("/v1/payment_intents/") => Json(json!({
            "id": "pi_1",
            "client_secret": "pi_1_secret_x",
            "status": "succeeded",
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "no such route").into_response(),
    }
}

async fn serve(stub: Arc<GatewayStub>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().fallback(gateway_stub).with_state(stub);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn paypal_against(stub: Arc<GatewayStub>) -> PaypalGateway {
    let base_url = serve(stub).await;
    PaypalGateway::new(PaypalConfig {
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        ..PaypalConfig::default()
    })
    .unwrap()
}

async fn stripe_against(stub: Arc<GatewayStub>) -> StripeGateway {
    let base_url = serve(stub).await;
    StripeGateway::new(StripeConfig {
        secret_key: Some("sk_test_1".to_string()),
        base_url,
        timeout_secs: 5,
        ..StripeConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn failed_token_request_is_retried_once() {
    let stub = GatewayStub::new(3600, 1);
    let paypal = paypal_against(stub.clone()).await;

    let capture = paypal.capture("AUTH-1").await.unwrap();
    assert_eq!(capture.capture_id, "CAP-1");
    assert_eq!(capture.status, PaymentStatus::Captured);
    assert_eq!(stub.token_requests(), 2);
    assert_eq!(*stub.bearer_tokens.lock().unwrap(), vec!["TOKEN-1".to_string()]);
}

#[tokio::test]
async fn token_failing_twice_surfaces_the_gateway_error() {
    let stub = GatewayStub::new(3600, 2);
    let paypal = paypal_against(stub.clone()).await;

    let err = paypal.capture("AUTH-1").await.unwrap_err();
    match err {
        PaymentError::GatewayError { status, body, retryable, .. } => {
            assert_eq!(status, Some(503));
            assert_eq!(body, "token service unavailable");
            assert!(retryable);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stub.token_requests(), 2);
    assert!(!stub.requests().iter().any(|r| r.ends_with("/capture")));
}

#[tokio::test]
async fn cached_token_is_reused_until_expiry() {
    let stub = GatewayStub::new(3600, 0);
    let paypal = paypal_against(stub.clone()).await;

    paypal.capture("AUTH-1").await.unwrap();
    paypal.capture("AUTH-2").await.unwrap();
    assert_eq!(stub.token_requests(), 1);
    assert_eq!(
        *stub.bearer_tokens.lock().unwrap(),
        vec!["TOKEN-1".to_string(), "TOKEN-1".to_string()]
    );
}

#[tokio::test]
async fn token_inside_the_expiry_margin_is_refetched() {
    // 30s is below the 60s safety margin, so the token is stale on arrival
    let stub = GatewayStub::new(30, 0);
    let paypal = paypal_against(stub.clone()).await;

    paypal.capture("AUTH-1").await.unwrap();
    paypal.capture("AUTH-2").await.unwrap();
    assert_eq!(stub.token_requests(), 2);
    assert_eq!(
        *stub.bearer_tokens.lock().unwrap(),
        vec!["TOKEN-1".to_string(), "TOKEN-2".to_string()]
    );
}

#[tokio::test]
async fn declined_capture_keeps_status_and_body_verbatim() {
    let stub = GatewayStub::new(3600, 0);
    let paypal = paypal_against(stub).await;

    let err = paypal.capture("AUTH-DECLINED").await.unwrap_err();
    match err {
        PaymentError::GatewayError { gateway, status, body, retryable } => {
            assert_eq!(gateway, "paypal");
            assert_eq!(status, Some(422));
            assert_eq!(body, DECLINED_BODY);
            assert!(!retryable);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn void_accepts_an_empty_response() {
    let stub = GatewayStub::new(3600, 0);
    let paypal = paypal_against(stub.clone()).await;

    assert_eq!(paypal.void("AUTH-1").await.unwrap(), PaymentStatus::Voided);
    assert!(stub
        .requests()
        .contains(&"POST /v2/payments/authorizations/AUTH-1/void".to_string()));
}

#[tokio::test]
async fn paypal_ids_stay_inside_one_path_segment() {
    let stub = GatewayStub::new(3600, 0);
    let paypal = paypal_against(stub.clone()).await;

    paypal
        .capture("X/../../captures/CAP-OTHER/refund?note=1")
        .await
        .unwrap();

    let capture = stub
        .requests()
        .into_iter()
        .find(|r| r.ends_with("/capture"))
        .unwrap();
    let uri: Uri = capture.trim_start_matches("POST ").parse().unwrap();
    assert!(uri.path().starts_with("/v2/payments/authorizations/X%2F"), "{uri}");
    assert_eq!(uri.query(), None);
    assert_eq!(uri.path().split('/').filter(|s| !s.is_empty()).count(), 5);
    assert!(!stub.requests().iter().any(|r| r.contains("/refund")));
}

#[tokio::test]
async fn stripe_retrieve_keeps_the_charge_id_in_one_segment() {
    let stub = GatewayStub::new(3600, 0);
    let stripe = stripe_against(stub.clone()).await;

    let charge = stripe
        .retrieve_charge("pi_1/../../customers?limit=100")
        .await
        .unwrap();
    assert_eq!(charge.status, ChargeStatus::Succeeded);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let uri: Uri = requests[0].trim_start_matches("GET ").parse().unwrap();
    assert!(uri.path().starts_with("/v1/payment_intents/pi_1%2F"), "{uri}");
    assert_eq!(uri.query(), None);
    assert_eq!(uri.path().split('/').filter(|s| !s.is_empty()).count(), 3);
}
