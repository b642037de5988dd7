//! Integration tests for the payments HTTP surface.
//!
//! Builds the full router over in-memory adapters and drives it with
//! `tower::ServiceExt::oneshot`.

use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_payments::adapters::http::{api_router, AuthState, PaymentsAppState};
use storefront_payments::adapters::{
    InMemoryIntentStore, InMemoryOrderRepository, ManualClock, MockPaymentGateway,
    MockSessionValidator,
};
use storefront_payments::application::handlers::{IngestSettings, PrepareSettings};
use storefront_payments::domain::foundation::{ProductId, Timestamp};
use storefront_payments::domain::payment::signature::webhook_checksum;
use storefront_payments::domain::payment::Currency;
use storefront_payments::domain::webhook::{ReconciliationJob, WebhookError};
use storefront_payments::ports::ReconciliationQueue;

const NOW: i64 = 1_700_000_000;
const EVENTS_SECRET: &str = "test_events_secret";
const TOKEN: &str = "customer-token";

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct RecordingQueue {
    jobs: Mutex<Vec<ReconciliationJob>>,
}

impl ReconciliationQueue for RecordingQueue {
    fn submit(&self, job: ReconciliationJob) -> Result<(), WebhookError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    queue: Arc<RecordingQueue>,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(NOW).unwrap()));
    let queue = Arc::new(RecordingQueue::default());
    let state = PaymentsAppState {
        orders: Arc::new(InMemoryOrderRepository::new()),
        intents: Arc::new(InMemoryIntentStore::new(clock.clone())),
        gateway: Arc::new(MockPaymentGateway::new()),
        queue: queue.clone(),
        clock,
        checkout: PrepareSettings {
            public_key: "pub_test_abc".to_string(),
            integrity_secret: SecretString::new("test_integrity_secret".to_string()),
            currency: Currency::cop(),
            redirect_url: "https://shop.example.com/checkout/result".to_string(),
            tenant_prefix: "SP".to_string(),
            intent_ttl_secs: 900,
        },
        ingest: IngestSettings::new(
            SecretString::new(EVENTS_SECRET.to_string()),
            600,
            "SP",
            Vec::new(),
        ),
    };
    let auth: AuthState = Arc::new(MockSessionValidator::new().with_test_customer(TOKEN, "cust-1"));
    TestApp {
        router: api_router(state, auth),
        queue,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn cart() -> Value {
    json!({
        "items": [{
            "product_id": ProductId::new().to_string(),
            "title": "Linen shirt",
            "quantity": 1,
            "unit_price": 50000.0
        }]
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();

    let (status, body) = send(&app.router, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

// =============================================================================
// Checkout endpoints
// =============================================================================

#[tokio::test]
async fn prepare_requires_a_session() {
    let app = test_app();

    let (status, _) = send(&app.router, post_json("/payments/prepare", None, &cart())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn prepare_rejects_unknown_token() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json("/payments/prepare", Some("stolen"), &cart()),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn prepare_returns_signed_intent() {
    let app = test_app();

    let (status, body) = send(&app.router, post_json("/payments/prepare", Some(TOKEN), &cart())).await;

    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["amount_in_cents"], 5_000_000);
    assert_eq!(body["currency"], "COP");
    assert_eq!(body["public_key"], "pub_test_abc");
    assert_eq!(body["signature"].as_str().unwrap().len(), 64);
    assert!(body.get("integrity_secret").is_none());
}

#[tokio::test]
async fn prepare_rejects_empty_cart() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        post_json("/payments/prepare", Some(TOKEN), &json!({ "items": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn confirm_with_lowered_amount_is_rejected() {
    let app = test_app();
    let (_, body) = send(&app.router, post_json("/payments/prepare", Some(TOKEN), &cart())).await;
    let intent: Value = serde_json::from_slice(&body).unwrap();

    let (status, body) = send(
        &app.router,
        post_json(
            "/payments/confirm",
            Some(TOKEN),
            &json!({
                "reference": intent["reference"],
                "transaction_id": "tx-1",
                "amount_in_cents": 4_000_000,
                "currency": "COP",
                "integrity_signature": intent["signature"]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error_code"], "AMOUNT_MISMATCH");
    assert!(!body["message"].as_str().unwrap().contains("5000000"));
}

#[tokio::test]
async fn confirm_unknown_reference_is_not_found() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        post_json(
            "/payments/confirm",
            Some(TOKEN),
            &json!({
                "reference": "SP-NEVERPREPARED-0000",
                "transaction_id": "tx-1",
                "amount_in_cents": 100,
                "currency": "COP",
                "integrity_signature": "0".repeat(64)
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Webhook endpoint
// =============================================================================

fn signed_webhook(secret: &str) -> Value {
    let checksum = webhook_checksum(&["tx-1", "APPROVED", "5000000"], &NOW.to_string(), secret);
    json!({
        "event": "transaction.updated",
        "data": {
            "transaction": {
                "id": "tx-1",
                "reference": "SP-LX3K9Q2A-9F3A1C0B7E2D4F11",
                "amount_in_cents": 5000000,
                "currency": "COP",
                "status": "APPROVED"
            }
        },
        "signature": {
            "properties": ["transaction.id", "transaction.status", "transaction.amount_in_cents"],
            "checksum": checksum
        },
        "timestamp": NOW
    })
}

#[tokio::test]
async fn authentic_webhook_is_queued_without_a_session() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json("/payments/webhook", None, &signed_webhook(EVENTS_SECRET)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    assert_eq!(app.queue.jobs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn forged_webhook_still_gets_200() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json("/payments/webhook", None, &signed_webhook("wrong_secret")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ERROR_LOGGED");
    assert!(app.queue.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_webhook_still_gets_200() {
    let app = test_app();

    let request = Request::post("/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ERROR_LOGGED");
}

#[tokio::test]
async fn oversized_webhook_still_gets_200() {
    let app = test_app();

    let request = Request::post("/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(vec![b' '; 3 * 1024 * 1024]))
        .unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ERROR_LOGGED");
    assert!(app.queue.jobs.lock().unwrap().is_empty());
}
