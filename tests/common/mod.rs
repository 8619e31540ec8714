//! Test utilities and fixtures for Janhit integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

pub use janhit::config::Pricing;
pub use janhit::db::{create_memory_pool, init_db, queries, AppState, DbPool};
pub use janhit::email::{EmailMessage, NotificationChannel, SendOutcome};
pub use janhit::error::AppError;
pub use janhit::gateway::{
    CreateOrderRequest, GatewayOrder, OrderGateway, OrderNotes, SignatureVerifier,
};
pub use janhit::models::*;

pub const CHECKOUT_SECRET: &str = "test-checkout-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

// ============ Collaborator doubles ============

/// Notification channel that records every message instead of sending.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingChannel {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<EmailMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, message: &EmailMessage) -> janhit::error::Result<SendOutcome> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(SendOutcome::Sent)
    }
}

/// Notification channel that always fails delivery.
pub struct FailingChannel;

#[async_trait]
impl NotificationChannel for FailingChannel {
    async fn send(&self, _message: &EmailMessage) -> janhit::error::Result<SendOutcome> {
        Err(AppError::Internal("email service down".into()))
    }
}

/// Gateway double handing out sequential order ids without network.
#[derive(Default)]
pub struct StaticGateway {
    counter: AtomicU64,
}

#[async_trait]
impl OrderGateway for StaticGateway {
    async fn create_order(
        &self,
        _request: &CreateOrderRequest,
    ) -> janhit::error::Result<GatewayOrder> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            id: format!("order_test{:04}", n),
        })
    }
}

/// Gateway double that is always down.
pub struct DownGateway;

#[async_trait]
impl OrderGateway for DownGateway {
    async fn create_order(
        &self,
        _request: &CreateOrderRequest,
    ) -> janhit::error::Result<GatewayOrder> {
        Err(AppError::GatewayUnavailable("connection refused".into()))
    }
}

// ============ App state ============

pub struct TestHarness {
    pub state: AppState,
    pub notifier: Arc<RecordingChannel>,
}

pub fn test_state() -> TestHarness {
    test_state_with_gateway(Arc::new(StaticGateway::default()))
}

pub fn test_state_with_gateway(gateway: Arc<dyn OrderGateway>) -> TestHarness {
    let db = create_memory_pool().expect("Failed to create in-memory pool");
    {
        let conn = db.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize schema");
    }

    let notifier = Arc::new(RecordingChannel::default());
    let state = AppState {
        db,
        gateway,
        verifier: SignatureVerifier::new(CHECKOUT_SECRET, WEBHOOK_SECRET),
        notifier: notifier.clone(),
        base_url: "http://localhost:3000".to_string(),
        gateway_key_id: "key_test".to_string(),
        department_email: Some("grievances@example.gov.in".to_string()),
        pricing: Pricing {
            complaint_filing: 4900,
            rti_drafting: 1100,
            developer_api_pro: 49900,
        },
    };

    TestHarness { state, notifier }
}

/// Swap the recording notifier for a failing one.
pub fn with_failing_notifier(harness: &TestHarness) -> AppState {
    let mut state = harness.state.clone();
    state.notifier = Arc::new(FailingChannel);
    state
}

pub fn app(state: AppState) -> Router {
    janhit::handlers::router().with_state(state)
}

// ============ Fixtures ============

/// Create a test user with an active session, returning the bearer token.
pub fn create_test_user(
    conn: &rusqlite::Connection,
    email: &str,
) -> (User, String) {
    let user = queries::create_user(conn, email, "Test Citizen").expect("Failed to create user");
    let token = queries::create_session(conn, &user.id, 3600).expect("Failed to create session");
    (user, token)
}

/// Insert a pending payment intent directly, simulating a completed
/// checkout with the given gateway order id.
pub fn create_pending_intent(
    conn: &rusqlite::Connection,
    user_id: &str,
    task_type: TaskType,
    order_id: &str,
    amount: i64,
) -> PaymentIntent {
    queries::create_payment_intent(
        conn,
        &queries::CreatePaymentIntent {
            user_id,
            order_id,
            payment_type: PaymentType::Task,
            task_type: &task_type,
            amount,
        },
    )
    .expect("Failed to create payment intent")
}

pub fn create_test_complaint(conn: &rusqlite::Connection, user_id: &str) -> Complaint {
    queries::create_complaint(
        conn,
        user_id,
        &CreateComplaint {
            description: "Open drain near the bus stand has not been covered.".to_string(),
            location: "Station Road, Ward 4".to_string(),
        },
    )
    .expect("Failed to create complaint")
}

pub fn create_test_rti(conn: &rusqlite::Connection, user_id: &str, body_text: &str) -> RtiRequest {
    queries::create_rti_request(
        conn,
        user_id,
        &CreateRtiRequest {
            subject: "Ward development fund utilization".to_string(),
            department: "Municipal Corporation".to_string(),
            body_text: body_text.to_string(),
        },
    )
    .expect("Failed to create RTI request")
}

pub const RTI_BODY: &str = "To the Public Information Officer,\n\nKindly provide certified copies \
of all work orders issued under the ward development fund for the financial year 2024-25, along \
with the corresponding completion certificates.";

// ============ Signatures ============

type HmacSha256 = Hmac<Sha256>;

fn hmac_hex(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Signature the checkout widget would hand back to the browser.
pub fn sign_checkout(order_id: &str, payment_id: &str) -> String {
    hmac_hex(
        CHECKOUT_SECRET.as_bytes(),
        format!("{}|{}", order_id, payment_id).as_bytes(),
    )
}

/// Signature the gateway would put in the X-Signature header.
pub fn sign_webhook(body: &[u8]) -> String {
    hmac_hex(WEBHOOK_SECRET.as_bytes(), body)
}

// ============ Request helpers ============

pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    app.oneshot(
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Deliver a webhook body with its correct signature (or an override).
pub async fn post_webhook(
    app: Router,
    body: &[u8],
    signature: Option<&str>,
) -> Response<Body> {
    let sig = signature
        .map(|s| s.to_string())
        .unwrap_or_else(|| sign_webhook(body));

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/payments/webhook")
            .header("Content-Type", "application/json")
            .header("X-Signature", sig)
            .body(Body::from(body.to_vec()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

pub async fn response_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&response_bytes(response).await).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

/// Standard webhook body for a captured payment.
pub fn payment_captured_body(
    payment_id: &str,
    order_id: &str,
    artifact_id: Option<&str>,
) -> Vec<u8> {
    let mut notes = serde_json::Map::new();
    if let Some(artifact_id) = artifact_id {
        notes.insert("artifact_id".into(), artifact_id.into());
    }
    serde_json::to_vec(&serde_json::json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "notes": notes,
                }
            }
        }
    }))
    .unwrap()
}

/// Standard webhook body for a paid order (no payment id).
pub fn order_paid_body(order_id: &str, artifact_id: Option<&str>) -> Vec<u8> {
    let mut notes = serde_json::Map::new();
    if let Some(artifact_id) = artifact_id {
        notes.insert("artifact_id".into(), artifact_id.into());
    }
    serde_json::to_vec(&serde_json::json!({
        "event": "order.paid",
        "payload": {
            "order": {
                "entity": {
                    "id": order_id,
                    "notes": notes,
                }
            }
        }
    }))
    .unwrap()
}
