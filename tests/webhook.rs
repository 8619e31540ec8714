//! Tests for POST /payments/webhook — the asynchronous gateway
//! confirmation path.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use tower::ServiceExt;

#[tokio::test]
async fn test_missing_signature_header_rejected() {
    let harness = test_state();
    let body = order_paid_body("order_1", None);

    let response = app(harness.state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments/webhook")
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_signature_changes_nothing() {
    let harness = test_state();
    {
        let conn = harness.state.db.get().unwrap();
        let (user, _) = create_test_user(&conn, "a@example.com");
        create_pending_intent(&conn, &user.id, TaskType::RtiDrafting, "order_1", 1100);
    }

    let body = order_paid_body("order_1", None);
    let response = post_webhook(app(harness.state.clone()), &body, Some("0".repeat(64).as_str())).await;
    assert_status(&response, StatusCode::BAD_REQUEST);

    let conn = harness.state.db.get().unwrap();
    let intent = queries::get_payment_intent_by_order(&conn, "order_1")
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, IntentStatus::Pending);
    assert_eq!(harness.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_signature_over_tampered_body_rejected() {
    let harness = test_state();
    let body = order_paid_body("order_1", None);
    let signature = sign_webhook(&body);

    let tampered = order_paid_body("order_2", None);
    let response = post_webhook(app(harness.state.clone()), &tampered, Some(&signature)).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unrecognized_event_acknowledged() {
    let harness = test_state();
    let body = serde_json::to_vec(&serde_json::json!({
        "event": "payment.failed",
        "payload": {}
    }))
    .unwrap();

    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(response_json(response).await["received"], true);
    assert_eq!(harness.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_unknown_order_acknowledged_without_state_change() {
    // The webhook may race ahead of the local order-creation commit;
    // acknowledging stops gateway retries and the client path covers it.
    let harness = test_state();
    let body = payment_captured_body("pay_x", "order_unknown", None);

    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(response_json(response).await["received"], true);
    assert_eq!(harness.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_with_valid_signature_rejected() {
    let harness = test_state();
    let body = b"{not json".to_vec();

    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_paid_alone_fulfills_rti() {
    // No client verify ever arrives; the webhook alone must leave the
    // RTI paid with exactly one attachment email sent.
    let harness = test_state();
    let rti_id;
    {
        let conn = harness.state.db.get().unwrap();
        let (user, _) = create_test_user(&conn, "citizen@example.com");
        let rti = create_test_rti(&conn, &user.id, RTI_BODY);
        rti_id = rti.id.clone();
        create_pending_intent(&conn, &user.id, TaskType::RtiDrafting, "order_rti", 1100);
        queries::set_rti_order(&conn, &rti.id, "order_rti").unwrap();
    }

    let body = order_paid_body("order_rti", None);
    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::OK);

    {
        let conn = harness.state.db.get().unwrap();
        let intent = queries::get_payment_intent_by_order(&conn, "order_rti")
            .unwrap()
            .unwrap();
        assert_eq!(intent.status, IntentStatus::Succeeded);

        let rti = queries::get_rti_by_id(&conn, &rti_id).unwrap().unwrap();
        assert_eq!(rti.status, RtiStatus::Paid);
        assert!(rti.paid_at.is_some());
        assert_eq!(
            rti.document_path.as_deref(),
            Some(format!("/rti/{}/document", rti_id).as_str())
        );
    }

    assert_eq!(harness.notifier.sent_count(), 1);
    let email = harness.notifier.last().unwrap();
    assert_eq!(email.to, "citizen@example.com");
    assert_eq!(email.attachments.len(), 1);
    assert_eq!(
        email.attachments[0].filename,
        format!("rti-request-{}.pdf", rti_id)
    );
    assert!(email.attachments[0].content.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn test_explicit_artifact_id_beats_recency_heuristic() {
    // Two drafts created after the intent: the metadata id must pick the
    // older one even though the heuristic would pick the newer.
    let harness = test_state();
    let (first_id, second_id);
    {
        let conn = harness.state.db.get().unwrap();
        let (user, _) = create_test_user(&conn, "citizen@example.com");
        create_pending_intent(&conn, &user.id, TaskType::RtiDrafting, "order_two", 1100);
        let first = create_test_rti(&conn, &user.id, RTI_BODY);
        let second = create_test_rti(&conn, &user.id, RTI_BODY);
        first_id = first.id.clone();
        second_id = second.id.clone();
    }

    let body = payment_captured_body("pay_t", "order_two", Some(&first_id));
    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::OK);

    let conn = harness.state.db.get().unwrap();
    let first = queries::get_rti_by_id(&conn, &first_id).unwrap().unwrap();
    let second = queries::get_rti_by_id(&conn, &second_id).unwrap().unwrap();
    assert_eq!(first.status, RtiStatus::Paid);
    assert_eq!(second.status, RtiStatus::Draft);
}

#[tokio::test]
async fn test_duplicate_deliveries_fulfill_once() {
    let harness = test_state();
    {
        let conn = harness.state.db.get().unwrap();
        let (user, _) = create_test_user(&conn, "citizen@example.com");
        let rti = create_test_rti(&conn, &user.id, RTI_BODY);
        create_pending_intent(&conn, &user.id, TaskType::RtiDrafting, "order_dup", 1100);
        queries::set_rti_order(&conn, &rti.id, "order_dup").unwrap();
    }

    // The gateway retries and may also deliver both event types.
    let captured = payment_captured_body("pay_d", "order_dup", None);
    let paid = order_paid_body("order_dup", None);

    for body in [&paid, &captured, &paid, &captured, &captured] {
        let response = post_webhook(app(harness.state.clone()), body, None).await;
        assert_status(&response, StatusCode::OK);
        assert_eq!(response_json(response).await["received"], true);
    }

    assert_eq!(harness.notifier.sent_count(), 1);

    // order.paid won without a payment id; payment.captured backfilled it.
    let conn = harness.state.db.get().unwrap();
    let intent = queries::get_payment_intent_by_order(&conn, "order_dup")
        .unwrap()
        .unwrap();
    assert_eq!(intent.payment_id.as_deref(), Some("pay_d"));
}

#[tokio::test]
async fn test_lookup_falls_back_to_payment_id() {
    // payment.captured without an order id in the payload still resolves
    // via the backfilled payment id.
    let harness = test_state();
    {
        let conn = harness.state.db.get().unwrap();
        let (user, _) = create_test_user(&conn, "citizen@example.com");
        create_pending_intent(&conn, &user.id, TaskType::DeveloperApiPro, "order_pp", 49900);
        queries::try_mark_succeeded(&conn, "order_pp", Some("pay_pp")).unwrap();
    }

    let body = serde_json::to_vec(&serde_json::json!({
        "event": "payment.captured",
        "payload": {"payment": {"entity": {"id": "pay_pp", "notes": {}}}}
    }))
    .unwrap();

    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::OK);
    // Already succeeded: duplicate acknowledged, no fulfillment.
    assert_eq!(harness.notifier.sent_count(), 0);
}
