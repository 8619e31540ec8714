//! Tests for GET /rti/{id}/document — on-demand document retrieval.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn test_document_requires_auth() {
    let harness = test_state();
    let rti_id = {
        let conn = harness.state.db.get().unwrap();
        let (user, _) = create_test_user(&conn, "a@example.com");
        create_test_rti(&conn, &user.id, RTI_BODY).id
    };

    let response = get(
        app(harness.state.clone()),
        &format!("/rti/{}/document", rti_id),
        None,
    )
    .await;
    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unpaid_draft_returns_payment_required() {
    let harness = test_state();
    let (token, rti_id);
    {
        let conn = harness.state.db.get().unwrap();
        let (user, t) = create_test_user(&conn, "a@example.com");
        token = t;
        rti_id = create_test_rti(&conn, &user.id, RTI_BODY).id;
    }

    let response = get(
        app(harness.state.clone()),
        &format!("/rti/{}/document", rti_id),
        Some(&token),
    )
    .await;
    assert_status(&response, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_foreign_document_is_forbidden() {
    let harness = test_state();
    let (other_token, rti_id);
    {
        let conn = harness.state.db.get().unwrap();
        let (owner, _) = create_test_user(&conn, "owner@example.com");
        let rti = create_test_rti(&conn, &owner.id, RTI_BODY);
        queries::mark_rti_paid(&conn, &rti.id).unwrap();
        rti_id = rti.id;
        other_token = create_test_user(&conn, "other@example.com").1;
    }

    let response = get(
        app(harness.state.clone()),
        &format!("/rti/{}/document", rti_id),
        Some(&other_token),
    )
    .await;
    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_paid_document_is_served_and_stable() {
    let harness = test_state();
    let (token, rti_id);
    {
        let conn = harness.state.db.get().unwrap();
        let (user, t) = create_test_user(&conn, "a@example.com");
        token = t;
        let rti = create_test_rti(&conn, &user.id, RTI_BODY);
        queries::mark_rti_paid(&conn, &rti.id).unwrap();
        rti_id = rti.id;
    }

    let uri = format!("/rti/{}/document", rti_id);

    let response = get(app(harness.state.clone()), &uri, Some(&token)).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let first = response_bytes(response).await;
    assert!(first.starts_with(b"%PDF-1.4"));

    // Regeneration is deterministic: a second download is byte-identical.
    let response = get(app(harness.state.clone()), &uri, Some(&token)).await;
    let second = response_bytes(response).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_download_matches_fulfillment_attachment() {
    // The email attachment and the on-demand endpoint share one
    // renderer, so their bytes must be identical.
    let harness = test_state();
    let (token, rti_id);
    {
        let conn = harness.state.db.get().unwrap();
        let (user, t) = create_test_user(&conn, "a@example.com");
        token = t;
        let rti = create_test_rti(&conn, &user.id, RTI_BODY);
        create_pending_intent(&conn, &user.id, TaskType::RtiDrafting, "order_match", 1100);
        queries::set_rti_order(&conn, &rti.id, "order_match").unwrap();
        rti_id = rti.id;
    }

    let body = order_paid_body("order_match", None);
    let response = post_webhook(app(harness.state.clone()), &body, None).await;
    assert_status(&response, StatusCode::OK);

    let email = harness.notifier.last().unwrap();
    assert_eq!(email.attachments.len(), 1);

    let response = get(
        app(harness.state.clone()),
        &format!("/rti/{}/document", rti_id),
        Some(&token),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    let downloaded = response_bytes(response).await;

    assert_eq!(email.attachments[0].content, downloaded);
}

#[tokio::test]
async fn test_response_received_still_serves_document() {
    // A department reply moves the status past paid; the citizen keeps
    // access to the document.
    let harness = test_state();
    let (token, rti_id);
    {
        let conn = harness.state.db.get().unwrap();
        let (user, t) = create_test_user(&conn, "a@example.com");
        token = t;
        let rti = create_test_rti(&conn, &user.id, RTI_BODY);
        queries::mark_rti_paid(&conn, &rti.id).unwrap();
        conn.execute(
            "UPDATE rti_requests SET status = 'response_received' WHERE id = ?1",
            rusqlite::params![&rti.id],
        )
        .unwrap();
        rti_id = rti.id;
    }

    let response = get(
        app(harness.state.clone()),
        &format!("/rti/{}/document", rti_id),
        Some(&token),
    )
    .await;
    assert_status(&response, StatusCode::OK);
}
