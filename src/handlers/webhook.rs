//! Asynchronous gateway webhook: the server-to-server confirmation path.
//!
//! Delivered 0..N times, in any order relative to the browser callback.
//! Trust comes solely from the HMAC over the raw body; there is no
//! caller identity. Once signature and parsing succeed the endpoint
//! always acknowledges, so the gateway stops retrying even when there is
//! nothing to do locally.

use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::fulfillment;
use crate::gateway::{OrderNotes, WebhookEvent, EVENT_ORDER_PAID, EVENT_PAYMENT_CAPTURED};
use crate::models::TransitionOutcome;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

fn ack() -> Json<WebhookAck> {
    Json(WebhookAck { received: true })
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("X-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing X-Signature header".into()))?;

    // The HMAC covers the untouched byte stream; parse only after it
    // verifies. Mismatches change no state.
    if !state.verifier.verify_webhook(&body, signature) {
        return Err(AppError::InvalidSignature);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)?;

    // Extract whichever identifiers this event type carries.
    let (order_id, payment_id, notes): (Option<String>, Option<String>, OrderNotes) =
        match event.event.as_str() {
            EVENT_PAYMENT_CAPTURED => match event.payload.payment {
                Some(wrapper) => {
                    let payment = wrapper.entity;
                    (payment.order_id, Some(payment.id), payment.notes)
                }
                None => {
                    tracing::warn!("payment.captured event without payment entity");
                    return Ok(ack());
                }
            },
            EVENT_ORDER_PAID => match event.payload.order {
                Some(wrapper) => {
                    let order = wrapper.entity;
                    (Some(order.id), None, order.notes)
                }
                None => {
                    tracing::warn!("order.paid event without order entity");
                    return Ok(ack());
                }
            },
            other => {
                tracing::debug!(event = %other, "Ignoring unrecognized webhook event");
                return Ok(ack());
            }
        };

    if order_id.is_none() && payment_id.is_none() {
        tracing::warn!(event = %event.event, "Webhook carries no payment identifiers");
        return Ok(ack());
    }

    let conn = state.db.get()?;

    let mut intent = None;
    if let Some(order_id) = &order_id {
        intent = queries::get_payment_intent_by_order(&conn, order_id)?;
    }
    if intent.is_none() {
        if let Some(payment_id) = &payment_id {
            intent = queries::get_payment_intent_by_payment(&conn, payment_id)?;
        }
    }

    // May legitimately arrive before the local order-creation commit in
    // adversarial orderings; acknowledge and rely on redelivery or the
    // client path.
    let Some(intent) = intent else {
        tracing::warn!(
            order_id = ?order_id,
            payment_id = ?payment_id,
            "Webhook for unknown payment intent, acknowledging"
        );
        return Ok(ack());
    };

    let outcome = queries::try_mark_succeeded(&conn, &intent.order_id, payment_id.as_deref())?;
    drop(conn);

    match outcome {
        TransitionOutcome::Transitioned => {
            fulfillment::dispatch(&state, &intent, &notes).await;
        }
        TransitionOutcome::AlreadySucceeded => {
            tracing::info!(
                order_id = %intent.order_id,
                event = %event.event,
                "Payment already confirmed, webhook is a duplicate"
            );
        }
    }

    Ok(ack())
}
