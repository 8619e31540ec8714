//! Synchronous payment verification: the browser's confirmation path.
//!
//! Races against the gateway webhook over the same intent row; the
//! atomic transition in `queries::try_mark_succeeded` decides which path
//! dispatches fulfillment.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{CurrentUser, Json};
use crate::fulfillment;
use crate::gateway::OrderNotes;
use crate::models::{IntentStatus, TransitionOutcome};

/// The confirmation payload the checkout widget hands to the browser,
/// forwarded verbatim (camelCase keys included).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
}

pub async fn verify_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let conn = state.db.get()?;

    let intent = queries::get_payment_intent_by_order(&conn, &request.order_id)?
        .ok_or_else(|| AppError::NotFound("No payment found for this order".into()))?;

    if intent.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Payment belongs to a different user".into(),
        ));
    }

    // Idempotent short-circuit: a repeat of an already-confirmed payment
    // is a success, with no re-verification and no second fulfillment.
    if intent.status == IntentStatus::Succeeded {
        return Ok(Json(VerifyResponse { success: true }));
    }

    if !state
        .verifier
        .verify_checkout(&request.order_id, &request.payment_id, &request.signature)
    {
        return Err(AppError::InvalidSignature);
    }

    let outcome =
        queries::try_mark_succeeded(&conn, &request.order_id, Some(&request.payment_id))?;
    drop(conn);

    match outcome {
        TransitionOutcome::Transitioned => {
            // Fire-and-log: payment success and fulfillment success are
            // independent facts. The client callback carries no gateway
            // metadata, so resolution relies on the correlation stamped
            // at checkout.
            fulfillment::dispatch(&state, &intent, &OrderNotes::default()).await;
        }
        TransitionOutcome::AlreadySucceeded => {
            tracing::info!(
                order_id = %request.order_id,
                "Webhook won the confirmation race, skipping fulfillment dispatch"
            );
        }
    }

    Ok(Json(VerifyResponse { success: true }))
}
