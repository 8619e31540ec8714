//! Fulfillment: the irreversible side effect of a confirmed payment.
//!
//! `dispatch` is invoked by exactly one confirmation path per intent —
//! whichever won the `pending -> succeeded` transition race. The
//! dispatcher routes by task type; each handler additionally checks its
//! artifact's own status before acting, so a future caller that bypasses
//! the transition race still cannot double-fulfill.
//!
//! Failures stop here. A payment that genuinely succeeded must never be
//! reported as failed because its side effect could not be delivered, so
//! handler errors are logged with the artifact context and swallowed at
//! this boundary. The artifact stays un-notified until a manual retry.

pub mod complaint;
pub mod developer;
pub mod rti;

use crate::db::AppState;
use crate::error::Result;
use crate::gateway::OrderNotes;
use crate::models::{PaymentIntent, TaskType};

/// Route a freshly-transitioned intent to its fulfillment handler,
/// fire-and-log. Never fails the calling confirmation endpoint.
pub async fn dispatch(state: &AppState, intent: &PaymentIntent, notes: &OrderNotes) {
    if let Err(e) = run(state, intent, notes).await {
        tracing::error!(
            intent_id = %intent.id,
            order_id = %intent.order_id,
            task_type = %intent.task_type.as_str(),
            error = %e,
            "Fulfillment failed; payment remains succeeded"
        );
    }
}

async fn run(state: &AppState, intent: &PaymentIntent, notes: &OrderNotes) -> Result<()> {
    match &intent.task_type {
        TaskType::ComplaintFiling => complaint::fulfill(state, intent, notes).await,
        TaskType::RtiDrafting => rti::fulfill(state, intent, notes).await,
        TaskType::DeveloperApiPro => developer::fulfill(state, intent).await,
        TaskType::Other(other) => {
            // Unknown task types must not fail the confirmation: the
            // payment is real even if this build cannot fulfill it.
            tracing::warn!(
                intent_id = %intent.id,
                task_type = %other,
                "No fulfillment handler for task type"
            );
            Ok(())
        }
    }
}
