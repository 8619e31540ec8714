//! Complaint fulfillment: notify the civic department and mark the
//! complaint as filed.

use rusqlite::Connection;

use crate::db::{queries, AppState};
use crate::email::EmailMessage;
use crate::error::Result;
use crate::gateway::OrderNotes;
use crate::models::{Complaint, ComplaintStatus, PaymentIntent};

/// Fallback inbox when no department address is configured.
const DEFAULT_DEPARTMENT_EMAIL: &str = "grievances@janhit.example";

pub async fn fulfill(state: &AppState, intent: &PaymentIntent, notes: &OrderNotes) -> Result<()> {
    let conn = state.db.get()?;

    let Some(complaint) = resolve(&conn, intent, notes)? else {
        tracing::warn!(
            intent_id = %intent.id,
            order_id = %intent.order_id,
            "No complaint found for confirmed payment"
        );
        return Ok(());
    };

    if complaint.status == ComplaintStatus::Filed {
        tracing::info!(complaint_id = %complaint.id, "Complaint already filed, skipping");
        return Ok(());
    }

    let filer = queries::get_user_by_id(&conn, &complaint.user_id)?;
    let filer_reference = match &filer {
        Some(user) => format!("{} <{}>", user.name, user.email),
        None => complaint.user_id.clone(),
    };

    let to = state
        .department_email
        .clone()
        .unwrap_or_else(|| DEFAULT_DEPARTMENT_EMAIL.to_string());

    let message = EmailMessage {
        to,
        subject: format!("Citizen complaint: {}", complaint.location),
        html_body: compose_body(&complaint, &filer_reference),
        attachments: vec![],
    };

    if let Err(e) = state.notifier.send(&message).await {
        tracing::error!(
            complaint_id = %complaint.id,
            error = %e,
            "Complaint notification failed; complaint stays pending for retry"
        );
        return Err(e);
    }

    queries::mark_complaint_filed(&conn, &complaint.id)?;
    tracing::info!(complaint_id = %complaint.id, "Complaint filed with department");
    Ok(())
}

/// Prefer the explicit artifact id echoed back in confirmation metadata;
/// fall back to the order-id correlation stamped at checkout.
fn resolve(
    conn: &Connection,
    intent: &PaymentIntent,
    notes: &OrderNotes,
) -> Result<Option<Complaint>> {
    if let Some(artifact_id) = &notes.artifact_id {
        if let Some(complaint) = queries::get_complaint_by_id(conn, artifact_id)? {
            if complaint.user_id == intent.user_id {
                return Ok(Some(complaint));
            }
            tracing::warn!(
                complaint_id = %complaint.id,
                intent_id = %intent.id,
                "Confirmation metadata names a complaint owned by another user"
            );
        }
    }

    queries::latest_complaint_for_order(conn, &intent.user_id, &intent.order_id)
}

fn compose_body(complaint: &Complaint, filer_reference: &str) -> String {
    format!(
        r#"<h2>Citizen complaint</h2>
<p><strong>Location:</strong> {}</p>
<p>{}</p>
<hr>
<p>Filed by: {}<br>Reference: {}</p>"#,
        complaint.location, complaint.description, filer_reference, complaint.id
    )
}
