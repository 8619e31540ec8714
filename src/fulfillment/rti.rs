//! RTI fulfillment: render the drafted request into a paginated document
//! and email it to the citizen.

use rusqlite::Connection;

use crate::db::{queries, AppState};
use crate::email::{Attachment, EmailMessage};
use crate::error::{AppError, Result};
use crate::gateway::OrderNotes;
use crate::models::{PaymentIntent, RtiRequest};
use crate::render::{self, PageGeometry};

/// Disclosure line stamped on every page of a rendered request.
const DOCUMENT_FOOTER: &str =
    "Generated via Janhit under the Right to Information Act, 2005. Verify before submission.";

/// Render an RTI request into PDF bytes.
///
/// The single rendering path for both the fulfillment attachment and the
/// on-demand document endpoint, so the two are byte-identical for the
/// same request.
pub fn render_document(rti: &RtiRequest) -> Vec<u8> {
    let doc = render::layout(&rti.body_text, PageGeometry::a4(), DOCUMENT_FOOTER);
    render::pdf::to_pdf_bytes(&doc)
}

pub async fn fulfill(state: &AppState, intent: &PaymentIntent, notes: &OrderNotes) -> Result<()> {
    let conn = state.db.get()?;

    let Some(rti) = resolve(&conn, intent, notes)? else {
        tracing::warn!(
            intent_id = %intent.id,
            order_id = %intent.order_id,
            "No RTI request found for confirmed payment"
        );
        return Ok(());
    };

    if rti.status.is_paid() {
        tracing::info!(rti_id = %rti.id, "RTI request already fulfilled, skipping");
        return Ok(());
    }

    // Nothing to render: abort before advancing any state. The payment
    // itself stays succeeded; a manual retry can re-run this handler
    // once the draft has content.
    if rti.body_text.trim().is_empty() {
        tracing::error!(rti_id = %rti.id, "RTI draft is empty, nothing to render");
        return Err(AppError::EmptyDraft);
    }

    let user = queries::get_user_by_id(&conn, &rti.user_id)?.ok_or_else(|| {
        AppError::Internal(format!("RTI {} references missing user", rti.id))
    })?;

    queries::mark_rti_paid(&conn, &rti.id)?;

    let pdf = render_document(&rti);

    let document_url = format!("{}/rti/{}/document", state.base_url, rti.id);

    let message = EmailMessage {
        to: user.email.clone(),
        subject: format!("Your RTI request to {}", rti.department),
        html_body: compose_body(&rti, &document_url),
        attachments: vec![Attachment {
            filename: format!("rti-request-{}.pdf", rti.id),
            content: pdf,
        }],
    };

    if let Err(e) = state.notifier.send(&message).await {
        tracing::error!(
            rti_id = %rti.id,
            error = %e,
            "RTI notification failed; request stays paid and un-notified"
        );
        return Err(e);
    }

    if rti.document_path.is_none() {
        queries::set_rti_document_path(&conn, &rti.id, &format!("/rti/{}/document", rti.id))?;
    }

    tracing::info!(rti_id = %rti.id, to = %user.email, "RTI request document sent");
    Ok(())
}

/// Prefer explicit correlation — the artifact id from confirmation
/// metadata, then the order id stamped at checkout — and only then the
/// recency heuristic. The heuristic is a known weakness (two quick
/// drafts can collide), which is why an explicit id always wins.
fn resolve(
    conn: &Connection,
    intent: &PaymentIntent,
    notes: &OrderNotes,
) -> Result<Option<RtiRequest>> {
    if let Some(artifact_id) = &notes.artifact_id {
        if let Some(rti) = queries::get_rti_by_id(conn, artifact_id)? {
            if rti.user_id == intent.user_id {
                return Ok(Some(rti));
            }
            tracing::warn!(
                rti_id = %rti.id,
                intent_id = %intent.id,
                "Confirmation metadata names an RTI owned by another user"
            );
        }
    }

    if let Some(rti) = queries::get_rti_by_order(conn, &intent.order_id)? {
        if rti.user_id == intent.user_id {
            return Ok(Some(rti));
        }
    }

    queries::latest_draft_rti_since(conn, &intent.user_id, intent.created_at)
}

fn compose_body(rti: &RtiRequest, document_url: &str) -> String {
    format!(
        r#"<h2>Your RTI request is ready</h2>
<p>Your request <strong>{}</strong> addressed to <strong>{}</strong> has been
prepared and is attached as a PDF.</p>
<p>Print, sign and submit it to the Public Information Officer along with the
application fee receipt.</p>
<p>You can download the document again anytime: <a href="{}">{}</a></p>"#,
        rti.subject, rti.department, document_url, document_url
    )
}
