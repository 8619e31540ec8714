//! On-demand RTI document retrieval.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::CurrentUser;
use crate::fulfillment::rti::render_document;
use crate::id::is_valid_prefixed_id;

/// Serve the rendered document for a paid RTI request.
///
/// Regenerates through the same renderer the fulfillment email used, so
/// the download is byte-identical to the attachment.
pub async fn get_rti_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response> {
    if !is_valid_prefixed_id(&id) {
        return Err(AppError::NotFound("RTI request not found".into()));
    }

    let conn = state.db.get()?;

    let rti = queries::get_rti_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("RTI request not found".into()))?;

    if rti.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "RTI request belongs to a different user".into(),
        ));
    }

    if !rti.status.is_paid() {
        return Err(AppError::PaymentRequired(
            "Complete payment to download this document".into(),
        ));
    }

    let pdf = render_document(&rti);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"rti-request-{}.pdf\"", rti.id),
            ),
        ],
        pdf,
    )
        .into_response())
}
