//! Developer API credential retrieval.

use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{CurrentUser, Json};
use crate::models::ApiCredential;

/// Return the caller's API credential. Keys are handed out here rather
/// than emailed.
pub async fn get_credentials(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiCredential>> {
    let conn = state.db.get()?;

    queries::get_api_credential_for_user(&conn, &user.user_id)?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound("No API credential; purchase the developer pro plan".into())
        })
}
