//! Developer API fulfillment: mint a pro credential with a fresh quota.

use crate::crypto::generate_api_key;
use crate::db::{queries, AppState};
use crate::error::Result;
use crate::models::{PaymentIntent, PRO_MONTHLY_QUOTA};

pub async fn fulfill(state: &AppState, intent: &PaymentIntent) -> Result<()> {
    let conn = state.db.get()?;

    let api_key = generate_api_key();
    let credential =
        queries::upsert_api_credential(&conn, &intent.user_id, &api_key, "pro", PRO_MONTHLY_QUOTA)?;

    // The key is retrievable by the owner via GET /developer/credentials;
    // it is deliberately not emailed.
    tracing::info!(
        user_id = %intent.user_id,
        credential_id = %credential.id,
        "Developer API credential minted"
    );
    Ok(())
}
