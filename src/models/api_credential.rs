use serde::Serialize;

/// Monthly request quota granted with the pro plan.
pub const PRO_MONTHLY_QUOTA: i64 = 10_000;

/// A developer API credential, minted by fulfillment when a
/// `developer_api_pro` payment succeeds. One credential per user; a
/// repeat purchase rotates the key and resets the quota window.
///
/// Unlike session tokens the key itself is stored, so the owning user
/// can re-fetch it; it is never emailed.
#[derive(Debug, Clone, Serialize)]
pub struct ApiCredential {
    pub id: String,
    pub user_id: String,
    pub api_key: String,
    pub plan: String,
    pub monthly_quota: i64,
    pub used_count: i64,
    pub quota_reset_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
