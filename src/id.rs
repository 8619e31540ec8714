//! Prefixed ID generation for Janhit entities.
//!
//! All IDs use a `jh_` brand prefix to guarantee collision avoidance with
//! payment gateway IDs (`order_`, `pay_`, etc.).
//!
//! Format: `jh_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &[
    "jh_usr_",
    "jh_pi_",
    "jh_cmp_",
    "jh_rti_",
    "jh_cred_",
    "jh_sess_",
];

/// Validate that a string is a valid Janhit prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
/// Validates format: `jh_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];

    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Janhit.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    User,
    PaymentIntent,
    Complaint,
    RtiRequest,
    ApiCredential,
    Session,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "jh_usr",
            Self::PaymentIntent => "jh_pi",
            Self::Complaint => "jh_cmp",
            Self::RtiRequest => "jh_rti",
            Self::ApiCredential => "jh_cred",
            Self::Session => "jh_sess",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
