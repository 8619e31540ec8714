//! Secret hashing and token generation.
//!
//! Session tokens and developer API keys are stored hashed; the plaintext
//! is shown to the caller once and never persisted in recoverable form,
//! except developer API keys which the owner may re-fetch (see
//! `api_credentials` in the schema).

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Hash a secret for database lookups (session tokens).
/// Uses SHA-256 with application salt, returns lowercase hex string.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"janhit-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a high-entropy developer API key (32 bytes of OS entropy).
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("jh_live_{}", hex::encode(bytes))
}

/// Generate an opaque session token.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_secret_is_stable() {
        assert_eq!(hash_secret("token"), hash_secret("token"));
        assert_ne!(hash_secret("token"), hash_secret("token2"));
    }

    #[test]
    fn test_api_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with("jh_live_"));
        // jh_live_ (8 chars) + 64 hex chars
        assert_eq!(key.len(), 72);
        assert_ne!(key, generate_api_key());
    }
}
