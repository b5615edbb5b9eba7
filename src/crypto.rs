//! API key generation and hashing for the admin API.
//!
//! Keys are stored as SHA-256 hashes; only the prefix is kept in clear for
//! display in listings.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of the clear-text prefix stored for display (e.g., "bsk_a1b2").
pub const KEY_PREFIX_LEN: usize = 8;

/// Generate a new admin API key.
pub fn generate_api_key() -> String {
    format!(
        "bsk_{}{}",
        Uuid::new_v4().as_simple(),
        Uuid::new_v4().as_simple()
    )
}

/// Hash an API key for storage and lookup.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// The display prefix of a key (safe to store and show in clear).
pub fn key_prefix(key: &str) -> String {
    key.chars().take(KEY_PREFIX_LEN).collect()
}
