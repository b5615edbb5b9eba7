use serde::{Deserialize, Serialize};

/// A platform operator with read access to the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Display prefix of the API key (e.g., "bsk_a1b2").
    pub key_prefix: String,
    /// SHA-256 hash of the full API key.
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdmin {
    pub email: String,
    pub name: String,
}

/// Request-scoped identity inserted by the admin auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: String,
    pub email: String,
}
