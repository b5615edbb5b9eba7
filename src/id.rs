//! Prefixed ID generation for BubaStore entities.
//!
//! All IDs use a `bs_` brand prefix to guarantee collision avoidance with
//! payment gateway IDs (Stripe's `pi_`, `cus_`, MercadoPago's numeric ids).
//!
//! Format: `bs_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["bs_usr_", "bs_prod_", "bs_sale_", "bs_adm_"];

/// Validate that a string is a valid BubaStore prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
/// Validates format: `bs_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];

    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in BubaStore.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    User,
    Product,
    Sale,
    Admin,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "bs_usr",
            Self::Product => "bs_prod",
            Self::Sale => "bs_sale",
            Self::Admin => "bs_adm",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
