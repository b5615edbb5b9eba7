use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A seller: owns products and receives commission-adjusted sale notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// URL slug of the seller's public storefront page.
    pub store_slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub store_slug: String,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::BadRequest("Invalid email".into()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name must not be empty".into()));
        }
        let slug = self.store_slug.trim();
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(AppError::BadRequest(
                "Store slug must be lowercase letters, digits, and dashes".into(),
            ));
        }
        Ok(())
    }
}
