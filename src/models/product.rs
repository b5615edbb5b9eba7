use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Currency;

/// A digital good sold through a seller's storefront page.
///
/// Read-only from the payment pipeline's perspective: webhooks and the
/// download endpoint only ever look products up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Price in Brazilian reais, in cents. None = not sold in BRL.
    pub price_brl_cents: Option<i64>,
    /// Price in US dollars, in cents. None = not sold in USD.
    pub price_usd_cents: Option<i64>,
    /// Canonical URL of the deliverable file in hosted storage.
    pub file_url: String,
    pub cover_url: Option<String>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Price in the given currency, if the product is sold in it.
    pub fn price_cents(&self, currency: Currency) -> Option<i64> {
        match currency {
            Currency::Brl => self.price_brl_cents,
            Currency::Usd => self.price_usd_cents,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_brl_cents: Option<i64>,
    #[serde(default)]
    pub price_usd_cents: Option<i64>,
    pub file_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".into()));
        }
        if self.file_url.trim().is_empty() {
            return Err(AppError::BadRequest("File URL must not be empty".into()));
        }
        if self.price_brl_cents.is_none() && self.price_usd_cents.is_none() {
            return Err(AppError::BadRequest(
                "Product needs a price in at least one currency".into(),
            ));
        }
        if self.price_brl_cents.is_some_and(|p| p <= 0)
            || self.price_usd_cents.is_some_and(|p| p <= 0)
        {
            return Err(AppError::BadRequest("Prices must be positive".into()));
        }
        Ok(())
    }
}
