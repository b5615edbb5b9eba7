//! Signed, time-limited download tokens.
//!
//! A token is an HS256 JWT carrying just enough to redeem a purchased file:
//! the sale, the product, the buyer, and the file URL the product had at
//! fulfillment time. The file URL is re-checked against the live product at
//! redemption, so replacing a product file invalidates previously issued
//! links (they become "stale", not "forged").

use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Product, Sale};

/// How long a download link stays valid after fulfillment.
pub const DOWNLOAD_TOKEN_TTL_HOURS: u64 = 48;

const TOKEN_ISSUER: &str = "bubastore";

/// Claims embedded in a download token (beyond the standard iat/exp/iss).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadClaims {
    pub sale_id: String,
    pub product_id: String,
    pub buyer_email: String,
    /// The product's file URL at issuance time. Compared against the
    /// product's current file URL at redemption.
    pub file_url: String,
}

/// Issues and verifies download tokens with a server-held symmetric secret.
#[derive(Clone)]
pub struct DownloadTokens {
    key: HS256Key,
}

impl DownloadTokens {
    pub fn new(secret: &str) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
        }
    }

    /// Sign a token for a completed sale.
    pub fn issue(&self, sale: &Sale, product: &Product) -> Result<String> {
        let custom = DownloadClaims {
            sale_id: sale.id.clone(),
            product_id: product.id.clone(),
            buyer_email: sale.buyer_email.clone(),
            file_url: product.file_url.clone(),
        };

        let claims = Claims::with_custom_claims(
            custom,
            Duration::from_hours(DOWNLOAD_TOKEN_TTL_HOURS),
        )
        .with_issuer(TOKEN_ISSUER);

        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign download token: {}", e)))
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// Any failure (bad signature, expired, wrong issuer, garbage input)
    /// collapses to `TokenInvalidOrExpired` - callers must not leak which.
    pub fn verify(&self, token: &str) -> Result<DownloadClaims> {
        let options = VerificationOptions {
            // Exact expiry - no default leeway on a download credential
            time_tolerance: Some(Duration::from_secs(0)),
            allowed_issuers: Some([TOKEN_ISSUER.to_string()].into_iter().collect()),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<DownloadClaims>(token, Some(options))
            .map_err(|_| AppError::TokenInvalidOrExpired)?;

        Ok(claims.custom)
    }
}
