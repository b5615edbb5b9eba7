//! Structured, versioned product references for gateways without metadata
//! support.
//!
//! MercadoPago only carries a free-form `external_reference` string on a
//! payment. Instead of ad-hoc string splitting, references are a versioned
//! tagged payload (`v1.{product_id}`) with an explicit parse step that
//! returns a typed value or a `MalformedReference` error.

use crate::error::{AppError, Result};
use crate::id;

/// Current reference encoding version.
pub const REFERENCE_VERSION: &str = "v1";

/// A parsed product reference from a gateway payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReference {
    pub product_id: String,
}

impl ProductReference {
    pub fn new(product_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
        }
    }

    /// Encode for embedding in a gateway's external reference field.
    pub fn encode(&self) -> String {
        format!("{}.{}", REFERENCE_VERSION, self.product_id)
    }

    /// Parse and validate an external reference string.
    pub fn parse(raw: &str) -> Result<Self> {
        let (version, product_id) = raw
            .split_once('.')
            .ok_or_else(|| AppError::MalformedReference(format!("missing version tag: {:?}", raw)))?;

        if version != REFERENCE_VERSION {
            return Err(AppError::MalformedReference(format!(
                "unsupported version: {:?}",
                version
            )));
        }

        if !id::is_valid_prefixed_id(product_id) || !product_id.starts_with("bs_prod_") {
            return Err(AppError::MalformedReference(format!(
                "not a product id: {:?}",
                product_id
            )));
        }

        Ok(Self {
            product_id: product_id.to_string(),
        })
    }
}
