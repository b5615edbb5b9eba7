use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Common error message constants, so handlers and tests agree on wording.
pub mod msg {
    pub const PRODUCT_NOT_FOUND: &str = "Product not found";
    pub const SELLER_NOT_FOUND: &str = "Seller not found";
    pub const PRODUCT_INACTIVE: &str = "Product is not available for purchase";
    pub const CURRENCY_NOT_AVAILABLE: &str = "Product has no price in the requested currency";
    pub const INVALID_CURRENCY: &str = "Invalid currency. Must be 'brl' or 'usd'";
    pub const MISSING_SIGNATURE_HEADER: &str = "Missing stripe-signature header";
    pub const INVALID_SIGNATURE: &str = "Invalid webhook signature";
    pub const INVALID_SIGNATURE_FORMAT: &str = "Invalid signature header format";
    pub const INVALID_TIMESTAMP_IN_SIGNATURE: &str = "Invalid timestamp in signature header";
    pub const INVALID_WEBHOOK_SECRET: &str = "Invalid webhook secret";
    pub const MISSING_PRODUCT_REFERENCE: &str = "Payment has no product reference";
    pub const MISSING_BUYER_EMAIL: &str = "Payment has no buyer email";
    pub const MISSING_PAYMENT_ID: &str = "Notification has no payment id";
    pub const MISSING_DOWNLOAD_TOKEN: &str = "Missing download token";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired download token")]
    TokenInvalidOrExpired,

    /// The product file was replaced after the token was issued.
    #[error("Download link is stale")]
    LinkStale,

    #[error("Malformed payment reference: {0}")]
    MalformedReference(String),

    /// Server-to-server call to a payment gateway failed. Surfaced as 502
    /// so the gateway retries the webhook.
    #[error("Gateway fetch failed: {0}")]
    GatewayFetchFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::TokenInvalidOrExpired => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired download token",
                None,
            ),
            AppError::LinkStale => (
                StatusCode::GONE,
                "Download link is stale",
                Some("The product file changed since this link was issued".to_string()),
            ),
            AppError::MalformedReference(msg) => (
                StatusCode::BAD_REQUEST,
                "Malformed payment reference",
                Some(msg.clone()),
            ),
            AppError::GatewayFetchFailed(msg) => {
                tracing::error!("Gateway fetch failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment gateway unavailable", None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience for turning `Option<T>` lookups into 404s.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
