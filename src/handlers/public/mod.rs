mod checkout;
mod download;

pub use checkout::*;
pub use download::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/checkout/stripe", post(checkout_stripe))
        .route("/api/checkout/mercadopago", post(checkout_mercadopago))
        // Bare /api/download (no token) is a 400, not a 404
        .route("/api/download", get(missing_download_token))
        .route("/api/download/{token}", get(redeem_download))
}
