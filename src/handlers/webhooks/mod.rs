pub mod common;
pub mod mercadopago;
pub mod stripe;

pub use mercadopago::handle_mercadopago_webhook;
pub use stripe::handle_stripe_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/webhooks/stripe", post(handle_stripe_webhook))
        .route("/api/webhooks/mercadopago", post(handle_mercadopago_webhook))
}
