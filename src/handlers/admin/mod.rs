mod management;

pub use management::*;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::db::AppState;
use crate::middleware::require_admin;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/products", get(list_products))
        .route("/admin/sales", get(list_sales))
        .route("/admin/stats", get(platform_stats))
        .layer(from_fn_with_state(state, require_admin))
}
