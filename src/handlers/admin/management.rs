//! Read-only platform visibility for operators: users, products, sales,
//! and revenue statistics.

use axum::extract::State;
use axum::Extension;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::models::{CurrentAdmin, Product, Sale, SaleStats, User};
use crate::pagination::{PaginatedResponse, Pagination};

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<User>>> {
    let conn = state.db.get()?;
    let (items, total) = queries::list_users_paginated(&conn, pagination.limit(), pagination.offset())?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        limit: pagination.limit(),
        offset: pagination.offset(),
    }))
}

/// GET /admin/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<Product>>> {
    let conn = state.db.get()?;
    let (items, total) =
        queries::list_products_paginated(&conn, pagination.limit(), pagination.offset())?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        limit: pagination.limit(),
        offset: pagination.offset(),
    }))
}

/// GET /admin/sales
pub async fn list_sales(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentAdmin>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<Sale>>> {
    tracing::debug!(admin_id = %admin.id, "Listing sales");
    let conn = state.db.get()?;
    let (items, total) = queries::list_sales_paginated(&conn, pagination.limit(), pagination.offset())?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        limit: pagination.limit(),
        offset: pagination.offset(),
    }))
}

/// GET /admin/stats - per-currency gross, commission, and net totals.
pub async fn platform_stats(State(state): State<AppState>) -> Result<Json<SaleStats>> {
    let conn = state.db.get()?;
    Ok(Json(queries::sale_stats(&conn)?))
}
