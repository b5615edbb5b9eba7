//! Bearer-key authentication for the admin API.
//!
//! Keys are looked up by SHA-256 hash; the matched admin is inserted into
//! request extensions as `CurrentAdmin`.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::crypto::hash_api_key;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::CurrentAdmin;

/// Extract a Bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Middleware guarding admin routes.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let key = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let key_hash = hash_api_key(key);

    let admin = {
        let conn = state.db.get()?;
        queries::get_admin_by_key_hash(&conn, &key_hash)?.ok_or(AppError::Unauthorized)?
    };

    tracing::debug!(admin_id = %admin.id, "Admin authenticated");

    request.extensions_mut().insert(CurrentAdmin {
        id: admin.id,
        email: admin.email,
    });

    Ok(next.run(request).await)
}
