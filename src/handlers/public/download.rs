//! Download redemption: the only endpoint buyers ever touch directly.
//!
//! The token is verified, re-validated against the product's current file
//! URL, and the file is then streamed through the server. The storage URL
//! never reaches the client - a leaked download link is worthless once the
//! token expires or the file is replaced.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Path;
use crate::models::Product;

/// GET /api/download/{token}
pub async fn redeem_download(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    // 401 on bad signature or elapsed expiry
    let claims = state.download_tokens.verify(&token)?;

    let product = {
        let conn = state.db.get()?;
        queries::get_product_by_id(&conn, &claims.product_id)?
            .or_not_found(msg::PRODUCT_NOT_FOUND)?
    };

    // The token froze the file URL at fulfillment time. A mismatch means the
    // seller replaced the file since - reject as stale (410), distinct from
    // an invalid token (401).
    if product.file_url != claims.file_url {
        tracing::info!(
            sale_id = %claims.sale_id,
            product_id = %product.id,
            "Rejecting stale download link (product file was replaced)"
        );
        return Err(AppError::LinkStale);
    }

    tracing::info!(
        sale_id = %claims.sale_id,
        product_id = %product.id,
        "Serving product download"
    );

    stream_product_file(&state, &product).await
}

/// GET /api/download - token missing from the path entirely.
pub async fn missing_download_token() -> Result<Response> {
    Err(AppError::BadRequest(msg::MISSING_DOWNLOAD_TOKEN.into()))
}

/// Proxy the product file from storage, keeping the storage URL server-side.
async fn stream_product_file(state: &AppState, product: &Product) -> Result<Response> {
    let upstream = state
        .http_client
        .get(&product.file_url)
        .send()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch product file: {}", e)))?;

    if !upstream.status().is_success() {
        return Err(AppError::Internal(format!(
            "Storage returned {} for product {}",
            upstream.status(),
            product.id
        )));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let filename = download_filename(product);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// File name offered to the browser: the storage object's name, falling
/// back to a sanitized product title.
fn download_filename(product: &Product) -> String {
    product
        .file_url
        .split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty() && *name != product.file_url)
        .map(String::from)
        .unwrap_or_else(|| {
            let title: String = product
                .title
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect();
            format!("{}.bin", title)
        })
}
