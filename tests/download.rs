//! Download redemption endpoint tests: token gate, stale-link detection,
//! and streamed file delivery.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::*;

const FILE_BYTES: &[u8] = b"%PDF-1.4 test file contents";

/// Stub of hosted file storage.
fn storage_stub() -> Router {
    Router::new().route(
        "/files/ebook.pdf",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/pdf")],
                axum::body::Bytes::from_static(FILE_BYTES),
            )
        }),
    )
}

async fn get_download(app: &Router, token: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/download/{}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_valid_token_streams_file() {
    let storage_url = spawn_test_server(storage_stub()).await;
    let file_url = format!("{}/files/ebook.pdf", storage_url);

    let state = create_test_state();
    let (sale, product) = {
        let conn = state.db.get().unwrap();
        let seller = create_test_user(&conn, "seller@example.com", "seller");
        let product = create_test_product(&conn, &seller.id, "Ebook", &file_url);
        let sale = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_dl_1");
        (sale, product)
    };

    let token = state.download_tokens.issue(&sale, &product).unwrap();
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/download/{}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"ebook.pdf\"")
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], FILE_BYTES);
}

#[tokio::test]
async fn test_token_redeemable_multiple_times() {
    // No download-count limit: a token works any number of times until expiry
    let storage_url = spawn_test_server(storage_stub()).await;
    let file_url = format!("{}/files/ebook.pdf", storage_url);

    let state = create_test_state();
    let (sale, product) = {
        let conn = state.db.get().unwrap();
        let seller = create_test_user(&conn, "seller@example.com", "seller");
        let product = create_test_product(&conn, &seller.id, "Ebook", &file_url);
        let sale = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_dl_2");
        (sale, product)
    };

    let token = state.download_tokens.issue(&sale, &product).unwrap();
    let app = test_app(state);

    for _ in 0..3 {
        let (status, body) = get_download(&app, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], FILE_BYTES);
    }
}

#[tokio::test]
async fn test_garbage_token_unauthorized() {
    let state = create_test_state();
    let app = test_app(state);

    let (status, _) = get_download(&app, "not-a-real-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_wrong_secret_unauthorized() {
    let state = create_test_state();
    let (sale, product) = {
        let conn = state.db.get().unwrap();
        let seller = create_test_user(&conn, "seller@example.com", "seller");
        let product = create_test_product(
            &conn,
            &seller.id,
            "Ebook",
            "https://files.example.com/ebook.pdf",
        );
        let sale = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_dl_3");
        (sale, product)
    };

    // Signed with a different secret than the server verifies with
    let forged = DownloadTokens::new("attacker-secret")
        .issue(&sale, &product)
        .unwrap();
    let app = test_app(state);

    let (status, _) = get_download(&app, &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_replaced_file_yields_stale_link() {
    let state = create_test_state();
    let (sale, product) = {
        let conn = state.db.get().unwrap();
        let seller = create_test_user(&conn, "seller@example.com", "seller");
        let product = create_test_product(
            &conn,
            &seller.id,
            "Ebook",
            "https://files.example.com/ebook-v1.pdf",
        );
        let sale = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_dl_4");
        (sale, product)
    };

    let token = state.download_tokens.issue(&sale, &product).unwrap();

    // Seller replaces the product file after the token was issued
    {
        let conn = state.db.get().unwrap();
        assert!(queries::update_product_file_url(
            &conn,
            &product.id,
            "https://files.example.com/ebook-v2.pdf"
        )
        .unwrap());
    }

    let app = test_app(state);
    let (status, _) = get_download(&app, &token).await;

    assert_eq!(status, StatusCode::GONE, "Stale link must never download");
}

#[tokio::test]
async fn test_deleted_product_yields_not_found() {
    let state = create_test_state();
    let (sale, product) = {
        let conn = state.db.get().unwrap();
        let seller = create_test_user(&conn, "seller@example.com", "seller");
        let product = create_test_product(
            &conn,
            &seller.id,
            "Ebook",
            "https://files.example.com/ebook.pdf",
        );
        let sale = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_dl_5");
        (sale, product)
    };

    let token = state.download_tokens.issue(&sale, &product).unwrap();

    {
        let conn = state.db.get().unwrap();
        conn.execute("DELETE FROM sales WHERE product_id = ?1", [&product.id])
            .unwrap();
        conn.execute("DELETE FROM products WHERE id = ?1", [&product.id])
            .unwrap();
    }

    let app = test_app(state);
    let (status, _) = get_download(&app, &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token_is_bad_request() {
    let state = create_test_state();
    let app = test_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/download")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
