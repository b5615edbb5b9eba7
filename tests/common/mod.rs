//! Test utilities and fixtures for BubaStore integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use uuid::Uuid;

pub use bubastore::commission::DEFAULT_COMMISSION_RATE;
pub use bubastore::db::{init_db, queries, AppState, DbPool};
pub use bubastore::email::EmailService;
pub use bubastore::models::*;
pub use bubastore::payments::{
    MercadoPagoClient, MercadoPagoConfig, PaymentMethod, ProductReference, StripeClient,
    StripeConfig,
};
pub use bubastore::token::DownloadTokens;

pub const STRIPE_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const DOWNLOAD_TOKEN_SECRET: &str = "test-download-secret";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a pool backed by a shared in-memory database (unique per call so
/// tests stay isolated from each other).
pub fn test_pool() -> DbPool {
    let uri = format!(
        "file:bubastore_test_{}?mode=memory&cache=shared",
        Uuid::new_v4().as_simple()
    );
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder().max_size(4).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// Create an AppState for testing: in-memory database, test gateway
/// credentials, and no email API key (sends are skipped).
pub fn create_test_state() -> AppState {
    AppState {
        db: test_pool(),
        base_url: "http://localhost:3000".to_string(),
        stripe: StripeClient::new(&StripeConfig {
            secret_key: "sk_test_xxx".to_string(),
            webhook_secret: STRIPE_WEBHOOK_SECRET.to_string(),
        }),
        mercadopago: MercadoPagoClient::new(&MercadoPagoConfig {
            access_token: "TEST-access-token".to_string(),
        }),
        email: Arc::new(EmailService::new(None, "test@bubastore.dev".to_string())),
        download_tokens: DownloadTokens::new(DOWNLOAD_TOKEN_SECRET),
        http_client: reqwest::Client::new(),
        commission_rate: DEFAULT_COMMISSION_RATE,
    }
}

/// Build the full application router against a test state.
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .merge(bubastore::handlers::public::router())
        .merge(bubastore::handlers::webhooks::router())
        .merge(bubastore::handlers::admin::router(state.clone()))
        .with_state(state)
}

/// Spawn an ephemeral HTTP server for stubbing external services
/// (MercadoPago API, file storage). Returns its base URL.
pub async fn spawn_test_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Create a test seller with default values
pub fn create_test_user(conn: &Connection, email: &str, store_slug: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        name: format!("Test Seller {}", store_slug),
        store_slug: store_slug.to_string(),
    };
    queries::create_user(conn, &input).expect("Failed to create test seller")
}

/// Create a test product priced in both currencies
pub fn create_test_product(conn: &Connection, seller_id: &str, title: &str, file_url: &str) -> Product {
    let input = CreateProduct {
        title: title.to_string(),
        description: Some("Test product".to_string()),
        price_brl_cents: Some(4990),
        price_usd_cents: Some(990),
        file_url: file_url.to_string(),
        cover_url: None,
    };
    queries::create_product(conn, seller_id, &input).expect("Failed to create test product")
}

/// Record a test sale directly (as if a webhook had been processed)
pub fn create_test_sale(
    conn: &Connection,
    product: &Product,
    method: PaymentMethod,
    gateway_payment_id: &str,
) -> Sale {
    let input = CreateSale {
        product_id: product.id.clone(),
        seller_id: product.seller_id.clone(),
        buyer_email: "buyer@example.com".to_string(),
        buyer_name: Some("Test Buyer".to_string()),
        amount_cents: 990,
        currency: Currency::Usd,
        payment_method: method,
        gateway_payment_id: gateway_payment_id.to_string(),
    };
    queries::try_create_sale(conn, &input, DEFAULT_COMMISSION_RATE)
        .expect("Failed to create test sale")
        .expect("Test sale collided with an existing gateway payment id")
}

/// Create a test admin, returning it together with the clear-text API key
pub fn create_test_admin(conn: &Connection, email: &str) -> (Admin, String) {
    let input = CreateAdmin {
        email: email.to_string(),
        name: "Test Admin".to_string(),
    };
    queries::create_admin(conn, &input).expect("Failed to create test admin")
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Compute a valid Stripe webhook signature header for a payload
pub fn stripe_signature_header(payload: &[u8], secret: &str) -> String {
    let timestamp = now().to_string();
    let signature = compute_stripe_signature(payload, secret, &timestamp);
    format!("t={},v1={}", timestamp, signature)
}

pub fn compute_stripe_signature(payload: &[u8], secret: &str, timestamp: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a `payment_intent.succeeded` webhook body for a product purchase
pub fn stripe_payment_intent_event(
    payment_intent_id: &str,
    product_id: &str,
    amount_cents: i64,
    currency: &str,
    buyer_email: &str,
) -> Vec<u8> {
    serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": payment_intent_id,
                "amount": amount_cents,
                "currency": currency,
                "status": "succeeded",
                "receipt_email": buyer_email,
                "metadata": {
                    "product_id": product_id,
                    "buyer_name": "Test Buyer"
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}
