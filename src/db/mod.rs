mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::email::EmailService;
use crate::payments::{MercadoPagoClient, StripeClient};
use crate::token::DownloadTokens;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and injected collaborators.
///
/// Gateway and email clients are constructed once at startup and injected
/// here; nothing in the codebase reaches for an ambient SDK singleton.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Public base URL used to build download links embedded in emails.
    pub base_url: String,
    pub stripe: StripeClient,
    pub mercadopago: MercadoPagoClient,
    pub email: Arc<EmailService>,
    pub download_tokens: DownloadTokens,
    /// Shared HTTP client for streaming product files at redemption time.
    pub http_client: reqwest::Client,
    /// Platform commission rate applied to every sale.
    pub commission_rate: f64,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
