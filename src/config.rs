use std::env;

use crate::payments::{MercadoPagoConfig, StripeConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public base URL used to build download links embedded in emails.
    pub base_url: String,
    pub stripe: StripeConfig,
    pub mercadopago: MercadoPagoConfig,
    pub download_token_secret: String,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("BUBASTORE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "bubastore.db".to_string()),
            base_url,
            stripe: StripeConfig {
                secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            },
            mercadopago: MercadoPagoConfig {
                access_token: env::var("MERCADOPAGO_ACCESS_TOKEN").unwrap_or_default(),
            },
            download_token_secret: env::var("DOWNLOAD_TOKEN_SECRET")
                .unwrap_or_else(|_| "dev-download-token-secret".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "BubaStore <noreply@bubastore.app>".to_string()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
