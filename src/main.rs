use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bubastore::commission::DEFAULT_COMMISSION_RATE;
use bubastore::config::Config;
use bubastore::db::{create_pool, init_db, queries, AppState};
use bubastore::email::EmailService;
use bubastore::handlers;
use bubastore::handlers::webhooks::common::dispatch_sale_notifications;
use bubastore::models::{CreateAdmin, CreateProduct, CreateUser};
use bubastore::payments::{MercadoPagoClient, StripeClient};
use bubastore::token::DownloadTokens;

#[derive(Parser, Debug)]
#[command(name = "bubastore")]
#[command(about = "Multi-tenant storefront payments backend")]
struct Cli {
    /// Seed the database with dev data (seller, product, admin key)
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with dev data for testing.
/// Creates a seller, a product, and an admin with an API key.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let admin_count = queries::count_admins(&conn).expect("Failed to count admins");
    if admin_count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let seller = queries::create_user(
        &conn,
        &CreateUser {
            email: "seller@bubastore.local".to_string(),
            name: "Dev Seller".to_string(),
            store_slug: "dev-seller".to_string(),
        },
    )
    .expect("Failed to create dev seller");
    tracing::info!("Seller: {} ({})", seller.email, seller.id);

    let product = queries::create_product(
        &conn,
        &seller.id,
        &CreateProduct {
            title: "Sample Ebook".to_string(),
            description: Some("A sample digital product".to_string()),
            price_brl_cents: Some(4990),
            price_usd_cents: Some(990),
            file_url: "https://files.bubastore.local/sample-ebook.pdf".to_string(),
            cover_url: None,
        },
    )
    .expect("Failed to create dev product");
    tracing::info!("Product: {} ({})", product.title, product.id);

    let (admin, admin_api_key) = queries::create_admin(
        &conn,
        &CreateAdmin {
            email: "admin@bubastore.local".to_string(),
            name: "Dev Admin".to_string(),
        },
    )
    .expect("Failed to create dev admin");
    tracing::info!("Admin: {} ({})", admin.email, admin.id);

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Print copy-paste friendly output (no log formatting)
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  admin_api_key: {}", admin_api_key);
    println!("  seller_id: {}", seller.id);
    println!("  product_id: {}", product.id);
    println!("--- END COPY ---");
    println!();
}

/// Spawns the fulfillment outbox sweep.
///
/// Every 5 minutes, re-sends emails for sales still in `pending_notify`
/// (crash or email failure between sale-creation and dispatch). The
/// 2-minute grace period keeps the sweep off sales a webhook handler is
/// fulfilling right now.
fn spawn_notify_sweep(state: AppState) {
    const SWEEP_INTERVAL_SECS: u64 = 5 * 60;
    const GRACE_PERIOD_SECS: i64 = 120;

    tokio::spawn(async move {
        let interval = Duration::from_secs(SWEEP_INTERVAL_SECS);

        loop {
            tokio::time::sleep(interval).await;

            let cutoff = chrono::Utc::now().timestamp() - GRACE_PERIOD_SECS;
            let pending = {
                let conn = match state.db.get() {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("Notify sweep: failed to get db connection: {}", e);
                        continue;
                    }
                };
                match queries::list_pending_notify_sales(&conn, cutoff) {
                    Ok(sales) => sales,
                    Err(e) => {
                        tracing::warn!("Notify sweep: failed to list pending sales: {}", e);
                        continue;
                    }
                }
            };

            if pending.is_empty() {
                continue;
            }

            tracing::info!("Notify sweep: retrying {} unfulfilled sale(s)", pending.len());

            for sale in pending {
                let (product, seller) = {
                    let conn = match state.db.get() {
                        Ok(c) => c,
                        Err(e) => {
                            tracing::warn!("Notify sweep: failed to get db connection: {}", e);
                            break;
                        }
                    };
                    let product = match queries::get_product_by_id(&conn, &sale.product_id) {
                        Ok(Some(p)) => p,
                        Ok(None) => {
                            tracing::warn!(
                                sale_id = %sale.id,
                                "Notify sweep: product deleted, cannot fulfill"
                            );
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!("Notify sweep: product lookup failed: {}", e);
                            continue;
                        }
                    };
                    let seller = match queries::get_user_by_id(&conn, &sale.seller_id) {
                        Ok(Some(u)) => u,
                        Ok(None) => {
                            tracing::warn!(
                                sale_id = %sale.id,
                                "Notify sweep: seller missing, cannot fulfill"
                            );
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!("Notify sweep: seller lookup failed: {}", e);
                            continue;
                        }
                    };
                    (product, seller)
                };

                match dispatch_sale_notifications(&state, &sale, &product, &seller).await {
                    Ok(()) => {
                        if let Ok(conn) = state.db.get() {
                            if let Err(e) = queries::mark_sale_notified(&conn, &sale.id) {
                                tracing::warn!("Notify sweep: failed to mark notified: {}", e);
                            } else {
                                tracing::info!(sale_id = %sale.id, "Notify sweep: fulfillment emails sent");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            sale_id = %sale.id,
                            error = %e,
                            "Notify sweep: emails failed again, will retry next sweep"
                        );
                    }
                }
            }
        }
    });

    tracing::info!("Fulfillment notify sweep started (runs every 5 minutes)");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bubastore=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database pool and initialize schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    // Gateway and email clients are built once here and injected - no
    // ambient SDK singletons anywhere in the codebase.
    let state = AppState {
        db: db_pool,
        base_url: config.base_url.clone(),
        stripe: StripeClient::new(&config.stripe),
        mercadopago: MercadoPagoClient::new(&config.mercadopago),
        email: Arc::new(EmailService::new(
            config.resend_api_key.clone(),
            config.email_from.clone(),
        )),
        download_tokens: DownloadTokens::new(&config.download_token_secret),
        http_client: reqwest::Client::new(),
        commission_rate: DEFAULT_COMMISSION_RATE,
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set BUBASTORE_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Retry fulfillment emails for sales left pending by a crash
    spawn_notify_sweep(state.clone());

    // Build the application router
    let app = Router::new()
        .merge(handlers::public::router())
        .merge(handlers::webhooks::router())
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("BubaStore server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
