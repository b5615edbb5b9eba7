use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::commission;
use crate::crypto;
use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;
use crate::payments::PaymentMethod;

use super::from_row::{
    query_all, query_one, FromRow, ADMIN_COLS, PRODUCT_COLS, SALE_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users (sellers) ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let id = EntityType::User.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let store_slug = input.store_slug.trim().to_string();

    conn.execute(
        "INSERT INTO users (id, email, name, store_slug, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &email, &input.name, &store_slug, now, now],
    )?;

    Ok(User {
        id,
        email,
        name: input.name.clone(),
        store_slug,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn list_users_paginated(conn: &Connection, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            USER_COLS
        ),
        &[&limit, &offset],
    )?;
    Ok((items, total))
}

// ============ Products ============

pub fn create_product(conn: &Connection, seller_id: &str, input: &CreateProduct) -> Result<Product> {
    let id = EntityType::Product.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO products (id, seller_id, title, description, price_brl_cents, price_usd_cents, file_url, cover_url, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)",
        params![
            &id,
            seller_id,
            &input.title,
            &input.description,
            &input.price_brl_cents,
            &input.price_usd_cents,
            &input.file_url,
            &input.cover_url,
            now,
            now
        ],
    )?;

    Ok(Product {
        id,
        seller_id: seller_id.to_string(),
        title: input.title.clone(),
        description: input.description.clone(),
        price_brl_cents: input.price_brl_cents,
        price_usd_cents: input.price_usd_cents,
        file_url: input.file_url.clone(),
        cover_url: input.cover_url.clone(),
        active: true,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn list_products_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Product>, i64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM products ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            PRODUCT_COLS
        ),
        &[&limit, &offset],
    )?;
    Ok((items, total))
}

/// Replace a product's deliverable file. Previously issued download tokens
/// become stale (their embedded file_url no longer matches).
pub fn update_product_file_url(conn: &Connection, id: &str, file_url: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE products SET file_url = ?1, updated_at = ?2 WHERE id = ?3",
        params![file_url, now(), id],
    )?;
    Ok(affected > 0)
}

pub fn set_product_active(conn: &Connection, id: &str, active: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE products SET active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active as i32, now(), id],
    )?;
    Ok(affected > 0)
}

// ============ Sales ============

/// Record a confirmed payment exactly once.
///
/// Status is fixed to PAID (this pipeline only ever records successful
/// payments) and the commission is computed here. The UNIQUE constraint on
/// (payment_method, gateway_payment_id) turns a redelivered webhook into a
/// no-op: `Ok(None)` means "already processed - acknowledge, don't fulfill
/// again".
pub fn try_create_sale(
    conn: &Connection,
    input: &CreateSale,
    commission_rate: f64,
) -> Result<Option<Sale>> {
    let id = EntityType::Sale.gen_id();
    let now = now();
    let commission_cents = commission::commission_cents(input.amount_cents, commission_rate);

    conn.query_row(
        &format!(
            "INSERT INTO sales (id, product_id, seller_id, buyer_email, buyer_name, amount_cents, currency, payment_method, gateway_payment_id, commission_cents, status, notify_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'PAID', 'pending_notify', ?11)
             ON CONFLICT(payment_method, gateway_payment_id) DO NOTHING
             RETURNING {}",
            SALE_COLS
        ),
        params![
            &id,
            &input.product_id,
            &input.seller_id,
            &input.buyer_email,
            &input.buyer_name,
            input.amount_cents,
            input.currency.as_str(),
            input.payment_method.as_str(),
            &input.gateway_payment_id,
            commission_cents,
            now
        ],
        Sale::from_row,
    )
    .optional()
    .map_err(Into::into)
}

pub fn get_sale_by_id(conn: &Connection, id: &str) -> Result<Option<Sale>> {
    query_one(
        conn,
        &format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLS),
        &[&id],
    )
}

pub fn get_sale_by_gateway_payment(
    conn: &Connection,
    payment_method: PaymentMethod,
    gateway_payment_id: &str,
) -> Result<Option<Sale>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM sales WHERE payment_method = ?1 AND gateway_payment_id = ?2",
            SALE_COLS
        ),
        &[&payment_method.as_str(), &gateway_payment_id],
    )
}

pub fn list_sales_paginated(conn: &Connection, limit: i64, offset: i64) -> Result<(Vec<Sale>, i64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM sales ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            SALE_COLS
        ),
        &[&limit, &offset],
    )?;
    Ok((items, total))
}

/// Sales still awaiting fulfillment emails, created before `cutoff`.
///
/// The cutoff keeps the sweep from racing the webhook handler that is
/// dispatching the same sale's emails right now.
pub fn list_pending_notify_sales(conn: &Connection, cutoff: i64) -> Result<Vec<Sale>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM sales WHERE notify_status = 'pending_notify' AND created_at <= ?1
             ORDER BY created_at ASC",
            SALE_COLS
        ),
        &[&cutoff],
    )
}

pub fn mark_sale_notified(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE sales SET notify_status = 'notified' WHERE id = ?1 AND notify_status = 'pending_notify'",
        params![id],
    )?;
    Ok(affected > 0)
}

/// Platform-wide revenue aggregates, grouped by currency.
pub fn sale_stats(conn: &Connection) -> Result<SaleStats> {
    let mut stmt = conn.prepare(
        "SELECT currency, COUNT(*), SUM(amount_cents), SUM(commission_cents)
         FROM sales WHERE status = 'PAID' GROUP BY currency ORDER BY currency",
    )?;

    let by_currency = stmt
        .query_map([], |row| {
            let currency: String = row.get(0)?;
            let sale_count: i64 = row.get(1)?;
            let gross_cents: i64 = row.get(2)?;
            let commission_cents: i64 = row.get(3)?;
            Ok((currency, sale_count, gross_cents, commission_cents))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|(currency, sale_count, gross_cents, commission_cents)| {
            let currency = currency.parse::<Currency>().ok()?;
            Some(CurrencyTotals {
                currency,
                sale_count,
                gross_cents,
                commission_cents,
                net_cents: gross_cents - commission_cents,
            })
        })
        .collect::<Vec<_>>();

    let total_sales = by_currency.iter().map(|c| c.sale_count).sum();

    Ok(SaleStats {
        by_currency,
        total_sales,
    })
}

// ============ Admins ============

/// Create an admin and return it together with the clear-text API key.
/// The key is shown once; only its hash is stored.
pub fn create_admin(conn: &Connection, input: &CreateAdmin) -> Result<(Admin, String)> {
    let id = EntityType::Admin.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let api_key = crypto::generate_api_key();
    let key_prefix = crypto::key_prefix(&api_key);
    let key_hash = crypto::hash_api_key(&api_key);

    conn.execute(
        "INSERT INTO admins (id, email, name, key_prefix, key_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &email, &input.name, &key_prefix, &key_hash, now],
    )?;

    Ok((
        Admin {
            id,
            email,
            name: input.name.clone(),
            key_prefix,
            key_hash,
            created_at: now,
        },
        api_key,
    ))
}

pub fn get_admin_by_key_hash(conn: &Connection, key_hash: &str) -> Result<Option<Admin>> {
    query_one(
        conn,
        &format!("SELECT {} FROM admins WHERE key_hash = ?1", ADMIN_COLS),
        &[&key_hash],
    )
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
        .map_err(Into::into)
}
