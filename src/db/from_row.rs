//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, store_slug, created_at, updated_at";

pub const PRODUCT_COLS: &str = "id, seller_id, title, description, price_brl_cents, price_usd_cents, file_url, cover_url, active, created_at, updated_at";

pub const SALE_COLS: &str = "id, product_id, seller_id, buyer_email, buyer_name, amount_cents, currency, payment_method, gateway_payment_id, commission_cents, status, notify_status, created_at";

pub const ADMIN_COLS: &str = "id, email, name, key_prefix, key_hash, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            store_slug: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            seller_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            price_brl_cents: row.get(4)?,
            price_usd_cents: row.get(5)?,
            file_url: row.get(6)?,
            cover_url: row.get(7)?,
            active: row.get::<_, i32>(8)? != 0,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for Sale {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Sale {
            id: row.get(0)?,
            product_id: row.get(1)?,
            seller_id: row.get(2)?,
            buyer_email: row.get(3)?,
            buyer_name: row.get(4)?,
            amount_cents: row.get(5)?,
            currency: parse_enum(row, 6, "currency")?,
            payment_method: parse_enum(row, 7, "payment_method")?,
            gateway_payment_id: row.get(8)?,
            commission_cents: row.get(9)?,
            status: parse_enum(row, 10, "status")?,
            notify_status: parse_enum(row, 11, "notify_status")?,
            created_at: row.get(12)?,
        })
    }
}

impl FromRow for Admin {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Admin {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            key_prefix: row.get(3)?,
            key_hash: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
