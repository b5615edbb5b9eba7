use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Sellers (creators with a public storefront page)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            store_slug TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- Digital products (priced in up to two currencies, one file each)
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            seller_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            price_brl_cents INTEGER,
            price_usd_cents INTEGER,
            file_url TEXT NOT NULL,
            cover_url TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            CHECK (price_brl_cents IS NOT NULL OR price_usd_cents IS NOT NULL)
        );
        CREATE INDEX IF NOT EXISTS idx_products_seller ON products(seller_id);
        CREATE INDEX IF NOT EXISTS idx_products_active ON products(id) WHERE active = 1;

        -- Sales (immutable; one row per confirmed gateway payment)
        -- UNIQUE(payment_method, gateway_payment_id) is the idempotency
        -- guard: a redelivered webhook conflicts instead of duplicating.
        -- notify_status is the fulfillment outbox column:
        -- pending_notify -> notified once both emails went out.
        CREATE TABLE IF NOT EXISTS sales (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id),
            seller_id TEXT NOT NULL REFERENCES users(id),
            buyer_email TEXT NOT NULL,
            buyer_name TEXT,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL CHECK (currency IN ('brl', 'usd')),
            payment_method TEXT NOT NULL CHECK (payment_method IN ('stripe', 'mercadopago')),
            gateway_payment_id TEXT NOT NULL,
            commission_cents INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('PAID', 'PENDING', 'FAILED', 'REFUNDED')),
            notify_status TEXT NOT NULL DEFAULT 'pending_notify'
                CHECK (notify_status IN ('pending_notify', 'notified')),
            created_at INTEGER NOT NULL,
            UNIQUE(payment_method, gateway_payment_id)
        );
        CREATE INDEX IF NOT EXISTS idx_sales_product ON sales(product_id);
        CREATE INDEX IF NOT EXISTS idx_sales_seller ON sales(seller_id);
        CREATE INDEX IF NOT EXISTS idx_sales_created ON sales(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_sales_pending_notify ON sales(created_at)
            WHERE notify_status = 'pending_notify';

        -- Platform operators (admin API read access)
        CREATE TABLE IF NOT EXISTS admins (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            key_prefix TEXT NOT NULL,
            key_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_admins_key_hash ON admins(key_hash);
        "#,
    )?;
    Ok(())
}
