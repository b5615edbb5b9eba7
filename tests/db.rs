//! Query-level tests: sale idempotency, the notify outbox, and lookups.

mod common;

use common::*;

fn sample_create_sale(product: &Product, gateway_payment_id: &str) -> CreateSale {
    CreateSale {
        product_id: product.id.clone(),
        seller_id: product.seller_id.clone(),
        buyer_email: "buyer@example.com".to_string(),
        buyer_name: None,
        amount_cents: 990,
        currency: Currency::Usd,
        payment_method: PaymentMethod::Stripe,
        gateway_payment_id: gateway_payment_id.to_string(),
    }
}

#[test]
fn test_try_create_sale_computes_commission_and_status() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/e.pdf");

    let sale = queries::try_create_sale(
        &conn,
        &sample_create_sale(&product, "pi_1"),
        DEFAULT_COMMISSION_RATE,
    )
    .unwrap()
    .expect("First insert should create the sale");

    assert_eq!(sale.status, SaleStatus::Paid);
    assert_eq!(sale.notify_status, NotifyStatus::PendingNotify);
    assert_eq!(sale.commission_cents, 50);
    assert!(sale.id.starts_with("bs_sale_"));
}

#[test]
fn test_try_create_sale_is_idempotent_per_gateway_payment() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/e.pdf");

    let first = queries::try_create_sale(
        &conn,
        &sample_create_sale(&product, "pi_same"),
        DEFAULT_COMMISSION_RATE,
    )
    .unwrap();
    assert!(first.is_some());

    // Same (payment_method, gateway_payment_id) - conflict, no new row
    let second = queries::try_create_sale(
        &conn,
        &sample_create_sale(&product, "pi_same"),
        DEFAULT_COMMISSION_RATE,
    )
    .unwrap();
    assert!(second.is_none(), "Duplicate delivery must return None");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_same_payment_id_across_gateways_is_not_a_conflict() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/e.pdf");

    let stripe = queries::try_create_sale(
        &conn,
        &sample_create_sale(&product, "12345"),
        DEFAULT_COMMISSION_RATE,
    )
    .unwrap();
    assert!(stripe.is_some());

    let mut mp_input = sample_create_sale(&product, "12345");
    mp_input.payment_method = PaymentMethod::MercadoPago;
    let mercadopago = queries::try_create_sale(&conn, &mp_input, DEFAULT_COMMISSION_RATE).unwrap();
    assert!(
        mercadopago.is_some(),
        "Uniqueness is per (payment_method, gateway_payment_id)"
    );
}

#[test]
fn test_get_sale_by_gateway_payment() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/e.pdf");
    let created = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_lookup");

    let found = queries::get_sale_by_gateway_payment(&conn, PaymentMethod::Stripe, "pi_lookup")
        .unwrap()
        .expect("Sale should be found");
    assert_eq!(found.id, created.id);

    let missing =
        queries::get_sale_by_gateway_payment(&conn, PaymentMethod::MercadoPago, "pi_lookup")
            .unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_notify_outbox_lifecycle() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/e.pdf");
    let sale = create_test_sale(&conn, &product, PaymentMethod::Stripe, "pi_outbox");

    // Fresh sales are pending and picked up once past the cutoff
    let pending = queries::list_pending_notify_sales(&conn, now() + 1).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, sale.id);

    // A cutoff in the past (grace period) hides just-created sales
    let pending = queries::list_pending_notify_sales(&conn, now() - 3600).unwrap();
    assert!(pending.is_empty());

    // Marking notified removes the sale from the outbox
    assert!(queries::mark_sale_notified(&conn, &sale.id).unwrap());
    let pending = queries::list_pending_notify_sales(&conn, now() + 1).unwrap();
    assert!(pending.is_empty());

    // Second mark is a no-op
    assert!(!queries::mark_sale_notified(&conn, &sale.id).unwrap());

    let reloaded = queries::get_sale_by_id(&conn, &sale.id).unwrap().unwrap();
    assert_eq!(reloaded.notify_status, NotifyStatus::Notified);
}

#[test]
fn test_update_product_file_url() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/v1.pdf");

    assert!(
        queries::update_product_file_url(&conn, &product.id, "https://f.example.com/v2.pdf")
            .unwrap()
    );

    let reloaded = queries::get_product_by_id(&conn, &product.id).unwrap().unwrap();
    assert_eq!(reloaded.file_url, "https://f.example.com/v2.pdf");

    assert!(!queries::update_product_file_url(
        &conn,
        "bs_prod_ffffffffffffffffffffffffffffffff",
        "https://x"
    )
    .unwrap());
}

#[test]
fn test_duplicate_user_email_rejected() {
    let conn = setup_test_db();
    create_test_user(&conn, "dup@example.com", "loja-a");

    let result = queries::create_user(
        &conn,
        &CreateUser {
            email: "dup@example.com".to_string(),
            name: "Other".to_string(),
            store_slug: "loja-b".to_string(),
        },
    );
    assert!(result.is_err(), "Duplicate email must be rejected");
}

#[test]
fn test_product_price_per_currency() {
    let conn = setup_test_db();
    let seller = create_test_user(&conn, "s@example.com", "loja");
    let product = create_test_product(&conn, &seller.id, "Ebook", "https://f.example.com/e.pdf");

    assert_eq!(product.price_cents(Currency::Brl), Some(4990));
    assert_eq!(product.price_cents(Currency::Usd), Some(990));

    let usd_only = queries::create_product(
        &conn,
        &seller.id,
        &CreateProduct {
            title: "USD only".to_string(),
            description: None,
            price_brl_cents: None,
            price_usd_cents: Some(500),
            file_url: "https://f.example.com/u.pdf".to_string(),
            cover_url: None,
        },
    )
    .unwrap();
    assert_eq!(usd_only.price_cents(Currency::Brl), None);
}

#[test]
fn test_admin_key_hash_lookup() {
    let conn = setup_test_db();
    let (admin, api_key) = create_test_admin(&conn, "admin@example.com");

    let hash = bubastore::crypto::hash_api_key(&api_key);
    let found = queries::get_admin_by_key_hash(&conn, &hash).unwrap().unwrap();
    assert_eq!(found.id, admin.id);
    assert!(api_key.starts_with(&found.key_prefix));

    let wrong = queries::get_admin_by_key_hash(
        &conn,
        &bubastore::crypto::hash_api_key("bsk_not_the_key"),
    )
    .unwrap();
    assert!(wrong.is_none());
}
