//! Gateway-agnostic fulfillment pipeline.
//!
//! Each webhook handler verifies and filters its gateway's notification,
//! then hands a `PaymentConfirmation` to `fulfill`, which walks the sale
//! through: SaleRecorded -> TokenIssued -> EmailsSent -> Acked.
//!
//! Sale creation is idempotent (UNIQUE on payment_method +
//! gateway_payment_id), so a redelivered webhook acknowledges without
//! creating a second sale or re-sending emails. Email dispatch is decoupled
//! through the notify_status outbox column: a sale whose emails failed stays
//! `pending_notify` and is retried by the background sweep, so the webhook
//! still acks 200 once the sale is durably recorded.

use serde::Serialize;

use crate::db::{queries, AppState};
use crate::email::{BuyerEmail, SellerEmail};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::{Currency, Product, Sale, User};
use crate::payments::PaymentMethod;

/// Acknowledgement body returned to the gateway.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

pub fn ack() -> Json<WebhookAck> {
    Json(WebhookAck { received: true })
}

/// A confirmed payment, normalized across gateways.
#[derive(Debug)]
pub struct PaymentConfirmation {
    pub method: PaymentMethod,
    /// The gateway's unique payment id (idempotency key together with method).
    pub gateway_payment_id: String,
    pub product_id: String,
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    pub amount_cents: i64,
    pub currency: Currency,
}

/// Record the sale and trigger fulfillment. Returns the gateway ack.
pub async fn fulfill(
    state: &AppState,
    confirmation: PaymentConfirmation,
) -> Result<Json<WebhookAck>> {
    let (sale, product, seller) = {
        let conn = state.db.get()?;

        let product = queries::get_product_by_id(&conn, &confirmation.product_id)?
            .or_not_found(msg::PRODUCT_NOT_FOUND)?;
        let seller = queries::get_user_by_id(&conn, &product.seller_id)?
            .or_not_found(msg::SELLER_NOT_FOUND)?;

        let sale = queries::try_create_sale(
            &conn,
            &crate::models::CreateSale {
                product_id: product.id.clone(),
                seller_id: seller.id.clone(),
                buyer_email: confirmation.buyer_email.clone(),
                buyer_name: confirmation.buyer_name.clone(),
                amount_cents: confirmation.amount_cents,
                currency: confirmation.currency,
                payment_method: confirmation.method,
                gateway_payment_id: confirmation.gateway_payment_id.clone(),
            },
            state.commission_rate,
        )?;

        let Some(sale) = sale else {
            // Redelivered webhook - the sale exists, emails already went out
            // (or the sweep owns them). Acknowledge and stop.
            tracing::info!(
                method = %confirmation.method,
                gateway_payment_id = %confirmation.gateway_payment_id,
                "Webhook already processed, acknowledging without fulfillment"
            );
            return Ok(ack());
        };

        (sale, product, seller)
    };

    tracing::info!(
        sale_id = %sale.id,
        product_id = %product.id,
        method = %sale.payment_method,
        amount_cents = sale.amount_cents,
        commission_cents = sale.commission_cents,
        "Sale recorded"
    );

    match dispatch_sale_notifications(state, &sale, &product, &seller).await {
        Ok(()) => {
            let conn = state.db.get()?;
            queries::mark_sale_notified(&conn, &sale.id)?;
        }
        Err(e) => {
            // Sale is durably recorded; the notify sweep retries the emails.
            // Still ack so the gateway doesn't redeliver (which would be a
            // no-op anyway thanks to the idempotency guard).
            tracing::warn!(
                sale_id = %sale.id,
                error = %e,
                "Fulfillment emails failed, sale left pending_notify for sweep"
            );
        }
    }

    Ok(ack())
}

/// Issue a fresh download token and send both fulfillment emails.
///
/// The two sends run concurrently and are awaited together; Ok means both
/// succeeded (or were skipped for lack of an API key). Also used by the
/// notify sweep to retry sales stuck in `pending_notify`.
pub async fn dispatch_sale_notifications(
    state: &AppState,
    sale: &Sale,
    product: &Product,
    seller: &User,
) -> Result<()> {
    let token = state.download_tokens.issue(sale, product)?;
    let download_url = format!("{}/api/download/{}", state.base_url, token);

    let buyer = state.email.send_buyer_confirmation(BuyerEmail {
        to_email: &sale.buyer_email,
        buyer_name: sale.buyer_name.as_deref(),
        product_title: &product.title,
        seller_name: &seller.name,
        download_url: &download_url,
    });

    let seller_note = state.email.send_seller_notification(SellerEmail {
        to_email: &seller.email,
        seller_name: &seller.name,
        product_title: &product.title,
        amount_cents: sale.amount_cents,
        commission_cents: sale.commission_cents,
        currency: sale.currency,
    });

    let (buyer_result, seller_result) = tokio::join!(buyer, seller_note);
    buyer_result?;
    seller_result?;

    Ok(())
}

/// Currency codes from gateways are free-form strings; anything outside
/// BRL/USD is a configuration error, not a buyer mistake.
pub fn parse_gateway_currency(raw: &str) -> Result<Currency> {
    raw.parse::<Currency>().map_err(|_| {
        AppError::BadRequest(format!("Unsupported payment currency: {:?}", raw))
    })
}
