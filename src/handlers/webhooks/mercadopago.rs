use axum::extract::State;

use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::payments::{MercadoPagoNotification, PaymentMethod, ProductReference};

use super::common::{ack, fulfill, parse_gateway_currency, PaymentConfirmation, WebhookAck};

/// Axum handler for MercadoPago webhooks.
///
/// MercadoPago doesn't sign notifications, so the body is only trusted for
/// the payment id: amounts, status, and buyer details come from a
/// server-to-server fetch of the payment. Non-payment notification types
/// and non-approved payments are acknowledged as no-ops.
pub async fn handle_mercadopago_webhook(
    State(state): State<AppState>,
    Json(notification): Json<MercadoPagoNotification>,
) -> Result<Json<WebhookAck>> {
    if notification.kind != "payment" {
        tracing::debug!(kind = %notification.kind, "Ignoring MercadoPago notification");
        return Ok(ack());
    }

    let payment_id = notification
        .data
        .id_string()
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_PAYMENT_ID.into()))?;

    // Authoritative details come from the gateway, never the notification.
    let payment = state.mercadopago.get_payment(&payment_id).await?;

    if payment.status != "approved" {
        tracing::info!(
            payment_id = %payment.id,
            status = %payment.status,
            "MercadoPago payment not approved, acknowledging without sale"
        );
        return Ok(ack());
    }

    let reference = payment
        .external_reference
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_PRODUCT_REFERENCE.into()))?;
    let product_ref = ProductReference::parse(reference)?;

    let buyer_name = payment.payer.as_ref().and_then(|p| p.full_name());
    let buyer_email = payment
        .payer
        .as_ref()
        .and_then(|p| p.email.clone())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_BUYER_EMAIL.into()))?;

    let currency = parse_gateway_currency(&payment.currency_id)?;
    let amount_cents = payment.amount_cents();

    fulfill(
        &state,
        PaymentConfirmation {
            method: PaymentMethod::MercadoPago,
            gateway_payment_id: payment.id.to_string(),
            product_id: product_ref.product_id,
            buyer_email,
            buyer_name,
            amount_cents,
            currency,
        },
    )
    .await
}
