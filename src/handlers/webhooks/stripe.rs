use axum::{body::Bytes, extract::State, http::HeaderMap};

use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::payments::{PaymentMethod, StripePaymentIntent, StripeWebhookEvent};

use super::common::{ack, fulfill, parse_gateway_currency, PaymentConfirmation, WebhookAck};

/// Axum handler for Stripe webhooks.
///
/// The body stays raw (`Bytes`) because the signature is computed over the
/// exact payload Stripe sent. Verification fails closed: missing or invalid
/// signatures are 400 and nothing is written.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SIGNATURE_HEADER.into()))?
        .to_str()
        .map_err(|_| AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()))?;

    if !state.stripe.verify_webhook_signature(&body, signature)? {
        tracing::warn!("Stripe webhook rejected: invalid signature");
        return Err(AppError::BadRequest(msg::INVALID_SIGNATURE.into()));
    }

    let event: StripeWebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to parse Stripe webhook: {}", e);
        AppError::BadRequest("Invalid JSON".into())
    })?;

    // Only successful payment intents create sales; everything else is
    // acknowledged as a no-op so Stripe stops redelivering.
    if event.event_type != "payment_intent.succeeded" {
        tracing::debug!(event_type = %event.event_type, "Ignoring Stripe event");
        return Ok(ack());
    }

    let intent: StripePaymentIntent =
        serde_json::from_value(event.data.object).map_err(|e| {
            tracing::error!("Failed to parse payment intent: {}", e);
            AppError::BadRequest("Invalid payment intent".into())
        })?;

    if intent.status != "succeeded" {
        return Ok(ack());
    }

    let product_id = intent
        .metadata
        .product_id
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_PRODUCT_REFERENCE.into()))?;

    let buyer_email = intent
        .metadata
        .buyer_email
        .or(intent.receipt_email)
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_BUYER_EMAIL.into()))?;

    let currency = parse_gateway_currency(&intent.currency)?;

    fulfill(
        &state,
        PaymentConfirmation {
            method: PaymentMethod::Stripe,
            gateway_payment_id: intent.id,
            product_id,
            buyer_email,
            buyer_name: intent.metadata.buyer_name,
            amount_cents: intent.amount,
            currency,
        },
    )
    .await
}
