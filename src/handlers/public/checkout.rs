//! Checkout initiation: creates the gateway-side payment object that later
//! confirms back through the webhooks.
//!
//! The product reference is attached here - Stripe carries it in payment
//! intent metadata, MercadoPago in the preference's external_reference - so
//! the webhook handlers can resolve product and seller without trusting
//! anything else in the notification.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::Currency;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub product_id: String,
    /// "brl" or "usd"
    pub currency: String,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StripeCheckoutResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount_cents: i64,
    pub currency: Currency,
}

#[derive(Debug, Serialize)]
pub struct MercadoPagoCheckoutResponse {
    pub preference_id: String,
    /// URL the buyer is redirected to for payment.
    pub init_point: String,
    pub amount_cents: i64,
    pub currency: Currency,
}

/// Validate the request and resolve the price the buyer will be charged.
fn resolve_checkout(
    state: &AppState,
    request: &CheckoutRequest,
) -> Result<(crate::models::Product, Currency, i64)> {
    let currency = request
        .currency
        .parse::<Currency>()
        .map_err(|_| AppError::BadRequest(msg::INVALID_CURRENCY.into()))?;

    let conn = state.db.get()?;
    let product = queries::get_product_by_id(&conn, &request.product_id)?
        .or_not_found(msg::PRODUCT_NOT_FOUND)?;

    if !product.active {
        return Err(AppError::BadRequest(msg::PRODUCT_INACTIVE.into()));
    }

    let amount_cents = product
        .price_cents(currency)
        .ok_or_else(|| AppError::BadRequest(msg::CURRENCY_NOT_AVAILABLE.into()))?;

    Ok((product, currency, amount_cents))
}

/// POST /api/checkout/stripe
pub async fn checkout_stripe(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<StripeCheckoutResponse>> {
    let (product, currency, amount_cents) = resolve_checkout(&state, &request)?;

    let (payment_intent_id, client_secret) = state
        .stripe
        .create_payment_intent(
            amount_cents,
            currency,
            &product.id,
            request.buyer_email.as_deref(),
            request.buyer_name.as_deref(),
        )
        .await?;

    tracing::info!(
        product_id = %product.id,
        payment_intent_id = %payment_intent_id,
        amount_cents,
        "Created Stripe payment intent"
    );

    Ok(Json(StripeCheckoutResponse {
        payment_intent_id,
        client_secret,
        amount_cents,
        currency,
    }))
}

/// POST /api/checkout/mercadopago
pub async fn checkout_mercadopago(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<MercadoPagoCheckoutResponse>> {
    let (product, currency, amount_cents) = resolve_checkout(&state, &request)?;

    let (preference_id, init_point) = state
        .mercadopago
        .create_preference(
            &product,
            amount_cents,
            currency,
            request.buyer_email.as_deref(),
        )
        .await?;

    tracing::info!(
        product_id = %product.id,
        preference_id = %preference_id,
        amount_cents,
        "Created MercadoPago preference"
    );

    Ok(Json(MercadoPagoCheckoutResponse {
        preference_id,
        init_point,
        amount_cents,
        currency,
    }))
}
