use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Currency, Product};
use crate::payments::ProductReference;

const MERCADOPAGO_API_URL: &str = "https://api.mercadopago.com";

#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
struct CreatePreferenceRequest<'a> {
    items: Vec<PreferenceItem<'a>>,
    external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<PreferencePayer<'a>>,
}

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    title: &'a str,
    quantity: u32,
    /// Decimal price, as MercadoPago expects (not cents).
    unit_price: f64,
    currency_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PreferencePayer<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePreferenceResponse {
    id: String,
    init_point: String,
}

/// MercadoPago does not sign its webhook notifications. The defense against
/// forged payloads is to never trust the notification body: the handler only
/// takes the payment id from it and fetches the authoritative payment record
/// server-to-server with `get_payment`.
#[derive(Debug, Clone)]
pub struct MercadoPagoClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl MercadoPagoClient {
    pub fn new(config: &MercadoPagoConfig) -> Self {
        Self {
            client: Client::new(),
            access_token: config.access_token.clone(),
            base_url: MERCADOPAGO_API_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests to point at a local stub).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Create a checkout preference for a product purchase.
    ///
    /// The structured product reference travels in `external_reference`;
    /// the webhook handler parses it back out of the fetched payment.
    pub async fn create_preference(
        &self,
        product: &Product,
        amount_cents: i64,
        currency: Currency,
        buyer_email: Option<&str>,
    ) -> Result<(String, String)> {
        let request = CreatePreferenceRequest {
            items: vec![PreferenceItem {
                title: &product.title,
                quantity: 1,
                unit_price: amount_cents as f64 / 100.0,
                currency_id: currency.code(),
            }],
            external_reference: ProductReference::new(&product.id).encode(),
            payer: buyer_email.map(|email| PreferencePayer { email }),
        };

        let response = self
            .client
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("MercadoPago API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "MercadoPago API error: {}",
                error_text
            )));
        }

        let preference: CreatePreferenceResponse = response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse MercadoPago response: {}", e))
        })?;

        Ok((preference.id, preference.init_point))
    }

    /// Fetch authoritative payment details by id.
    ///
    /// Failures map to `GatewayFetchFailed` (502) so the gateway retries the
    /// webhook rather than dropping the notification.
    pub async fn get_payment(&self, payment_id: &str) -> Result<MercadoPagoPayment> {
        let response = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::GatewayFetchFailed(format!("MercadoPago: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::GatewayFetchFailed(format!(
                "MercadoPago returned {} for payment {}",
                response.status(),
                payment_id
            )));
        }

        response.json().await.map_err(|e| {
            AppError::GatewayFetchFailed(format!("Failed to parse MercadoPago payment: {}", e))
        })
    }
}

/// Inbound webhook notification body: `{"type": "payment", "data": {"id": ...}}`
#[derive(Debug, Deserialize)]
pub struct MercadoPagoNotification {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: MercadoPagoNotificationData,
}

#[derive(Debug, Default, Deserialize)]
pub struct MercadoPagoNotificationData {
    /// MercadoPago sends the id as a string or a number depending on the
    /// notification version; accept both.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl MercadoPagoNotificationData {
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Payment record as fetched from the MercadoPago API.
#[derive(Debug, Deserialize)]
pub struct MercadoPagoPayment {
    pub id: i64,
    pub status: String,
    /// Decimal amount (e.g., 49.90), not cents.
    pub transaction_amount: f64,
    pub currency_id: String,
    pub external_reference: Option<String>,
    pub payer: Option<MercadoPagoPayer>,
}

impl MercadoPagoPayment {
    /// Charge amount in integer cents.
    pub fn amount_cents(&self) -> i64 {
        (self.transaction_amount * 100.0).round() as i64
    }
}

#[derive(Debug, Deserialize)]
pub struct MercadoPagoPayer {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl MercadoPagoPayer {
    /// Buyer display name, if the gateway reported one.
    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.to_string()),
            (None, Some(last)) => Some(last.to_string()),
            (None, None) => None,
        }
    }
}
