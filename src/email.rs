//! Fulfillment email delivery via the Resend API.
//!
//! Two templated emails go out per sale: the buyer confirmation carrying the
//! download link, and the seller notification with the commission breakdown.
//! Transient API failures (network, 429, 5xx) retry with exponential
//! backoff; a missing API key downgrades to a logged no-op so development
//! environments work without credentials.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::commission::net_cents;
use crate::error::{AppError, Result};
use crate::models::Currency;
use crate::token::DOWNLOAD_TOKEN_TTL_HOURS;

/// Retry delays in seconds (exponential backoff: 1s, 4s, 16s)
const RETRY_DELAYS: &[u64] = &[1, 4, 16];

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Format an amount in cents for display in emails.
/// BRL uses the Brazilian convention (comma decimal separator).
pub fn format_money(amount_cents: i64, currency: Currency) -> String {
    let units = amount_cents / 100;
    let cents = (amount_cents % 100).abs();
    match currency {
        Currency::Brl => format!("R$ {},{:02}", units, cents),
        Currency::Usd => format!("${}.{:02}", units, cents),
    }
}

/// Result of attempting to send a fulfillment email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSendResult {
    /// Email was sent successfully via Resend
    Sent,
    /// No API key configured - logged and skipped
    Skipped,
}

/// Everything needed to render the buyer confirmation email.
pub struct BuyerEmail<'a> {
    pub to_email: &'a str,
    pub buyer_name: Option<&'a str>,
    pub product_title: &'a str,
    pub seller_name: &'a str,
    pub download_url: &'a str,
}

/// Everything needed to render the seller sale notification.
pub struct SellerEmail<'a> {
    pub to_email: &'a str,
    pub seller_name: &'a str,
    pub product_title: &'a str,
    pub amount_cents: i64,
    pub commission_cents: i64,
    pub currency: Currency,
}

/// Resend API request body.
#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    text: String,
    html: String,
}

/// Resend API response.
#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    #[allow(dead_code)]
    id: String,
}

/// Email service using the Resend API.
pub struct EmailService {
    api_key: Option<String>,
    from_email: String,
    http_client: Client,
}

impl EmailService {
    pub fn new(api_key: Option<String>, from_email: String) -> Self {
        Self {
            api_key,
            from_email,
            http_client: Client::new(),
        }
    }

    /// Send the buyer confirmation with the download link.
    pub async fn send_buyer_confirmation(&self, email: BuyerEmail<'_>) -> Result<EmailSendResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(
                to = %email.to_email,
                "No Resend API key configured, skipping buyer confirmation email"
            );
            return Ok(EmailSendResult::Skipped);
        };

        let subject = format!("Your purchase: {}", email.product_title);
        let greeting = email
            .buyer_name
            .map(|n| format!("Hi {},", n))
            .unwrap_or_else(|| "Hi,".to_string());

        let text = format!(
            "{}\n\nThanks for buying {} from {}.\n\nDownload your file here:\n{}\n\nThis link is valid for {} hours. If it expires, reply to this email and the seller will send you a fresh one.\n\nEnjoy!",
            greeting,
            email.product_title,
            email.seller_name,
            email.download_url,
            DOWNLOAD_TOKEN_TTL_HOURS
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
<h2 style="color: #333;">Your purchase: {}</h2>
<p>{}</p>
<p>Thanks for buying <strong>{}</strong> from {}.</p>
<div style="text-align: center; margin: 30px 0;">
<a href="{}" style="background: #7c3aed; color: #fff; padding: 14px 28px; border-radius: 8px; text-decoration: none; font-weight: bold;">Download your file</a>
</div>
<p style="color: #666;">This link is valid for {} hours. If it expires, reply to this email and the seller will send you a fresh one.</p>
<hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
<p style="color: #999; font-size: 12px;">Sold via BubaStore.</p>
</body>
</html>"#,
            email.product_title,
            greeting,
            email.product_title,
            email.seller_name,
            email.download_url,
            DOWNLOAD_TOKEN_TTL_HOURS
        );

        let request = ResendEmailRequest {
            from: &self.from_email,
            to: vec![email.to_email],
            subject,
            text,
            html,
        };

        self.send_request_with_retry(api_key, &request, email.to_email)
            .await
    }

    /// Send the seller notification with the commission breakdown.
    pub async fn send_seller_notification(&self, email: SellerEmail<'_>) -> Result<EmailSendResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(
                to = %email.to_email,
                "No Resend API key configured, skipping seller notification email"
            );
            return Ok(EmailSendResult::Skipped);
        };

        let gross = format_money(email.amount_cents, email.currency);
        let fee = format_money(email.commission_cents, email.currency);
        let net = format_money(
            net_cents(email.amount_cents, email.commission_cents),
            email.currency,
        );

        let subject = format!("You made a sale: {}", email.product_title);
        let text = format!(
            "Hi {},\n\nYou just sold {}.\n\nSale amount: {}\nPlatform fee (5%): {}\nYou receive: {}\n\nThe buyer has received their download link.",
            email.seller_name, email.product_title, gross, fee, net
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
<h2 style="color: #333;">You made a sale!</h2>
<p>Hi {},</p>
<p>You just sold <strong>{}</strong>.</p>
<table style="width: 100%; border-collapse: collapse; margin: 20px 0;">
<tr><td style="padding: 8px 0; color: #666;">Sale amount</td><td style="padding: 8px 0; text-align: right;">{}</td></tr>
<tr><td style="padding: 8px 0; color: #666;">Platform fee (5%)</td><td style="padding: 8px 0; text-align: right;">-{}</td></tr>
<tr><td style="padding: 8px 0; font-weight: bold; border-top: 1px solid #eee;">You receive</td><td style="padding: 8px 0; text-align: right; font-weight: bold; border-top: 1px solid #eee;">{}</td></tr>
</table>
<p style="color: #666;">The buyer has received their download link.</p>
</body>
</html>"#,
            email.seller_name, email.product_title, gross, fee, net
        );

        let request = ResendEmailRequest {
            from: &self.from_email,
            to: vec![email.to_email],
            subject,
            text,
            html,
        };

        self.send_request_with_retry(api_key, &request, email.to_email)
            .await
    }

    /// Send a request to Resend with exponential backoff retry.
    ///
    /// Retries on transient errors (network issues, 5xx, 429 rate limit).
    /// Fails immediately on non-transient errors (4xx except 429).
    async fn send_request_with_retry(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
        to_email: &str,
    ) -> Result<EmailSendResult> {
        let mut last_error: Option<AppError> = None;

        for (attempt, delay_secs) in std::iter::once(&0u64).chain(RETRY_DELAYS).enumerate() {
            if *delay_secs > 0 {
                tracing::warn!(
                    attempt,
                    delay_secs,
                    "Retrying email send after transient failure"
                );
                tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
            }

            match self.send_resend_request(api_key, request).await {
                Ok(()) => {
                    tracing::info!(to = %to_email, attempt, "Email sent via Resend");
                    return Ok(EmailSendResult::Sent);
                }
                Err((error, is_transient)) => {
                    if is_transient {
                        last_error = Some(error);
                    } else {
                        return Err(error);
                    }
                }
            }
        }

        tracing::error!(
            to = %to_email,
            attempts = RETRY_DELAYS.len() + 1,
            "Email send failed after all retries"
        );
        Err(last_error.unwrap_or_else(|| {
            AppError::Internal("Email service error: all retries exhausted".into())
        }))
    }

    /// Send a single request to the Resend API.
    ///
    /// Returns Ok(()) on success, or Err((AppError, is_transient)) on failure.
    async fn send_resend_request(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
    ) -> std::result::Result<(), (AppError, bool)> {
        let response = self
            .http_client
            .post(RESEND_API_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send request to Resend API");
                // Network errors are transient
                (
                    AppError::Internal(format!("Email service error: {}", e)),
                    true,
                )
            })?;

        let status = response.status();

        if status.is_success() {
            let _result: ResendEmailResponse = response.json().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to parse Resend API response");
                (AppError::Internal("Email service response error".into()), false)
            })?;
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();

            let is_transient = status.as_u16() == 429 // Rate limited
                || status.is_server_error(); // 5xx errors

            if is_transient {
                tracing::warn!(status = %status, body = %body, "Resend API returned transient error");
            } else {
                tracing::error!(status = %status, body = %body, "Resend API returned non-transient error");
            }

            Err((
                AppError::Internal(format!("Email service error: {} - {}", status, body)),
                is_transient,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_brl() {
        assert_eq!(format_money(4990, Currency::Brl), "R$ 49,90");
        assert_eq!(format_money(5, Currency::Brl), "R$ 0,05");
        assert_eq!(format_money(100, Currency::Brl), "R$ 1,00");
    }

    #[test]
    fn test_format_money_usd() {
        assert_eq!(format_money(990, Currency::Usd), "$9.90");
        assert_eq!(format_money(50, Currency::Usd), "$0.50");
        assert_eq!(format_money(10000, Currency::Usd), "$100.00");
    }

    #[test]
    fn test_retry_delays_configuration() {
        assert_eq!(RETRY_DELAYS, &[1, 4, 16], "Exponential backoff: 1s, 4s, 16s");
        let total_delay: u64 = RETRY_DELAYS.iter().sum();
        assert_eq!(total_delay, 21);
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_send() {
        let service = EmailService::new(None, "test@bubastore.dev".to_string());

        let result = service
            .send_buyer_confirmation(BuyerEmail {
                to_email: "buyer@example.com",
                buyer_name: Some("Buyer"),
                product_title: "Ebook",
                seller_name: "Seller",
                download_url: "http://localhost:3000/api/download/abc",
            })
            .await
            .unwrap();

        assert_eq!(result, EmailSendResult::Skipped);
    }
}
