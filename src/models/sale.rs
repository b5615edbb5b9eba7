use serde::{Deserialize, Serialize};

use crate::payments::PaymentMethod;

/// Currencies the platform sells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Brl,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brl => "brl",
            Self::Usd => "usd",
        }
    }

    /// ISO 4217 code, as the gateways report it.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Brl => "BRL",
            Self::Usd => "USD",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brl" => Ok(Self::Brl),
            "usd" => Ok(Self::Usd),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment outcome recorded on a sale. The webhook pipeline only ever
/// writes `Paid`; the other states exist for refund/admin tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Pending => "PENDING",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAID" => Ok(Self::Paid),
            "PENDING" => Ok(Self::Pending),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(()),
        }
    }
}

/// Outbox state for fulfillment emails. A sale is created `PendingNotify`
/// and flipped to `Notified` once both emails went out; the background
/// sweep retries anything left pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyStatus {
    PendingNotify,
    Notified,
}

impl NotifyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingNotify => "pending_notify",
            Self::Notified => "notified",
        }
    }
}

impl std::str::FromStr for NotifyStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_notify" => Ok(Self::PendingNotify),
            "notified" => Ok(Self::Notified),
            _ => Err(()),
        }
    }
}

/// Immutable record of one completed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub seller_id: String,
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    pub amount_cents: i64,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    /// The gateway's unique payment id (Stripe payment intent,
    /// MercadoPago payment id). UNIQUE together with payment_method.
    pub gateway_payment_id: String,
    pub commission_cents: i64,
    pub status: SaleStatus,
    pub notify_status: NotifyStatus,
    pub created_at: i64,
}

/// Data required to record a new sale. Status is fixed to PAID and the
/// commission is computed at insert time.
#[derive(Debug, Clone)]
pub struct CreateSale {
    pub product_id: String,
    pub seller_id: String,
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    pub amount_cents: i64,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub gateway_payment_id: String,
}

/// Revenue aggregates for a single currency (amounts cannot be summed
/// across currencies).
#[derive(Debug, Clone, Serialize)]
pub struct CurrencyTotals {
    pub currency: Currency,
    pub sale_count: i64,
    pub gross_cents: i64,
    pub commission_cents: i64,
    pub net_cents: i64,
}

/// Platform-wide sales statistics, grouped by currency.
#[derive(Debug, Clone, Serialize)]
pub struct SaleStats {
    pub by_currency: Vec<CurrencyTotals>,
    pub total_sales: i64,
}
