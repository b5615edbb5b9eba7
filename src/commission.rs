//! Platform commission calculation.
//!
//! All monetary amounts are integer cents; the commission is rounded to the
//! nearest cent, half away from zero.

/// Flat platform rate applied to every sale.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.05;

/// Compute the platform commission for a gross amount.
///
/// Pure function, no side effects. Negative or nonsensical amounts are not
/// guarded; callers only pass gateway-confirmed charge amounts.
pub fn commission_cents(amount_cents: i64, rate: f64) -> i64 {
    (amount_cents as f64 * rate).round() as i64
}

/// Net amount the seller receives after commission.
pub fn net_cents(amount_cents: i64, commission_cents: i64) -> i64 {
    amount_cents - commission_cents
}
