//! Amount parsing and display helpers.
//!
//! Amounts are exact decimals everywhere inside the crate; rounding to two
//! places only happens in [`format_amount`].

use std::str::FromStr;

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::core::errors::ValidationError;

/// Number of fractional digits shown to users.
pub const DISPLAY_SCALE: u32 = 2;

/// Largest accepted amount, in whole units. Keeps every ledger total far from
/// the `Decimal` range so sums cannot overflow.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Parses user text into a strictly positive amount that survives the numeric
/// persisted form without loss.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidAmount(raw.to_string()));
    }
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if !within_limit(amount) || !survives_float_encoding(amount) {
        return Err(ValidationError::UnrepresentableAmount(trimmed.to_string()));
    }
    Ok(amount.normalize())
}

pub(crate) fn within_limit(amount: Decimal) -> bool {
    amount.abs() <= Decimal::from(MAX_AMOUNT_UNITS)
}

/// Snapshots store amounts as JSON numbers, so an accepted amount must map to
/// an `f64` whose shortest rendering parses back to the same decimal.
fn survives_float_encoding(amount: Decimal) -> bool {
    let Some(float) = amount.to_f64() else {
        return false;
    };
    if !float.is_finite() {
        return false;
    }
    Decimal::from_str(&float.to_string())
        .map(|decoded| decoded == amount)
        .unwrap_or(false)
}

/// Rounds half away from zero to [`DISPLAY_SCALE`] places.
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount with the configured currency symbol, e.g. `$1,250.00` or `-$40.10`.
pub fn format_amount(amount: Decimal, symbol: &str) -> String {
    let rounded = round_for_display(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}{symbol}{}.{fraction}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
