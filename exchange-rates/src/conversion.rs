//! The conversion engine: pure functions over a [`RateSnapshot`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;
use crate::snapshot::RateSnapshot;

/// Fraction digits of a converted amount.
pub const RESULT_SCALE: u32 = 2;

/// Fraction digits of a displayed unit rate.
pub const UNIT_RATE_SCALE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// A well-formed amount whose value or result does not fit in 28
    /// significant digits at the required scale.
    #[error("Amount out of range: {0:?}")]
    OutOfRange(String),

    #[error("Rate not available for {0}")]
    RateUnavailable(CurrencyCode),
}

/// Outcome of one conversion, already rounded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedAmount {
    /// The parsed input amount.
    pub amount: Decimal,
    /// Converted amount with exactly [`RESULT_SCALE`] fraction digits.
    pub value: Decimal,
    /// Unrounded rate applied to the amount (target per source unit).
    pub rate: Decimal,
    /// "1 source = N target" with exactly [`UNIT_RATE_SCALE`] digits.
    pub unit_rate: Decimal,
}

impl fmt::Display for ConvertedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Parses a user-entered amount. Surrounding whitespace is ignored;
/// scientific notation is accepted.
///
/// Anything but an optionally signed decimal literal (digit separators,
/// `NaN`, `inf`) is an [`InvalidAmount`](ConversionError::InvalidAmount).
/// A literal beyond the 28-digit decimal range is
/// [`OutOfRange`](ConversionError::OutOfRange).
pub fn parse_amount(amount: &str) -> Result<Decimal, ConversionError> {
    let trimmed = amount.trim();
    if !is_decimal_literal(trimmed) {
        return Err(ConversionError::InvalidAmount(amount.to_string()));
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ConversionError::OutOfRange(amount.to_string()))
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with digits on at least one
/// side of the point.
fn is_decimal_literal(s: &str) -> bool {
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (int.is_empty() && frac.is_empty()) || !all_digits(int) || !all_digits(frac) {
        return false;
    }

    match exponent {
        None => true,
        Some(exponent) => {
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            !digits.is_empty() && all_digits(digits)
        }
    }
}

/// Converts an amount expressed in the snapshot's base currency.
pub fn convert(
    amount: &str,
    snapshot: &RateSnapshot,
    to: &CurrencyCode,
) -> Result<ConvertedAmount, ConversionError> {
    let parsed = parse_amount(amount)?;
    let rate = snapshot
        .rate(to)
        .ok_or_else(|| ConversionError::RateUnavailable(to.clone()))?;
    apply(parsed, rate, amount)
}

/// Converts between two arbitrary codes by cross-rating through the base:
/// `amount * rate(to) / rate(from)`.
///
/// Identical to [`convert`] when `from` is the snapshot's base.
pub fn convert_between(
    amount: &str,
    snapshot: &RateSnapshot,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<ConvertedAmount, ConversionError> {
    let parsed = parse_amount(amount)?;
    let rate = cross_rate(snapshot, from, to)?;
    apply(parsed, rate, amount)
}

fn cross_rate(
    snapshot: &RateSnapshot,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<Decimal, ConversionError> {
    let to_rate = snapshot
        .rate(to)
        .ok_or_else(|| ConversionError::RateUnavailable(to.clone()))?;
    if from == snapshot.base_currency() {
        return Ok(to_rate);
    }
    let from_rate = snapshot
        .rate(from)
        .ok_or_else(|| ConversionError::RateUnavailable(from.clone()))?;
    // Both rates are positive, so the division cannot fail on zero.
    to_rate
        .checked_div(from_rate)
        .ok_or_else(|| ConversionError::RateUnavailable(to.clone()))
}

fn apply(amount: Decimal, rate: Decimal, raw: &str) -> Result<ConvertedAmount, ConversionError> {
    let out_of_range = || ConversionError::OutOfRange(raw.to_string());

    let product = amount.checked_mul(rate).ok_or_else(out_of_range)?;
    Ok(ConvertedAmount {
        amount,
        value: round_half_up(product, RESULT_SCALE).ok_or_else(out_of_range)?,
        rate,
        unit_rate: round_half_up(rate, UNIT_RATE_SCALE).ok_or_else(out_of_range)?,
    })
}

/// Rounds midpoints away from zero and pads to exactly `scale` digits.
///
/// Returns `None` when the value is too large to carry `scale` fraction
/// digits.
pub fn round_half_up(value: Decimal, scale: u32) -> Option<Decimal> {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    (rounded.scale() == scale).then_some(rounded)
}
