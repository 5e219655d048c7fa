//! Point-in-time rate tables.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;

/// Reasons a rate table is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Rate for {0} must be positive")]
    NonPositiveRate(CurrencyCode),

    #[error("Rate for {0} is not a finite number")]
    NonFiniteRate(CurrencyCode),
}

/// An immutable table of rates relative to one base currency.
///
/// Each rate answers "how many units of this currency buy one unit of the
/// base". The base itself need not appear as a key, its rate is always 1.
/// Snapshots are never merged; a successful fetch replaces the previous one
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    base_currency: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
    fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Builds a snapshot, refusing any rate that is zero or negative.
    pub fn new(
        base_currency: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        let mut table = BTreeMap::new();
        for (code, rate) in rates {
            if rate <= Decimal::ZERO {
                return Err(SnapshotError::NonPositiveRate(code));
            }
            table.insert(code, rate);
        }
        Ok(Self {
            base_currency,
            rates: table,
            fetched_at,
        })
    }

    /// Builds a snapshot from floating point rates as they arrive off the wire.
    pub fn from_f64_rates(
        base_currency: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, f64)>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        let converted = rates
            .into_iter()
            .map(|(code, rate)| {
                if !rate.is_finite() {
                    return Err(SnapshotError::NonFiniteRate(code));
                }
                match Decimal::from_f64(rate) {
                    Some(value) => Ok((code, value)),
                    None => Err(SnapshotError::NonFiniteRate(code)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(base_currency, converted, fetched_at)
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// The raw rate table as delivered by the provider.
    pub fn rates(&self) -> &BTreeMap<CurrencyCode, Decimal> {
        &self.rates
    }

    /// Rate of `code` against the base, with the base resolving to 1.
    pub fn rate(&self, code: &CurrencyCode) -> Option<Decimal> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if *code == self.base_currency => Some(Decimal::ONE),
            None => None,
        }
    }

    /// Every convertible code in ascending order, base included.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.rates.keys().cloned().collect();
        if !self.rates.contains_key(&self.base_currency) {
            codes.push(self.base_currency.clone());
            codes.sort();
        }
        codes
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[test]
    fn test_base_has_implicit_unit_rate() {
        let snapshot =
            RateSnapshot::new(code("USD"), [(code("EUR"), dec!(0.9123))], Utc::now()).unwrap();

        assert_eq!(snapshot.rate(&code("USD")), Some(Decimal::ONE));
        assert_eq!(snapshot.rate(&code("EUR")), Some(dec!(0.9123)));
        assert_eq!(snapshot.rate(&code("GBP")), None);
    }

    #[test]
    fn test_non_positive_rate_is_refused() {
        let result = RateSnapshot::new(
            code("USD"),
            [(code("EUR"), dec!(0.9)), (code("XXX"), dec!(0))],
            Utc::now(),
        );
        assert!(matches!(result, Err(SnapshotError::NonPositiveRate(c)) if c.as_str() == "XXX"));
    }

    #[test]
    fn test_non_finite_float_is_refused() {
        let result = RateSnapshot::from_f64_rates(
            code("USD"),
            [(code("EUR"), f64::INFINITY)],
            Utc::now(),
        );
        assert!(matches!(result, Err(SnapshotError::NonFiniteRate(_))));
    }

    #[test]
    fn test_currencies_are_sorted_and_include_base() {
        let snapshot = RateSnapshot::new(
            code("USD"),
            [(code("INR"), dec!(83.12)), (code("EUR"), dec!(0.92))],
            Utc::now(),
        )
        .unwrap();

        let codes: Vec<String> = snapshot
            .currencies()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(codes, vec!["EUR", "INR", "USD"]);
    }
}
