//! Exchange Rates
//!
//! Runtime currency codes, immutable rate snapshots and the conversion
//! arithmetic that runs on top of them. All amounts are exact decimals;
//! nothing in this crate performs I/O.
//!
//! # Example
//! ```
//! use chrono::Utc;
//! use exchange_rates::{CurrencyCode, RateSnapshot, convert};
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let usd: CurrencyCode = "USD".parse().unwrap();
//! let eur: CurrencyCode = "EUR".parse().unwrap();
//! let snapshot = RateSnapshot::new(
//!     usd,
//!     [(eur.clone(), Decimal::from_str("0.9123").unwrap())],
//!     Utc::now(),
//! )
//! .unwrap();
//!
//! let converted = convert("100", &snapshot, &eur).unwrap();
//! assert_eq!(converted.to_string(), "91.23");
//! ```

mod conversion;
mod currency;
mod snapshot;

pub use conversion::{
    ConversionError, ConvertedAmount, RESULT_SCALE, UNIT_RATE_SCALE, convert, convert_between,
    parse_amount, round_half_up,
};
pub use currency::{CurrencyCode, InvalidCurrencyCode};
pub use snapshot::{RateSnapshot, SnapshotError};
