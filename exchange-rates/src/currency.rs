//! Runtime currency codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string cannot be used as a currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency code: {0:?}")]
pub struct InvalidCurrencyCode(pub String);

/// A short uppercase currency identifier such as `USD`.
///
/// The set of codes is not fixed at compile time: whatever keys the rate
/// provider returns are the convertible universe. Parsing only normalizes
/// case and rejects strings that cannot be a code at all.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Maximum accepted length. ISO 4217 codes are three letters, some
    /// providers add longer tickers for metals and crypto.
    pub const MAX_LEN: usize = 10;

    pub fn new(code: impl AsRef<str>) -> Result<Self, InvalidCurrencyCode> {
        let raw = code.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > Self::MAX_LEN
            || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(InvalidCurrencyCode(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Builds a code from a literal.
    ///
    /// # Panics
    ///
    /// Panics if `code` is not a valid currency code.
    pub fn from_static(code: &'static str) -> Self {
        match Self::new(code) {
            Ok(code) => code,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
