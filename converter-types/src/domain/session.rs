//! The user's working session.

use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};

/// Amount and currency pair the user is currently working with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Raw amount text, possibly empty.
    pub amount: String,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
}

impl Session {
    /// An empty session on the given default pair.
    pub fn new(from_currency: CurrencyCode, to_currency: CurrencyCode) -> Self {
        Self {
            amount: String::new(),
            from_currency,
            to_currency,
        }
    }

    /// Exchanges the source and target currencies.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from_currency, &mut self.to_currency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_swap_restores_pair() {
        let original = Session::new("USD".parse().unwrap(), "EUR".parse().unwrap());
        let mut session = original.clone();

        session.swap();
        assert_eq!(session.from_currency.as_str(), "EUR");
        assert_eq!(session.to_currency.as_str(), "USD");

        session.swap();
        assert_eq!(session, original);
    }
}
