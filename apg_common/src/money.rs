use std::{
    fmt::Display,
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       Money        ----------------------------------------------------------

/// An amount of money in a single currency.
///
/// Equality is component-wise: two `Money` values are equal iff both the amount and the currency code match, so an
/// amount in the wrong currency can never compare equal to the expected one. Arithmetic across currencies is a caller
/// error and is surfaced by [`Money::checked_add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

#[derive(Debug, Clone, Error)]
pub enum MoneyError {
    #[error("Cannot combine amounts in {0} and {1}")]
    CurrencyMismatch(String, String),
    #[error("Not a valid money value: {0}")]
    ParseError(String),
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self { amount, currency: currency.to_string() }
    }

    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Add another amount in the same currency. Mixing currencies is an error, never a silent sum.
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency.clone(), other.currency.clone()));
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    /// Render the amount at exactly `places` decimal places, without the currency code.
    pub fn format_amount(&self, places: u32) -> String {
        let mut amount = self.amount;
        amount.rescale(places);
        amount.to_string()
    }
}

/// Parses the notification wire format, `"USD 10.00"`.
impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, ' ');
        let currency = parts.next().filter(|c| !c.is_empty()).ok_or_else(|| MoneyError::ParseError(s.to_string()))?;
        let amount = parts.next().ok_or_else(|| MoneyError::ParseError(s.to_string()))?;
        let amount = Decimal::from_str(amount.trim()).map_err(|_| MoneyError::ParseError(s.to_string()))?;
        Ok(Money::new(amount, currency))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

#[cfg(test)]
mod test {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_wire_format() {
        let m = "USD 10.00".parse::<Money>().unwrap();
        assert_eq!(m, Money::new(dec!(10.00), "USD"));
        assert_eq!(m.currency(), "USD");
    }

    #[test]
    fn rejects_malformed_values() {
        assert!("".parse::<Money>().is_err());
        assert!("USD".parse::<Money>().is_err());
        assert!("USD ten".parse::<Money>().is_err());
    }

    #[test]
    fn equality_is_component_wise() {
        assert_ne!(Money::new(dec!(10), "USD"), Money::new(dec!(10), "EUR"));
        assert_eq!(Money::new(dec!(10.0), "USD"), Money::new(dec!(10.0), "USD"));
    }

    #[test]
    fn mixed_currency_addition_is_an_error() {
        let usd = Money::new(dec!(5), "USD");
        let eur = Money::new(dec!(5), "EUR");
        assert!(usd.checked_add(&eur).is_err());
        let sum = usd.checked_add(&Money::new(dec!(2.50), "USD")).unwrap();
        assert_eq!(sum, Money::new(dec!(7.50), "USD"));
    }

    #[test]
    fn formats_to_configured_places() {
        let m = Money::new(dec!(10.1), "USD");
        assert_eq!(m.format_amount(2), "10.10");
    }
}
