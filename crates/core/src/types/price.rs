//! Product price backed by decimal arithmetic.
//!
//! Prices are persisted as plain JSON numbers (`"price": 19.99`) so the
//! documents stay readable by other tools, but are held as [`Decimal`] in
//! memory to avoid float drift when formatting or comparing.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Price is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A catalog price in the store's single currency.
///
/// Stored documents are trusted as-is on load; [`Price::try_new`] applies the
/// non-negative rule to values coming from requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero price (free download).
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate and wrap an amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn try_new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the product is given away for free.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_number_roundtrip() {
        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");
    }

    #[test]
    fn test_integer_json_accepted() {
        let price: Price = serde_json::from_str("5").unwrap();
        assert_eq!(price.to_string(), "$5.00");
    }

    #[test]
    fn test_try_new_rejects_negative() {
        assert_eq!(
            Price::try_new(Decimal::new(-1, 0)),
            Err(PriceError::Negative)
        );
        assert!(Price::try_new(Decimal::ZERO).unwrap().is_free());
    }
}
