//! Product Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{fixtures::FixtureError, tags::string::StringTagCollection};

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product title
    pub title: String,

    /// Product tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Product price (e.g., "2.99 GBP")
    pub price: String,

    /// Units in stock, omitted when stock is not tracked
    #[serde(default)]
    pub stock: Option<u32>,
}

impl ProductFixture {
    /// Parse the price and tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the price is invalid.
    pub fn parts<'a>(&self) -> Result<(Money<'a, Currency>, StringTagCollection), FixtureError> {
        let price = parse_money(&self.price)?;
        let tags = self.tags.iter().collect();

        Ok((price, tags))
    }
}

/// Parse a price string (e.g., "2.99 GBP") into money.
///
/// # Errors
///
/// Returns an error if the price is invalid.
pub fn parse_money<'a>(s: &str) -> Result<Money<'a, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal number, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, parse_currency(currency_code)?))
}

/// Look up a supported ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for unsupported codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string is not a decimal number.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let (number, scale) = match trimmed.strip_suffix('%') {
        Some(points) => (points.trim(), Decimal::ONE_HUNDRED),
        None => (trimmed, Decimal::ONE),
    };

    let value = number
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    Ok(Percentage::from(value / scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_accepts_supported_currencies() -> Result<(), FixtureError> {
        let (gbp_minor, gbp) = parse_price("2.99 GBP")?;
        let (usd_minor, usd) = parse_price("1 USD")?;
        let (eur_minor, eur) = parse_price("2.50 EUR")?;

        assert_eq!(gbp_minor, 299);
        assert_eq!(gbp, GBP);
        assert_eq!(usd_minor, 100);
        assert_eq!(usd, USD);
        assert_eq!(eur_minor, 250);
        assert_eq!(eur, EUR);

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> Result<(), FixtureError> {
        let expected = Percentage::from(Decimal::new(15, 2));

        assert_eq!(parse_percentage("15%")?, expected);
        assert_eq!(parse_percentage("  15 % ")?, expected);
        assert_eq!(parse_percentage("0.15")?, expected);

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        let result = parse_percentage("lots");

        assert!(matches!(result, Err(FixtureError::InvalidPercentage(_))));
    }

    #[test]
    fn product_fixture_parts() -> Result<(), FixtureError> {
        let fixture = ProductFixture {
            title: "Apple".to_string(),
            tags: vec!["fruit".to_string()],
            price: "0.45 GBP".to_string(),
            stock: None,
        };

        let (price, tags) = fixture.parts()?;

        assert_eq!(price, Money::from_minor(45, GBP));
        assert_eq!(tags.to_string(), "fruit");

        Ok(())
    }
}
