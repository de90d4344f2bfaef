//! Prices

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors that can occur while calculating total price.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// Minor unit arithmetic overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculates the total of a set of prices, starting from zero in `currency`.
///
/// # Errors
///
/// - [`TotalPriceError::Money`]: a price is in a different currency.
pub fn total_price<'a, I>(
    prices: I,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, TotalPriceError>
where
    I: IntoIterator<Item = Money<'a, Currency>>,
{
    let total = prices
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, price| acc.add(price))?;

    Ok(total)
}

/// Calculates `unit * quantity`.
///
/// # Errors
///
/// - [`TotalPriceError::Overflow`]: the result does not fit in minor units.
pub fn extended_price<'a>(
    unit: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, TotalPriceError> {
    let minor = unit
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(TotalPriceError::Overflow)?;

    Ok(Money::from_minor(minor, unit.currency()))
}
