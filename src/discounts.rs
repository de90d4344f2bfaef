//! Discount utilities
//!
//! Minor-unit arithmetic shared by the benefit types.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use smallvec::SmallVec;
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Minor unit arithmetic overflowed.
    #[error("discount arithmetic overflowed")]
    Overflow,
}

/// Clamp a percentage to the `0..=1` fraction range.
pub fn clamp_fraction(percent: Percentage) -> Decimal {
    (percent * Decimal::ONE).clamp(Decimal::ZERO, Decimal::ONE)
}

/// Calculate a percentage of a minor unit amount, rounding half away from zero.
///
/// The percentage is clamped so a discount never exceeds the amount.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the result cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    clamp_fraction(*percent)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Multiply a unit price by a quantity.
///
/// # Errors
///
/// Returns [`DiscountError::Overflow`] if the product does not fit in `i64`.
pub fn extend_minor(unit_minor: i64, quantity: u32) -> Result<i64, DiscountError> {
    unit_minor
        .checked_mul(i64::from(quantity))
        .ok_or(DiscountError::Overflow)
}

/// Split `total` across `weights` in proportion to each weight.
///
/// Every share but the last is rounded towards zero; the last share takes
/// whatever remains so the shares always sum to `total`.
///
/// # Errors
///
/// Returns [`DiscountError::Overflow`] if the weights overflow when summed,
/// or [`DiscountError::PercentConversion`] if a share cannot be represented.
pub fn apportion(total: i64, weights: &[i64]) -> Result<SmallVec<[i64; 8]>, DiscountError> {
    let weight_sum = weights
        .iter()
        .try_fold(0i64, |acc, weight| acc.checked_add(*weight))
        .ok_or(DiscountError::Overflow)?;

    let mut shares = SmallVec::with_capacity(weights.len());

    if weight_sum == 0 {
        shares.resize(weights.len(), 0);
        return Ok(shares);
    }

    let total_dec = Decimal::from_i64(total).ok_or(DiscountError::PercentConversion)?;
    let sum_dec = Decimal::from_i64(weight_sum).ok_or(DiscountError::PercentConversion)?;
    let mut applied = 0i64;

    for (idx, weight) in weights.iter().enumerate() {
        let share = if idx + 1 == weights.len() {
            total.checked_sub(applied).ok_or(DiscountError::Overflow)?
        } else {
            let weight_dec = Decimal::from_i64(*weight).ok_or(DiscountError::PercentConversion)?;

            weight_dec
                .checked_mul(total_dec)
                .ok_or(DiscountError::Overflow)?
                .checked_div(sum_dec)
                .ok_or(DiscountError::PercentConversion)?
                .round_dp_with_strategy(0, RoundingStrategy::ToZero)
                .to_i64()
                .ok_or(DiscountError::PercentConversion)?
        };

        applied = applied.checked_add(share).ok_or(DiscountError::Overflow)?;
        shares.push(share);
    }

    Ok(shares)
}
