//! Offer Benefits
//!
//! A benefit turns a satisfied condition into discounts on basket lines.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    basket::{Basket, consumer::Claimant, line::Line},
    discounts::{apportion, clamp_fraction, extend_minor, percent_of_minor},
    offers::{
        OfferError,
        applications::BasketDiscount,
        conditions::{AffectedLine, Condition, ConditionKind},
    },
    ranges::Range,
};

/// How the discount is calculated.
#[derive(Debug, Clone, Copy)]
pub enum BenefitKind<'a> {
    /// Percentage off every affected unit.
    Percentage(Percentage),

    /// Fixed amount off the affected units.
    Absolute(Money<'a, Currency>),

    /// Cheapest affected unit is free.
    Multibuy,

    /// The condition's items cost this amount in total.
    FixedPrice(Money<'a, Currency>),
}

/// Offer benefit
#[derive(Debug, Clone)]
pub struct Benefit<'a> {
    range: Range,
    kind: BenefitKind<'a>,
    max_affected_items: Option<u32>,
}

impl<'a> Benefit<'a> {
    /// Create a benefit over a range.
    pub fn new(range: Range, kind: BenefitKind<'a>) -> Self {
        Self {
            range,
            kind,
            max_affected_items: None,
        }
    }

    /// Percentage discount on the range.
    pub fn percentage(range: Range, percent: Percentage) -> Self {
        Self::new(range, BenefitKind::Percentage(percent))
    }

    /// Fixed amount off the range.
    pub fn absolute(range: Range, amount: Money<'a, Currency>) -> Self {
        Self::new(range, BenefitKind::Absolute(amount))
    }

    /// Cheapest unit in the range is free.
    pub fn multibuy(range: Range) -> Self {
        Self::new(range, BenefitKind::Multibuy)
    }

    /// The condition's items are sold for `price`.
    pub fn fixed_price(range: Range, price: Money<'a, Currency>) -> Self {
        Self::new(range, BenefitKind::FixedPrice(price))
    }

    /// Limit how many units one application may discount.
    #[must_use]
    pub fn with_max_affected_items(mut self, max: u32) -> Self {
        self.max_affected_items = Some(max);
        self
    }

    /// Range of discounted products
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Benefit kind
    pub fn kind(&self) -> &BenefitKind<'a> {
        &self.kind
    }

    /// Maximum units discounted per application, if limited
    pub fn max_affected_items(&self) -> Option<u32> {
        self.max_affected_items
    }

    /// Apply the benefit once, then let the condition consume its items.
    ///
    /// # Errors
    ///
    /// Returns an [`OfferError`] if the discount arithmetic fails or the
    /// benefit is priced in another currency.
    pub fn apply(
        &self,
        basket: &mut Basket<'a>,
        condition: &Condition<'a>,
        claimant: Claimant,
        offer_name: &str,
    ) -> Result<BasketDiscount<'a>, OfferError> {
        let currency = basket.currency();

        let (amount, affected) = match self.kind {
            BenefitKind::Percentage(percent) => self.apply_percentage(basket, claimant, &percent)?,
            BenefitKind::Absolute(amount) => {
                check_currency(offer_name, currency, &amount)?;
                self.apply_absolute(basket, claimant, amount.to_minor_units())?
            }
            BenefitKind::Multibuy => self.apply_multibuy(basket, claimant)?,
            BenefitKind::FixedPrice(price) => {
                check_currency(offer_name, currency, &price)?;
                apply_fixed_price(basket, condition, claimant, price.to_minor_units())?
            }
        };

        if affected.is_empty() {
            return Ok(BasketDiscount::zero(currency));
        }

        condition.consume_items(basket, claimant, &affected);

        let quantity = affected
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity));

        Ok(BasketDiscount::new(Money::from_minor(amount, currency), quantity))
    }

    fn can_apply(&self, line: &Line<'_>) -> bool {
        self.range.contains(line.product(), line.tags()) && line.unit_price().to_minor_units() > 0
    }

    /// Lines the claimant can still discount, cheapest first.
    fn applicable_lines(&self, basket: &Basket<'_>, claimant: &Claimant) -> SmallVec<[usize; 8]> {
        cheapest_first(basket, |line| {
            self.can_apply(line) && line.quantity_without_offer_discount(claimant) > 0
        })
    }

    fn apply_percentage(
        &self,
        basket: &mut Basket<'a>,
        claimant: Claimant,
        percent: &Percentage,
    ) -> Result<(i64, Affected), OfferError> {
        let mut limit = self.max_affected_items.unwrap_or(u32::MAX);
        let mut affected = Affected::new();
        let mut total = 0i64;

        for idx in self.applicable_lines(basket, &claimant) {
            if limit == 0 {
                break;
            }

            let Some(line) = basket.line_mut(idx) else {
                continue;
            };

            let quantity = line.quantity_without_offer_discount(&claimant).min(limit);
            let value = extend_minor(line.unit_price().to_minor_units(), quantity)?;
            let discount = percent_of_minor(percent, value)?;

            total = total.saturating_add(line.discount(discount, quantity, claimant)?);
            affected.push(AffectedLine { line: idx, quantity });
            limit -= quantity;
        }

        Ok((total, affected))
    }

    fn apply_absolute(
        &self,
        basket: &mut Basket<'a>,
        claimant: Claimant,
        amount: i64,
    ) -> Result<(i64, Affected), OfferError> {
        let mut limit = self.max_affected_items.unwrap_or(u32::MAX);
        let mut affected = Affected::new();
        let mut weights: SmallVec<[i64; 8]> = SmallVec::new();

        for idx in self.applicable_lines(basket, &claimant) {
            if limit == 0 {
                break;
            }

            let Some(line) = basket.lines().get(idx) else {
                continue;
            };

            let quantity = line.quantity_without_offer_discount(&claimant).min(limit);

            weights.push(extend_minor(line.unit_price().to_minor_units(), quantity)?);
            affected.push(AffectedLine { line: idx, quantity });
            limit -= quantity;
        }

        let value = weights.iter().fold(0i64, |acc, w| acc.saturating_add(*w));

        discount_affected(basket, claimant, &affected, amount.clamp(0, value), &weights)
            .map(|total| (total, affected))
    }

    fn apply_multibuy(
        &self,
        basket: &mut Basket<'a>,
        claimant: Claimant,
    ) -> Result<(i64, Affected), OfferError> {
        let mut affected = Affected::new();

        let cheapest = cheapest_first(basket, |line| {
            self.can_apply(line)
                && line.quantity_without_offer_discount(&claimant) > 0
                && !line.has_discount_from(claimant.offer())
        })
        .into_iter()
        .next();

        let Some(idx) = cheapest else {
            return Ok((0, affected));
        };

        let Some(line) = basket.line_mut(idx) else {
            return Ok((0, affected));
        };

        let unit = line.unit_price().to_minor_units();
        let total = line.discount(unit, 1, claimant)?;

        affected.push(AffectedLine { line: idx, quantity: 1 });

        Ok((total, affected))
    }
}

type Affected = SmallVec<[AffectedLine; 4]>;

/// Discount the condition's items down to `price`.
///
/// Value conditions have no item count to price, so they never discount.
fn apply_fixed_price<'a>(
    basket: &mut Basket<'a>,
    condition: &Condition<'a>,
    claimant: Claimant,
    price: i64,
) -> Result<(i64, Affected), OfferError> {
    let mut affected = Affected::new();

    let (permitted, per_product) = match *condition.kind() {
        ConditionKind::Count(count) => (count, false),
        ConditionKind::Coverage(count) => (count, true),
        ConditionKind::Value(_) => return Ok((0, affected)),
    };

    let lines = cheapest_first(basket, |line| {
        condition.can_apply(line) && line.quantity_without_offer_discount(&claimant) > 0
    });

    let mut covered = 0u32;
    let mut weights: SmallVec<[i64; 8]> = SmallVec::new();

    for idx in lines {
        if covered >= permitted {
            break;
        }

        let Some(line) = basket.lines().get(idx) else {
            continue;
        };

        let quantity = if per_product {
            1
        } else {
            line.quantity_without_offer_discount(&claimant)
                .min(permitted - covered)
        };

        weights.push(extend_minor(line.unit_price().to_minor_units(), quantity)?);
        affected.push(AffectedLine { line: idx, quantity });
        covered = covered.saturating_add(quantity);
    }

    let value = weights.iter().fold(0i64, |acc, w| acc.saturating_add(*w));
    let discount = value.saturating_sub(price).max(0);

    if discount == 0 {
        return Ok((0, Affected::new()));
    }

    discount_affected(basket, claimant, &affected, discount, &weights)
        .map(|total| (total, affected))
}

/// Split `amount` across the affected lines by weight and apply it.
fn discount_affected(
    basket: &mut Basket<'_>,
    claimant: Claimant,
    affected: &[AffectedLine],
    amount: i64,
    weights: &[i64],
) -> Result<i64, OfferError> {
    let shares = apportion(amount, weights)?;
    let mut total = 0i64;

    for (item, share) in affected.iter().zip(shares) {
        if let Some(line) = basket.line_mut(item.line) {
            total = total.saturating_add(line.discount(share, item.quantity, claimant)?);
        }
    }

    Ok(total)
}

fn cheapest_first(basket: &Basket<'_>, keep: impl Fn(&Line<'_>) -> bool) -> SmallVec<[usize; 8]> {
    let mut lines: SmallVec<[(usize, i64); 8]> = basket
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| keep(line))
        .map(|(idx, line)| (idx, line.unit_price().to_minor_units()))
        .collect();

    lines.sort_by_key(|(_, price)| *price);

    lines.into_iter().map(|(idx, _)| idx).collect()
}

fn check_currency(
    offer_name: &str,
    currency: &Currency,
    amount: &Money<'_, Currency>,
) -> Result<(), OfferError> {
    if amount.currency() == currency {
        return Ok(());
    }

    Err(OfferError::CurrencyMismatch {
        offer: offer_name.to_string(),
        expected: currency.iso_alpha_code,
        found: amount.currency().iso_alpha_code,
    })
}

impl fmt::Display for Benefit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BenefitKind::Percentage(percent) => {
                let points = (clamp_fraction(percent) * Decimal::ONE_HUNDRED).normalize();
                write!(f, "{points}% discount on {}", self.range)
            }
            BenefitKind::Absolute(amount) => write!(f, "{amount} discount on {}", self.range),
            BenefitKind::Multibuy => write!(f, "Cheapest product from {} is free", self.range),
            BenefitKind::FixedPrice(price) => {
                write!(f, "The products that meet the condition are sold for {price}")
            }
        }
    }
}
