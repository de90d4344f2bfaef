//! Offer Conditions
//!
//! A condition decides whether an offer can be applied to a basket, and
//! which basket units the offer uses up once its benefit has been applied.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    basket::{Basket, consumer::Claimant, line::Line},
    ranges::Range,
};

/// Units of a basket line touched by a benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedLine {
    /// Line index in the basket
    pub line: usize,

    /// Units affected
    pub quantity: u32,
}

/// What a condition measures.
#[derive(Debug, Clone, Copy)]
pub enum ConditionKind<'a> {
    /// At least this many units from the range.
    Count(u32),

    /// At least this much spent on the range.
    Value(Money<'a, Currency>),

    /// At least this many distinct products from the range.
    Coverage(u32),
}

/// Offer condition
#[derive(Debug, Clone)]
pub struct Condition<'a> {
    range: Range,
    kind: ConditionKind<'a>,
}

impl<'a> Condition<'a> {
    /// Create a condition over a range.
    pub fn new(range: Range, kind: ConditionKind<'a>) -> Self {
        Self { range, kind }
    }

    /// Require `count` units from the range.
    pub fn count(range: Range, count: u32) -> Self {
        Self::new(range, ConditionKind::Count(count))
    }

    /// Require `value` to be spent on the range.
    pub fn value(range: Range, value: Money<'a, Currency>) -> Self {
        Self::new(range, ConditionKind::Value(value))
    }

    /// Require `count` distinct products from the range.
    pub fn coverage(range: Range, count: u32) -> Self {
        Self::new(range, ConditionKind::Coverage(count))
    }

    /// Range the condition is evaluated against
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Condition kind
    pub fn kind(&self) -> &ConditionKind<'a> {
        &self.kind
    }

    /// Whether a line can count towards this condition.
    pub fn can_apply(&self, line: &Line<'_>) -> bool {
        self.range.contains(line.product(), line.tags()) && line.unit_price().to_minor_units() > 0
    }

    /// Whether the units still available to the claimant meet the condition.
    pub fn is_satisfied(&self, basket: &Basket<'_>, claimant: &Claimant) -> bool {
        self.shortfall(basket, |line| line.consumer().available(claimant))
            .is_some_and(|shortfall| shortfall <= 0)
    }

    /// Whether the basket goes some of the way towards the condition without
    /// meeting it.
    pub fn is_partially_satisfied(&self, basket: &Basket<'_>, claimant: &Claimant) -> bool {
        let Some(target) = self.target(basket) else {
            return false;
        };

        self.shortfall(basket, |line| line.consumer().available(claimant))
            .is_some_and(|shortfall| shortfall > 0 && shortfall < target)
    }

    /// Describe what the customer must add to meet the condition.
    ///
    /// Units consumed by offers evaluated after the claimant still count,
    /// as do units the claimant consumed itself.
    pub fn upsell_message(&self, basket: &Basket<'_>, claimant: &Claimant) -> Option<String> {
        let delta = self.shortfall(basket, |line| line.consumer().matched(claimant))?;

        if delta <= 0 {
            return None;
        }

        match self.kind {
            ConditionKind::Count(_) | ConditionKind::Coverage(_) => {
                let noun = if delta == 1 { "product" } else { "products" };

                Some(format!("Buy {delta} more {noun} from {}", self.range))
            }
            ConditionKind::Value(value) => Some(format!(
                "Spend {} more from {}",
                Money::from_minor(delta, value.currency()),
                self.range
            )),
        }
    }

    /// Consume the units that met the condition, on top of those the benefit
    /// already affected.
    pub fn consume_items(
        &self,
        basket: &mut Basket<'a>,
        claimant: Claimant,
        affected: &[AffectedLine],
    ) {
        match self.kind {
            ConditionKind::Count(count) => {
                let already = affected
                    .iter()
                    .filter(|item| {
                        basket
                            .lines()
                            .get(item.line)
                            .is_some_and(|line| self.can_apply(line))
                    })
                    .fold(0u32, |acc, item| acc.saturating_add(item.quantity));

                let mut remaining = count.saturating_sub(already);

                for idx in self.lines_most_expensive_first(basket) {
                    if remaining == 0 {
                        break;
                    }

                    if let Some(line) = basket.line_mut(idx) {
                        remaining -= line.consume(remaining, claimant);
                    }
                }
            }
            ConditionKind::Value(value) => {
                let already = affected
                    .iter()
                    .filter_map(|item| {
                        let line = basket.lines().get(item.line)?;
                        self.can_apply(line).then(|| {
                            line.unit_price()
                                .to_minor_units()
                                .saturating_mul(i64::from(item.quantity))
                        })
                    })
                    .fold(0i64, i64::saturating_add);

                let mut remaining = value.to_minor_units().saturating_sub(already);

                for idx in self.lines_most_expensive_first(basket) {
                    if remaining <= 0 {
                        break;
                    }

                    if let Some(line) = basket.line_mut(idx) {
                        let unit = line.unit_price().to_minor_units();
                        let wanted = u32::try_from(ceil_div(remaining, unit)).unwrap_or(u32::MAX);
                        let consumed = line.consume(wanted, claimant);

                        remaining =
                            remaining.saturating_sub(unit.saturating_mul(i64::from(consumed)));
                    }
                }
            }
            ConditionKind::Coverage(count) => {
                let covered: SmallVec<[usize; 8]> = affected
                    .iter()
                    .filter(|item| item.quantity > 0)
                    .map(|item| item.line)
                    .collect();

                let covered_count = u32::try_from(covered.len()).unwrap_or(u32::MAX);
                let mut remaining = count.saturating_sub(covered_count);

                for idx in self.lines_most_expensive_first(basket) {
                    if remaining == 0 {
                        break;
                    }

                    if covered.contains(&idx) {
                        continue;
                    }

                    if let Some(line) = basket.line_mut(idx) {
                        remaining -= line.consume(1, claimant);
                    }
                }
            }
        }
    }

    /// How far the basket is from the condition, measured in units, products
    /// or minor currency units. `None` when the condition cannot be measured
    /// in the basket currency.
    fn shortfall(&self, basket: &Basket<'_>, units: impl Fn(&Line<'_>) -> u32) -> Option<i64> {
        let target = self.target(basket)?;
        let lines = basket.lines().iter().filter(|line| self.can_apply(line));

        let achieved = match self.kind {
            ConditionKind::Count(_) => lines.map(|line| i64::from(units(line))).sum(),
            ConditionKind::Coverage(_) => lines
                .filter(|line| units(line) > 0)
                .fold(0i64, |acc, _| acc.saturating_add(1)),
            ConditionKind::Value(_) => lines
                .map(|line| {
                    line.unit_price()
                        .to_minor_units()
                        .saturating_mul(i64::from(units(line)))
                })
                .fold(0i64, i64::saturating_add),
        };

        Some(target.saturating_sub(achieved))
    }

    fn target(&self, basket: &Basket<'_>) -> Option<i64> {
        match self.kind {
            ConditionKind::Count(count) | ConditionKind::Coverage(count) => Some(i64::from(count)),
            ConditionKind::Value(value) => {
                (value.currency() == basket.currency()).then(|| value.to_minor_units())
            }
        }
    }

    fn lines_most_expensive_first(&self, basket: &Basket<'_>) -> SmallVec<[usize; 8]> {
        let mut lines: SmallVec<[(usize, i64); 8]> = basket
            .lines()
            .iter()
            .enumerate()
            .filter(|(_, line)| self.can_apply(line))
            .map(|(idx, line)| (idx, line.unit_price().to_minor_units()))
            .collect();

        lines.sort_by(|a, b| b.1.cmp(&a.1));

        lines.into_iter().map(|(idx, _)| idx).collect()
    }
}

impl fmt::Display for Condition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConditionKind::Count(1) => write!(f, "Basket includes 1 item from {}", self.range),
            ConditionKind::Count(count) => {
                write!(f, "Basket includes {count} items from {}", self.range)
            }
            ConditionKind::Value(value) => {
                write!(f, "Basket includes {value} (inc. tax) from {}", self.range)
            }
            ConditionKind::Coverage(count) => write!(
                f,
                "Basket includes {count} distinct products from {}",
                self.range
            ),
        }
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    if divisor <= 0 {
        return 0;
    }

    value.saturating_add(divisor - 1) / divisor
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::{offers::OfferKey, products::Catalogue};

    use super::*;

    fn claimant() -> Claimant {
        let key = SlotMap::<OfferKey, ()>::with_key().insert(());
        Claimant::new(key, true, 0)
    }

    fn basket_with<'a>(
        catalogue: &mut Catalogue<'a>,
        items: &[(i64, u32)],
    ) -> Result<Basket<'a>, Box<dyn std::error::Error>> {
        let mut basket = Basket::new(GBP);

        for (idx, (price, quantity)) in items.iter().enumerate() {
            let key = catalogue.insert(format!("Product {idx}"), Money::from_minor(*price, GBP));
            let product = catalogue.get(key).ok_or("missing product")?;
            basket.add_product(product, *quantity)?;
        }

        Ok(basket)
    }

    #[test]
    fn count_condition_messages_singular_and_plural() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::count(Range::all_products("All products"), 3);
        let claimant = claimant();

        let basket = basket_with(&mut catalogue, &[(100, 1)])?;

        assert!(!condition.is_satisfied(&basket, &claimant));
        assert!(condition.is_partially_satisfied(&basket, &claimant));
        assert_eq!(
            condition.upsell_message(&basket, &claimant).as_deref(),
            Some("Buy 2 more products from All products")
        );

        let basket = basket_with(&mut catalogue, &[(100, 2)])?;

        assert_eq!(
            condition.upsell_message(&basket, &claimant).as_deref(),
            Some("Buy 1 more product from All products")
        );

        let basket = basket_with(&mut catalogue, &[(100, 3)])?;

        assert!(condition.is_satisfied(&basket, &claimant));
        assert!(!condition.is_partially_satisfied(&basket, &claimant));
        assert_eq!(condition.upsell_message(&basket, &claimant), None);

        Ok(())
    }

    #[test]
    fn value_condition_reports_money_shortfall() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::value(
            Range::all_products("Everything"),
            Money::from_minor(1000, GBP),
        );
        let claimant = claimant();

        let basket = basket_with(&mut catalogue, &[(250, 2)])?;

        assert!(!condition.is_satisfied(&basket, &claimant));
        assert_eq!(
            condition.upsell_message(&basket, &claimant).as_deref(),
            Some("Spend £5.00 more from Everything")
        );

        let basket = basket_with(&mut catalogue, &[(250, 4)])?;

        assert!(condition.is_satisfied(&basket, &claimant));
        assert_eq!(condition.upsell_message(&basket, &claimant), None);

        Ok(())
    }

    #[test]
    fn value_condition_in_another_currency_never_applies() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::value(
            Range::all_products("Everything"),
            Money::from_minor(100, USD),
        );
        let claimant = claimant();

        let basket = basket_with(&mut catalogue, &[(500, 2)])?;

        assert!(!condition.is_satisfied(&basket, &claimant));
        assert_eq!(condition.upsell_message(&basket, &claimant), None);

        Ok(())
    }

    #[test]
    fn coverage_condition_counts_distinct_products() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::coverage(Range::all_products("Mix"), 2);
        let claimant = claimant();

        let basket = basket_with(&mut catalogue, &[(100, 5)])?;

        assert!(!condition.is_satisfied(&basket, &claimant));
        assert_eq!(
            condition.upsell_message(&basket, &claimant).as_deref(),
            Some("Buy 1 more product from Mix")
        );

        let basket = basket_with(&mut catalogue, &[(100, 1), (200, 1)])?;

        assert!(condition.is_satisfied(&basket, &claimant));

        Ok(())
    }

    #[test]
    fn zero_priced_lines_do_not_count() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::count(Range::all_products("All"), 1);

        let basket = basket_with(&mut catalogue, &[(0, 3)])?;

        assert!(!condition.is_satisfied(&basket, &claimant()));

        Ok(())
    }

    #[test]
    fn count_consume_tops_up_affected_units_from_expensive_lines() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::count(Range::all_products("All"), 3);
        let claimant = claimant();

        let mut basket = basket_with(&mut catalogue, &[(100, 2), (500, 2)])?;

        condition.consume_items(&mut basket, claimant, &[AffectedLine { line: 0, quantity: 1 }]);

        assert_eq!(basket.line(0)?.quantity_with_offer_discount(claimant.offer()), 0);
        assert_eq!(basket.line(1)?.quantity_with_offer_discount(claimant.offer()), 2);

        Ok(())
    }

    #[test]
    fn value_consume_stops_once_threshold_is_reached() -> TestResult {
        let mut catalogue = Catalogue::new();
        let condition = Condition::value(Range::all_products("All"), Money::from_minor(700, GBP));
        let claimant = claimant();

        let mut basket = basket_with(&mut catalogue, &[(100, 5), (300, 2)])?;

        condition.consume_items(&mut basket, claimant, &[]);

        assert_eq!(basket.line(1)?.quantity_with_offer_discount(claimant.offer()), 2);
        assert_eq!(basket.line(0)?.quantity_with_offer_discount(claimant.offer()), 1);

        Ok(())
    }

    #[test]
    fn describes_itself() {
        let range = Range::all_products("All products");

        assert_eq!(
            Condition::count(range.clone(), 2).to_string(),
            "Basket includes 2 items from All products"
        );
        assert_eq!(
            Condition::coverage(range, 3).to_string(),
            "Basket includes 3 distinct products from All products"
        );
    }
}
