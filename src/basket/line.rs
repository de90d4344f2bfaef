//! Basket Lines

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    basket::consumer::{Claimant, LineOfferConsumer},
    offers::OfferKey,
    pricing::{TotalPriceError, extended_price, total_price},
    products::{Product, ProductKey},
    tags::string::StringTagCollection,
};

/// A product in the basket with its quantity, offer consumption and discounts.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    product: ProductKey,
    title: String,
    tags: StringTagCollection,
    unit_price: Money<'a, Currency>,
    quantity: u32,
    consumer: LineOfferConsumer,
    discounts: SmallVec<[(OfferKey, i64); 2]>,
}

impl<'a> Line<'a> {
    pub(crate) fn new(
        product: &Product<'a>,
        unit_price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            product: product.key,
            title: product.title.clone(),
            tags: product.tags.clone(),
            unit_price,
            quantity,
            consumer: LineOfferConsumer::new(quantity),
            discounts: SmallVec::new(),
        }
    }

    /// Product key
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Product title at the time it was added
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Product tags
    pub fn tags(&self) -> &StringTagCollection {
        &self.tags
    }

    /// Unit price from the basket strategy
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Number of units
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Offer consumption ledger
    pub fn consumer(&self) -> &LineOfferConsumer {
        &self.consumer
    }

    /// Price of all units before discounts.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the price does not fit in minor units.
    pub fn line_price_excl_discounts(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        extended_price(&self.unit_price, self.quantity)
    }

    /// Total discount applied to the line by all offers.
    pub fn discount_value(&self) -> Money<'a, Currency> {
        Money::from_minor(self.discount_minor(), self.unit_price.currency())
    }

    /// Discount applied to the line by one offer.
    pub fn discount_from(&self, offer: OfferKey) -> Money<'a, Currency> {
        let minor = self
            .discounts
            .iter()
            .filter(|(key, _)| *key == offer)
            .map(|(_, amount)| *amount)
            .sum();

        Money::from_minor(minor, self.unit_price.currency())
    }

    /// Price of all units after discounts.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if the arithmetic overflows.
    pub fn line_price_incl_discounts(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        Ok(self.line_price_excl_discounts()?.sub(self.discount_value())?)
    }

    /// Units the claimant could still consume.
    pub fn quantity_without_offer_discount(&self, claimant: &Claimant) -> u32 {
        self.consumer.available(claimant)
    }

    /// Units consumed by the offer.
    pub fn quantity_with_offer_discount(&self, offer: OfferKey) -> u32 {
        self.consumer.consumed(offer)
    }

    /// Whether the offer has discounted this line.
    pub fn has_discount_from(&self, offer: OfferKey) -> bool {
        self.discounts.iter().any(|(key, _)| *key == offer)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.consumer.resize(quantity);
        self.discounts.clear();
    }

    pub(crate) fn consume(&mut self, quantity: u32, claimant: Claimant) -> u32 {
        self.consumer.consume(quantity, claimant)
    }

    /// Discount `quantity` units by up to `amount` minor units for the claimant.
    ///
    /// The discount is capped so the line never goes below zero. Returns the
    /// amount actually applied.
    pub(crate) fn discount(
        &mut self,
        amount: i64,
        quantity: u32,
        claimant: Claimant,
    ) -> Result<i64, TotalPriceError> {
        let line_minor = self.line_price_excl_discounts()?.to_minor_units();
        let remaining = line_minor.saturating_sub(self.discount_minor()).max(0);
        let applied = amount.clamp(0, remaining);

        if let Some((_, total)) = self
            .discounts
            .iter_mut()
            .find(|(key, _)| *key == claimant.offer())
        {
            *total = total.saturating_add(applied);
        } else {
            self.discounts.push((claimant.offer(), applied));
        }

        self.consume(quantity, claimant);

        Ok(applied)
    }

    pub(crate) fn reset_offers(&mut self) {
        self.consumer.clear();
        self.discounts.clear();
    }

    fn discount_minor(&self) -> i64 {
        self.discounts
            .iter()
            .fold(0i64, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

/// Sum the undiscounted prices of a set of lines.
///
/// # Errors
///
/// Returns a [`TotalPriceError`] on overflow or currency mismatch.
pub fn lines_total<'a>(
    lines: &[Line<'a>],
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, TotalPriceError> {
    let prices = lines
        .iter()
        .map(Line::line_price_excl_discounts)
        .collect::<Result<SmallVec<[_; 8]>, _>>()?;

    total_price(prices, currency)
}
