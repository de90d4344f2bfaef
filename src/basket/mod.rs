//! Basket

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    basket::line::{Line, lines_total},
    offers::applications::OfferApplications,
    pricing::{TotalPriceError, total_price},
    products::Product,
    strategy::{AvailabilityError, Selector, Strategy},
};

pub mod consumer;
pub mod line;

/// Errors related to basket construction or totals.
#[derive(Debug, Error)]
pub enum BasketError {
    /// A product's price currency differs from the basket currency
    /// (product, price currency, basket currency).
    #[error("{0} is priced in {1}, but basket has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// Products must be added at least one unit at a time.
    #[error("quantity must be at least one")]
    ZeroQuantity,

    /// The line quantity would overflow.
    #[error("line quantity overflowed")]
    QuantityOverflow,

    /// The strategy refused the purchase.
    #[error("{product} cannot be added: {source}")]
    Unavailable {
        /// Product title
        product: String,

        /// Why the purchase was refused
        source: AvailabilityError,
    },

    /// A line was not found in the basket.
    #[error("Line {0} not found")]
    LineNotFound(usize),
}

/// Basket
#[derive(Debug)]
pub struct Basket<'a> {
    lines: Vec<Line<'a>>,
    currency: &'static Currency,
    strategy: Box<dyn Strategy>,
    applications: OfferApplications<'a>,
}

impl<'a> Basket<'a> {
    /// Create an empty basket using the selector's default strategy.
    pub fn new(currency: &'static Currency) -> Self {
        Self::with_strategy(currency, Selector.strategy())
    }

    /// Create an empty basket with a specific strategy.
    pub fn with_strategy(currency: &'static Currency, strategy: Box<dyn Strategy>) -> Self {
        Basket {
            lines: Vec::new(),
            currency,
            strategy,
            applications: OfferApplications::default(),
        }
    }

    /// Replace the pricing strategy.
    ///
    /// Existing lines keep the price they were added at.
    pub fn set_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategy = strategy;
    }

    /// The pricing strategy
    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Add `quantity` units of a product.
    ///
    /// Units of a product already in the basket are merged into its line.
    /// Any previously applied offers are discarded.
    ///
    /// # Errors
    ///
    /// Returns a [`BasketError`] if the quantity is zero, the product is
    /// priced in another currency, or the strategy refuses the purchase.
    #[tracing::instrument(skip_all, fields(product = %product.title, quantity = quantity))]
    pub fn add_product(&mut self, product: &Product<'a>, quantity: u32) -> Result<(), BasketError> {
        if quantity == 0 {
            return Err(BasketError::ZeroQuantity);
        }

        let info = self.strategy.fetch_for_product(product);
        let price_currency = info.price.currency();

        if price_currency != self.currency {
            return Err(BasketError::CurrencyMismatch(
                product.title.clone(),
                price_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        let existing = self
            .lines
            .iter()
            .position(|line| line.product() == product.key);

        let current = existing
            .and_then(|idx| self.lines.get(idx))
            .map_or(0, Line::quantity);

        let new_quantity = current
            .checked_add(quantity)
            .ok_or(BasketError::QuantityOverflow)?;

        info.availability
            .is_purchase_permitted(new_quantity)
            .map_err(|source| BasketError::Unavailable {
                product: product.title.clone(),
                source,
            })?;

        match existing.and_then(|idx| self.lines.get_mut(idx)) {
            Some(line) => line.set_quantity(new_quantity),
            None => self.lines.push(Line::new(product, info.price, quantity)),
        }

        self.reset_offer_applications();

        debug!(
            product = %product.title,
            quantity = new_quantity,
            items = self.num_items(),
            "added product to basket"
        );

        Ok(())
    }

    /// Discard every offer application and line consumption.
    pub fn reset_offer_applications(&mut self) {
        self.lines.iter_mut().for_each(Line::reset_offers);
        self.applications = OfferApplications::default();
    }

    /// Get a line by index.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::LineNotFound`] if the index is out of range.
    pub fn line(&self, idx: usize) -> Result<&Line<'a>, BasketError> {
        self.lines.get(idx).ok_or(BasketError::LineNotFound(idx))
    }

    pub(crate) fn line_mut(&mut self, idx: usize) -> Option<&mut Line<'a>> {
        self.lines.get_mut(idx)
    }

    /// All lines in the basket.
    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Total number of units across all lines.
    pub fn num_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity()))
    }

    /// Get the number of lines in the basket.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the basket is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the basket.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Offers applied by the last applicator run.
    pub fn applications(&self) -> &OfferApplications<'a> {
        &self.applications
    }

    pub(crate) fn applications_mut(&mut self) -> &mut OfferApplications<'a> {
        &mut self.applications
    }

    /// Total before offer discounts.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if there was a money arithmetic error.
    pub fn total_excl_discounts(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        lines_total(&self.lines, self.currency)
    }

    /// Sum of all offer discounts.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if there was a money arithmetic error.
    pub fn total_discount(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        let discounts: SmallVec<[Money<'a, Currency>; 8]> =
            self.lines.iter().map(Line::discount_value).collect();

        total_price(discounts, self.currency)
    }

    /// Total after offer discounts.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if there was a money arithmetic error.
    pub fn total(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        Ok(self.total_excl_discounts()?.sub(self.total_discount()?)?)
    }
}
