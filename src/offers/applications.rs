//! Offer Applications

use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};

use crate::{
    offers::OfferKey,
    pricing::{TotalPriceError, total_price},
};

/// Result of applying an offer's benefit once.
#[derive(Debug, Clone, Copy)]
pub struct BasketDiscount<'a> {
    amount: Money<'a, Currency>,
    affected_quantity: u32,
}

impl<'a> BasketDiscount<'a> {
    /// Create a discount result.
    pub fn new(amount: Money<'a, Currency>, affected_quantity: u32) -> Self {
        Self {
            amount,
            affected_quantity,
        }
    }

    /// A result that touched nothing.
    pub fn zero(currency: &'a Currency) -> Self {
        Self::new(Money::from_minor(0, currency), 0)
    }

    /// Discount amount
    pub fn amount(&self) -> Money<'a, Currency> {
        self.amount
    }

    /// Units the benefit affected
    pub fn affected_quantity(&self) -> u32 {
        self.affected_quantity
    }

    /// Whether the benefit affected any units.
    pub fn is_successful(&self) -> bool {
        self.affected_quantity > 0
    }
}

/// Accumulated applications of one offer.
#[derive(Debug, Clone)]
pub struct OfferApplication<'a> {
    /// Applied offer
    pub offer: OfferKey,

    /// Offer name at the time it was applied
    pub name: String,

    /// Total discount across all applications
    pub discount: Money<'a, Currency>,

    /// Number of times the offer was applied
    pub frequency: u32,

    /// Units affected across all applications
    pub affected_quantity: u32,
}

/// Offers applied to a basket, in the order they were first applied.
#[derive(Debug, Clone, Default)]
pub struct OfferApplications<'a> {
    applications: Vec<OfferApplication<'a>>,
    ranks: FxHashMap<OfferKey, usize>,
}

impl<'a> OfferApplications<'a> {
    /// Record the position an offer was evaluated at.
    pub(crate) fn set_rank(&mut self, offer: OfferKey, rank: usize) {
        self.ranks.insert(offer, rank);
    }

    /// Position the offer was evaluated at, if it was evaluated.
    pub fn rank(&self, offer: OfferKey) -> Option<usize> {
        self.ranks.get(&offer).copied()
    }

    /// Record one successful application of an offer.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the discount currency differs from earlier applications.
    pub(crate) fn add(
        &mut self,
        offer: OfferKey,
        name: &str,
        discount: &BasketDiscount<'a>,
    ) -> Result<(), MoneyError> {
        if let Some(application) = self.applications.iter_mut().find(|app| app.offer == offer) {
            application.discount = application.discount.add(discount.amount)?;
            application.frequency = application.frequency.saturating_add(1);
            application.affected_quantity = application
                .affected_quantity
                .saturating_add(discount.affected_quantity);

            return Ok(());
        }

        self.applications.push(OfferApplication {
            offer,
            name: name.to_string(),
            discount: discount.amount,
            frequency: 1,
            affected_quantity: discount.affected_quantity,
        });

        Ok(())
    }

    /// Get an offer's applications.
    pub fn get(&self, offer: OfferKey) -> Option<&OfferApplication<'a>> {
        self.applications.iter().find(|app| app.offer == offer)
    }

    /// Iterate over applied offers.
    pub fn iter(&self) -> impl Iterator<Item = &OfferApplication<'a>> {
        self.applications.iter()
    }

    /// Number of distinct offers applied
    pub fn len(&self) -> usize {
        self.applications.len()
    }

    /// Whether no offer was applied
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    /// Sum of every offer's discount.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if a discount is in another currency.
    pub fn total_discount(
        &self,
        currency: &'a Currency,
    ) -> Result<Money<'a, Currency>, TotalPriceError> {
        total_price(self.applications.iter().map(|app| app.discount), currency)
    }
}
