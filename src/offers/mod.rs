//! Conditional Offers
//!
//! An offer pairs a [`Condition`] with a [`Benefit`]. The [`Applicator`]
//! evaluates offers against a basket in priority order; exclusive offers
//! never share a basket unit with any other offer.
//!
//! [`Applicator`]: applicator::Applicator

use std::fmt;

use jiff::Timestamp;
use rusty_money::MoneyError;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::{
    basket::{Basket, consumer::Claimant},
    discounts::DiscountError,
    offers::{applications::BasketDiscount, benefits::Benefit, conditions::Condition},
    pricing::TotalPriceError,
};

pub mod applications;
pub mod applicator;
pub mod benefits;
pub mod conditions;

/// Upper bound on how many times one offer may apply to a basket.
pub const MAX_APPLICATIONS: u32 = 10_000;

new_key_type! {
    /// Offer Key
    pub struct OfferKey;
}

/// Errors raised while applying offers.
#[derive(Debug, Error)]
pub enum OfferError {
    /// Discount calculation failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Line price calculation failed.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// The offer is priced in a different currency from the basket.
    #[error("offer {offer} is priced in {found}, but basket has currency {expected}")]
    CurrencyMismatch {
        /// Offer name
        offer: String,

        /// Basket currency
        expected: &'static str,

        /// Offer currency
        found: &'static str,
    },
}

/// Whether an offer may be applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OfferStatus {
    /// Available within its validity window.
    #[default]
    Open,

    /// Never applied.
    Suspended,
}

/// A condition and benefit pair applied to baskets.
#[derive(Debug, Clone)]
pub struct ConditionalOffer<'a> {
    key: OfferKey,
    name: String,
    slug: String,
    condition: Condition<'a>,
    benefit: Benefit<'a>,
    priority: i32,
    exclusive: bool,
    start: Option<Timestamp>,
    end: Option<Timestamp>,
    status: OfferStatus,
    max_basket_applications: Option<u32>,
}

impl<'a> ConditionalOffer<'a> {
    /// Create an open, exclusive offer with priority zero.
    pub fn new(
        key: OfferKey,
        name: impl Into<String>,
        condition: Condition<'a>,
        benefit: Benefit<'a>,
    ) -> Self {
        let name = name.into();

        Self {
            key,
            slug: slugify(&name),
            name,
            condition,
            benefit,
            priority: 0,
            exclusive: true,
            start: None,
            end: None,
            status: OfferStatus::Open,
            max_basket_applications: None,
        }
    }

    /// Override the slug derived from the name.
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Higher priorities are applied first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the offer refuses to share units with other offers.
    #[must_use]
    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// The offer is not available before `start`.
    #[must_use]
    pub fn starting_at(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    /// The offer is not available from `end` onwards.
    #[must_use]
    pub fn ending_at(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    /// Limit how many times the offer applies to one basket.
    #[must_use]
    pub fn with_max_basket_applications(mut self, max: u32) -> Self {
        self.max_basket_applications = Some(max);
        self
    }

    /// Set the offer status.
    #[must_use]
    pub fn with_status(mut self, status: OfferStatus) -> Self {
        self.status = status;
        self
    }

    /// Offer key
    pub fn key(&self) -> OfferKey {
        self.key
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL-safe identifier
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Condition
    pub fn condition(&self) -> &Condition<'a> {
        &self.condition
    }

    /// Benefit
    pub fn benefit(&self) -> &Benefit<'a> {
        &self.benefit
    }

    /// Priority
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the offer is exclusive
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Status
    pub fn status(&self) -> OfferStatus {
        self.status
    }

    /// Whether the offer can be applied at `now`.
    pub fn is_available(&self, now: Timestamp) -> bool {
        self.status == OfferStatus::Open
            && self.start.is_none_or(|start| start <= now)
            && self.end.is_none_or(|end| now < end)
    }

    /// Most times the offer may apply to one basket.
    pub fn max_applications(&self) -> u32 {
        self.max_basket_applications
            .map_or(MAX_APPLICATIONS, |max| max.min(MAX_APPLICATIONS))
    }

    /// How the basket's lines see this offer, using the rank from the last
    /// applicator run.
    pub fn claimant(&self, basket: &Basket<'_>) -> Claimant {
        basket.applications().rank(self.key).map_or_else(
            || Claimant::unranked(self.key, self.exclusive),
            |rank| Claimant::new(self.key, self.exclusive, rank),
        )
    }

    /// Whether the basket meets the condition with the units still available
    /// to this offer.
    pub fn is_condition_satisfied(&self, basket: &Basket<'_>) -> bool {
        self.condition.is_satisfied(basket, &self.claimant(basket))
    }

    /// Whether the basket goes some of the way towards the condition.
    pub fn is_condition_partially_satisfied(&self, basket: &Basket<'_>) -> bool {
        self.condition.is_partially_satisfied(basket, &self.claimant(basket))
    }

    /// Apply the benefit once as `claimant`.
    ///
    /// Returns a zero discount if the condition is not satisfied.
    ///
    /// # Errors
    ///
    /// Returns an [`OfferError`] if the discount cannot be calculated.
    pub fn apply_benefit(
        &self,
        basket: &mut Basket<'a>,
        claimant: Claimant,
    ) -> Result<BasketDiscount<'a>, OfferError> {
        if !self.condition.is_satisfied(basket, &claimant) {
            return Ok(BasketDiscount::zero(basket.currency()));
        }

        self.benefit.apply(basket, &self.condition, claimant, &self.name)
    }

    /// What the customer must add to the basket to get this offer.
    pub fn upsell_message(&self, basket: &Basket<'_>) -> Option<String> {
        self.condition.upsell_message(basket, &self.claimant(basket))
    }
}

impl fmt::Display for ConditionalOffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lower-case the name and join its alphanumeric runs with hyphens.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Offers keyed in creation order.
#[derive(Debug, Default)]
pub struct OfferSet<'a> {
    offers: SlotMap<OfferKey, ConditionalOffer<'a>>,
}

impl<'a> OfferSet<'a> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an offer built from its new key.
    pub fn insert(&mut self, build: impl FnOnce(OfferKey) -> ConditionalOffer<'a>) -> OfferKey {
        self.offers.insert_with_key(build)
    }

    /// Insert an offer built from its new key, unless building it fails.
    ///
    /// # Errors
    ///
    /// Returns the builder's error; nothing is inserted.
    pub fn try_insert<E>(
        &mut self,
        build: impl FnOnce(OfferKey) -> Result<ConditionalOffer<'a>, E>,
    ) -> Result<OfferKey, E> {
        self.offers.try_insert_with_key(build)
    }

    /// Get an offer by key.
    pub fn get(&self, key: OfferKey) -> Option<&ConditionalOffer<'a>> {
        self.offers.get(key)
    }

    /// Get an offer by slug.
    pub fn by_slug(&self, slug: &str) -> Option<&ConditionalOffer<'a>> {
        self.offers.values().find(|offer| offer.slug == slug)
    }

    /// Iterate over offers.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionalOffer<'a>> {
        self.offers.values()
    }

    /// Number of offers
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}
