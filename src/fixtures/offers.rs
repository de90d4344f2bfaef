//! Offer Fixtures

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    fixtures::{
        FixtureError,
        products::{parse_money, parse_percentage},
    },
    offers::{
        ConditionalOffer, OfferKey, OfferStatus,
        benefits::Benefit,
        conditions::Condition,
    },
    ranges::Range,
};

/// Offer status in YAML
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFixture {
    /// Open
    #[default]
    Open,

    /// Suspended
    Suspended,
}

impl From<StatusFixture> for OfferStatus {
    fn from(status: StatusFixture) -> Self {
        match status {
            StatusFixture::Open => OfferStatus::Open,
            StatusFixture::Suspended => OfferStatus::Suspended,
        }
    }
}

/// Condition fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionFixture {
    /// Number of units
    Count {
        /// Range key
        range: String,

        /// Units required
        value: u32,
    },

    /// Amount spent (e.g., "10.00 GBP")
    Value {
        /// Range key
        range: String,

        /// Amount required
        value: String,
    },

    /// Number of distinct products
    Coverage {
        /// Range key
        range: String,

        /// Products required
        value: u32,
    },
}

/// Benefit fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BenefitFixture {
    /// Percentage off (e.g., "15%")
    Percentage {
        /// Range key
        range: String,

        /// Percentage
        value: String,

        /// Maximum units discounted per application
        #[serde(default)]
        max_affected_items: Option<u32>,
    },

    /// Fixed amount off (e.g., "1.50 GBP")
    Absolute {
        /// Range key
        range: String,

        /// Amount
        value: String,

        /// Maximum units discounted per application
        #[serde(default)]
        max_affected_items: Option<u32>,
    },

    /// Cheapest unit free
    Multibuy {
        /// Range key
        range: String,
    },

    /// Condition items for a fixed price
    FixedPrice {
        /// Range key
        range: String,

        /// Price of the items
        value: String,
    },
}

/// Offer fixture from YAML
#[derive(Debug, Deserialize)]
pub struct OfferFixture {
    /// Offer name
    pub name: String,

    /// Slug, defaults to the slugified name
    #[serde(default)]
    pub slug: Option<String>,

    /// Priority, highest applied first
    #[serde(default)]
    pub priority: i32,

    /// Whether the offer refuses to share units
    #[serde(default = "default_exclusive")]
    pub exclusive: bool,

    /// Status
    #[serde(default)]
    pub status: StatusFixture,

    /// Start of the validity window
    #[serde(default)]
    pub start: Option<Timestamp>,

    /// End of the validity window
    #[serde(default)]
    pub end: Option<Timestamp>,

    /// Maximum applications per basket
    #[serde(default)]
    pub max_basket_applications: Option<u32>,

    /// Condition
    pub condition: ConditionFixture,

    /// Benefit
    pub benefit: BenefitFixture,
}

fn default_exclusive() -> bool {
    true
}

impl OfferFixture {
    /// Build the offer, resolving range keys and checking amounts are in
    /// the fixture currency.
    ///
    /// # Errors
    ///
    /// Returns an error if a range is unknown or an amount is invalid.
    pub fn try_into_offer<'a>(
        self,
        key: OfferKey,
        ranges: &FxHashMap<String, Range>,
        currency: &'static Currency,
    ) -> Result<ConditionalOffer<'a>, FixtureError> {
        let condition = match self.condition {
            ConditionFixture::Count { range, value } => {
                Condition::count(lookup(ranges, &range)?, value)
            }
            ConditionFixture::Value { range, value } => {
                Condition::value(lookup(ranges, &range)?, money_in(&value, currency)?)
            }
            ConditionFixture::Coverage { range, value } => {
                Condition::coverage(lookup(ranges, &range)?, value)
            }
        };

        let benefit = match self.benefit {
            BenefitFixture::Percentage {
                range,
                value,
                max_affected_items,
            } => with_max(
                Benefit::percentage(lookup(ranges, &range)?, parse_percentage(&value)?),
                max_affected_items,
            ),
            BenefitFixture::Absolute {
                range,
                value,
                max_affected_items,
            } => with_max(
                Benefit::absolute(lookup(ranges, &range)?, money_in(&value, currency)?),
                max_affected_items,
            ),
            BenefitFixture::Multibuy { range } => Benefit::multibuy(lookup(ranges, &range)?),
            BenefitFixture::FixedPrice { range, value } => {
                Benefit::fixed_price(lookup(ranges, &range)?, money_in(&value, currency)?)
            }
        };

        let mut offer = ConditionalOffer::new(key, self.name, condition, benefit)
            .with_priority(self.priority)
            .with_exclusive(self.exclusive)
            .with_status(self.status.into());

        if let Some(slug) = self.slug {
            offer = offer.with_slug(slug);
        }

        if let Some(start) = self.start {
            offer = offer.starting_at(start);
        }

        if let Some(end) = self.end {
            offer = offer.ending_at(end);
        }

        if let Some(max) = self.max_basket_applications {
            offer = offer.with_max_basket_applications(max);
        }

        Ok(offer)
    }
}

fn with_max(benefit: Benefit<'_>, max: Option<u32>) -> Benefit<'_> {
    match max {
        Some(max) => benefit.with_max_affected_items(max),
        None => benefit,
    }
}

fn lookup(ranges: &FxHashMap<String, Range>, key: &str) -> Result<Range, FixtureError> {
    ranges
        .get(key)
        .cloned()
        .ok_or_else(|| FixtureError::RangeNotFound(key.to_string()))
}

fn money_in<'a>(s: &str, currency: &'static Currency) -> Result<Money<'a, Currency>, FixtureError> {
    let money = parse_money(s)?;

    if money.currency() != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            money.currency().iso_alpha_code.to_string(),
        ));
    }

    Ok(money)
}
