//! Purchase Strategies
//!
//! A strategy decides what a product costs and whether it can be bought.
//! Baskets ask their strategy for [`PurchaseInfo`] whenever a product is added.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::products::Product;

/// Reasons a purchase is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AvailabilityError {
    /// The product cannot be bought at all.
    #[error("product is unavailable")]
    Unavailable,

    /// Not enough stock for the requested quantity.
    #[error("only {available} in stock, {requested} requested")]
    InsufficientStock {
        /// Units in stock
        available: u32,
        /// Units requested
        requested: u32,
    },
}

/// Stock availability for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Always available.
    Available,

    /// Available up to the given number of units.
    InStock(u32),

    /// Not available.
    Unavailable,
}

impl Availability {
    /// Check whether `quantity` units may be purchased.
    ///
    /// # Errors
    ///
    /// Returns an [`AvailabilityError`] if the product is unavailable or
    /// there is not enough stock.
    pub fn is_purchase_permitted(&self, quantity: u32) -> Result<(), AvailabilityError> {
        match *self {
            Availability::Available => Ok(()),
            Availability::InStock(available) if quantity <= available => Ok(()),
            Availability::InStock(available) => Err(AvailabilityError::InsufficientStock {
                available,
                requested: quantity,
            }),
            Availability::Unavailable => Err(AvailabilityError::Unavailable),
        }
    }
}

/// Price and availability of a product under a strategy.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseInfo<'a> {
    /// Unit price
    pub price: Money<'a, Currency>,

    /// Availability
    pub availability: Availability,
}

/// Pricing & availability strategy.
pub trait Strategy: fmt::Debug {
    /// Fetch purchase info for a product.
    fn fetch_for_product<'a>(&self, product: &Product<'a>) -> PurchaseInfo<'a>;
}

/// Uses the product price and requires stock when it is tracked.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockRequired;

impl Strategy for StockRequired {
    fn fetch_for_product<'a>(&self, product: &Product<'a>) -> PurchaseInfo<'a> {
        let availability = match product.stock {
            None => Availability::Available,
            Some(0) => Availability::Unavailable,
            Some(units) => Availability::InStock(units),
        };

        PurchaseInfo {
            price: product.price,
            availability,
        }
    }
}

/// Uses the product price and ignores stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl Strategy for Unrestricted {
    fn fetch_for_product<'a>(&self, product: &Product<'a>) -> PurchaseInfo<'a> {
        PurchaseInfo {
            price: product.price,
            availability: Availability::Available,
        }
    }
}

/// Picks the strategy a basket should use.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selector;

impl Selector {
    /// Return the default strategy.
    pub fn strategy(&self) -> Box<dyn Strategy> {
        Box::new(StockRequired)
    }
}
