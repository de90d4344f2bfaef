//! Rebate
//!
//! Rebate is a conditional offers engine. Offers pair a condition on a
//! product range with a benefit, and are applied to a basket in priority
//! order. Exclusive offers never share a basket unit with another offer.
//! Each offer can describe what the customer needs to add to qualify.

pub mod basket;
pub mod config;
pub mod discounts;
pub mod fixtures;
pub mod observability;
pub mod offers;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod ranges;
pub mod receipt;
pub mod strategy;
pub mod tags;
