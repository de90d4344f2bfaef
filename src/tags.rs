//! Tags
//!
//! Category tags attached to products and matched by ranges.

pub mod collection;
pub mod string;
