//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    basket::{
        Basket, BasketError,
        consumer::{Claimant, LineOfferConsumer},
        line::Line,
    },
    discounts::DiscountError,
    fixtures::{Fixture, FixtureError},
    offers::{
        ConditionalOffer, OfferError, OfferKey, OfferSet, OfferStatus,
        applications::{BasketDiscount, OfferApplication, OfferApplications},
        applicator::Applicator,
        benefits::{Benefit, BenefitKind},
        conditions::{Condition, ConditionKind},
    },
    pricing::TotalPriceError,
    products::{Catalogue, Product, ProductKey},
    ranges::Range,
    receipt::{Receipt, ReceiptError},
    strategy::{Availability, PurchaseInfo, Selector, StockRequired, Strategy, Unrestricted},
    tags::{collection::TagCollection, string::StringTagCollection},
};
