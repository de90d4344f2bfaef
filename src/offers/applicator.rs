//! Offer Applicator

use jiff::Timestamp;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
    basket::{Basket, consumer::Claimant},
    offers::{ConditionalOffer, OfferError, OfferSet},
};

/// Applies offers to baskets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Applicator {
    now: Option<Timestamp>,
}

impl Applicator {
    /// Applicator using the current time to check offer availability.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applicator with a fixed clock.
    pub fn at(now: Timestamp) -> Self {
        Self { now: Some(now) }
    }

    /// Apply every available offer to the basket.
    ///
    /// Previous applications are discarded first. Offers are evaluated by
    /// priority, highest first, with ties going to the offer created first.
    /// Each offer is applied repeatedly until its benefit stops affecting
    /// units or it reaches its application limit.
    ///
    /// # Errors
    ///
    /// Returns an [`OfferError`] if a benefit cannot be calculated.
    #[tracing::instrument(skip_all, fields(offers = offers.len(), lines = basket.len()))]
    pub fn apply<'a>(
        &self,
        basket: &mut Basket<'a>,
        offers: &OfferSet<'a>,
    ) -> Result<(), OfferError> {
        basket.reset_offer_applications();

        let now = self.now.unwrap_or_else(Timestamp::now);
        let ordered = ordered_offers(offers, now);

        for (rank, offer) in ordered.iter().enumerate() {
            basket.applications_mut().set_rank(offer.key(), rank);
        }

        for (rank, offer) in ordered.into_iter().enumerate() {
            let claimant = Claimant::new(offer.key(), offer.is_exclusive(), rank);
            let max = offer.max_applications();
            let mut applied = 0u32;

            while applied < max {
                let result = offer.apply_benefit(basket, claimant)?;

                if !result.is_successful() {
                    break;
                }

                trace!(
                    offer = offer.name(),
                    discount = %result.amount(),
                    quantity = result.affected_quantity(),
                    "offer applied"
                );

                basket
                    .applications_mut()
                    .add(offer.key(), offer.name(), &result)?;

                applied += 1;
            }

            debug!(
                offer = offer.name(),
                rank,
                priority = offer.priority(),
                exclusive = offer.is_exclusive(),
                applications = applied,
                "offer evaluated"
            );
        }

        Ok(())
    }
}

fn ordered_offers<'o, 'a>(
    offers: &'o OfferSet<'a>,
    now: Timestamp,
) -> SmallVec<[&'o ConditionalOffer<'a>; 8]> {
    let mut ordered: SmallVec<[&ConditionalOffer<'a>; 8]> = offers
        .iter()
        .filter(|offer| offer.is_available(now))
        .collect();

    ordered.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.key().cmp(&b.key()))
    });

    ordered
}
