//! Line Offer Consumption
//!
//! Tracks, unit by unit, which offers have consumed a basket line. Every
//! consumption is a [`Claimant`]: the offer, whether it is exclusive, and the
//! position the applicator evaluated it at.
//!
//! A unit can be shared by any number of non-exclusive offers. An exclusive
//! offer owns the units it consumes outright and cannot use a unit another
//! offer has already touched.

use smallvec::SmallVec;

use crate::offers::OfferKey;

/// An offer's identity as seen by a basket line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claimant {
    offer: OfferKey,
    exclusive: bool,
    rank: usize,
}

impl Claimant {
    /// Create a claimant evaluated at `rank`.
    pub fn new(offer: OfferKey, exclusive: bool, rank: usize) -> Self {
        Self {
            offer,
            exclusive,
            rank,
        }
    }

    /// Create a claimant for an offer the applicator never evaluated.
    ///
    /// Unranked claimants see every existing claim as coming before them.
    pub fn unranked(offer: OfferKey, exclusive: bool) -> Self {
        Self::new(offer, exclusive, usize::MAX)
    }

    /// Offer key
    pub fn offer(&self) -> OfferKey {
        self.offer
    }

    /// Whether the offer is exclusive.
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Evaluation rank
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Whether two different offers may not share a unit.
    fn conflicts(&self, other: &Claimant) -> bool {
        self.offer != other.offer && (self.exclusive || other.exclusive)
    }

    /// Whether this existing claim hides a unit from `other`.
    fn blocks(&self, other: &Claimant) -> bool {
        self.rank < other.rank && self.conflicts(other)
    }
}

type Claims = SmallVec<[Claimant; 2]>;

/// Per-unit consumption ledger for one basket line.
#[derive(Debug, Clone, Default)]
pub struct LineOfferConsumer {
    units: Vec<Claims>,
}

impl LineOfferConsumer {
    /// Create a ledger for `quantity` unconsumed units.
    pub fn new(quantity: u32) -> Self {
        let mut consumer = Self::default();
        consumer.resize(quantity);
        consumer
    }

    /// Grow or shrink the ledger to `quantity` units, dropping all claims.
    pub(crate) fn resize(&mut self, quantity: u32) {
        self.units.clear();
        self.units
            .resize_with(usize::try_from(quantity).unwrap_or(0), Claims::new);
    }

    /// Drop every claim.
    pub(crate) fn clear(&mut self) {
        self.units.iter_mut().for_each(SmallVec::clear);
    }

    /// Units on the line.
    pub fn quantity(&self) -> u32 {
        count(self.units.len())
    }

    /// Units the claimant could still consume.
    ///
    /// A unit is available unless the claimant already holds it, or a claim
    /// ranked before the claimant conflicts with it.
    pub fn available(&self, claimant: &Claimant) -> u32 {
        count(
            self.units
                .iter()
                .filter(|claims| is_available(claims, claimant))
                .count(),
        )
    }

    /// Units consumed by a specific offer.
    pub fn consumed(&self, offer: OfferKey) -> u32 {
        count(
            self.units
                .iter()
                .filter(|claims| holds(claims, offer))
                .count(),
        )
    }

    /// Units consumed by any offer.
    pub fn consumed_any(&self) -> u32 {
        count(self.units.iter().filter(|claims| !claims.is_empty()).count())
    }

    /// Units that count towards the claimant's condition: those it could
    /// still consume plus those it already holds.
    pub fn matched(&self, claimant: &Claimant) -> u32 {
        count(
            self.units
                .iter()
                .filter(|claims| holds(claims, claimant.offer) || is_available(claims, claimant))
                .count(),
        )
    }

    /// Offers holding at least one unit, in first-claim order.
    pub fn consumers(&self) -> SmallVec<[OfferKey; 4]> {
        let mut offers: SmallVec<[OfferKey; 4]> = SmallVec::new();

        for claim in self.units.iter().flatten() {
            if !offers.contains(&claim.offer) {
                offers.push(claim.offer);
            }
        }

        offers
    }

    /// Consume up to `quantity` units for the claimant, returning how many
    /// were consumed.
    ///
    /// Non-exclusive claimants reuse units already shared with other
    /// non-exclusive offers before touching free units.
    pub(crate) fn consume(&mut self, quantity: u32, claimant: Claimant) -> u32 {
        let mut remaining = quantity;

        if !claimant.exclusive {
            remaining = self.claim_where(remaining, claimant, |claims| !claims.is_empty());
        }

        remaining = self.claim_where(remaining, claimant, SmallVec::is_empty);

        quantity - remaining
    }

    fn claim_where(
        &mut self,
        mut remaining: u32,
        claimant: Claimant,
        prefer: impl Fn(&Claims) -> bool,
    ) -> u32 {
        for claims in &mut self.units {
            if remaining == 0 {
                break;
            }

            if prefer(claims) && can_claim(claims, &claimant) {
                claims.push(claimant);
                remaining -= 1;
            }
        }

        remaining
    }
}

fn holds(claims: &Claims, offer: OfferKey) -> bool {
    claims.iter().any(|claim| claim.offer == offer)
}

fn is_available(claims: &Claims, claimant: &Claimant) -> bool {
    !holds(claims, claimant.offer) && !claims.iter().any(|claim| claim.blocks(claimant))
}

fn can_claim(claims: &Claims, claimant: &Claimant) -> bool {
    !holds(claims, claimant.offer) && !claims.iter().any(|claim| claim.conflicts(claimant))
}

fn count(units: usize) -> u32 {
    u32::try_from(units).unwrap_or(u32::MAX)
}
