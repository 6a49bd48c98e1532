//! Top-of-book quotes and per-triangle snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::money::{Price, Qty};
use super::triangle::Leg;

/// Best bid/ask for a single pair with the sizes available at the top of
/// the book and the time the book was observed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Quote {
    bid: Price,
    ask: Price,
    bid_size: Qty,
    ask_size: Qty,
    observed_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote. Prices must be positive; sizes may be zero (an
    /// empty book side is a valid observation).
    #[must_use]
    pub fn new(
        bid: Price,
        ask: Price,
        bid_size: Qty,
        ask_size: Qty,
        observed_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(bid > Price::ZERO && ask > Price::ZERO, "non-positive price");
        Self {
            bid,
            ask,
            bid_size,
            ask_size,
            observed_at,
        }
    }

    /// Best bid price.
    #[must_use]
    pub const fn bid(&self) -> Price {
        self.bid
    }

    /// Best ask price.
    #[must_use]
    pub const fn ask(&self) -> Price {
        self.ask
    }

    /// Quantity available at the best bid.
    #[must_use]
    pub const fn bid_size(&self) -> Qty {
        self.bid_size
    }

    /// Quantity available at the best ask.
    #[must_use]
    pub const fn ask_size(&self) -> Qty {
        self.ask_size
    }

    /// When the book was observed.
    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Age of this quote relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.observed_at
    }
}

/// The three legs' quotes snapshotted together for one evaluation cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuoteView {
    ab: Quote,
    bc: Quote,
    ac: Quote,
    taken_at: DateTime<Utc>,
}

impl QuoteView {
    /// Snapshot three leg quotes taken at `taken_at`.
    #[must_use]
    pub const fn new(ab: Quote, bc: Quote, ac: Quote, taken_at: DateTime<Utc>) -> Self {
        Self {
            ab,
            bc,
            ac,
            taken_at,
        }
    }

    /// Quote for the given leg.
    #[must_use]
    pub const fn leg(&self, leg: Leg) -> &Quote {
        match leg {
            Leg::Ab => &self.ab,
            Leg::Bc => &self.bc,
            Leg::Ac => &self.ac,
        }
    }

    /// When the snapshot was assembled.
    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Age of the stalest leg relative to `now`.
    #[must_use]
    pub fn max_age(&self, now: DateTime<Utc>) -> chrono::Duration {
        Leg::ALL
            .iter()
            .map(|l| self.leg(*l).age(now))
            .max()
            .unwrap_or_else(chrono::Duration::zero)
    }
}
