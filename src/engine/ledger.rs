//! Per-venue inventory ledger.
//!
//! Tracks available and reserved balances per asset. Reservation is a
//! single atomic compare-and-reserve over all touched assets so that two
//! attempts computed from overlapping quote snapshots can never
//! double-spend a balance, even if a future revision allows more than one
//! attempt in flight.
//!
//! Invariant: `reserved <= available` per asset at all times. Releases and
//! settlements are keyed by attempt id and idempotent.

use std::collections::HashMap;

use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Asset, AttemptId, Qty};

#[derive(Default)]
struct Inner {
    available: HashMap<Asset, Decimal>,
    reserved: HashMap<Asset, Decimal>,
    holds: HashMap<AttemptId, Vec<(Asset, Qty)>>,
}

/// Thread-safe inventory ledger for one venue.
#[derive(Default)]
pub struct InventoryLedger {
    inner: Mutex<Inner>,
}

impl InventoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite available balances with venue-reported totals.
    ///
    /// Reported totals never shrink below what is currently reserved;
    /// in-flight holds stay covered until they resolve.
    pub fn set_balances(&self, balances: HashMap<Asset, Decimal>) {
        let mut inner = self.inner.lock();
        for (asset, total) in balances {
            let reserved = inner.reserved.get(&asset).copied().unwrap_or(Decimal::ZERO);
            inner.available.insert(asset, total.max(reserved));
        }
    }

    /// Available balance for an asset.
    #[must_use]
    pub fn available_of(&self, asset: &Asset) -> Decimal {
        self.inner
            .lock()
            .available
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Currently reserved balance for an asset.
    #[must_use]
    pub fn reserved_of(&self, asset: &Asset) -> Decimal {
        self.inner
            .lock()
            .reserved
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Number of attempts currently holding reservations.
    #[must_use]
    pub fn open_holds(&self) -> usize {
        self.inner.lock().holds.len()
    }

    /// Atomically reserve the given quantities for one attempt.
    ///
    /// All-or-nothing: if any asset lacks headroom, nothing is reserved
    /// and `false` is returned. Reserving twice for the same attempt id
    /// is rejected.
    pub fn try_reserve(&self, id: AttemptId, wants: &[(Asset, Qty)]) -> bool {
        let mut inner = self.inner.lock();
        if inner.holds.contains_key(&id) {
            return false;
        }
        for (asset, qty) in wants {
            let available = inner.available.get(asset).copied().unwrap_or(Decimal::ZERO);
            let reserved = inner.reserved.get(asset).copied().unwrap_or(Decimal::ZERO);
            if reserved + *qty > available {
                return false;
            }
        }
        for (asset, qty) in wants {
            *inner.reserved.entry(asset.clone()).or_insert(Decimal::ZERO) += *qty;
        }
        inner.holds.insert(id, wants.to_vec());
        true
    }

    /// Release an attempt's reservations unchanged. Idempotent.
    pub fn release(&self, id: AttemptId) {
        let mut inner = self.inner.lock();
        let Some(hold) = inner.holds.remove(&id) else {
            return;
        };
        for (asset, qty) in hold {
            if let Some(reserved) = inner.reserved.get_mut(&asset) {
                *reserved -= qty;
            }
        }
    }

    /// Resolve an attempt's reservations and apply signed balance deltas
    /// from its fills. Idempotent per attempt id.
    pub fn settle(&self, id: AttemptId, deltas: &[(Asset, Decimal)]) {
        let mut inner = self.inner.lock();
        let Some(hold) = inner.holds.remove(&id) else {
            return;
        };
        for (asset, qty) in hold {
            if let Some(reserved) = inner.reserved.get_mut(&asset) {
                *reserved -= qty;
            }
        }
        for (asset, delta) in deltas {
            let entry = inner
                .available
                .entry(asset.clone())
                .or_insert(Decimal::ZERO);
            *entry += *delta;
            // Flattening slippage can momentarily report a tiny negative;
            // the ledger floors at zero rather than carry a debt.
            if *entry < Decimal::ZERO {
                *entry = Decimal::ZERO;
            }
        }
    }
}
