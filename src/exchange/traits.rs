//! Venue adapter trait definitions.
//!
//! These traits define the capability set the engine consumes. Real
//! connectivity lives behind them; the crate ships only the in-process
//! paper venue.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Asset, Fill, LegOrder, OrderId, QuoteView, Triangle};
use crate::engine::edge::FeeSchedule;
use crate::error::{ExecutionError, Result};

/// Connectivity and metadata for one trading venue.
///
/// `place_order` resolves IOC semantics itself: an `Ok` fill with zero
/// quantity means the order cancelled without executing. `Err` is
/// reserved for transport failures and venue rejections.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    /// Snapshot the three legs' top-of-book quotes.
    async fn quotes(&self, triangle: &Triangle) -> Result<QuoteView>;

    /// Submit an IOC market order and return whatever filled.
    async fn place_order(&self, order: &LegOrder) -> std::result::Result<Fill, ExecutionError>;

    /// Best-effort cancel by client order id.
    async fn cancel_order(&self, id: &OrderId) -> Result<()>;

    /// Current available balances per asset.
    async fn balances(&self) -> Result<HashMap<Asset, Decimal>>;

    /// Taker fee schedule for the venue.
    fn fees(&self) -> FeeSchedule;

    /// Venue-reported minimum notional for a symbol, in that symbol's
    /// quote currency.
    fn min_notional(&self, symbol: &str) -> Decimal;

    /// Venue name for logging and metric labels.
    fn venue_name(&self) -> &str;
}
