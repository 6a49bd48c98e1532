//! Order specifications and fills.

use serde::Serialize;

use super::attempt::AttemptId;
use super::money::{Price, Qty};
use super::triangle::Leg;

/// Unique identifier for an order on a venue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create a new order id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side that reverses this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Time-in-force. The engine only ever places immediate-or-cancel orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeInForce {
    /// Fill whatever is immediately available, cancel the remainder.
    ImmediateOrCancel,
}

/// Order kind. The engine only ever places market-equivalent orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderKind {
    Market,
}

/// One leg order as handed to the venue adapter. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct LegOrder {
    pub symbol: String,
    pub side: Side,
    pub qty: Qty,
    pub tif: TimeInForce,
    pub kind: OrderKind,
    pub leg: Leg,
    /// Owning attempt, echoed back on fills for idempotent bookkeeping.
    pub attempt_id: AttemptId,
    /// Client-assigned id, used to cancel after a submission timeout.
    pub client_id: OrderId,
}

impl LegOrder {
    /// Build an IOC market order for `leg` belonging to `attempt_id`.
    #[must_use]
    pub fn ioc_market(
        symbol: impl Into<String>,
        side: Side,
        qty: Qty,
        leg: Leg,
        attempt_id: AttemptId,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            qty,
            tif: TimeInForce::ImmediateOrCancel,
            kind: OrderKind::Market,
            leg,
            attempt_id,
            client_id: OrderId::new(format!("{attempt_id}-{}-{side}", leg.to_string().to_lowercase())),
        }
    }
}

/// Execution details of one (possibly partial) fill.
///
/// The adapter reports `fee` denominated in the venue's settlement
/// currency (asset A of the triangle) so realized PnL can be summed
/// directly.
#[derive(Debug, Clone, Serialize)]
pub struct Fill {
    pub leg: Leg,
    pub side: Side,
    pub order_id: OrderId,
    pub qty: Qty,
    pub price: Price,
    pub fee: Price,
    pub attempt_id: AttemptId,
}

impl Fill {
    /// A zero-quantity fill: the venue executed nothing (IOC cancelled,
    /// or the submission timed out).
    #[must_use]
    pub fn none(leg: Leg, side: Side, attempt_id: AttemptId) -> Self {
        Self {
            leg,
            side,
            order_id: OrderId::new(""),
            qty: Qty::ZERO,
            price: Price::ZERO,
            fee: Price::ZERO,
            attempt_id,
        }
    }

    /// Executed notional (price times quantity).
    #[must_use]
    pub fn notional(&self) -> Price {
        self.price * self.qty
    }

    /// True when nothing executed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.qty.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn fill_notional() {
        let fill = Fill {
            leg: Leg::Ab,
            side: Side::Buy,
            order_id: OrderId::new("o-1"),
            qty: dec!(0.5),
            price: dec!(2000),
            fee: dec!(1),
            attempt_id: AttemptId::new(),
        };
        assert_eq!(fill.notional(), dec!(1000.0));
        assert!(!fill.is_empty());
    }

    #[test]
    fn empty_fill() {
        let fill = Fill::none(Leg::Bc, Side::Sell, AttemptId::new());
        assert!(fill.is_empty());
        assert_eq!(fill.notional(), dec!(0));
    }
}
