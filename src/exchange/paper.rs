//! In-process paper venue for dry-run mode.
//!
//! Serves a static top-of-book from configuration and fills IOC market
//! orders against it deterministically, charging the configured taker
//! fee. Useful for exercising the full decision/execution path without
//! venue credentials.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::config::{PaperBookConfig, PaperConfig};
use crate::domain::{Asset, Fill, Leg, LegOrder, OrderId, Quote, QuoteView, Side, Triangle};
use crate::engine::edge::FeeSchedule;
use crate::error::{ExecutionError, Result};
use crate::exchange::traits::VenueAdapter;

/// Deterministic venue that fills against a configured static book.
pub struct PaperVenue {
    name: String,
    config: PaperConfig,
    book: PaperBookConfig,
    order_seq: AtomicU64,
}

impl PaperVenue {
    #[must_use]
    pub fn new(name: impl Into<String>, config: PaperConfig) -> Self {
        let book = config.book.clone().unwrap_or_else(default_book);
        Self {
            name: name.into(),
            config,
            book,
            order_seq: AtomicU64::new(1),
        }
    }

    fn next_order_id(&self) -> OrderId {
        let seq = self.order_seq.fetch_add(1, Ordering::Relaxed);
        OrderId::new(format!("paper-{seq}"))
    }

    /// Execution price for an IOC market order on `leg`.
    fn exec_price(&self, leg: Leg, side: Side) -> Decimal {
        match (leg, side) {
            (Leg::Ab, Side::Buy) => self.book.ab_ask,
            (Leg::Ab, Side::Sell) => self.book.ab_bid,
            (Leg::Bc, Side::Buy) => self.book.bc_ask,
            (Leg::Bc, Side::Sell) => self.book.bc_bid,
            (Leg::Ac, Side::Buy) => self.book.ac_ask,
            (Leg::Ac, Side::Sell) => self.book.ac_bid,
        }
    }

    /// Fee in the settlement currency (asset A) for a fill on `leg`.
    fn fee_in_quote(&self, leg: Leg, qty: Decimal, price: Decimal) -> Decimal {
        let notional_quote = match leg {
            // AB and AC are priced in A directly.
            Leg::Ab | Leg::Ac => qty * price,
            // BC is priced in C; convert through the AC bid.
            Leg::Bc => qty * price * self.book.ac_bid,
        };
        notional_quote * self.config.taker_fee
    }
}

fn default_book() -> PaperBookConfig {
    PaperBookConfig {
        ab_bid: Decimal::from(1999),
        ab_ask: Decimal::from(2000),
        bc_bid: Decimal::new(5, 2),    // 0.05
        bc_ask: Decimal::new(501, 4),  // 0.0501
        ac_bid: Decimal::from(40_000),
        ac_ask: Decimal::from(40_010),
        size: Decimal::ONE,
    }
}

#[async_trait]
impl VenueAdapter for PaperVenue {
    async fn quotes(&self, _triangle: &Triangle) -> Result<QuoteView> {
        let now = Utc::now();
        let size = self.book.size;
        Ok(QuoteView::new(
            Quote::new(self.book.ab_bid, self.book.ab_ask, size, size, now),
            Quote::new(self.book.bc_bid, self.book.bc_ask, size, size, now),
            Quote::new(self.book.ac_bid, self.book.ac_ask, size, size, now),
            now,
        ))
    }

    async fn place_order(&self, order: &LegOrder) -> std::result::Result<Fill, ExecutionError> {
        if order.qty <= Decimal::ZERO {
            return Err(ExecutionError::Rejected("non-positive quantity".into()));
        }
        // The static book always covers `size` at the top; the remainder
        // of a larger IOC order cancels.
        let qty = order.qty.min(self.book.size);
        let price = self.exec_price(order.leg, order.side);
        Ok(Fill {
            leg: order.leg,
            side: order.side,
            order_id: self.next_order_id(),
            qty,
            price,
            fee: self.fee_in_quote(order.leg, qty, price),
            attempt_id: order.attempt_id,
        })
    }

    async fn cancel_order(&self, _id: &OrderId) -> Result<()> {
        // IOC orders never rest on the paper book.
        Ok(())
    }

    async fn balances(&self) -> Result<HashMap<Asset, Decimal>> {
        Ok(self
            .config
            .balances
            .iter()
            .map(|(asset, total)| (Asset::new(asset.clone()), *total))
            .collect())
    }

    fn fees(&self) -> FeeSchedule {
        FeeSchedule::flat(self.config.taker_fee)
    }

    fn min_notional(&self, symbol: &str) -> Decimal {
        self.config
            .min_notionals
            .get(symbol)
            .copied()
            .unwrap_or(self.config.min_notional)
    }

    fn venue_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::domain::AttemptId;

    fn venue() -> PaperVenue {
        PaperVenue::new("paper", PaperConfig::default())
    }

    fn order(leg: Leg, side: Side, qty: Decimal) -> LegOrder {
        LegOrder::ioc_market("ETH/USDT", side, qty, leg, AttemptId::new())
    }

    #[tokio::test]
    async fn buy_fills_at_ask() {
        let fill = venue()
            .place_order(&order(Leg::Ab, Side::Buy, dec!(0.5)))
            .await
            .unwrap();
        assert_eq!(fill.qty, dec!(0.5));
        assert_eq!(fill.price, dec!(2000));
        assert_eq!(fill.fee, dec!(1.0000)); // 0.5 * 2000 * 0.001
    }

    #[tokio::test]
    async fn ioc_truncates_to_top_depth() {
        let fill = venue()
            .place_order(&order(Leg::Ab, Side::Buy, dec!(5)))
            .await
            .unwrap();
        assert_eq!(fill.qty, dec!(1));
    }

    #[tokio::test]
    async fn rejects_non_positive_quantity() {
        let err = venue()
            .place_order(&order(Leg::Ab, Side::Buy, dec!(0)))
            .await;
        assert!(matches!(err, Err(ExecutionError::Rejected(_))));
    }

    #[tokio::test]
    async fn bc_fee_converts_to_quote_currency() {
        let fill = venue()
            .place_order(&order(Leg::Bc, Side::Sell, dec!(0.1)))
            .await
            .unwrap();
        // 0.1 ETH * 0.05 BTC * 40000 USDT/BTC * 0.001 = 0.2 USDT
        assert_eq!(fill.fee, dec!(0.200000));
    }
}
