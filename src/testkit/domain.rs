//! Builders for domain values used across tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Asset, Quote, QuoteView, Triangle};

/// The canonical test triangle: ETH/USDT, ETH/BTC, BTC/USDT settling
/// in USDT.
#[must_use]
pub fn triangle() -> Triangle {
    Triangle::new(
        "ETH/USDT",
        "ETH/BTC",
        "BTC/USDT",
        Asset::from("USDT"),
        Asset::from("ETH"),
        Asset::from("BTC"),
    )
    .expect("valid test triangle")
}

/// A quote with the same size on both sides, observed at `at`.
#[must_use]
pub fn quote(bid: Decimal, ask: Decimal, size: Decimal, at: DateTime<Utc>) -> Quote {
    Quote::new(bid, ask, size, size, at)
}

/// A view with a roughly 1% gross cycle edge and one unit of depth on
/// every leg: buy ETH at 2000 USDT, sell at 0.05 BTC, sell BTC at
/// 40400 USDT.
#[must_use]
pub fn profitable_view(now: DateTime<Utc>) -> QuoteView {
    QuoteView::new(
        quote(dec!(1999), dec!(2000), dec!(1), now),
        quote(dec!(0.05), dec!(0.0501), dec!(1), now),
        quote(dec!(40400), dec!(40410), dec!(1), now),
        now,
    )
}

/// A view whose cycle multiplies out to exactly 1.0: zero gross edge.
#[must_use]
pub fn flat_view(now: DateTime<Utc>) -> QuoteView {
    QuoteView::new(
        quote(dec!(1999), dec!(2000), dec!(1), now),
        quote(dec!(0.05), dec!(0.0501), dec!(1), now),
        quote(dec!(40000), dec!(40010), dec!(1), now),
        now,
    )
}
