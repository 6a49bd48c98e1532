//! Venue-agnostic domain types: triangles, quotes, orders, fills, and
//! attempt records.

pub mod attempt;
pub mod money;
pub mod order;
pub mod quote;
pub mod triangle;

pub use attempt::{Attempt, AttemptId, AttemptOutcome, BookSnapshot, RejectReason, SkipReason};
pub use money::{bps_to_fraction, Price, Qty};
pub use order::{Fill, LegOrder, OrderId, OrderKind, Side, TimeInForce};
pub use quote::{Quote, QuoteView};
pub use triangle::{Asset, Leg, Triangle};
