//! Arbit - single-venue triangular arbitrage decision and execution.
//!
//! The engine polls one venue's order books for a configured asset
//! triangle, computes the fee-inclusive cycle edge, sizes an order
//! against top-of-book depth, runs the result through a risk gate, and
//! executes the three legs sequentially with unwind-on-miss semantics.
//!
//! # Architecture
//!
//! One independent decision loop per configured venue, each owning its
//! own adapter, ledger, risk gate, and circuit breaker:
//!
//! - **`engine::edge`** - fee-inclusive cycle edge math
//! - **`engine::sizing`** - depth-capped base quantity sizing
//! - **`engine::risk`** - pure pre-trade checks in a fixed order
//! - **`engine::executor`** - the three-leg execution state machine
//! - **`engine::breaker`** - consecutive-failure circuit breaker
//! - **`engine::ledger`** - balances with attempt-keyed reservations
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with per-venue sections
//! - [`domain`] - venue-agnostic types: triangles, quotes, orders, attempts
//! - [`engine`] - decision and execution components
//! - [`error`] - error types for the crate
//! - [`exchange`] - the venue adapter trait and bundled implementations
//! - [`record`] - attempt recording and metrics sinks
//! - [`app`] - application orchestration
//!
//! # Example
//!
//! ```no_run
//! use arbit::config::Config;
//!
//! let config = Config::load("config.toml").expect("config");
//! config.validate().expect("valid config");
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod record;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
