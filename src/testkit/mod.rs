//! Test doubles and builders shared by unit and integration tests.
//!
//! Compiled only under `cfg(test)` or the `testkit` feature so that
//! integration tests can depend on it without shipping it.

pub mod domain;
pub mod venue;

pub use domain::{flat_view, profitable_view, quote, triangle};
pub use venue::{PlaceScript, ScriptedVenue};
