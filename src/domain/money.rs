//! Monetary types for price and quantity representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Quantity represented as a Decimal for precision.
pub type Qty = Decimal;

/// Convert a basis-point value to a fraction (10 bps = 0.001).
#[must_use]
pub fn bps_to_fraction(bps: Decimal) -> Decimal {
    bps / Decimal::from(10_000)
}
