//! Venue abstraction layer.

pub mod factory;
pub mod paper;
pub mod traits;

pub use factory::build_adapter;
pub use paper::PaperVenue;
pub use traits::VenueAdapter;
