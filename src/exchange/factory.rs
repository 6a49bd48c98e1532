//! Venue adapter factory.
//!
//! Creates the adapter implementation selected by configuration. Venue
//! behavior is a fixed capability set chosen at startup, never discovered
//! dynamically.

use std::sync::Arc;

use crate::config::{VenueConfig, VenueKind};
use crate::error::Result;

use super::paper::PaperVenue;
use super::traits::VenueAdapter;

/// Build the adapter for one configured venue.
#[allow(clippy::unnecessary_wraps)]
pub fn build_adapter(config: &VenueConfig) -> Result<Arc<dyn VenueAdapter>> {
    match config.kind {
        VenueKind::Paper => Ok(Arc::new(PaperVenue::new(
            config.name.clone(),
            config.paper.clone(),
        ))),
    }
}
