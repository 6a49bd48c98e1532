//! Application orchestration: builds per-venue loops and runs them to
//! completion.

pub mod runner;
pub mod state;

pub use runner::VenueLoop;
pub use state::AppState;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::exchange::build_adapter;
use crate::record::{AttemptRecorder, LogMetrics, LogRecorder, MetricsSink};

/// Main application.
pub struct App;

impl App {
    /// Spawn one decision loop per configured venue and wait for all of
    /// them to stop. Loops exit when the kill switch in `state` trips.
    pub async fn run(config: Config, state: Arc<AppState>) -> Result<()> {
        if !config.dry_run {
            warn!("dry_run disabled but only the paper venue is bundled; orders stay simulated");
        }

        let recorder: Arc<dyn AttemptRecorder> = Arc::new(LogRecorder);
        let metrics: Arc<dyn MetricsSink> = Arc::new(LogMetrics);

        let mut handles = Vec::with_capacity(config.venues.len());
        for venue_config in &config.venues {
            let adapter = build_adapter(venue_config)?;
            let venue_loop = VenueLoop::new(
                venue_config.clone(),
                adapter,
                state.clone(),
                recorder.clone(),
                metrics.clone(),
            )?;
            info!(venue = %venue_config.name, "spawning venue loop");
            handles.push(tokio::spawn(venue_loop.run()));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "venue loop halted with error"),
                Err(e) => error!(error = %e, "venue loop panicked"),
            }
        }

        Ok(())
    }
}
