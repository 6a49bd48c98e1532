//! Shared application state.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide state shared by all venue loops.
///
/// The kill switch is the only mutable state shared across venues: a
/// read-only boolean checked at the top of every cycle. Setting it asks
/// every loop to exit after its in-flight attempt reaches a terminal
/// state.
#[derive(Default)]
pub struct AppState {
    kill_switch: AtomicBool,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask all venue loops to stop after their current cycle.
    pub fn request_shutdown(&self) {
        self.kill_switch.store(true, Ordering::SeqCst);
    }

    /// True once shutdown has been requested.
    #[must_use]
    pub fn shutdown_requested(&self) -> bool {
        self.kill_switch.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_switch_latches() {
        let state = AppState::new();
        assert!(!state.shutdown_requested());
        state.request_shutdown();
        assert!(state.shutdown_requested());
        state.request_shutdown();
        assert!(state.shutdown_requested());
    }
}
