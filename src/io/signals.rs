//! Shutdown signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP all clear a shared `running` flag. The tick
//! loop polls that flag between ticks and then stops the pipeline, so the
//! camera is always released through the normal stop path.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread,
};

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown signal has arrived
    pub running: Arc<AtomicBool>,
    /// Number of shutdown signals received so far
    pub received: Arc<AtomicUsize>,
}

impl SignalState {
    /// State not wired to any OS signal; `running` only changes when the
    /// caller clears it.
    pub fn detached() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            received: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Record a shutdown request.
    pub fn request_shutdown(&self) {
        self.received.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Register shutdown signal handlers and return the shared state.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let received = Arc::clone(&state.received);

    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let count = received.fetch_add(1, Ordering::SeqCst) + 1;
                if debug_enabled {
                    log_pipe!();
                    log_debug!("Received signal {sig} ({count} so far)");
                }

                if count == 1 {
                    log_pipe!();
                    log_info!("Shutdown requested, stopping camera...");
                } else {
                    log_warning!("Shutdown already in progress");
                }
                running.store(false, Ordering::SeqCst);
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_state_runs_until_shutdown() {
        let state = SignalState::detached();
        assert!(state.is_running());

        state.request_shutdown();
        state.request_shutdown();

        assert!(!state.is_running());
        assert_eq!(state.received.load(Ordering::SeqCst), 2);
    }
}
