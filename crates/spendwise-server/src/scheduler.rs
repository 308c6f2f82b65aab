//! Background housekeeping for in-memory server state
//!
//! Expired insight cache entries and elapsed rate-limit windows are pruned
//! on a fixed interval so idle users do not pin memory:
//!
//! - `SPENDWISE_JANITOR_INTERVAL_SECS`: interval in seconds (default: 300, 0 disables)

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::AppState;

const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Configuration for the housekeeping task
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    pub interval: Duration,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }
}

impl JanitorConfig {
    /// Parse configuration from environment variables
    ///
    /// Returns None when housekeeping is disabled
    pub fn from_env() -> Option<Self> {
        let secs = match std::env::var("SPENDWISE_JANITOR_INTERVAL_SECS") {
            Ok(s) => match s.parse::<u64>() {
                Ok(v) => v,
                Err(_) => {
                    warn!("Invalid SPENDWISE_JANITOR_INTERVAL_SECS '{}', using default", s);
                    DEFAULT_INTERVAL_SECS
                }
            },
            Err(_) => DEFAULT_INTERVAL_SECS,
        };

        if secs == 0 {
            warn!("SPENDWISE_JANITOR_INTERVAL_SECS is 0, cache housekeeping disabled");
            return None;
        }

        Some(Self {
            interval: Duration::from_secs(secs),
        })
    }
}

/// Start the housekeeping loop as a background task
pub fn start_janitor(state: Arc<AppState>, config: JanitorConfig) {
    info!(
        "Starting cache housekeeping every {}s",
        config.interval.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = interval(config.interval);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_housekeeping(&state);
        }
    });
}

/// Run a single housekeeping pass, returning (cache entries, limiter windows) removed
pub fn run_housekeeping(state: &AppState) -> (usize, usize) {
    let insights = state.composer.cache().purge_expired();
    let windows = state.ai_limiter.purge_expired();
    if insights > 0 || windows > 0 {
        debug!(insights, windows, "Pruned expired server state");
    }
    (insights, windows)
}
