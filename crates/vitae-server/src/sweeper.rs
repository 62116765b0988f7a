//! Background task that drops expired login sessions.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Start the periodic session sweeper.
pub fn start_session_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!("Session sweeper started");
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = state.sessions.purge_expired();
            debug!(
                "Session sweep removed {}, {} active",
                removed,
                state.sessions.count()
            );
        }
    });
}
