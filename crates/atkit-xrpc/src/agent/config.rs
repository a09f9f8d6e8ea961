//! Agent configuration.

use std::time::Duration;

/// Tuning for the session lifecycle.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on the delay between scheduled refreshes.
    pub refresh_interval: Duration,
    /// Refresh this long before the access token expires.
    pub refresh_margin: Duration,
    /// Restoring a session reuses the access token only if it has at least
    /// this long left.
    pub restore_reuse_threshold: Duration,
    /// Capacity of the lifecycle event channel.
    pub event_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 60),
            refresh_margin: Duration::from_secs(60),
            restore_reuse_threshold: Duration::from_secs(5 * 60),
            event_capacity: 64,
        }
    }
}
