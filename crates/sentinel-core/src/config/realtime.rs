//! Real-time notification stream configuration.

use serde::{Deserialize, Serialize};

/// Settings for SSE delivery sessions and the notification bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Heartbeat interval for open delivery sessions, in seconds.
    #[serde(default = "default_heartbeat")]
    pub heartbeat_interval_seconds: u64,
    /// Per-subscriber outbound channel capacity.
    #[serde(default = "default_buffer_size")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat(),
            channel_buffer_size: default_buffer_size(),
        }
    }
}

fn default_heartbeat() -> u64 {
    30
}

fn default_buffer_size() -> usize {
    64
}
