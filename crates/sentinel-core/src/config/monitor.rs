//! Alert monitor configuration.

use serde::{Deserialize, Serialize};

/// Background alert monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Whether the monitor runs in this process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression driving evaluation cycles (6-field, seconds first).
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Delay before the warm-up cycle that runs right after start.
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_seconds: u64,
    /// Window during which repeat notifications for the same alert are
    /// suppressed.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_minutes: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
            warmup_delay_seconds: default_warmup_delay(),
            dedup_window_minutes: default_dedup_window(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Every 5 minutes.
fn default_schedule() -> String {
    "0 */5 * * * *".to_string()
}

fn default_warmup_delay() -> u64 {
    5
}

fn default_dedup_window() -> i64 {
    60
}
