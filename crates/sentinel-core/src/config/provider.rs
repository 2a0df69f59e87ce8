//! Portfolio data provider configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external portfolio data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key sent as `X-API-Key`. Optional — unauthenticated requests are
    /// rate-limited harder by the provider.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://aura.adex.network".to_string()
}

fn default_timeout() -> u64 {
    30
}
