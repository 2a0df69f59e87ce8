//! Authentication configuration.
//!
//! Sentinel does not issue tokens itself — wallet-signature login lives in
//! the external auth service. This section only configures validation of
//! the JWTs that service hands out.

use serde::{Deserialize, Serialize};

/// JWT validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret used to verify access tokens.
    pub jwt_secret: String,
    /// Leeway in seconds applied to expiry validation.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

fn default_leeway() -> u64 {
    30
}
