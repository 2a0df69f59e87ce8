//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use sentinel_entity::alert::AlertRules;

/// Create alert request body.
///
/// The alert type is derived from `rules.type`, so the two can never
/// disagree in storage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAlertRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Typed alert rules.
    pub rules: AlertRules,
}

/// Update alert request body. Omitted fields stay unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAlertRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New rules.
    pub rules: Option<AlertRules>,
    /// Enable/disable evaluation.
    pub is_active: Option<bool>,
}

/// Query parameters for listing notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotificationsQuery {
    /// Include already-read notifications.
    #[serde(default)]
    pub include_read: bool,
}
