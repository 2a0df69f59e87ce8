//! Alert entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::rules::AlertRules;

/// A user-defined portfolio alert.
///
/// `rules` is stored as raw JSON so that a malformed or future rules shape
/// never prevents the row from loading; the monitor parses it into
/// [`AlertRules`] at evaluation time and treats parse failures as
/// "not triggered".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: Uuid,
    /// The owning user.
    pub user_id: Uuid,
    /// Display name chosen by the user.
    pub name: String,
    /// Alert type discriminator (`price_change`, `portfolio_value`, …).
    pub alert_type: String,
    /// Type-specific rules as `{ "type": …, "conditions": … }` JSON.
    pub rules: serde_json::Value,
    /// Whether the monitor evaluates this alert.
    pub is_active: bool,
    /// When the alert was created.
    pub created_at: DateTime<Utc>,
    /// When the alert was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Parse the stored rules JSON into the typed sum type.
    pub fn parsed_rules(&self) -> Result<AlertRules, serde_json::Error> {
        serde_json::from_value(self.rules.clone())
    }
}
