//! Wallet entity model.
//!
//! Wallet management (linking, activation, signature verification) belongs
//! to the external user-facing API; the monitor only reads a user's active
//! wallet address to know which portfolio to fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A wallet linked to a user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    /// Unique wallet identifier.
    pub id: Uuid,
    /// The owning user.
    pub user_id: Uuid,
    /// On-chain address.
    pub address: String,
    /// Chain this wallet lives on (e.g. "ethereum").
    pub chain: String,
    /// Whether this is the user's designated active wallet.
    pub is_active: bool,
    /// When the wallet was linked.
    pub created_at: DateTime<Utc>,
}
