//! Wallet repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use sentinel_core::error::{AppError, ErrorKind};
use sentinel_core::result::AppResult;
use sentinel_entity::wallet::Wallet;

/// Read-side repository for wallets. Writes happen in the external
/// user-facing API.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    /// Create a new wallet repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user's designated active wallet, if any.
    pub async fn find_active(&self, user_id: Uuid) -> AppResult<Option<Wallet>> {
        sqlx::query_as::<_, Wallet>(
            "SELECT * FROM wallets WHERE user_id = $1 AND is_active = TRUE LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch active wallet", e))
    }
}
