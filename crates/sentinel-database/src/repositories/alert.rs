//! Alert repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use sentinel_core::error::{AppError, ErrorKind};
use sentinel_core::result::AppResult;
use sentinel_entity::alert::Alert;

/// Fields that can change on an existing alert. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct AlertChanges {
    /// New display name.
    pub name: Option<String>,
    /// New rules JSON.
    pub rules: Option<serde_json::Value>,
    /// Enable/disable evaluation.
    pub is_active: Option<bool>,
}

/// Repository for alert CRUD operations.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Create a new alert repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every active alert across all users, oldest first.
    ///
    /// This is the monitor's per-cycle load; the returned order is the
    /// evaluation order within the cycle.
    pub async fn find_active(&self) -> AppResult<Vec<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT * FROM portfolio_alerts WHERE is_active = TRUE ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list active alerts", e))
    }

    /// List a user's alerts, newest first.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT * FROM portfolio_alerts WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list alerts", e))
    }

    /// Fetch one alert, scoped to its owner.
    pub async fn find_by_id(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT * FROM portfolio_alerts WHERE id = $1 AND user_id = $2",
        )
        .bind(alert_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch alert", e))
    }

    /// Create an alert.
    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        alert_type: &str,
        rules: &serde_json::Value,
    ) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(
            "INSERT INTO portfolio_alerts (user_id, name, alert_type, rules) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(user_id)
        .bind(name)
        .bind(alert_type)
        .bind(rules)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create alert", e))
    }

    /// Apply partial changes to an alert, scoped to its owner.
    ///
    /// Returns `NotFound` when the alert does not exist or belongs to
    /// someone else.
    pub async fn update(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        changes: &AlertChanges,
    ) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(
            "UPDATE portfolio_alerts SET \
                 name = COALESCE($3, name), \
                 rules = COALESCE($4, rules), \
                 is_active = COALESCE($5, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(alert_id)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.rules.as_ref())
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update alert", e))?
        .ok_or_else(|| AppError::not_found("Alert not found"))
    }

    /// Delete an alert, scoped to its owner.
    pub async fn delete(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM portfolio_alerts WHERE id = $1 AND user_id = $2")
            .bind(alert_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete alert", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Alert not found"));
        }
        Ok(())
    }
}
