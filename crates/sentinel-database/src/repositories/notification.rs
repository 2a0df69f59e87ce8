//! Notification repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sentinel_core::error::{AppError, ErrorKind};
use sentinel_core::result::AppResult;
use sentinel_entity::notification::Notification;

/// Repository for notification persistence and read-state updates.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a notification. New notifications always start unread.
    pub async fn create(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        title: &str,
        message: &str,
        severity: &str,
        metadata: &serde_json::Value,
    ) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO alert_notifications (user_id, alert_id, title, message, severity, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(title)
        .bind(message)
        .bind(severity)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    /// List a user's notifications, newest first.
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        include_read: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM alert_notifications \
             WHERE user_id = $1 AND (is_read = FALSE OR $2) \
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id)
        .bind(include_read)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))
    }

    /// Whether any notification for `alert_id` was created at or after
    /// `cutoff`. This is the anti-spam probe for the dedup window.
    pub async fn exists_recent_for_alert(
        &self,
        alert_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> AppResult<bool> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM alert_notifications \
             WHERE alert_id = $1 AND created_at >= $2 LIMIT 1",
        )
        .bind(alert_id)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to probe recent notifications", e)
        })?;

        Ok(found.is_some())
    }

    /// Mark a notification as read, scoped to its owner.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE alert_notifications SET is_read = TRUE \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?
        .ok_or_else(|| AppError::not_found("Notification not found"))
    }

    /// Mark all of a user's notifications as read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE alert_notifications SET is_read = TRUE \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;

        Ok(result.rows_affected())
    }
}
