//! Storage seam between the monitor and the database.
//!
//! The scheduler and recorder only ever touch this trait, so evaluation
//! cycles can run against an in-memory store in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use sentinel_core::result::AppResult;
use sentinel_database::repositories::alert::AlertRepository;
use sentinel_database::repositories::notification::NotificationRepository;
use sentinel_database::repositories::wallet::WalletRepository;
use sentinel_entity::alert::Alert;
use sentinel_entity::notification::Notification;
use sentinel_entity::wallet::Wallet;

use crate::evaluator::NotificationDraft;

/// Everything the evaluation pipeline needs from the data store.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// All alerts with `is_active = true`, in evaluation order.
    async fn list_active_alerts(&self) -> AppResult<Vec<Alert>>;

    /// The user's designated active wallet, if any.
    async fn find_active_wallet(&self, user_id: Uuid) -> AppResult<Option<Wallet>>;

    /// Whether any notification for `alert_id` was created at or after
    /// `cutoff`.
    async fn recent_notification_exists(
        &self,
        alert_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Persist a new unread notification for a triggered alert.
    async fn insert_notification(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        draft: &NotificationDraft,
    ) -> AppResult<Notification>;
}

/// Postgres-backed store, wrapping the concrete repositories.
#[derive(Debug, Clone)]
pub struct PgAlertStore {
    alerts: Arc<AlertRepository>,
    notifications: Arc<NotificationRepository>,
    wallets: Arc<WalletRepository>,
}

impl PgAlertStore {
    /// Create a store over the three repositories.
    pub fn new(
        alerts: Arc<AlertRepository>,
        notifications: Arc<NotificationRepository>,
        wallets: Arc<WalletRepository>,
    ) -> Self {
        Self {
            alerts,
            notifications,
            wallets,
        }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn list_active_alerts(&self) -> AppResult<Vec<Alert>> {
        self.alerts.find_active().await
    }

    async fn find_active_wallet(&self, user_id: Uuid) -> AppResult<Option<Wallet>> {
        self.wallets.find_active(user_id).await
    }

    async fn recent_notification_exists(
        &self,
        alert_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.notifications
            .exists_recent_for_alert(alert_id, cutoff)
            .await
    }

    async fn insert_notification(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        draft: &NotificationDraft,
    ) -> AppResult<Notification> {
        self.notifications
            .create(
                user_id,
                alert_id,
                &draft.title,
                &draft.message,
                draft.severity.as_str(),
                &draft.metadata,
            )
            .await
    }
}
