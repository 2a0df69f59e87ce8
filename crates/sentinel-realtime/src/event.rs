//! In-flight notification event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use sentinel_entity::notification::Notification;

/// A "notification created" event published on the bus.
///
/// In-flight only — never persisted, never replayed. A session that was
/// not subscribed at publish time will never see it.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    /// The recipient user.
    pub user_id: Uuid,
    /// The alert that triggered.
    pub alert_id: Uuid,
    /// The persisted notification record.
    pub notification: Notification,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Build an event for a freshly persisted notification.
    pub fn for_notification(notification: Notification) -> Self {
        Self {
            user_id: notification.user_id,
            alert_id: notification.alert_id,
            timestamp: Utc::now(),
            notification,
        }
    }
}
