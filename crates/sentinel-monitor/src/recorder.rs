//! Notification recorder — dedup, persist, announce.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, info};

use sentinel_entity::alert::Alert;
use sentinel_realtime::{NotificationBus, NotificationEvent};

use crate::evaluator::NotificationDraft;
use crate::store::AlertStore;

/// Turns a triggered verdict into at most one durable notification per
/// dedup window per alert, then announces it on the bus.
pub struct NotificationRecorder {
    store: Arc<dyn AlertStore>,
    bus: Arc<NotificationBus>,
    dedup_window: Duration,
}

impl NotificationRecorder {
    /// Create a recorder with the given dedup window.
    pub fn new(store: Arc<dyn AlertStore>, bus: Arc<NotificationBus>, dedup_window: Duration) -> Self {
        Self {
            store,
            bus,
            dedup_window,
        }
    }

    /// Persist and publish a notification for a triggered alert.
    ///
    /// Skips silently when the same alert already produced a notification
    /// inside the dedup window. Any store failure is logged and swallowed;
    /// the condition is re-evaluated from scratch next cycle.
    ///
    /// Returns whether a notification was actually created.
    pub async fn record(&self, alert: &Alert, draft: NotificationDraft) -> bool {
        let cutoff = Utc::now() - self.dedup_window;

        match self.store.recent_notification_exists(alert.id, cutoff).await {
            Ok(true) => {
                debug!(
                    alert_id = %alert.id,
                    "Skipping duplicate notification (already triggered within dedup window)"
                );
                return false;
            }
            Ok(false) => {}
            Err(e) => {
                error!(alert_id = %alert.id, error = %e, "Dedup probe failed");
                return false;
            }
        }

        let notification = match self
            .store
            .insert_notification(alert.user_id, alert.id, &draft)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                error!(alert_id = %alert.id, error = %e, "Failed to persist notification");
                return false;
            }
        };

        let event = NotificationEvent::for_notification(notification);
        let delivered = self.bus.publish(&event);
        info!(
            alert_id = %alert.id,
            user_id = %alert.user_id,
            subscribers = delivered,
            "Notification recorded and published"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::testing::{price_alert, MockStore};
    use sentinel_entity::alert::rules::Direction;
    use sentinel_entity::notification::Severity;

    fn draft() -> NotificationDraft {
        NotificationDraft {
            title: "ETH Price Alert Triggered".to_string(),
            message: "ETH is now $3100.00 (above $3000)".to_string(),
            severity: Severity::Warning,
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_record_persists_and_publishes() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(MockStore::new(vec![alert.clone()]));
        let bus = Arc::new(NotificationBus::new(8));
        let (_id, mut rx) = bus.subscribe();

        let recorder =
            NotificationRecorder::new(store.clone(), Arc::clone(&bus), Duration::minutes(60));

        assert!(recorder.record(&alert, draft()).await);
        assert_eq!(store.inserted_count(), 1);

        let event = rx.try_recv().expect("event published");
        assert_eq!(event.alert_id, alert.id);
        assert_eq!(event.user_id, alert.user_id);
        assert_eq!(event.notification.severity, "warning");
    }

    #[tokio::test]
    async fn test_consecutive_triggers_inside_window_produce_one_notification() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(MockStore::new(vec![alert.clone()]));
        let bus = Arc::new(NotificationBus::new(8));
        let (_id, mut rx) = bus.subscribe();

        let recorder =
            NotificationRecorder::new(store.clone(), Arc::clone(&bus), Duration::minutes(60));

        assert!(recorder.record(&alert, draft()).await);
        assert!(!recorder.record(&alert, draft()).await);

        assert_eq!(store.inserted_count(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_trigger_after_window_elapsed_notifies_again() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(MockStore::new(vec![alert.clone()]));
        // A notification from two hours ago is outside the 60-minute window.
        store.seed_notification(alert.id, Utc::now() - Duration::hours(2));

        let bus = Arc::new(NotificationBus::new(8));
        let recorder =
            NotificationRecorder::new(store.clone(), Arc::clone(&bus), Duration::minutes(60));

        assert!(recorder.record(&alert, draft()).await);
        assert_eq!(store.inserted_count(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed_and_publishes_nothing() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(MockStore::new(vec![alert.clone()]).failing_inserts());
        let bus = Arc::new(NotificationBus::new(8));
        let (_id, mut rx) = bus.subscribe();

        let recorder =
            NotificationRecorder::new(store.clone(), Arc::clone(&bus), Duration::minutes(60));

        assert!(!recorder.record(&alert, draft()).await);
        assert_eq!(store.inserted_count(), 0);
        assert!(rx.try_recv().is_err());
    }
}
