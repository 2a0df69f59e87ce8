//! Notification bus — best-effort fan-out to current subscribers.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::event::NotificationEvent;

/// Identifier handed back by [`NotificationBus::subscribe`]; passing it to
/// [`NotificationBus::unsubscribe`] removes the registration.
pub type SubscriberId = Uuid;

#[derive(Debug)]
struct Subscriber {
    tx: mpsc::Sender<NotificationEvent>,
}

/// In-process pub/sub channel between the alert monitor and delivery
/// sessions.
///
/// The registry tolerates concurrent subscribe/unsubscribe while a publish
/// is in flight; publish iterates a snapshot of the senders so a subscriber
/// removed mid-publish simply stops receiving. A subscriber whose channel
/// is closed or full cannot stall the publisher or its siblings.
#[derive(Debug)]
pub struct NotificationBus {
    subscribers: DashMap<SubscriberId, Subscriber>,
    buffer_size: usize,
}

impl NotificationBus {
    /// Create a bus whose per-subscriber channels hold `buffer_size` events.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            buffer_size,
        }
    }

    /// Register a subscriber. Returns its id and the receiving half of its
    /// event channel. Events published from now on are delivered in FIFO
    /// order per subscriber.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<NotificationEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.buffer_size);
        self.subscribers.insert(id, Subscriber { tx });
        debug!(subscriber_id = %id, total = self.subscribers.len(), "Bus subscriber added");
        (id, rx)
    }

    /// Remove a subscriber. Returns whether it was registered. Safe to call
    /// concurrently with `publish` and idempotent.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(subscriber_id = %id, total = self.subscribers.len(), "Bus subscriber removed");
        }
        removed
    }

    /// Publish an event to every current subscriber. Returns how many
    /// subscribers accepted it.
    ///
    /// Subscribers with a closed receiver are pruned; subscribers with a
    /// full buffer miss this event (no buffering beyond their channel, no
    /// retry).
    pub fn publish(&self, event: &NotificationEvent) -> usize {
        // Snapshot so entries can come and go while we deliver.
        let targets: Vec<(SubscriberId, mpsc::Sender<NotificationEvent>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().tx.clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(subscriber_id = %id, "Pruning closed bus subscriber");
                    self.subscribers.remove(&id);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber_id = %id, "Bus subscriber buffer full, dropping event");
                }
            }
        }
        delivered
    }

    /// Whether a subscriber id is currently registered.
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.contains_key(&id)
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sentinel_entity::notification::Notification;

    fn event_for(user_id: Uuid) -> NotificationEvent {
        let alert_id = Uuid::new_v4();
        NotificationEvent {
            user_id,
            alert_id,
            notification: Notification {
                id: Uuid::new_v4(),
                user_id,
                alert_id,
                title: "t".to_string(),
                message: "m".to_string(),
                severity: "info".to_string(),
                metadata: serde_json::json!({}),
                is_read: false,
                created_at: Utc::now(),
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = NotificationBus::new(8);
        let (_id_a, mut rx_a) = bus.subscribe();
        let (_id_b, mut rx_b) = bus.subscribe();

        let delivered = bus.publish(&event_for(Uuid::new_v4()));
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers_is_a_noop() {
        let bus = NotificationBus::new(8);
        assert_eq!(bus.publish(&event_for(Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn test_unsubscribed_receiver_gets_nothing() {
        let bus = NotificationBus::new(8);
        let (id, mut rx) = bus.subscribe();

        assert!(bus.unsubscribe(id));
        assert!(!bus.is_subscribed(id));
        assert_eq!(bus.publish(&event_for(Uuid::new_v4())), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_subscriber_does_not_affect_siblings() {
        let bus = NotificationBus::new(8);
        let (_dead_id, dead_rx) = bus.subscribe();
        let (_live_id, mut live_rx) = bus.subscribe();
        drop(dead_rx);

        let delivered = bus.publish(&event_for(Uuid::new_v4()));
        assert_eq!(delivered, 1);
        assert!(live_rx.try_recv().is_ok());
        // The dead entry was pruned during publish.
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_events_arrive_in_publish_order() {
        let bus = NotificationBus::new(8);
        let (_id, mut rx) = bus.subscribe();

        let first = event_for(Uuid::new_v4());
        let second = event_for(Uuid::new_v4());
        bus.publish(&first);
        bus.publish(&second);

        assert_eq!(rx.try_recv().unwrap().alert_id, first.alert_id);
        assert_eq!(rx.try_recv().unwrap().alert_id, second.alert_id);
    }
}
