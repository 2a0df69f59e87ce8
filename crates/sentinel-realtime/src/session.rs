//! Delivery session — one live push connection to a notification client.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use sentinel_entity::notification::Notification;

use crate::bus::{NotificationBus, SubscriberId};
use crate::event::NotificationEvent;

/// Lifecycle of a delivery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Subscribed to the bus, connected ack not yet sent.
    Connecting,
    /// Streaming events and heartbeats.
    Open,
    /// Torn down; the bus subscription is gone.
    Closed,
}

/// Messages a session pushes to its transport.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Handshake acknowledgement, sent exactly once when the session opens.
    Connected {
        /// Human-readable hello.
        message: String,
        /// When the session opened.
        timestamp: DateTime<Utc>,
    },
    /// A notification event that passed the session's user filter.
    Notification {
        /// Recipient user.
        user_id: Uuid,
        /// Alert that triggered.
        alert_id: Uuid,
        /// The notification record.
        notification: Notification,
        /// Publish time.
        timestamp: DateTime<Utc>,
    },
    /// Keep-alive with no payload; clients ignore it.
    Heartbeat,
}

impl StreamMessage {
    fn connected() -> Self {
        Self::Connected {
            message: "Notification stream established".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn from_event(event: NotificationEvent) -> Self {
        Self::Notification {
            user_id: event.user_id,
            alert_id: event.alert_id,
            notification: event.notification,
            timestamp: event.timestamp,
        }
    }
}

/// One long-lived push connection.
///
/// Subscribes to the bus on construction, forwards events that match its
/// user filter, emits periodic heartbeats, and deterministically
/// unsubscribes when the transport goes away — the outbound channel
/// closing is the disconnect signal. Dropping the session (even mid-run,
/// via task abort) also releases the subscription.
#[derive(Debug)]
pub struct DeliverySession {
    subscriber_id: SubscriberId,
    /// `Some` for authenticated sessions, `None` for anonymous ones that
    /// receive every event.
    user_id: Option<Uuid>,
    heartbeat_interval: Duration,
    state: SessionState,
    bus: Arc<NotificationBus>,
    events: mpsc::Receiver<NotificationEvent>,
}

impl DeliverySession {
    /// Subscribe to the bus and create a session in the `Connecting` state.
    pub fn connect(
        bus: Arc<NotificationBus>,
        user_id: Option<Uuid>,
        heartbeat_interval: Duration,
    ) -> Self {
        let (subscriber_id, events) = bus.subscribe();

        info!(
            subscriber_id = %subscriber_id,
            user_id = ?user_id,
            "Delivery session connected"
        );

        Self {
            subscriber_id,
            user_id,
            heartbeat_interval,
            state: SessionState::Connecting,
            bus,
            events,
        }
    }

    /// The bus subscriber id backing this session.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether an event passes this session's user filter.
    fn matches(&self, event: &NotificationEvent) -> bool {
        match self.user_id {
            Some(user_id) => event.user_id == user_id,
            None => true,
        }
    }

    /// Drive the session until the client disconnects.
    ///
    /// Sends the connected ack, then forwards matching events interleaved
    /// with heartbeats, preserving publish order. Returns once the outbound
    /// channel closes (client gone) or the bus drops the subscription; the
    /// bus registration and heartbeat timer are released on every exit
    /// path.
    pub async fn run(mut self, outbound: mpsc::Sender<StreamMessage>) -> SessionState {
        if outbound.send(StreamMessage::connected()).await.is_err() {
            self.shutdown();
            return SessionState::Closed;
        }
        self.state = SessionState::Open;

        // First heartbeat a full interval from now, not immediately.
        let mut heartbeat = time::interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(event) => {
                            if !self.matches(&event) {
                                continue;
                            }
                            if outbound.send(StreamMessage::from_event(event)).await.is_err() {
                                break;
                            }
                        }
                        // Bus side closed; tear down.
                        None => break,
                    }
                }
                _ = heartbeat.tick() => {
                    if outbound.send(StreamMessage::Heartbeat).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.shutdown();
        SessionState::Closed
    }

    /// Unsubscribe from the bus and mark the session closed. Idempotent.
    fn shutdown(&mut self) {
        if self.state != SessionState::Closed {
            self.bus.unsubscribe(self.subscriber_id);
            self.state = SessionState::Closed;
            debug!(subscriber_id = %self.subscriber_id, "Delivery session closed");
        }
    }
}

impl Drop for DeliverySession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_for(user_id: Uuid) -> NotificationEvent {
        let alert_id = Uuid::new_v4();
        NotificationEvent {
            user_id,
            alert_id,
            notification: Notification {
                id: Uuid::new_v4(),
                user_id,
                alert_id,
                title: "Price alert".to_string(),
                message: "ETH is now $3100.00 (above $3000)".to_string(),
                severity: "warning".to_string(),
                metadata: serde_json::json!({}),
                is_read: false,
                created_at: Utc::now(),
            },
            timestamp: Utc::now(),
        }
    }

    /// A heartbeat long enough to stay out of the way of event assertions.
    const QUIET: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_connected_ack_comes_first() {
        let bus = Arc::new(NotificationBus::new(8));
        let session = DeliverySession::connect(Arc::clone(&bus), None, QUIET);
        assert_eq!(session.state(), SessionState::Connecting);

        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(tx));

        let first = rx.recv().await.expect("connected ack");
        assert!(matches!(first, StreamMessage::Connected { .. }));

        drop(rx);
        bus.publish(&event_for(Uuid::new_v4()));
        assert_eq!(task.await.unwrap(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_authenticated_session_filters_by_user() {
        let bus = Arc::new(NotificationBus::new(8));
        let user = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let session = DeliverySession::connect(Arc::clone(&bus), Some(user), QUIET);
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(tx));

        assert!(matches!(
            rx.recv().await.unwrap(),
            StreamMessage::Connected { .. }
        ));

        bus.publish(&event_for(stranger));
        bus.publish(&event_for(user));

        // Only the matching event comes through.
        match rx.recv().await.unwrap() {
            StreamMessage::Notification { user_id, .. } => assert_eq!(user_id, user),
            other => panic!("unexpected message: {other:?}"),
        }

        drop(rx);
        bus.publish(&event_for(user));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_anonymous_session_receives_all_events() {
        let bus = Arc::new(NotificationBus::new(8));
        let session = DeliverySession::connect(Arc::clone(&bus), None, QUIET);
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(tx));

        assert!(matches!(
            rx.recv().await.unwrap(),
            StreamMessage::Connected { .. }
        ));

        let first = event_for(Uuid::new_v4());
        let second = event_for(Uuid::new_v4());
        bus.publish(&first);
        bus.publish(&second);

        // Both arrive, in publish order.
        match rx.recv().await.unwrap() {
            StreamMessage::Notification { alert_id, .. } => assert_eq!(alert_id, first.alert_id),
            other => panic!("unexpected message: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            StreamMessage::Notification { alert_id, .. } => assert_eq!(alert_id, second.alert_id),
            other => panic!("unexpected message: {other:?}"),
        }

        drop(rx);
        bus.publish(&event_for(Uuid::new_v4()));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_is_emitted_while_open() {
        let bus = Arc::new(NotificationBus::new(8));
        let session =
            DeliverySession::connect(Arc::clone(&bus), None, Duration::from_millis(20));
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(tx));

        assert!(matches!(
            rx.recv().await.unwrap(),
            StreamMessage::Connected { .. }
        ));

        let beat = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("heartbeat within timeout")
            .expect("channel open");
        assert!(matches!(beat, StreamMessage::Heartbeat));

        drop(rx);
        bus.publish(&event_for(Uuid::new_v4()));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_unsubscribes_and_stops_heartbeat() {
        let bus = Arc::new(NotificationBus::new(8));
        let session = DeliverySession::connect(Arc::clone(&bus), None, QUIET);
        let subscriber_id = session.subscriber_id();
        assert_eq!(bus.subscriber_count(), 1);

        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(tx));
        assert!(matches!(
            rx.recv().await.unwrap(),
            StreamMessage::Connected { .. }
        ));

        // Simulated client disconnect.
        drop(rx);
        bus.publish(&event_for(Uuid::new_v4()));

        assert_eq!(task.await.unwrap(), SessionState::Closed);
        assert!(!bus.is_subscribed(subscriber_id));

        // Publishing afterward must not reach the removed subscriber.
        assert_eq!(bus.publish(&event_for(Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn test_aborted_session_still_releases_its_subscription() {
        let bus = Arc::new(NotificationBus::new(8));
        let session = DeliverySession::connect(Arc::clone(&bus), None, QUIET);
        let (tx, _rx) = mpsc::channel(8);

        let task = tokio::spawn(session.run(tx));
        tokio::task::yield_now().await;
        task.abort();
        let _ = task.await;

        assert_eq!(bus.subscriber_count(), 0);
    }
}
