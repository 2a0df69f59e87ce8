//! # sentinel-realtime
//!
//! In-process fan-out of notification events to live delivery sessions.
//!
//! The [`bus::NotificationBus`] decouples the alert monitor (producer)
//! from any number of SSE clients (consumers). Events are best-effort:
//! nothing is buffered or replayed, whoever is subscribed at publish time
//! receives the event exactly once.

pub mod bus;
pub mod event;
pub mod session;

pub use bus::NotificationBus;
pub use event::NotificationEvent;
pub use session::{DeliverySession, SessionState, StreamMessage};
