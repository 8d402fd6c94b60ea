//! Broadcast bus for runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] to provide non-blocking event
//! publishing from many sources (perseverance loops, probe, watchdog,
//! orchestrator, supervisor).
//!
//! ## Rules
//! - `publish()` never blocks and never fails; events without receivers are
//!   dropped.
//! - Capacity is a shared ring buffer; a receiver that lags observes
//!   `RecvError::Lagged(n)` and skips the `n` oldest events.
//! - No persistence or delivery guarantees; the bus is diagnostics plumbing,
//!   not the source of truth (that is the state store).

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (holds an `Arc`-backed sender); multiple publishers may
/// publish concurrently and each subscriber receives its own clone of every
/// event sent after it subscribed.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers; returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn delivers_to_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::StreamAlive).with_device("dev-1"));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::StreamAlive);
        assert_eq!(ev.device.as_deref(), Some("dev-1"));
    }

    #[tokio::test]
    async fn publish_without_receivers_is_a_noop() {
        let bus = Bus::new(1);
        bus.publish(Event::new(EventKind::ShutdownRequested));
    }
}
