//! In-memory device state store with merge-and-notify updates.
//!
//! One [`StateStore`] instance is shared (via `Arc`) by every worker of the
//! process; it is never ambient global state. All mutation goes through
//! [`StateStore::update`], which holds the store lock for the merge **and**
//! for enqueueing notifications, so updates to the same device reach every
//! observer in application order. Enqueueing is non-blocking (unbounded
//! per-observer queues); observer callbacks run on their own worker tasks.
//!
//! ## Rules
//! - `get` returns a snapshot, never a live reference.
//! - Records are created with defaults on first update or first `get`.
//! - Unsubscribing removes the observer under the same lock `update` takes:
//!   updates applied after `unsubscribe` returns are never delivered, while
//!   notifications already queued may still arrive (tolerated by design).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;

use super::observe::Observe;
use super::record::{DeviceState, StateDelta};

type Notification = (Arc<str>, Arc<StateDelta>);

struct ObserverSlot {
    id: u64,
    tx: mpsc::UnboundedSender<Notification>,
}

struct Inner {
    records: HashMap<String, DeviceState>,
    observers: Vec<ObserverSlot>,
    next_id: u64,
}

/// Mapping from device identifier to its state record, with subscriptions.
///
/// Purely in-memory, process-lifetime only.
pub struct StateStore {
    inner: Mutex<Inner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                observers: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Merges `delta` into the record for `device_id` (created with defaults
    /// if absent) and notifies all current observers with the delta.
    ///
    /// Safe under concurrent calls for the same and different devices;
    /// merges are serialized, so no update is lost and per-device
    /// notification order equals application order.
    pub fn update(&self, device_id: &str, delta: StateDelta) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .records
            .entry(device_id.to_string())
            .or_default()
            .apply(&delta);

        let note: Notification = (Arc::from(device_id), Arc::new(delta));
        // Sends are non-blocking; a closed queue means the worker is gone,
        // so the slot is dropped here.
        inner.observers.retain(|slot| slot.tx.send(note.clone()).is_ok());
    }

    /// Returns a snapshot of the current record (defaults if never set).
    pub fn get(&self, device_id: &str) -> DeviceState {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.records.get(device_id).cloned().unwrap_or_default()
    }

    /// Registers an observer for every update to any device.
    ///
    /// Spawns a dedicated worker task that drains this observer's queue and
    /// awaits [`Observe::on_update`] per notification. Must be called from
    /// within a tokio runtime.
    pub fn subscribe(self: &Arc<Self>, observer: Arc<dyn Observe>) -> Subscription {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
        let id = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.push(ObserverSlot { id, tx });
            id
        };

        tokio::spawn(async move {
            while let Some((device_id, delta)) = rx.recv().await {
                observer.on_update(&device_id, &delta).await;
            }
        });

        Subscription {
            store: Arc::downgrade(self),
            id,
        }
    }
}

/// Opaque handle returned by [`StateStore::subscribe`].
///
/// Removing the observer is idempotent and safe concurrently with in-flight
/// delivery: at most the already-queued notifications are still delivered.
/// Dropping the handle unsubscribes as well.
pub struct Subscription {
    store: Weak<StateStore>,
    id: u64,
}

impl Subscription {
    /// Removes the observer; updates applied after this returns are never
    /// delivered to it.
    pub fn unsubscribe(self) {
        self.remove();
    }

    fn remove(&self) {
        if let Some(store) = self.store.upgrade() {
            let mut inner = store.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.observers.retain(|slot| slot.id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
