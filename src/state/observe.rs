//! Observer trait for state updates, plus a closure adapter.
//!
//! [`Observe`] is the extension point for reacting to device state changes
//! (the orchestrator uses it internally; external bridges such as an MQTT
//! publisher plug in the same way). Each observer is driven by a dedicated
//! worker task owned by the [`StateStore`](crate::StateStore), so a slow
//! observer never stalls the updating worker or other observers.
//!
//! [`ObserveFn`] wraps a closure producing a fresh future per notification,
//! which keeps ad-hoc observers free of shared mutable state.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::record::StateDelta;

/// Contract for state update observers.
///
/// Called from an observer-dedicated worker task with the device identifier
/// and the delta that was just merged. Observers needing the full record
/// must query the store again; the delta alone may be stale.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles one state update notification.
    async fn on_update(&self, device_id: &str, delta: &StateDelta);
}

/// Closure-backed observer.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use camvisor::{ObserveFn, StateDelta};
///
/// let obs = ObserveFn::arc(|device_id: Arc<str>, _delta: StateDelta| async move {
///     println!("update for {device_id}");
/// });
/// # let _ = obs;
/// ```
pub struct ObserveFn<F> {
    f: F,
}

impl<F> ObserveFn<F> {
    /// Creates a new closure-backed observer.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the observer and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Observe for ObserveFn<F>
where
    F: Fn(Arc<str>, StateDelta) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_update(&self, device_id: &str, delta: &StateDelta) {
        (self.f)(Arc::from(device_id), delta.clone()).await;
    }
}
