//! Shared, subscribable device state.
//!
//! The [`StateStore`] is the single point of shared mutable truth between
//! the independent workers managing one device (probe, watchdog,
//! orchestrator, external publishers). Every mutation goes through
//! [`StateStore::update`], which serializes partial merges per store and
//! notifies subscribers with the applied delta.
//!
//! ## Architecture
//! ```text
//! update(device, delta)
//!     │  lock: merge into DeviceState (unset fields untouched)
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_update(device, &delta)
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_update(device, &delta)
//!     └──► [queue N] ──► worker N ──► observerN.on_update(device, &delta)
//! ```
//!
//! Subscribers receive the **delta only**; a reaction that depends on the
//! full record must call [`StateStore::get`] again before acting. That
//! re-read is deliberate: a delta may describe a state already superseded,
//! and all reactions in this crate are idempotent guards on current state.

mod observe;
mod record;
mod store;

pub use observe::{Observe, ObserveFn};
pub use record::{
    DeviceState, SensorKind, SensorReading, SensorValue, StateDelta, StreamLiveness,
    StreamRequestState,
};
pub use store::{StateStore, Subscription};
