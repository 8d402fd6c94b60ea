//! Runtime events: types and broadcast bus.
//!
//! Groups the event **data model** and the **bus** used to publish and
//! observe lifecycle events emitted by the supervisor, perseverance loops,
//! the probe, the watchdog and the orchestrator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! Domain state (liveness, request state, sensors) does **not** travel over
//! this bus; it lives in the [`StateStore`](crate::StateStore). The bus
//! carries diagnostics only.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
