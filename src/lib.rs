//! # camvisor
//!
//! **Camvisor** keeps a camera device streaming to a local relay and keeps
//! proving that the stream actually carries media.
//!
//! It supervises three cooperating loops per device: a liveness probe that
//! decodes the stream with an external tool, a watchdog that reruns the
//! probe on a fixed cadence, and an orchestrator that (re)asks the device
//! to start streaming whenever the stream goes unhealthy. Long-running
//! side processes (relays, recorders) run under the same retry machinery.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │  (Watchdog)  │   │(Orchestrator)│   │ (CommandTask)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Supervisor                                               │
//! │  - Bus (broadcast events)                                 │
//! │  - SubscriberSet (fans out to user subscribers)           │
//! │  - one Perseverance retry loop per spec                   │
//! └──────┬──────────────────┬──────────────────┬──────────────┘
//!        ▼                  ▼                  ▼
//!  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//!  │ Perseverance│   │ Perseverance│   │ Perseverance│
//!  │ (retry loop)│   │ (retry loop)│   │ (retry loop)│
//!  └──────┬──────┘   └──────┬──────┘   └──────┬──────┘
//!         │ publishes       │                 │
//!         ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                  Bus (broadcast channel)                  │
//! └───────────────────────────┬───────────────────────────────┘
//!                             ▼
//!                      SubscriberSet
//!                    (per-sub queues)
//!                   ┌──────┼──────┐
//!                   ▼      ▼      ▼
//!               worker1 worker2 workerN
//! ```
//!
//! Device health lives in the [`StateStore`]: the probe promotes a device
//! to Alive when it decodes a container header, the watchdog demotes it to
//! Unhealthy after every probe round, and the orchestrator reacts to the
//! demotions. Store observers receive every change for one device in the
//! order it was applied.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use camvisor::{
//!     Bus, Config, ControlChannel, LogWriter, Orchestrator, Probe, RequestError,
//!     StateStore, StreamingCommand, Subscribe, Supervisor, TaskSpec, Watchdog,
//! };
//!
//! struct MyChannel;
//!
//! #[async_trait::async_trait]
//! impl ControlChannel for MyChannel {
//!     async fn request_streaming(
//!         &self,
//!         _device_id: &str,
//!         _local_url: &str,
//!         _command: StreamingCommand,
//!     ) -> Result<(), RequestError> {
//!         // deliver the request over your signalling path
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let sup = Supervisor::new(cfg.clone(), vec![Arc::new(LogWriter) as Arc<dyn Subscribe>]);
//!     let bus = sup.bus().clone();
//!
//!     let store = Arc::new(StateStore::new());
//!     let device = "cam-1";
//!     let url = cfg.local_stream_url(device);
//!
//!     let probe = Probe::new(device, url.clone(), store.clone(), bus.clone());
//!     let watchdog = Watchdog::new(device, Arc::new(probe), store.clone(), bus.clone());
//!     let orch = Orchestrator::new(device, url, store, Arc::new(MyChannel), bus);
//!
//!     sup.run(vec![
//!         TaskSpec::with_defaults(Arc::new(watchdog), &cfg),
//!         TaskSpec::with_defaults(Arc::new(orch), &cfg),
//!     ])
//!     .await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod orchestrator;
mod probe;
mod retry;
mod shutdown;
mod state;
mod subscribers;
mod supervisor;
mod tasks;
mod watchdog;

// ---- Public re-exports ----

pub use config::{Config, RelayConfig};
pub use error::{RequestError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use orchestrator::{ControlChannel, Orchestrator, StreamingCommand};
pub use probe::{classify, FlvError, FlvHeader, FlvTag, LogTail, Probe, SilenceEvent};
pub use retry::{Attempt, Perseverance, RetryPolicy};
pub use shutdown::wait_for_shutdown_signal;
pub use state::{
    DeviceState, Observe, ObserveFn, SensorKind, SensorReading, SensorValue, StateDelta,
    StateStore, StreamLiveness, StreamRequestState, Subscription,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use supervisor::Supervisor;
pub use tasks::{CommandTask, Task, TaskFn, TaskRef, TaskSpec};
pub use watchdog::Watchdog;
