//! # Supervisor: orchestrates supervised tasks, fan-out delivery, and
//! graceful shutdown.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`], and the
//! runtime configuration. It runs every [`TaskSpec`] under its own
//! [`Perseverance`] loop, handles OS signals, and enforces the configured
//! grace period on shutdown.
//!
//! ```text
//! Inputs to run():
//!   Vec<TaskSpec>  ──►  Supervisor::run(specs)
//!
//! Spawn loops:
//!   TaskSpec[0]  TaskSpec[1]  ...  TaskSpec[N-1]
//!       │            │                   │
//!       └──► Perseverance::new(task, retry, bus)        (one per spec)
//!                    └──► child CancellationToken = runtime_token.child_token()
//!                         set.spawn(loop.run(child_token))
//!
//! Event flow:
//!   tasks ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                        ┌─────────┬─────────┐
//!                                                        ▼         ▼         ▼
//!                                                 [queue S1] [queue S2] ... [queue SN]
//!
//! Shutdown path:
//!   OS signal or external token
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► runtime_token.cancel()   → propagates to child tokens
//!             └─► wait up to cfg.grace:
//!                    ├─ all joined → AllStoppedWithin
//!                    └─ timeout    → GraceExceeded (error)
//! ```

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::retry::Perseverance;
use crate::shutdown;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::TaskSpec;

/// Coordinates supervised task loops, event delivery, and graceful shutdown.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
}

impl Supervisor {
    /// Creates a new supervisor with the given config and subscribers.
    ///
    /// Subscriber delivery is best-effort: the supervisor keeps the
    /// [`SubscriberSet`] alive for its whole lifetime and never drains it,
    /// so events still sitting in subscriber queues when the process exits
    /// are dropped. Subscribers needing a flushed tail (files, network
    /// sinks) should flush from their own `on_event`.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        Self { cfg, bus, subs }
    }

    /// The shared event bus; tasks spawned outside the supervisor can
    /// publish and subscribe through it.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the provided task specifications until either all loops exit on
    /// their own or a termination signal arrives.
    pub async fn run(&self, specs: Vec<TaskSpec>) -> Result<(), RuntimeError> {
        self.run_with_token(specs, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run) but with an external cancellation token;
    /// cancelling it is treated the same as an OS termination signal.
    pub async fn run_with_token(
        &self,
        specs: Vec<TaskSpec>,
        external: CancellationToken,
    ) -> Result<(), RuntimeError> {
        let token = CancellationToken::new();
        self.subscriber_listener();

        let mut set = JoinSet::new();
        self.spawn_loops(&mut set, &token, specs);
        self.drive_shutdown(&mut set, &token, &external).await
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                set.emit(&ev);
            }
        });
    }

    /// Spawns one perseverance loop per spec into the join set.
    fn spawn_loops(
        &self,
        set: &mut JoinSet<()>,
        runtime_token: &CancellationToken,
        specs: Vec<TaskSpec>,
    ) {
        for spec in specs {
            let (task, retry) = spec.into_parts();
            let pers = Perseverance::new(task, retry, self.bus.clone());
            let child = runtime_token.child_token();
            set.spawn(pers.run(child));
        }
    }

    /// Waits until all loops finish, a shutdown signal is received, or the
    /// external token is cancelled.
    async fn drive_shutdown(
        &self,
        set: &mut JoinSet<()>,
        runtime_token: &CancellationToken,
        external: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => {
                match res {
                    Ok(()) => info!("termination signal received, shutting down"),
                    // Cannot listen for signals at all; running on without a
                    // way to stop would strand every child process.
                    Err(e) => error!(error = %e, "signal listener failed, shutting down"),
                }
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                runtime_token.cancel();
                self.wait_all_with_grace(set).await
            }
            _ = external.cancelled() => {
                info!("external cancellation, shutting down");
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                runtime_token.cancel();
                self.wait_all_with_grace(set).await
            }
            _ = async { while set.join_next().await.is_some() {} } => {
                Ok(())
            }
        }
    }

    /// Waits for all loops to finish within the configured grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout and returns
    /// [`RuntimeError::GraceExceeded`].
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };
        let timed = tokio::time::timeout(grace, done).await;

        match timed {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded { grace })
            }
        }
    }
}
