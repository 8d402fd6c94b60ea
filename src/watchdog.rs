//! Watchdog loop: keeps one device's liveness probe running on a fixed
//! cadence.
//!
//! Every round runs the probe to completion, demotes the device to
//! Unhealthy (the decode path inside the probe is the only place that
//! promotes to Alive), then waits a fixed delay. The demotion happens
//! unconditionally, even when the round ended because of cancellation, so
//! a stale Alive never outlives its probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::retry::Attempt;
use crate::state::{StateDelta, StateStore, StreamLiveness, StreamRequestState};
use crate::tasks::{Task, TaskRef};

/// Default pause between probe rounds.
const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Fixed-cadence supervisor for one device's liveness probe.
pub struct Watchdog {
    name: String,
    probe: TaskRef,
    store: Arc<StateStore>,
    device_id: Arc<str>,
    delay: Duration,
    bus: Bus,
}

impl Watchdog {
    pub fn new(
        device_id: impl Into<Arc<str>>,
        probe: TaskRef,
        store: Arc<StateStore>,
        bus: Bus,
    ) -> Self {
        let device_id = device_id.into();
        Self {
            name: format!("watchdog:{device_id}"),
            probe,
            store,
            device_id,
            delay: DEFAULT_DELAY,
            bus,
        }
    }

    /// Overrides the pause between rounds.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn mark_unhealthy(&self) {
        self.store.update(
            &self.device_id,
            StateDelta::new().with_stream_liveness(StreamLiveness::Unhealthy),
        );
        self.bus
            .publish(Event::new(EventKind::StreamUnhealthy).with_device(self.device_id.clone()));

        let state = self.store.get(&self.device_id);
        if state.stream_request_state == StreamRequestState::RequestFailed {
            error!(
                device = %self.device_id,
                "stream is dead and the request to start it failed"
            );
        }
    }
}

#[async_trait]
impl Task for Watchdog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, attempt: Attempt) -> Result<(), TaskError> {
        let token = attempt.token().clone();
        let mut round: u32 = 0;

        loop {
            round += 1;
            debug!(device = %self.device_id, round, "probing the stream");

            let res = self
                .probe
                .run(Attempt::new(round, token.child_token()))
                .await;
            // Whatever ended the round, the stream is no longer proven live.
            self.mark_unhealthy();

            match res {
                Ok(()) | Err(TaskError::Fail { .. }) => {}
                Err(TaskError::Canceled) => return Ok(()),
                Err(e @ TaskError::Fatal { .. }) => return Err(e),
            }
            if token.is_cancelled() {
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = token.cancelled() => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn reprobes_on_cadence_and_always_demotes() {
        let store = Arc::new(StateStore::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let probe = TaskFn::arc("probe", move |_attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::fail("no stream"))
            }
        });

        let bus = Bus::new(16);
        let watchdog =
            Watchdog::new("cam-1", probe, store.clone(), bus).with_delay(Duration::from_secs(5));

        let token = CancellationToken::new();
        let child = token.child_token();
        let handle = tokio::spawn(async move { watchdog.run(Attempt::new(1, child)).await });

        tokio::time::sleep(Duration::from_secs(12)).await;
        token.cancel();
        let res = handle.await.unwrap();

        assert!(res.is_ok());
        // Rounds at t=0, 5s and 10s with the virtual clock.
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(
            store.get("cam-1").stream_liveness,
            StreamLiveness::Unhealthy
        );
    }

    #[tokio::test]
    async fn demotes_even_when_cancelled_mid_probe() {
        let store = Arc::new(StateStore::new());
        let probe = TaskFn::arc("probe", move |attempt: Attempt| async move {
            attempt.cancelled().await;
            Err(TaskError::Canceled)
        });

        let bus = Bus::new(16);
        let watchdog = Watchdog::new("cam-1", probe, store.clone(), bus);

        let token = CancellationToken::new();
        let child = token.child_token();
        let handle = tokio::spawn(async move { watchdog.run(Attempt::new(1, child)).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        assert!(handle.await.unwrap().is_ok());
        assert_eq!(
            store.get("cam-1").stream_liveness,
            StreamLiveness::Unhealthy
        );
    }

    #[tokio::test]
    async fn fatal_probe_error_stops_the_loop() {
        let store = Arc::new(StateStore::new());
        let probe = TaskFn::arc("probe", |_attempt| async {
            Err(TaskError::fatal("decoder binary not found"))
        });

        let watchdog = Watchdog::new("cam-1", probe, store.clone(), Bus::new(4));
        let res = watchdog
            .run(Attempt::new(1, CancellationToken::new()))
            .await;
        assert!(matches!(res, Err(TaskError::Fatal { .. })));
    }
}
