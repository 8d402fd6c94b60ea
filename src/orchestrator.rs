//! Stream request orchestrator: asks the device to publish its stream to
//! the local relay and re-asks whenever the stream goes unhealthy.
//!
//! The orchestrator never talks to the device directly; it goes through a
//! [`ControlChannel`], which is whatever signalling path the integration
//! provides. State transitions are recorded in the store so the watchdog
//! and the orchestrator stay consistent about what has been requested.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{RequestError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::retry::Attempt;
use crate::state::{
    ObserveFn, StateDelta, StateStore, StreamLiveness, StreamRequestState,
};
use crate::tasks::Task;

/// What the device is asked to do with its local stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamingCommand {
    Start,
    Stop,
}

/// Signalling path used to ask a device to start or stop streaming.
#[async_trait]
pub trait ControlChannel: Send + Sync + 'static {
    async fn request_streaming(
        &self,
        device_id: &str,
        local_url: &str,
        command: StreamingCommand,
    ) -> Result<(), RequestError>;
}

/// Keeps one device streaming to the local relay.
pub struct Orchestrator {
    name: String,
    device_id: Arc<str>,
    local_url: String,
    store: Arc<StateStore>,
    channel: Arc<dyn ControlChannel>,
    bus: Bus,
}

impl Orchestrator {
    pub fn new(
        device_id: impl Into<Arc<str>>,
        local_url: impl Into<String>,
        store: Arc<StateStore>,
        channel: Arc<dyn ControlChannel>,
        bus: Bus,
    ) -> Self {
        let device_id = device_id.into();
        Self {
            name: format!("orchestrator:{device_id}"),
            device_id,
            local_url: local_url.into(),
            store,
            channel,
            bus,
        }
    }

    /// Issues one start request and records the outcome.
    async fn initiate(&self) {
        info!(device = %self.device_id, url = %self.local_url, "requesting streaming");
        self.bus.publish(
            Event::new(EventKind::StreamingRequested).with_device(self.device_id.clone()),
        );

        match self
            .channel
            .request_streaming(&self.device_id, &self.local_url, StreamingCommand::Start)
            .await
        {
            Ok(()) => {
                self.store.update(
                    &self.device_id,
                    StateDelta::new()
                        .with_stream_request_state(StreamRequestState::Requested)
                        .with_local_streaming_initiated(true),
                );
            }
            Err(e) => {
                error!(device = %self.device_id, error = %e, "streaming request rejected");
                self.store.update(
                    &self.device_id,
                    StateDelta::new().with_stream_request_state(StreamRequestState::RequestFailed),
                );
            }
        }
    }

    /// Start-of-connection guard: request unless the stream is already
    /// proven live or a still-credible request is pending.
    fn should_initiate_on_start(&self) -> bool {
        let state = self.store.get(&self.device_id);
        state.stream_liveness != StreamLiveness::Alive
            && (state.stream_request_state != StreamRequestState::Requested
                || state.stream_liveness == StreamLiveness::Unhealthy)
    }
}

#[async_trait]
impl Task for Orchestrator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, attempt: Attempt) -> Result<(), TaskError> {
        let (wake_tx, mut wake_rx) = mpsc::unbounded_channel::<()>();
        let device_id = self.device_id.clone();
        let subscription = self.store.subscribe(ObserveFn::arc(
            move |dev: Arc<str>, delta: StateDelta| {
                let wake_tx = wake_tx.clone();
                let device_id = device_id.clone();
                async move {
                    if dev == device_id
                        && delta.stream_liveness == Some(StreamLiveness::Unhealthy)
                    {
                        let _ = wake_tx.send(());
                    }
                }
            },
        ));

        if self.should_initiate_on_start() {
            self.initiate().await;
        }

        loop {
            tokio::select! {
                woke = wake_rx.recv() => {
                    if woke.is_none() {
                        return Err(TaskError::fail("state store dropped"));
                    }
                    let state = self.store.get(&self.device_id);
                    if state.stream_request_state == StreamRequestState::RequestFailed {
                        debug!(
                            device = %self.device_id,
                            "stream is unhealthy but the last request failed, not re-asking"
                        );
                        continue;
                    }
                    self.initiate().await;
                }
                _ = attempt.cancelled() => {
                    subscription.unsubscribe();
                    if let Err(e) = self
                        .channel
                        .request_streaming(&self.device_id, &self.local_url, StreamingCommand::Stop)
                        .await
                    {
                        warn!(device = %self.device_id, error = %e, "unable to stop streaming");
                    }
                    return Ok(());
                }
            }
        }
    }
}
