//! Built-in logging subscriber.
//!
//! [`LogWriter`] renders every runtime event through `tracing` at a level
//! matching its severity. Useful as-is for services that only need logs;
//! metrics or alerting integrations implement their own [`Subscribe`].

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Logging subscriber backed by `tracing`.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let device = e.device.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskStarting => {
                info!(seq = e.seq, task, attempt = e.attempt, "task starting");
            }
            EventKind::TaskStopped => {
                info!(seq = e.seq, task, "task stopped");
            }
            EventKind::TaskFailed => {
                warn!(seq = e.seq, task, attempt = e.attempt, reason, "task failed");
            }
            EventKind::BackoffScheduled => {
                info!(
                    seq = e.seq,
                    task,
                    attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    "retry scheduled"
                );
            }
            EventKind::ProbeStarted => {
                debug!(seq = e.seq, device, "probe started");
            }
            EventKind::StreamAlive => {
                info!(seq = e.seq, device, "stream is alive");
            }
            EventKind::StreamUnhealthy => {
                warn!(seq = e.seq, device, "stream is unhealthy");
            }
            EventKind::SilenceStarted => {
                debug!(seq = e.seq, device, "silence started");
            }
            EventKind::SilenceEnded => {
                debug!(seq = e.seq, device, "silence ended");
            }
            EventKind::StreamingRequested => {
                info!(seq = e.seq, device, "streaming requested");
            }
            EventKind::ShutdownRequested => {
                info!(seq = e.seq, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!(seq = e.seq, "all tasks stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(seq = e.seq, "grace period exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(seq = e.seq, subscriber = task, reason, "subscriber queue overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(seq = e.seq, subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
