//! Liveness probe: a dummy player that proves the stream carries media.
//!
//! Launches an external decode tool against the local stream URL and drives
//! three concurrent activities until the first termination condition wins:
//!
//! 1. **Process wait** — detects exit and classifies the exit code.
//! 2. **Diagnostic tail** — keeps the last few stderr lines for failure
//!    reports and classifies each line for silence markers.
//! 3. **Payload decode** — reads stdout as an FLV container; the first
//!    decoded header marks the device Alive in the state store, following
//!    tags are consumed and discarded to keep the pipe drained.
//!
//! Termination policy: a self-exit with any exit code — including 0, since
//! the tool is not expected to finish on a healthy stream — is a probe
//! failure with the tail attached; being killed without a code is expected
//! (that is how we stop it); a structural decode error kills the process
//! and reports failure; caller cancellation kills the process and is never
//! a failure. An `exiting` latch suppresses reports from the other two
//! activities once any termination path has been taken.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::probe::classify::{classify, SilenceEvent};
use crate::probe::flv;
use crate::probe::tail::LogTail;
use crate::retry::Attempt;
use crate::state::{StateDelta, StateStore, StreamLiveness};
use crate::tasks::Task;

/// Default number of stderr lines kept for failure reports.
const DEFAULT_TAIL_CAPACITY: usize = 3;

enum ExitReason {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    DecodeFailed,
}

/// Stream liveness probe for one device.
pub struct Probe {
    name: String,
    device_id: Arc<str>,
    url: String,
    program: String,
    args: Vec<String>,
    tail_capacity: usize,
    store: Arc<StateStore>,
    bus: Bus,
}

impl Probe {
    /// Creates a probe decoding `url` with the default tool (`ffmpeg -i
    /// <url> -f flv -`).
    pub fn new(
        device_id: impl Into<Arc<str>>,
        url: impl Into<String>,
        store: Arc<StateStore>,
        bus: Bus,
    ) -> Self {
        let device_id = device_id.into();
        let url = url.into();
        Self {
            name: format!("probe:{device_id}"),
            device_id,
            program: "ffmpeg".to_string(),
            args: vec![
                "-i".to_string(),
                url.clone(),
                "-f".to_string(),
                "flv".to_string(),
                "-".to_string(),
            ],
            url,
            tail_capacity: DEFAULT_TAIL_CAPACITY,
            store,
            bus,
        }
    }

    /// Overrides the decode program, keeping the default arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Overrides the decode command (program and full argv).
    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    /// Overrides the diagnostic tail capacity.
    pub fn with_tail_capacity(mut self, capacity: usize) -> Self {
        self.tail_capacity = capacity;
        self
    }

    async fn run_player(&self, token: &CancellationToken) -> Result<(), TaskError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TaskError::fatal(format!("unable to start {}: {e}", self.program)))?;

        info!(device = %self.device_id, url = %self.url, "player started");
        self.bus
            .publish(Event::new(EventKind::ProbeStarted).with_device(self.device_id.clone()));

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TaskError::fatal("missing stdout pipe"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TaskError::fatal("missing stderr pipe"))?;

        let exiting = Arc::new(AtomicBool::new(false));
        let tail_task = tokio::spawn(tail_stderr(
            stderr,
            self.tail_capacity,
            self.bus.clone(),
            self.device_id.clone(),
        ));
        let (decode_err_tx, mut decode_err_rx) = mpsc::channel::<()>(1);
        tokio::spawn(decode_stdout(
            stdout,
            self.store.clone(),
            self.bus.clone(),
            self.device_id.clone(),
            self.url.clone(),
            exiting.clone(),
            decode_err_tx,
        ));

        let reason = tokio::select! {
            status = child.wait() => ExitReason::Exited(status),
            _ = token.cancelled() => ExitReason::Cancelled,
            Some(()) = decode_err_rx.recv() => ExitReason::DecodeFailed,
        };
        exiting.store(true, Ordering::SeqCst);

        match reason {
            ExitReason::Exited(status) => {
                let status =
                    status.map_err(|e| TaskError::fail(format!("wait failed: {e}")))?;
                match status.code() {
                    // Killed without a code: someone stopped it on purpose.
                    None => {
                        warn!(device = %self.device_id, "player terminated");
                        Ok(())
                    }
                    Some(code) => {
                        let tail = tail_task.await.unwrap_or_default();
                        error!(
                            device = %self.device_id,
                            code,
                            logtail = %tail,
                            "player exited"
                        );
                        Err(TaskError::fail(format!("player exited with code {code}")))
                    }
                }
            }
            ExitReason::Cancelled => {
                debug!(device = %self.device_id, "cancel request received, killing the player");
                if let Err(e) = child.start_kill() {
                    error!(device = %self.device_id, error = %e, "unable to kill player");
                }
                let _ = child.wait().await;
                Ok(())
            }
            ExitReason::DecodeFailed => {
                debug!(device = %self.device_id, "decoder failure, killing the player");
                if let Err(e) = child.start_kill() {
                    error!(device = %self.device_id, error = %e, "unable to kill player");
                }
                let _ = child.wait().await;
                Err(TaskError::fail("stream decode failed"))
            }
        }
    }
}

#[async_trait]
impl Task for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, attempt: Attempt) -> Result<(), TaskError> {
        self.run_player(attempt.token()).await
    }
}

/// Tails the tool's diagnostic output, classifying every line and keeping
/// the most recent ones for failure reports.
async fn tail_stderr(stderr: ChildStderr, capacity: usize, bus: Bus, device_id: Arc<str>) -> LogTail {
    let mut tail = LogTail::new(capacity);
    let mut lines = BufReader::new(stderr).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        match classify(&line) {
            SilenceEvent::Start => {
                debug!(device = %device_id, "silence started");
                bus.publish(Event::new(EventKind::SilenceStarted).with_device(device_id.clone()));
            }
            SilenceEvent::End => {
                debug!(device = %device_id, "silence ended");
                bus.publish(Event::new(EventKind::SilenceEnded).with_device(device_id.clone()));
            }
            SilenceEvent::Unknown => {}
        }
        tail.push(line);
    }
    tail
}

/// Decodes the tool's primary output; the first container header proves
/// liveness, everything after is drained and discarded.
async fn decode_stdout(
    stdout: ChildStdout,
    store: Arc<StateStore>,
    bus: Bus,
    device_id: Arc<str>,
    url: String,
    exiting: Arc<AtomicBool>,
    err_tx: mpsc::Sender<()>,
) {
    let mut reader = BufReader::new(stdout);

    match flv::read_header(&mut reader).await {
        Err(e) => {
            if !exiting.load(Ordering::SeqCst) {
                if e.is_eof() {
                    warn!(device = %device_id, "closed pipe");
                } else {
                    warn!(device = %device_id, error = %e, "unable to decode stream header");
                }
                let _ = err_tx.send(()).await;
            }
        }
        Ok(header) => {
            debug!(device = %device_id, ?header, "successfully decoded stream header");
            info!(device = %device_id, url = %url, "stream is alive");
            store.update(
                &device_id,
                StateDelta::new().with_stream_liveness(StreamLiveness::Alive),
            );
            bus.publish(Event::new(EventKind::StreamAlive).with_device(device_id.clone()));

            loop {
                match flv::read_tag(&mut reader).await {
                    Ok(_tag) => {}
                    Err(e) => {
                        if !exiting.load(Ordering::SeqCst) {
                            if e.is_eof() {
                                warn!(device = %device_id, "closed pipe");
                            } else {
                                warn!(device = %device_id, error = %e, "failed to decode tag");
                                let _ = err_tx.send(()).await;
                            }
                        }
                        return;
                    }
                }
            }
        }
    }
}
