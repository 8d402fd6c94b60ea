//! Error types used by the camvisor runtime and tasks.
//!
//! - [`RuntimeError`] — errors raised by the top-level supervisor.
//! - [`TaskError`] — errors raised by individual supervised runs.
//! - [`RequestError`] — errors surfaced by the external device control channel.
//!
//! Recoverable stream and process failures stay inside the probe/watchdog
//! loop as [`TaskError::Fail`] and become state transitions, never hard
//! errors. Setup-time environment problems (missing binary, unwritable log
//! directory) are [`TaskError::Fatal`] and are the only class that stops a
//! supervised task for good.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the supervisor runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some workers were still running.
    #[error("shutdown grace {grace:?} exceeded; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Errors produced by one supervised run of a task.
///
/// [`Perseverance`](crate::Perseverance) retries only [`TaskError::Fail`];
/// `Fatal` stops the task, `Canceled` is a graceful exit.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Non-recoverable environment problem (should not be retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Run failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Run was cancelled due to parent context shutdown.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Convenience constructor for a retryable failure.
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Convenience constructor for a fatal, non-retryable failure.
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates whether the error is safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}

/// Errors surfaced by the external device control channel.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RequestError {
    /// The device explicitly rejected the request.
    #[error("request rejected by device: {reason}")]
    Rejected {
        /// Rejection reason reported by the device.
        reason: String,
    },

    /// The control channel failed to deliver the request.
    #[error("control channel failure: {0}")]
    Channel(String),
}
