//! Task trait: the supervised unit of work.
//!
//! A task receives an [`Attempt`] context per run and reports its outcome
//! through the return value: `Err(TaskError::Fail)` asks for a retry with
//! backoff, `Err(TaskError::Fatal)` stops supervision, `Ok(())` or
//! `Err(TaskError::Canceled)` end the task gracefully. Implementations
//! should watch the attempt's cancellation token and release their resources
//! (kill subprocesses, close handles) promptly when it fires.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::retry::Attempt;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// Asynchronous, cancelable unit of work.
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use camvisor::{Attempt, Task, TaskError};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     async fn run(&self, attempt: Attempt) -> Result<(), TaskError> {
///         attempt.cancelled().await;
///         Err(TaskError::Canceled)
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name (diagnostics only).
    fn name(&self) -> &str;

    /// Executes one supervised run.
    ///
    /// The supervisor imposes no timeout; a run that neither fails nor
    /// returns is only stoppable through the attempt's cancellation token.
    async fn run(&self, attempt: Attempt) -> Result<(), TaskError>;
}
