//! Function-backed task.
//!
//! [`TaskFn`] wraps a closure that produces a fresh future per run, so
//! nothing is shared between restarts unless the closure captures an
//! explicit `Arc`.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::retry::Attempt;
use crate::tasks::task::Task;

/// Closure-backed [`Task`] implementation.
///
/// ## Example
/// ```rust
/// use camvisor::{Attempt, TaskError, TaskFn, TaskRef};
///
/// let t: TaskRef = TaskFn::arc("worker", |attempt: Attempt| async move {
///     if attempt.is_cancelled() {
///         return Err(TaskError::Canceled);
///     }
///     // do work...
///     Ok(())
/// });
/// assert_eq!(t.name(), "worker");
/// ```
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(Attempt) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, attempt: Attempt) -> Result<(), TaskError> {
        (self.f)(attempt).await
    }
}
