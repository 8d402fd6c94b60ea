//! Task specification for supervised execution.
//!
//! [`TaskSpec`] bundles a task with the retry policy its perseverance loop
//! should use. Created explicitly with [`TaskSpec::new`] or from global
//! defaults with [`TaskSpec::with_defaults`], then passed to
//! [`Supervisor::run`](crate::Supervisor::run).

use crate::config::Config;
use crate::retry::RetryPolicy;
use crate::tasks::task::TaskRef;

/// Specification for running a task under supervision.
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    retry: RetryPolicy,
}

impl TaskSpec {
    /// Creates a spec with an explicit retry policy.
    pub fn new(task: TaskRef, retry: RetryPolicy) -> Self {
        Self { task, retry }
    }

    /// Creates a spec inheriting the retry policy from `cfg`.
    pub fn with_defaults(task: TaskRef, cfg: &Config) -> Self {
        Self {
            task,
            retry: cfg.retry.clone(),
        }
    }

    /// The task to execute.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// The retry policy for this task.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Decomposes the spec into its parts.
    pub(crate) fn into_parts(self) -> (TaskRef, RetryPolicy) {
        (self.task, self.retry)
    }
}
