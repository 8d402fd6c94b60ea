//! Task abstractions and built-in task implementations.
//!
//! - [`Task`] — the async, cancelable unit supervised by
//!   [`Perseverance`](crate::Perseverance); [`TaskRef`] is the shared handle.
//! - [`TaskFn`] — closure-backed task for ad-hoc workers.
//! - [`TaskSpec`] — bundle of a task and its retry policy, consumed by the
//!   [`Supervisor`](crate::Supervisor).
//! - [`CommandTask`] — runs an external long-lived command (for example a
//!   remote transcoding pipeline) with per-run log files.

mod command;
mod spec;
mod task;
mod task_fn;

pub use command::CommandTask;
pub use spec::TaskSpec;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
