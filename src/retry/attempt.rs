//! Per-run attempt context.
//!
//! One [`Attempt`] is created for every supervised run. It exposes the
//! attempt ordinal (1-based, incrementing across consecutive runs until the
//! policy resets it) and the cancellation signal the run must honor. A run
//! reports failure by returning `Err` from
//! [`Task::run`](crate::Task::run); the perseverance loop then begins the
//! next cooldown interval.

use tokio_util::sync::CancellationToken;

/// Context for one supervised run.
///
/// Lives from the start of the run until the next run begins or the parent
/// supervisor is cancelled.
#[derive(Clone, Debug)]
pub struct Attempt {
    ordinal: u32,
    token: CancellationToken,
}

impl Attempt {
    /// Creates an attempt context with the given ordinal and token.
    pub fn new(ordinal: u32, token: CancellationToken) -> Self {
        Self { ordinal, token }
    }

    /// The 1-based attempt ordinal (resets after a recovered run).
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// The cancellation signal for this run.
    ///
    /// Cancelling the parent supervisor cancels this token too; the task
    /// must release its resources (kill subprocesses, close handles) when it
    /// fires.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
