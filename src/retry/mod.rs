//! Retry with escalating cooldowns ("perseverance").
//!
//! - [`RetryPolicy`] — ordered cooldown schedule plus the recovery
//!   threshold that resets escalation.
//! - [`Attempt`] — per-run context handed to the task (ordinal and
//!   cancellation signal).
//! - [`Perseverance`] — the loop that runs a task forever, escalating the
//!   cooldown on rapid failure and resetting after a sustained run.

mod attempt;
mod perseverance;
mod policy;

pub use attempt::Attempt;
pub use perseverance::Perseverance;
pub use policy::RetryPolicy;
