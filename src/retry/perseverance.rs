//! Perseverance: run a task forever, escalating cooldowns on rapid failure.
//!
//! Supervises one [`Task`] with a [`RetryPolicy`]:
//!
//! ```text
//! loop {
//!   ├─► ordinal += 1 (or back to 1 after a recovered run)
//!   ├─► publish TaskStarting{ task, ordinal }
//!   ├─► task.run(Attempt{ ordinal, child token })
//!   │       │
//!   │       ├─ Ok / Canceled ──► publish TaskStopped, exit
//!   │       ├─ Fatal ─────────► publish TaskFailed, exit (no retry)
//!   │       └─ Fail ──────────► publish TaskFailed
//!   │                           ├─► publish BackoffScheduled{ delay }
//!   │                           └─► sleep(cooldown) (cancellable)
//!   └─ exit on parent cancellation (never starts another run)
//! }
//! ```
//!
//! ## Rules
//! - Runs are sequential within one loop, never parallel.
//! - A run lasting at least `reset_after` is recovered: the next run's
//!   ordinal is 1 and escalation starts over.
//! - Cancellation interrupts a sleeping cooldown immediately and propagates
//!   into the in-flight attempt's token.
//! - No internal timeout is imposed; a blocked run is only stoppable via
//!   its cancellation signal.

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::retry::{Attempt, RetryPolicy};
use crate::tasks::TaskRef;

/// Retry loop supervising a single task.
pub struct Perseverance {
    task: TaskRef,
    policy: RetryPolicy,
    bus: Bus,
}

impl Perseverance {
    /// Creates a perseverance loop for `task`.
    pub fn new(task: TaskRef, policy: RetryPolicy, bus: Bus) -> Self {
        Self { task, policy, bus }
    }

    /// Runs the task until it stops gracefully, fails fatally, or the
    /// parent token is cancelled.
    pub async fn run(self, token: CancellationToken) {
        let mut ordinal: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }
            ordinal += 1;

            self.bus.publish(
                Event::new(EventKind::TaskStarting)
                    .with_task(self.task.name())
                    .with_attempt(ordinal),
            );

            let child = token.child_token();
            let started = Instant::now();
            let res = self.task.run(Attempt::new(ordinal, child)).await;
            let recovered = started.elapsed() >= self.policy.reset_after;

            match res {
                Ok(()) | Err(TaskError::Canceled) => {
                    self.bus.publish(
                        Event::new(EventKind::TaskStopped)
                            .with_task(self.task.name())
                            .with_attempt(ordinal),
                    );
                    break;
                }
                Err(e @ TaskError::Fatal { .. }) => {
                    self.bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task(self.task.name())
                            .with_attempt(ordinal)
                            .with_reason(e.to_string()),
                    );
                    break;
                }
                Err(e) => {
                    self.bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task(self.task.name())
                            .with_attempt(ordinal)
                            .with_reason(e.to_string()),
                    );

                    if recovered {
                        ordinal = 0;
                    }
                    let delay = self.policy.delay_after(ordinal);
                    self.bus.publish(
                        Event::new(EventKind::BackoffScheduled)
                            .with_task(self.task.name())
                            .with_attempt(ordinal)
                            .with_delay(delay)
                            .with_reason(e.to_string()),
                    );

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    tokio::select! {
                        _ = &mut sleep => {}
                        _ = token.cancelled() => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn policy(cooldowns: &[u64], reset_after: u64) -> RetryPolicy {
        RetryPolicy {
            reset_after: Duration::from_secs(reset_after),
            cooldowns: cooldowns.iter().copied().map(Duration::from_secs).collect(),
        }
    }

    type RunLog = Arc<Mutex<Vec<(u32, Instant)>>>;

    async fn wait_for_runs(log: &RunLog, n: usize) {
        loop {
            if log.lock().unwrap().len() >= n {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn escalates_and_saturates_on_rapid_failure() {
        let log: RunLog = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let task = TaskFn::arc("flappy", move |attempt: Attempt| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push((attempt.ordinal(), Instant::now()));
                Err(TaskError::fail("boom"))
            }
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(
            Perseverance::new(task, policy(&[1, 3, 5], 60), Bus::new(8)).run(token.clone()),
        );

        wait_for_runs(&log, 5).await;
        token.cancel();
        handle.await.unwrap();

        let runs = log.lock().unwrap();
        let ordinals: Vec<u32> = runs.iter().map(|(o, _)| *o).collect();
        assert_eq!(&ordinals[..5], &[1, 2, 3, 4, 5]);

        let gaps: Vec<Duration> = runs.windows(2).map(|w| w[1].1 - w[0].1).collect();
        assert_eq!(
            &gaps[..4],
            &[
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(5),
                Duration::from_secs(5),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_run_resets_escalation() {
        let log: RunLog = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        // Runs 1 and 2 fail immediately; run 3 holds for 2s (recovered) then
        // fails; run 4 fails immediately again.
        let task = TaskFn::arc("recovering", move |attempt: Attempt| {
            let sink = sink.clone();
            let counter = counter.clone();
            async move {
                sink.lock().unwrap().push((attempt.ordinal(), Instant::now()));
                if counter.fetch_add(1, Ordering::SeqCst) == 2 {
                    time::sleep(Duration::from_secs(2)).await;
                }
                Err(TaskError::fail("boom"))
            }
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(
            Perseverance::new(task, policy(&[1, 3, 5], 2), Bus::new(8)).run(token.clone()),
        );

        wait_for_runs(&log, 4).await;
        token.cancel();
        handle.await.unwrap();

        let runs = log.lock().unwrap();
        let ordinals: Vec<u32> = runs.iter().map(|(o, _)| *o).collect();
        assert_eq!(&ordinals[..4], &[1, 2, 3, 1]);

        // The recovered run waits the first cooldown again.
        let gap_after_recovery = runs[3].1 - runs[2].1;
        assert_eq!(gap_after_recovery, Duration::from_secs(2 + 1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_stops_without_another_run() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let task = TaskFn::arc("doomed", move |_attempt: Attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::fail("boom"))
            }
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(
            Perseverance::new(task, policy(&[3600], 60), Bus::new(8)).run(token.clone()),
        );

        // Let the first run fail and the loop enter its cooldown sleep.
        while runs.load(Ordering::SeqCst) < 1 {
            time::sleep(Duration::from_millis(10)).await;
        }
        time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn graceful_return_stops_the_loop() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let task = TaskFn::arc("one-shot", move |_attempt: Attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        Perseverance::new(task, RetryPolicy::default(), Bus::new(8))
            .run(CancellationToken::new())
            .await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let task = TaskFn::arc("broken-env", move |_attempt: Attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::fatal("missing binary"))
            }
        });

        Perseverance::new(task, RetryPolicy::default(), Bus::new(8))
            .run(CancellationToken::new())
            .await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
