//! Lifecycle events emitted by the runtime.
//!
//! [`EventKind`] classifies events in four groups:
//! - **Task lifecycle**: attempts starting, stopping, failing, backoff.
//! - **Stream health**: probe start, liveness transitions, silence markers.
//! - **Stream control**: start requests issued towards the device.
//! - **Runtime**: shutdown progress and subscriber fan-out problems.
//!
//! Each event carries a globally monotonic sequence number (`seq`) so
//! consumers can restore ordering when deliveries interleave.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle ===
    /// A supervised task is starting an attempt (`task`, `attempt`).
    TaskStarting,
    /// A supervised task stopped gracefully (finished or cancelled).
    TaskStopped,
    /// An attempt failed (`task`, `attempt`, `reason`).
    TaskFailed,
    /// A retry is scheduled after a failure (`task`, `attempt`, `delay_ms`).
    BackoffScheduled,

    // === Stream health ===
    /// The liveness probe launched its decode process (`device`).
    ProbeStarted,
    /// The probe decoded a container header; stream confirmed alive (`device`).
    StreamAlive,
    /// The watchdog demoted the stream after a probe ended (`device`).
    StreamUnhealthy,
    /// The decode tool reported the start of an audio silence (`device`).
    SilenceStarted,
    /// The decode tool reported the end of an audio silence (`device`).
    SilenceEnded,

    // === Stream control ===
    /// A start-stream request was issued to the device (`device`).
    StreamingRequested,

    // === Runtime ===
    /// Shutdown requested (OS signal or external cancellation).
    ShutdownRequested,
    /// All workers stopped within the configured grace period.
    AllStoppedWithin,
    /// Grace period elapsed with workers still running.
    GraceExceeded,
    /// A subscriber queue dropped an event (`task` = subscriber, `reason`).
    SubscriberOverflow,
    /// A subscriber panicked while handling an event (`task`, `reason`).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// `seq` is a monotonic global sequence; `at` a wall-clock timestamp for
/// logs. The remaining fields are set depending on the [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the supervised task, if applicable.
    pub task: Option<Arc<str>>,
    /// Device identifier, if applicable.
    pub device: Option<Arc<str>>,
    /// Attempt ordinal (1-based), if applicable.
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt, in milliseconds.
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, log tails).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            device: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a device identifier.
    #[inline]
    pub fn with_device(mut self, device: impl Into<Arc<str>>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Attaches an attempt ordinal.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
