//! # Runtime events emitted by the loader, the worker runtime and the master.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Unit events**: one lifecycle phase call on one unit (starting, completed, failed, skipped, timeout)
//! - **Worker events**: worker process state machine as seen by the master
//! - **Shutdown events**: terminate directive and grace outcome
//! - **Subscriber events**: delivery problems of the fan-out itself
//!
//! The [`Event`] struct carries the metadata: unit name, phase, worker slot,
//! pid, reason, exit code.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use unitvisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::PhaseFailed)
//!     .with_unit("database")
//!     .with_phase(Phase::Start)
//!     .with_reason("connection refused")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::PhaseFailed);
//! assert_eq!(ev.unit.as_deref(), Some("database"));
//! assert_eq!(ev.phase, Some(Phase::Start));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::units::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `unit` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `unit` (subscriber name), `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Unit lifecycle events ===
    /// The loader is about to call a phase on a unit.
    ///
    /// Sets: `unit`, `phase`.
    PhaseStarting,

    /// The phase call returned `Ok` and the unit moved to the phase target state.
    ///
    /// Sets: `unit`, `phase`.
    PhaseCompleted,

    /// The phase call failed (or timed out).
    ///
    /// Sets: `unit`, `phase`, `reason`.
    PhaseFailed,

    /// The phase does not apply to the unit's state (teardown of a partial bring-up).
    ///
    /// Sets: `unit`, `phase`, `reason` (current state).
    PhaseSkipped,

    /// The phase call exceeded its deadline (always followed by `PhaseFailed`).
    ///
    /// Sets: `unit`, `phase`, `timeout_ms`.
    TimeoutHit,

    /// A child component's router was mounted into its parent's router.
    ///
    /// Sets: `unit` (child), `reason` (mount segment).
    RouterMounted,

    // === Worker events (master side) ===
    /// A worker process was spawned.
    ///
    /// Sets: `worker`, `pid`, `reason` ("initial" / "replacement").
    WorkerForked,

    /// The worker reported Online; its bootstrap deadline is cleared.
    ///
    /// Sets: `worker`, `pid`.
    WorkerOnline,

    /// The worker finished bring-up and is serving.
    ///
    /// Sets: `worker`, `pid`.
    WorkerListening,

    /// The worker did not report Online before the bootstrap deadline and was killed.
    ///
    /// Sets: `worker`, `pid`, `timeout_ms`, `attempt` (consecutive timeouts).
    WorkerBootstrapTimeout,

    /// The master sent `Terminate` to the worker.
    ///
    /// Sets: `worker`, `pid`.
    WorkerDisconnecting,

    /// The worker exited after being asked to.
    ///
    /// Sets: `worker`, `pid`, `exit_code`.
    WorkerExited,

    /// The worker exited on its own.
    ///
    /// Sets: `worker`, `pid`, `exit_code`.
    WorkerDied,

    /// The slot will not be refilled (restart disabled or too many bootstrap timeouts).
    ///
    /// Sets: `worker`, `reason`.
    WorkerAbandoned,

    // === Shutdown events ===
    /// Shutdown requested (OS signal or explicit call).
    ShutdownRequested,

    /// Everything stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining workers are being killed.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic process-wide sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Unit (or subscriber) name, if applicable.
    pub unit: Option<Arc<str>>,
    /// Lifecycle phase, for unit events.
    pub phase: Option<Phase>,
    /// Worker slot id, for worker events.
    pub worker: Option<u32>,
    /// OS process id, for worker events.
    pub pid: Option<u32>,
    /// Process exit code (`None` inside `Some` means killed by a signal).
    pub exit_code: Option<Option<i32>>,
    /// Deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Counter attached to the event (consecutive timeouts).
    pub attempt: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            unit: None,
            phase: None,
            worker: None,
            pid: None,
            exit_code: None,
            timeout_ms: None,
            attempt: None,
            reason: None,
        }
    }

    /// Attaches a unit name.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a lifecycle phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a worker slot id and, if known, its pid.
    #[inline]
    pub fn with_worker(mut self, worker: u32, pid: Option<u32>) -> Self {
        self.worker = Some(worker);
        self.pid = pid;
        self
    }

    /// Attaches a process exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches a deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
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
            .with_unit(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }

    /// Returns `true` for the event kinds that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::PhaseFailed
                | EventKind::TimeoutHit
                | EventKind::WorkerBootstrapTimeout
                | EventKind::WorkerDied
                | EventKind::WorkerAbandoned
                | EventKind::GraceExceeded
                | EventKind::SubscriberPanicked
                | EventKind::SubscriberOverflow
        )
    }
}
