//! # Roster of live worker processes.
//!
//! The master keeps one [`WorkerRecord`] per live process. A record is
//! created on fork and removed once the exit is confirmed, so whatever is
//! left after the grace period is exactly the set of stuck workers.
//!
//! ```text
//! fork ──► insert(record)                          state = Forking
//! Online / Listening ──► health(worker, state, at)  state = Online / Listening
//! Terminate sent / Exit announced ──► disconnecting  state = Disconnecting
//! exit confirmed ──► remove(worker)
//! grace exceeded ──► snapshot() ──► ["worker-2", ...]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Stage of a live worker, as seen by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Spawned; has not reported Online yet.
    Forking,
    /// Reported Online; bringing its units up.
    Online,
    /// Units started; serving.
    Listening,
    /// Asked to stop, or announced its exit.
    Disconnecting,
}

impl WorkerState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            WorkerState::Forking => "forking",
            WorkerState::Online => "online",
            WorkerState::Listening => "listening",
            WorkerState::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Last health signal a worker sent and when it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthEvent {
    /// `Online` or `Listening`.
    pub state: WorkerState,
    pub at: Instant,
}

/// Master-side view of one worker process.
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    /// Slot id, stable across replacements.
    pub worker: u32,
    /// OS process id, when known.
    pub pid: Option<u32>,
    pub forked_at: Instant,
    pub last_health: Option<HealthEvent>,
    /// Bootstrap timeouts in a row for this slot, carried across replacements.
    pub consecutive_timeouts: u32,
    pub state: WorkerState,
}

impl WorkerRecord {
    /// Record of a freshly forked worker.
    pub(crate) fn forked(worker: u32, pid: Option<u32>, consecutive_timeouts: u32) -> Self {
        Self {
            worker,
            pid,
            forked_at: Instant::now(),
            last_health: None,
            consecutive_timeouts,
            state: WorkerState::Forking,
        }
    }

    pub fn label(&self) -> String {
        label(self.worker)
    }
}

pub(crate) fn label(worker: u32) -> String {
    format!("worker-{worker}")
}

/// Shared set of live worker records, keyed by slot id.
#[derive(Clone, Default)]
pub struct Roster {
    inner: Arc<RwLock<BTreeMap<u32, WorkerRecord>>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert(&self, record: WorkerRecord) {
        self.inner.write().await.insert(record.worker, record);
    }

    /// Records a health signal; moves `worker` to `state` and clears its timeouts.
    pub(crate) async fn health(&self, worker: u32, state: WorkerState, at: Instant) {
        if let Some(rec) = self.inner.write().await.get_mut(&worker) {
            rec.last_health = Some(HealthEvent { state, at });
            rec.state = state;
            rec.consecutive_timeouts = 0;
        }
    }

    pub(crate) async fn disconnecting(&self, worker: u32) {
        if let Some(rec) = self.inner.write().await.get_mut(&worker) {
            rec.state = WorkerState::Disconnecting;
        }
    }

    pub(crate) async fn remove(&self, worker: u32) -> Option<WorkerRecord> {
        self.inner.write().await.remove(&worker)
    }

    /// Copy of the record for `worker`.
    pub async fn get(&self, worker: u32) -> Option<WorkerRecord> {
        self.inner.read().await.get(&worker).cloned()
    }

    /// Labels of every live worker, in slot order.
    pub async fn snapshot(&self) -> Vec<String> {
        self.inner.read().await.values().map(WorkerRecord::label).collect()
    }

    /// Copies of every live record, in slot order.
    pub async fn records(&self) -> Vec<WorkerRecord> {
        self.inner.read().await.values().cloned().collect()
    }
}
