//! # Restart policy for worker processes.
//!
//! [`RestartPolicy`] decides what the master does when a worker process exits
//! while the master itself is **not** shutting down.
//!
//! - [`RestartPolicy::Never`] the slot stays empty; the master exits once no worker is left.
//! - [`RestartPolicy::OnUnexpectedExit`] a replacement is forked immediately (default).
//!
//! Exits that follow a `Terminate` directive are never restarted, whatever the policy.

/// Policy controlling whether a dead worker is replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    /// Never replace a worker.
    Never,
    /// Fork a replacement when a worker dies without being asked to (default).
    #[default]
    OnUnexpectedExit,
}

impl RestartPolicy {
    /// Returns `true` if a worker that died on its own should be replaced.
    #[inline]
    pub fn restarts(self) -> bool {
        matches!(self, RestartPolicy::OnUnexpectedExit)
    }
}
