//! Supervision policies.
//!
//! ## Contents
//! - [`RestartPolicy`] whether the master replaces a worker that died on its own
//!
//! ## Quick wiring
//! ```text
//! RuntimeConfig { restart: RestartPolicy, max_consecutive_timeouts, .. }
//!      └─► worker::Master uses:
//!           - restart to decide re-fork / leave the slot empty
//!           - max_consecutive_timeouts to abandon a slot that never comes online
//! ```

mod restart;

pub use restart::RestartPolicy;
