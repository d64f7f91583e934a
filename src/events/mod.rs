//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Loader` (unit phases), `WorkerRuntime`, `Master` (worker
//!   state machine, shutdown), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by `WorkerRuntime` / `Master`,
//!   which fans out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
