//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The loader,
//! the worker runtime and the master all publish into one bus per process;
//! a single listener forwards everything to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Loader ─────────┐
//! WorkerRuntime ──┼──► Bus ──► listener ──► SubscriberSet ──► LogWriter, custom, ...
//! Master ─────────┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; without receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - A receiver that falls behind gets `RecvError::Lagged(n)` and skips `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver that observes events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(1024)
    }
}
