//! # Component-local notification channel.
//!
//! Proxies publish, mediators listen. One [`Notifier`] per [`Facade`](crate::Facade);
//! nothing crosses component boundaries.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

/// A named data-change announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Name of the proxy whose data changed.
    pub name: Arc<str>,
    pub body: Value,
}

impl Notification {
    pub fn new(name: impl Into<Arc<str>>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Broadcast channel of [`Notification`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Creates a notifier; `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends `note` to every current listener; returns how many there were.
    pub fn notify(&self, note: Notification) -> usize {
        self.tx.send(note).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}
