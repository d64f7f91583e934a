//! # Subscribe: plugging handlers into the event stream.
//!
//! The master and every worker own a [`SubscriberSet`](crate::SubscriberSet)
//! fed from their bus. Each registered [`Subscribe`] implementation is driven by
//! its own task reading its own bounded queue, so one handler stalling on I/O
//! never delays unit phases or other handlers.
//!
//! A full queue loses the event for that handler alone and is reported as
//! `EventKind::SubscriberOverflow`; a panic inside `on_event` is caught and
//! reported as `EventKind::SubscriberPanicked`, after which the handler keeps
//! receiving events.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use unitvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct DeadWorkers(AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for DeadWorkers {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::WorkerDied {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "dead-workers" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Handler for runtime events.
///
/// Called sequentially per handler, in publish order. Must not block the
/// executor; errors are the handler's own business.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    /// Name carried by overflow and panic events about this handler.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length for this handler; values below 1 are raised to 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
