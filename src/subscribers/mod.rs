//! # Event subscribers.
//!
//! ```text
//! Loader / WorkerRuntime / Master ── publish(Event) ──► Bus ──► SubscriberSet
//!                                                                   │
//!                                                      ┌────────────┼────────────┐
//!                                                      ▼            ▼            ▼
//!                                                  LogWriter     Metrics       Custom
//! ```
//!
//! - [`Subscribe`] - trait for custom handlers
//! - [`SubscriberSet`] - per-subscriber queues, panic isolation
//! - [`LogWriter`] - built-in structured logger on top of `tracing`

mod log;
mod subscriber;
mod subscriber_set;

pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
