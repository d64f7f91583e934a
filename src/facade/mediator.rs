//! # View mediators: react to notifications they declared interest in.
//!
//! Registering a mediator spawns one listener task bound to the mediator's
//! lifetime in the registry:
//!
//! ```text
//! Notifier ──► listener task ──(name ∈ interests)──► mediator.on_notification()
//!                  ▲
//!     cancelled by remove_mediator() / Facade drop
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::notifier::{Notification, Notifier};

/// Named view updater registered in a [`Facade`](crate::Facade).
#[async_trait]
pub trait Mediator: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Notification names this mediator wants to receive.
    fn interests(&self) -> Vec<String>;

    async fn on_notification(&self, note: &Notification);
}

/// A registered mediator plus its listener task.
pub(crate) struct Listening {
    pub(crate) mediator: Arc<dyn Mediator>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Listening {
    /// Subscribes `mediator` to `notifier`. Must be called inside a tokio runtime.
    pub(crate) fn spawn(
        mediator: Arc<dyn Mediator>,
        notifier: &Notifier,
        cancel: CancellationToken,
    ) -> Self {
        let mut rx = notifier.subscribe();
        let interests: HashSet<String> = mediator.interests().into_iter().collect();
        let target = Arc::clone(&mediator);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    res = rx.recv() => match res {
                        Ok(note) if interests.contains(note.name.as_ref()) => {
                            target.on_notification(&note).await;
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(target: "unitvisor", mediator = target.name(), skipped, "mediator lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Self {
            mediator,
            cancel,
            task,
        }
    }

    /// Stops the listener task.
    pub(crate) fn stop(self) {
        self.cancel.cancel();
        drop(self.task);
    }
}
