//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to every subscriber
//! without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! Bus ──► listener ──► emit(event)
//!                         ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!                         │    (bounded)         └──────► panic → SubscriberPanicked
//!                         └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! `AssertUnwindSafe` is used around `on_event`; a subscriber that panics while
//! holding a lock of its own may leave that state poisoned.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(drain(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers (non-blocking).
    ///
    /// Overflow events are not re-published when they overflow themselves.
    pub fn emit(&self, event: Event) {
        let event = Arc::new(event);
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Forwards every bus event into this set until `stop` is cancelled.
    ///
    /// On stop, events already queued on the bus are still forwarded. Lagging
    /// only skips the lost events; the listener keeps running.
    pub fn listen(self: Arc<Self>, bus: &Bus, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = rx.recv() => match res {
                        Ok(ev) => self.emit(ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => self.emit(ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        })
    }

    /// Stops `listener`, then lets every subscriber drain its queue.
    ///
    /// `listener` must come from [`SubscriberSet::listen`] on this set with `stop`.
    pub async fn close(self: Arc<Self>, listener: JoinHandle<()>, stop: CancellationToken) {
        stop.cancel();
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(self) {
            set.shutdown().await;
        }
    }

    /// Gracefully shuts down all subscriber workers after they drain their queues.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

/// Worker loop of one subscriber.
async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*panic_err)));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Collect(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_is_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let collect = Arc::new(Collect(Mutex::new(Vec::new())));
        let set = SubscriberSet::new(vec![collect.clone(), Arc::new(Explode)], bus.clone());

        set.emit(Event::new(EventKind::PhaseStarting));
        set.emit(Event::new(EventKind::PhaseCompleted));

        let panicked = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(panicked.kind, EventKind::SubscriberPanicked);
        assert_eq!(panicked.unit.as_deref(), Some("explode"));
        assert_eq!(panicked.reason.as_deref(), Some("boom"));

        set.shutdown().await;
        assert_eq!(
            *collect.0.lock().unwrap(),
            [EventKind::PhaseStarting, EventKind::PhaseCompleted]
        );
    }

    #[tokio::test]
    async fn close_forwards_events_already_on_the_bus() {
        let bus = Bus::new(16);
        let collect = Arc::new(Collect(Mutex::new(Vec::new())));
        let set = Arc::new(SubscriberSet::new(vec![collect.clone()], bus.clone()));
        let stop = CancellationToken::new();
        let listener = set.clone().listen(&bus, stop.clone());

        bus.publish(Event::new(EventKind::ShutdownRequested));
        bus.publish(Event::new(EventKind::AllStoppedWithin));
        set.close(listener, stop).await;

        assert_eq!(
            *collect.0.lock().unwrap(),
            [EventKind::ShutdownRequested, EventKind::AllStoppedWithin]
        );
    }
}
