//! # Master: forks workers, restarts the ones that die, shuts them all down.
//!
//! The [`Master`] owns the event bus, a [`SubscriberSet`] and one slot actor
//! per worker. Each slot actor forks its worker, follows its control signals
//! and forks a replacement when the worker dies unexpectedly.
//!
//! ## Per-worker state machine
//! ```text
//! Forking ──Online──► Online ──Listening──► Listening
//!    │                                          │
//!    │ bootstrap deadline                       ├─ Terminate sent / Exit{0} ──► Disconnecting ──► Exited
//!    ▼                                          │
//!  killed ──► re-fork (policy)                  └─ exits on its own ──► Died ──► re-fork (policy)
//! ```
//!
//! ## Shutdown path
//! ```text
//! OS signal / Master::shutdown()
//!     └─► publish ShutdownRequested
//!     └─► terminate token cancelled ──► every slot sends Terminate
//!     └─► wait up to cfg.grace:
//!            ├─ all slots finished  → publish AllStoppedWithin
//!            └─ grace exceeded      → publish GraceExceeded, kill the rest,
//!                                     RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - A replacement is forked only for a worker that died on its own, with
//!   [`RestartPolicy::OnUnexpectedExit`](crate::RestartPolicy::OnUnexpectedExit)
//!   and no shutdown in progress.
//! - Replacements are forked immediately; there is no backoff.
//! - A worker that never reports Online within `bootstrap_timeout` is killed;
//!   the timeout count is carried to the slot's next worker and reset by Online.
//! - An exit is classified only after the worker's pending signals are read,
//!   so an `Exit{0}` that arrives just behind the process status still counts.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::RuntimeConfig;
use crate::core::shutdown_signal;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
use crate::worker::protocol::{Directive, Signal};
use crate::worker::roster::{Roster, WorkerRecord, WorkerState};
use crate::worker::spawn::{Spawn, Spawned};

/// How long signals still queued behind a finished process are read.
const SIGNAL_DRAIN: Duration = Duration::from_millis(500);

/// Builder for [`Master`].
pub struct MasterBuilder {
    cfg: RuntimeConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    os_signals: bool,
}

impl MasterBuilder {
    pub fn new(cfg: RuntimeConfig) -> Self {
        Self {
            cfg,
            subscribers: vec![Arc::new(LogWriter::new())],
            os_signals: true,
        }
    }

    /// Replaces the event subscribers (a [`LogWriter`] by default).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Whether OS termination signals start a shutdown (default `true`).
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    /// Builds the master. Must be called inside a tokio runtime.
    pub fn build(self, spawner: impl Spawn) -> Master {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        Master {
            cfg: self.cfg,
            bus,
            subs,
            spawner: Arc::new(spawner),
            roster: Roster::new(),
            terminate: CancellationToken::new(),
            os_signals: self.os_signals,
        }
    }
}

/// Worker supervisor.
pub struct Master {
    cfg: RuntimeConfig,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    spawner: Arc<dyn Spawn>,
    roster: Roster,
    terminate: CancellationToken,
    os_signals: bool,
}

impl Master {
    pub fn builder(cfg: RuntimeConfig) -> MasterBuilder {
        MasterBuilder::new(cfg)
    }

    /// Event bus shared by every slot actor.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Live worker records; stays valid after [`Master::run`] consumed the master.
    pub fn roster(&self) -> Roster {
        self.roster.clone()
    }

    /// Starts a graceful shutdown, same as an OS termination signal.
    pub fn shutdown(&self) {
        self.terminate.cancel();
    }

    /// Token that starts a graceful shutdown when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.terminate.clone()
    }

    /// Forks the workers and supervises them until shutdown completes or
    /// every slot has ended on its own.
    pub async fn run(self) -> Result<(), RuntimeError> {
        let stop = CancellationToken::new();
        let listener = Arc::clone(&self.subs).listen(&self.bus, stop.clone());

        let kill = CancellationToken::new();
        let mut set = JoinSet::new();
        for worker in 1..=self.cfg.workers() {
            let slot = Slot {
                worker: worker as u32,
                cfg: self.cfg.clone(),
                bus: self.bus.clone(),
                spawner: Arc::clone(&self.spawner),
                roster: self.roster.clone(),
            };
            set.spawn(slot.run(self.terminate.clone(), kill.clone()));
        }

        let res = self.drive_shutdown(&mut set, &kill).await;
        self.subs.close(listener, stop).await;
        res
    }

    async fn drive_shutdown(
        &self,
        set: &mut JoinSet<Result<(), RuntimeError>>,
        kill: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let os_signals = self.os_signals;
        tokio::select! {
            _ = async {
                if !os_signals {
                    return std::future::pending().await;
                }
                if let Err(e) = shutdown_signal().await {
                    warn!(target: "unitvisor", error = %e, "cannot listen for OS signals");
                    std::future::pending::<()>().await;
                }
            } => {}
            _ = self.terminate.cancelled() => {}
            res = join_all(set) => return res,
        }

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.terminate.cancel();
        self.wait_all_with_grace(set, kill).await
    }

    /// Waits for every slot within `cfg.grace`, killing whatever is left after.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<Result<(), RuntimeError>>,
        kill: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        match time::timeout(grace, join_all(set)).await {
            Ok(res) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                res
            }
            Err(_elapsed) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.roster.snapshot().await;
                kill.cancel();
                let _ = join_all(set).await;
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

/// Kills the process and reaps it.
async fn force(spawned: &mut Spawned) -> Option<i32> {
    if let Err(e) = spawned.process.kill().await {
        warn!(target: "unitvisor", pid = spawned.pid, error = %e, "kill failed");
    }
    spawned.process.wait().await.ok().flatten()
}

/// Joins every slot; returns the first error after all are done.
async fn join_all(set: &mut JoinSet<Result<(), RuntimeError>>) -> Result<(), RuntimeError> {
    let mut first = Ok(());
    while let Some(joined) = set.join_next().await {
        if let Ok(Err(e)) = joined {
            if first.is_ok() {
                first = Err(e);
            }
        }
    }
    first
}

/// How one worker process ended.
enum Outcome {
    /// Exited after Terminate or after announcing a clean exit.
    Exited(Option<i32>),
    /// Exited without being asked.
    Died(Option<i32>),
    /// Killed for missing the bootstrap deadline.
    Stuck,
    /// Killed after the grace period.
    Killed(Option<i32>),
}

/// Supervises one worker slot across replacements.
struct Slot {
    worker: u32,
    cfg: RuntimeConfig,
    bus: Bus,
    spawner: Arc<dyn Spawn>,
    roster: Roster,
}

impl Slot {
    async fn run(
        self,
        terminate: CancellationToken,
        kill: CancellationToken,
    ) -> Result<(), RuntimeError> {
        let mut consecutive: u32 = 0;
        let mut reason = "initial";

        loop {
            if terminate.is_cancelled() {
                return Ok(());
            }
            let mut spawned = self
                .spawner
                .spawn(self.worker)
                .map_err(|source| RuntimeError::Spawn {
                    worker: self.worker,
                    source,
                })?;
            let pid = spawned.pid;
            self.roster
                .insert(WorkerRecord::forked(self.worker, pid, consecutive))
                .await;
            self.publish(EventKind::WorkerForked, pid, |e| e.with_reason(reason));

            let outcome = self
                .supervise(&mut spawned, &terminate, &kill, &mut consecutive)
                .await;
            self.roster.remove(self.worker).await;

            match outcome {
                Outcome::Exited(code) | Outcome::Killed(code) => {
                    self.publish(EventKind::WorkerExited, pid, |e| e.with_exit_code(code));
                    return Ok(());
                }
                Outcome::Died(code) => {
                    self.publish(EventKind::WorkerDied, pid, |e| e.with_exit_code(code));
                    reason = "unexpected exit";
                }
                Outcome::Stuck => {
                    consecutive += 1;
                    let timeout = self.cfg.bootstrap_timeout;
                    self.publish(EventKind::WorkerBootstrapTimeout, pid, |e| {
                        e.with_timeout(timeout).with_attempt(consecutive)
                    });
                    let limit = self.cfg.max_consecutive_timeouts;
                    if limit > 0 && consecutive >= limit {
                        self.publish(EventKind::WorkerAbandoned, pid, |e| {
                            e.with_reason("too many bootstrap timeouts")
                        });
                        return Ok(());
                    }
                    reason = "bootstrap timeout";
                }
            }

            if !self.cfg.restart.restarts() || terminate.is_cancelled() {
                return Ok(());
            }
        }
    }

    /// Follows one worker process until it is gone.
    async fn supervise(
        &self,
        spawned: &mut Spawned,
        terminate: &CancellationToken,
        kill: &CancellationToken,
        consecutive: &mut u32,
    ) -> Outcome {
        let pid = spawned.pid;
        let deadline = Instant::now() + self.cfg.bootstrap_timeout;
        let mut online = false;
        let mut asked = false;
        let mut announced: Option<i32> = None;
        let mut link_open = true;

        loop {
            tokio::select! {
                biased;

                _ = kill.cancelled() => return Outcome::Killed(force(spawned).await),

                _ = terminate.cancelled(), if !asked => {
                    asked = true;
                    self.roster.disconnecting(self.worker).await;
                    if announced.is_none() {
                        self.publish(EventKind::WorkerDisconnecting, pid, |e| e.with_reason("terminate"));
                    }
                    // A closed link means the worker is already on its way out.
                    let _ = spawned.directives.send(Directive::Terminate).await;
                }

                _ = time::sleep_until(deadline), if !online && !asked => {
                    force(spawned).await;
                    return Outcome::Stuck;
                }

                signal = spawned.signals.recv(), if link_open => match signal {
                    Some(Signal::Online { pid: reported }) => {
                        online = true;
                        *consecutive = 0;
                        self.roster.health(self.worker, WorkerState::Online, Instant::now()).await;
                        self.publish(EventKind::WorkerOnline, Some(reported), |e| e);
                    }
                    Some(Signal::Listening) => {
                        online = true;
                        self.roster.health(self.worker, WorkerState::Listening, Instant::now()).await;
                        self.publish(EventKind::WorkerListening, pid, |e| e);
                    }
                    Some(Signal::Exit { code }) => {
                        self.roster.disconnecting(self.worker).await;
                        if !asked && announced.is_none() {
                            self.publish(EventKind::WorkerDisconnecting, pid, |e| {
                                e.with_exit_code(Some(code)).with_reason("exit announced")
                            });
                        }
                        announced = Some(code);
                    }
                    None => link_open = false,
                },

                res = spawned.process.wait() => {
                    let code = res.unwrap_or_else(|e| {
                        warn!(target: "unitvisor", worker = self.worker, error = %e, "wait for worker failed");
                        None
                    });
                    if link_open {
                        let drained = time::timeout(SIGNAL_DRAIN, async {
                            while let Some(signal) = spawned.signals.recv().await {
                                if let Signal::Exit { code } = signal {
                                    announced = Some(code);
                                }
                            }
                        })
                        .await;
                        if drained.is_err() {
                            warn!(target: "unitvisor", worker = self.worker, "control link still open after exit");
                        }
                    }
                    return if asked || announced == Some(0) {
                        Outcome::Exited(code)
                    } else {
                        Outcome::Died(code)
                    };
                }
            }
        }
    }

    fn publish(&self, kind: EventKind, pid: Option<u32>, with: impl FnOnce(Event) -> Event) {
        self.bus
            .publish(with(Event::new(kind).with_worker(self.worker, pid)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::policies::RestartPolicy;
    use crate::worker::spawn::WorkerProcess;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::sync::{broadcast, mpsc, oneshot};

    /// How a fake worker behaves.
    #[derive(Clone, Copy)]
    enum Script {
        /// Online, Listening, then exits cleanly on Terminate.
        Healthy,
        /// Online, Listening, then exits with code 1 on its own.
        Crash,
        /// Never reports anything.
        Hang,
        /// Online, Listening, then ignores Terminate.
        Deaf,
        /// Online, Listening, then exits with code 0 and announces it afterwards.
        LateExit,
    }

    struct FakeProcess {
        exit: oneshot::Receiver<i32>,
        status: Option<Option<i32>>,
    }

    #[async_trait]
    impl WorkerProcess for FakeProcess {
        async fn kill(&mut self) -> io::Result<()> {
            self.status.get_or_insert(None);
            Ok(())
        }

        async fn wait(&mut self) -> io::Result<Option<i32>> {
            if let Some(status) = self.status {
                return Ok(status);
            }
            let status = (&mut self.exit).await.ok();
            self.status = Some(status);
            Ok(status)
        }
    }

    struct FakeSpawner {
        scripts: Mutex<VecDeque<Script>>,
        fallback: Script,
        spawned: Arc<AtomicU32>,
    }

    impl FakeSpawner {
        fn new(scripts: &[Script], fallback: Script) -> (Self, Arc<AtomicU32>) {
            let spawned = Arc::new(AtomicU32::new(0));
            let spawner = Self {
                scripts: Mutex::new(scripts.iter().copied().collect()),
                fallback,
                spawned: spawned.clone(),
            };
            (spawner, spawned)
        }
    }

    impl Spawn for FakeSpawner {
        fn spawn(&self, _worker: u32) -> io::Result<Spawned> {
            let n = self.spawned.fetch_add(1, Ordering::SeqCst) + 1;
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);
            let pid = 1000 + n;
            let (signal_tx, signals) = mpsc::channel(8);
            let (directives, mut directive_rx) = mpsc::channel(4);
            let (exit_tx, exit) = oneshot::channel();

            tokio::spawn(async move {
                if matches!(script, Script::Hang) {
                    std::future::pending::<()>().await;
                }
                let _ = signal_tx.send(Signal::Online { pid }).await;
                let _ = signal_tx.send(Signal::Listening).await;
                let code = match script {
                    Script::Crash => 1,
                    Script::LateExit => {
                        let _ = exit_tx.send(0);
                        tokio::task::yield_now().await;
                        let _ = signal_tx.send(Signal::Exit { code: 0 }).await;
                        return;
                    }
                    Script::Deaf => std::future::pending().await,
                    _ => {
                        let _ = directive_rx.recv().await;
                        let _ = signal_tx.send(Signal::Exit { code: 0 }).await;
                        0
                    }
                };
                let _ = exit_tx.send(code);
            });

            Ok(Spawned {
                pid: Some(pid),
                signals,
                directives,
                process: Box::new(FakeProcess { exit, status: None }),
            })
        }
    }

    fn config(parallelism: usize, load_factor: f64) -> RuntimeConfig {
        let mut cfg = RuntimeConfig::for_environment(Environment::Test);
        cfg.parallelism = parallelism;
        cfg.load_factor = load_factor;
        cfg.grace = Duration::from_secs(1);
        cfg
    }

    fn master(cfg: RuntimeConfig, spawner: FakeSpawner) -> Master {
        Master::builder(cfg)
            .with_subscribers(Vec::new())
            .with_os_signals(false)
            .build(spawner)
    }

    /// Collects events until `count` events of `kind` were seen.
    async fn wait_for(
        rx: &mut broadcast::Receiver<Event>,
        seen: &mut Vec<EventKind>,
        kind: EventKind,
        count: usize,
    ) {
        while seen.iter().filter(|k| **k == kind).count() < count {
            let ev = rx.recv().await.unwrap();
            seen.push(ev.kind);
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Event>, seen: &mut Vec<EventKind>) {
        while let Ok(ev) = rx.try_recv() {
            seen.push(ev.kind);
        }
    }

    fn count(seen: &[EventKind], kind: EventKind) -> usize {
        seen.iter().filter(|k| **k == kind).count()
    }

    #[tokio::test(start_paused = true)]
    async fn forks_ceil_of_cores_times_load_factor() {
        let (spawner, spawned) = FakeSpawner::new(&[], Script::Healthy);
        let master = master(config(4, 0.5), spawner);
        let mut rx = master.bus().subscribe();
        let shutdown = master.shutdown_token();
        let run = tokio::spawn(master.run());

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, EventKind::WorkerListening, 2).await;
        shutdown.cancel();
        run.await.unwrap().unwrap();
        drain(&mut rx, &mut seen);

        assert_eq!(spawned.load(Ordering::SeqCst), 2);
        assert_eq!(count(&seen, EventKind::WorkerExited), 2);
        assert_eq!(count(&seen, EventKind::WorkerDied), 0);
        assert_eq!(count(&seen, EventKind::AllStoppedWithin), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_exit_is_replaced_exactly_once() {
        let (spawner, spawned) = FakeSpawner::new(&[Script::Crash], Script::Healthy);
        let master = master(config(1, 1.0), spawner);
        let mut rx = master.bus().subscribe();
        let shutdown = master.shutdown_token();
        let run = tokio::spawn(master.run());

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, EventKind::WorkerListening, 2).await;
        shutdown.cancel();
        run.await.unwrap().unwrap();
        drain(&mut rx, &mut seen);

        assert_eq!(spawned.load(Ordering::SeqCst), 2);
        assert_eq!(count(&seen, EventKind::WorkerDied), 1);
        assert_eq!(count(&seen, EventKind::WorkerExited), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_bootstrap_is_killed_and_replaced_once() {
        let (spawner, spawned) = FakeSpawner::new(&[Script::Hang], Script::Healthy);
        let master = master(config(1, 1.0), spawner);
        let mut rx = master.bus().subscribe();
        let shutdown = master.shutdown_token();
        let run = tokio::spawn(master.run());

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, EventKind::WorkerListening, 1).await;
        shutdown.cancel();
        run.await.unwrap().unwrap();
        drain(&mut rx, &mut seen);

        assert_eq!(spawned.load(Ordering::SeqCst), 2);
        assert_eq!(count(&seen, EventKind::WorkerBootstrapTimeout), 1);
        assert_eq!(count(&seen, EventKind::WorkerForked), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slot_is_abandoned_after_repeated_bootstrap_timeouts() {
        let (spawner, spawned) = FakeSpawner::new(&[], Script::Hang);
        let mut cfg = config(1, 1.0);
        cfg.max_consecutive_timeouts = 2;
        let master = master(cfg, spawner);
        let mut rx = master.bus().subscribe();

        master.run().await.unwrap();
        let mut seen = Vec::new();
        drain(&mut rx, &mut seen);

        assert_eq!(spawned.load(Ordering::SeqCst), 2);
        assert_eq!(count(&seen, EventKind::WorkerBootstrapTimeout), 2);
        assert_eq!(count(&seen, EventKind::WorkerAbandoned), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn never_policy_does_not_replace() {
        let (spawner, spawned) = FakeSpawner::new(&[Script::Crash], Script::Healthy);
        let mut cfg = config(1, 1.0);
        cfg.restart = RestartPolicy::Never;

        master(cfg, spawner).run().await.unwrap();
        assert_eq!(spawned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn workers_ignoring_terminate_are_killed_after_grace() {
        let (spawner, _spawned) = FakeSpawner::new(&[], Script::Deaf);
        let master = master(config(1, 1.0), spawner);
        let mut rx = master.bus().subscribe();
        let shutdown = master.shutdown_token();
        let run = tokio::spawn(master.run());

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, EventKind::WorkerListening, 1).await;
        shutdown.cancel();

        match run.await.unwrap() {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, ["worker-1"]),
            other => panic!("expected grace exceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exit_announced_after_process_status_is_not_a_death() {
        let (spawner, spawned) = FakeSpawner::new(&[], Script::LateExit);
        let master = master(config(1, 1.0), spawner);
        let mut rx = master.bus().subscribe();

        master.run().await.unwrap();
        let mut seen = Vec::new();
        drain(&mut rx, &mut seen);

        assert_eq!(spawned.load(Ordering::SeqCst), 1);
        assert_eq!(count(&seen, EventKind::WorkerDied), 0);
        assert_eq!(count(&seen, EventKind::WorkerExited), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn crashed_worker_is_replaced_while_the_other_keeps_serving() {
        let (spawner, spawned) =
            FakeSpawner::new(&[Script::Crash, Script::Healthy], Script::Healthy);
        let master = master(config(4, 0.5), spawner);
        let roster = master.roster();
        let mut rx = master.bus().subscribe();
        let shutdown = master.shutdown_token();
        let run = tokio::spawn(master.run());

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, EventKind::WorkerListening, 3).await;
        assert_eq!(roster.snapshot().await.len(), 2);

        shutdown.cancel();
        run.await.unwrap().unwrap();
        drain(&mut rx, &mut seen);

        assert_eq!(spawned.load(Ordering::SeqCst), 3);
        assert_eq!(count(&seen, EventKind::WorkerDied), 1);
        assert_eq!(count(&seen, EventKind::WorkerExited), 2);
        assert!(roster.snapshot().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn roster_follows_worker_state_transitions() {
        let (spawner, _spawned) = FakeSpawner::new(&[Script::Hang], Script::Deaf);
        let master = master(config(1, 1.0), spawner);
        let roster = master.roster();
        let mut rx = master.bus().subscribe();
        let shutdown = master.shutdown_token();
        let run = tokio::spawn(master.run());

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, EventKind::WorkerForked, 1).await;
        let rec = roster.get(1).await.unwrap();
        assert_eq!(rec.state, WorkerState::Forking);
        assert_eq!(rec.last_health, None);

        wait_for(&mut rx, &mut seen, EventKind::WorkerListening, 1).await;
        let rec = roster.get(1).await.unwrap();
        assert_eq!(rec.state, WorkerState::Listening);
        assert_eq!(rec.last_health.map(|h| h.state), Some(WorkerState::Listening));
        assert_eq!(rec.consecutive_timeouts, 0);

        shutdown.cancel();
        wait_for(&mut rx, &mut seen, EventKind::WorkerDisconnecting, 1).await;
        assert_eq!(
            roster.get(1).await.unwrap().state,
            WorkerState::Disconnecting
        );

        assert!(matches!(
            run.await.unwrap(),
            Err(RuntimeError::GraceExceeded { .. })
        ));
    }
}
