//! # Worker runtime: one process, one unit tree.
//!
//! ```text
//! send Online ─► bring_up ─► send Listening ─► wait for stop ─► tear_down ─► send Exit{0}
//!                   │
//!                   └─ failure ─► tear_down (best effort) ─► send Exit{1} ─► Err
//! ```
//!
//! A worker stops on the first of: a `Terminate` directive, the control link
//! closing (the master is gone) or an OS termination signal.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::RuntimeConfig;
use crate::core::{Loader, UnitTree, shutdown_signal};
use crate::error::{ProtocolError, RuntimeError};
use crate::events::Bus;
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
use crate::worker::protocol::{Directive, Signal, read_message, write_message};
use crate::worker::spawn::worker_id;

/// Builder for [`WorkerRuntime`].
pub struct WorkerBuilder {
    cfg: RuntimeConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    os_signals: bool,
    worker: u32,
}

impl WorkerBuilder {
    pub fn new(cfg: RuntimeConfig) -> Self {
        Self {
            cfg,
            subscribers: vec![Arc::new(LogWriter::new())],
            os_signals: true,
            worker: worker_id().unwrap_or_default(),
        }
    }

    /// Replaces the event subscribers (a [`LogWriter`] by default).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Whether OS termination signals stop the worker (default `true`).
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    /// Overrides the slot id read from the environment.
    pub fn with_worker_id(mut self, worker: u32) -> Self {
        self.worker = worker;
        self
    }

    pub fn build(self, tree: UnitTree) -> WorkerRuntime {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        WorkerRuntime {
            worker: self.worker,
            loader: Loader::new(bus.clone(), &self.cfg),
            bus,
            tree,
            subscribers: self.subscribers,
            os_signals: self.os_signals,
        }
    }
}

/// Drives one [`UnitTree`] for the lifetime of a worker process.
pub struct WorkerRuntime {
    worker: u32,
    bus: Bus,
    loader: Loader,
    tree: UnitTree,
    subscribers: Vec<Arc<dyn Subscribe>>,
    os_signals: bool,
}

impl WorkerRuntime {
    pub fn builder(cfg: RuntimeConfig) -> WorkerBuilder {
        WorkerBuilder::new(cfg)
    }

    pub fn tree(&self) -> &UnitTree {
        &self.tree
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the worker on the process's stdin/stdout.
    pub async fn run(&mut self) -> Result<(), RuntimeError> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Runs the worker on an arbitrary control link.
    pub async fn run_with<R, W>(&mut self, input: R, output: W) -> Result<(), RuntimeError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let stop = CancellationToken::new();
        let subscribers = std::mem::take(&mut self.subscribers);
        let subs = Arc::new(SubscriberSet::new(subscribers, self.bus.clone()));
        let listener = Arc::clone(&subs).listen(&self.bus, stop.clone());

        let res = self.serve(BufReader::new(input), output).await;
        subs.close(listener, stop).await;
        res
    }

    async fn serve<R, W>(&mut self, mut input: BufReader<R>, mut output: W) -> Result<(), RuntimeError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let worker = self.worker;
        write_message(&mut output, &Signal::Online { pid: std::process::id() }).await?;
        info!(target: "unitvisor", worker, units = ?self.tree.order(), "bringing up units");

        if let Err(err) = self.loader.bring_up(&mut self.tree).await {
            error!(
                target: "unitvisor",
                worker,
                unit = %err.unit,
                phase = err.phase.as_label(),
                error = %err.source,
                "bring-up failed"
            );
            return Err(self.abort(&mut output, err.into()).await);
        }
        if let Err(err) = write_message(&mut output, &Signal::Listening).await {
            error!(target: "unitvisor", worker, error = %err, "cannot report listening");
            return Err(self.abort(&mut output, err.into()).await);
        }

        let reason = self.wait_for_stop(&mut input).await;
        info!(target: "unitvisor", worker, reason, "stopping");
        self.tear_down().await;

        if let Err(e) = write_message(&mut output, &Signal::Exit { code: 0 }).await {
            warn!(target: "unitvisor", worker, error = %e, "cannot report exit");
        }
        Ok(())
    }

    async fn wait_for_stop<R>(&self, input: &mut BufReader<R>) -> &'static str
    where
        R: AsyncRead + Unpin + Send,
    {
        let os_signals = self.os_signals;
        let signal = async {
            if !os_signals {
                return std::future::pending().await;
            }
            if let Err(e) = shutdown_signal().await {
                warn!(target: "unitvisor", error = %e, "cannot listen for OS signals");
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => return "os signal",
                msg = read_message::<_, Directive>(input) => match msg {
                    Ok(Some(Directive::Terminate)) => return "terminate",
                    Ok(None) => return "control link closed",
                    Err(e @ ProtocolError::Malformed { .. }) => {
                        warn!(target: "unitvisor", worker = self.worker, error = %e, "ignoring control line");
                    }
                    Err(e) => {
                        warn!(target: "unitvisor", worker = self.worker, error = %e, "control link failed");
                        return "control link failed";
                    }
                },
            }
        }
    }

    /// Best-effort teardown and `Exit{1}` after a failed start; hands `err` back.
    async fn abort<W>(&mut self, output: &mut W, err: RuntimeError) -> RuntimeError
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.tear_down().await;
        if let Err(e) = write_message(output, &Signal::Exit { code: 1 }).await {
            warn!(target: "unitvisor", worker = self.worker, error = %e, "cannot report exit");
        }
        err
    }

    async fn tear_down(&mut self) {
        for failure in self.loader.tear_down(&mut self.tree).await {
            warn!(
                target: "unitvisor",
                worker = self.worker,
                unit = %failure.unit,
                phase = failure.phase.as_label(),
                error = %failure.source,
                "teardown step failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::error::UnitError;
    use crate::units::{Unit, UnitDescriptor, UnitState};
    use async_trait::async_trait;
    use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
    use tokio::sync::Notify;

    struct Plain {
        desc: UnitDescriptor,
        fail_start: bool,
    }

    #[async_trait]
    impl Unit for Plain {
        fn descriptor(&self) -> &UnitDescriptor {
            &self.desc
        }

        async fn start(&mut self, _deps: crate::units::Dependencies) -> Result<(), UnitError> {
            if self.fail_start {
                return Err(UnitError::Fatal {
                    error: "port in use".into(),
                });
            }
            Ok(())
        }
    }

    /// Root component whose `start` waits for the gate to open.
    struct Gated {
        desc: UnitDescriptor,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Unit for Gated {
        fn descriptor(&self) -> &UnitDescriptor {
            &self.desc
        }

        async fn start(&mut self, _deps: crate::units::Dependencies) -> Result<(), UnitError> {
            self.gate.notified().await;
            Ok(())
        }
    }

    fn tree(fail_start: bool) -> UnitTree {
        let mut b = UnitTree::builder(Box::new(Plain {
            desc: UnitDescriptor::component("app").depends_on("database"),
            fail_start,
        }));
        b.service(Box::new(Plain {
            desc: UnitDescriptor::service("database"),
            fail_start: false,
        }));
        b.build().unwrap()
    }

    type MasterSide = (BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>);

    fn start(
        tree: UnitTree,
    ) -> (
        MasterSide,
        tokio::task::JoinHandle<(WorkerRuntime, Result<(), RuntimeError>)>,
    ) {
        let (master, worker) = tokio::io::duplex(1024);
        let (worker_in, worker_out) = tokio::io::split(worker);
        let mut runtime = WorkerRuntime::builder(RuntimeConfig::for_environment(Environment::Test))
            .with_subscribers(Vec::new())
            .with_os_signals(false)
            .with_worker_id(1)
            .build(tree);
        let handle = tokio::spawn(async move {
            let res = runtime.run_with(worker_in, worker_out).await;
            (runtime, res)
        });
        let (master_in, master_out) = tokio::io::split(master);
        ((BufReader::new(master_in), master_out), handle)
    }

    async fn next(reader: &mut BufReader<ReadHalf<DuplexStream>>) -> Option<Signal> {
        read_message(reader).await.unwrap()
    }

    #[tokio::test]
    async fn terminate_runs_teardown_and_reports_exit() {
        let ((mut rx, mut tx), handle) = start(tree(false));

        assert_eq!(next(&mut rx).await, Some(Signal::Online { pid: std::process::id() }));
        assert_eq!(next(&mut rx).await, Some(Signal::Listening));
        write_message(&mut tx, &Directive::Terminate).await.unwrap();
        assert_eq!(next(&mut rx).await, Some(Signal::Exit { code: 0 }));

        let (runtime, res) = handle.await.unwrap();
        res.unwrap();
        assert!(runtime.tree().all_in(UnitState::Unloaded));
    }

    #[tokio::test]
    async fn closed_link_stops_the_worker() {
        let ((mut rx, mut tx), handle) = start(tree(false));

        assert!(matches!(next(&mut rx).await, Some(Signal::Online { .. })));
        assert_eq!(next(&mut rx).await, Some(Signal::Listening));
        tx.shutdown().await.unwrap();
        assert_eq!(next(&mut rx).await, Some(Signal::Exit { code: 0 }));

        let (runtime, res) = handle.await.unwrap();
        res.unwrap();
        assert!(runtime.tree().all_in(UnitState::Unloaded));
    }

    #[tokio::test]
    async fn failed_bring_up_exits_with_code_one() {
        let ((mut rx, _tx), handle) = start(tree(true));

        assert!(matches!(next(&mut rx).await, Some(Signal::Online { .. })));
        assert_eq!(next(&mut rx).await, Some(Signal::Exit { code: 1 }));

        let (runtime, res) = handle.await.unwrap();
        match res {
            Err(RuntimeError::Phase(err)) => assert_eq!(err.unit.as_ref(), "app"),
            other => panic!("expected phase error, got {other:?}"),
        }
        assert!(runtime.tree().all_in(UnitState::Unloaded));
    }

    #[tokio::test]
    async fn link_lost_during_start_still_tears_down() {
        let gate = Arc::new(Notify::new());
        let tree = UnitTree::builder(Box::new(Gated {
            desc: UnitDescriptor::component("app"),
            gate: Arc::clone(&gate),
        }))
        .build()
        .unwrap();
        let ((mut rx, tx), handle) = start(tree);

        assert!(matches!(next(&mut rx).await, Some(Signal::Online { .. })));
        drop(rx);
        drop(tx);
        gate.notify_one();

        let (runtime, res) = handle.await.unwrap();
        assert!(matches!(res, Err(RuntimeError::Protocol(_))), "{res:?}");
        assert!(runtime.tree().all_in(UnitState::Unloaded));
    }
}
