//! # Spawning worker processes.
//!
//! The master never touches `tokio::process` directly; it goes through the
//! [`Spawn`] seam, which hands back a [`Spawned`] worker: a process handle
//! plus the two halves of its control link.
//!
//! [`ProcessSpawner`] re-executes the current binary with
//! [`WORKER_ID_VAR`] set; the binary calls [`worker_id`] on startup to know
//! which role it plays.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::ProtocolError;
use crate::worker::protocol::{Directive, Signal, read_message, write_message};

/// Environment variable carrying the worker slot id into a worker process.
pub const WORKER_ID_VAR: &str = "UNITVISOR_WORKER_ID";

/// Slot id of this process, or `None` when running as the master.
pub fn worker_id() -> Option<u32> {
    std::env::var(WORKER_ID_VAR).ok()?.trim().parse().ok()
}

/// A running worker as seen by the master.
#[async_trait]
pub trait WorkerProcess: Send + 'static {
    /// Forcibly terminates the process.
    async fn kill(&mut self) -> io::Result<()>;

    /// Waits for the process to exit; `None` when it was killed by a signal.
    ///
    /// Must be cancel safe.
    async fn wait(&mut self) -> io::Result<Option<i32>>;
}

#[async_trait]
impl WorkerProcess for Child {
    async fn kill(&mut self) -> io::Result<()> {
        Child::kill(self).await
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        Ok(Child::wait(self).await?.code())
    }
}

/// A freshly spawned worker.
pub struct Spawned {
    /// OS process id, when known.
    pub pid: Option<u32>,
    /// Signals from the worker; closes when its stdout does.
    pub signals: mpsc::Receiver<Signal>,
    /// Directives to the worker.
    pub directives: mpsc::Sender<Directive>,
    pub process: Box<dyn WorkerProcess>,
}

/// Creates worker processes for the master.
pub trait Spawn: Send + Sync + 'static {
    /// Starts the worker for slot `worker`.
    fn spawn(&self, worker: u32) -> io::Result<Spawned>;
}

/// Spawns workers by re-executing a program with [`WORKER_ID_VAR`] set.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessSpawner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// The current executable with the current arguments.
    pub fn current() -> io::Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
            args: std::env::args_os().skip(1).collect(),
        })
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Spawn for ProcessSpawner {
    fn spawn(&self, worker: u32) -> io::Result<Spawned> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(WORKER_ID_VAR, worker.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("worker stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("worker stdout not captured"))?;

        let (signal_tx, signals) = mpsc::channel(16);
        let (directives, directive_rx) = mpsc::channel(4);
        tokio::spawn(pump_signals(worker, stdout, signal_tx));
        tokio::spawn(pump_directives(stdin, directive_rx));

        Ok(Spawned {
            pid: child.id(),
            signals,
            directives,
            process: Box::new(child),
        })
    }
}

/// Forwards decoded stdout lines until EOF or the receiver goes away.
async fn pump_signals(worker: u32, stdout: ChildStdout, tx: mpsc::Sender<Signal>) {
    let mut reader = BufReader::new(stdout);
    loop {
        match read_message::<_, Signal>(&mut reader).await {
            Ok(Some(signal)) => {
                if tx.send(signal).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(ProtocolError::Io(e)) => {
                warn!(target: "unitvisor", worker, error = %e, "control link read failed");
                return;
            }
            Err(e) => warn!(target: "unitvisor", worker, error = %e, "ignoring control line"),
        }
    }
}

async fn pump_directives(mut stdin: ChildStdin, mut rx: mpsc::Receiver<Directive>) {
    while let Some(directive) = rx.recv().await {
        if write_message(&mut stdin, &directive).await.is_err() {
            return;
        }
    }
}
