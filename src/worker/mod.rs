//! # Worker processes and their supervisor.
//!
//! ```text
//!                     ┌──────────── Master ─────────────┐
//!                     │ slot 1      slot 2  ...  slot N │   N = worker_count(cores, load_factor)
//!                     └──┬───────────┬──────────────┬───┘
//!            stdin/stdout│           │              │
//!                        ▼           ▼              ▼
//!                  WorkerRuntime WorkerRuntime  WorkerRuntime
//!                   (UnitTree)    (UnitTree)     (UnitTree)
//! ```
//!
//! - [`Master`] - forks workers, replaces dead ones, bounded graceful shutdown
//! - [`WorkerRuntime`] - brings one [`UnitTree`] up and down inside a worker
//! - [`Spawn`] / [`ProcessSpawner`] - how workers are created
//! - [`Directive`] / [`Signal`] - the JSON-lines control protocol
//! - [`launch`] - picks the role of the current process

mod master;
mod protocol;
mod roster;
mod runtime;
mod sizing;
mod spawn;

pub use master::{Master, MasterBuilder};
pub use protocol::{Directive, Signal, read_message, write_message};
pub use roster::{HealthEvent, Roster, WorkerRecord, WorkerState};
pub use runtime::{WorkerBuilder, WorkerRuntime};
pub use sizing::worker_count;
pub use spawn::{ProcessSpawner, Spawn, Spawned, WORKER_ID_VAR, WorkerProcess, worker_id};

use crate::config::RuntimeConfig;
use crate::core::UnitTree;
use crate::error::{ResolveError, RuntimeError};

/// Runs the current process as the master or as a worker.
///
/// A worker builds its tree with `build` and serves it. The master calls
/// `build` once too, so an invalid unit graph fails before anything is
/// forked, then re-executes the current binary once per worker.
pub async fn launch<F>(cfg: RuntimeConfig, build: F) -> Result<(), RuntimeError>
where
    F: FnOnce() -> Result<UnitTree, ResolveError>,
{
    let tree = build()?;
    match worker_id() {
        Some(worker) => {
            WorkerRuntime::builder(cfg)
                .with_worker_id(worker)
                .build(tree)
                .run()
                .await
        }
        None => {
            drop(tree);
            let spawner =
                ProcessSpawner::current().map_err(|source| RuntimeError::Spawn { worker: 0, source })?;
            Master::builder(cfg).build(spawner).run().await
        }
    }
}
