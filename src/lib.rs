//! # unitvisor
//!
//! **Unitvisor** runs an application as a set of dependency-ordered units
//! inside a pool of supervised worker processes.
//!
//! - Services and components declare their dependencies by name.
//! - The resolver orders them; the loader drives them through six lifecycle
//!   phases and injects started dependencies at start.
//! - A master process forks one worker per share of the CPU, replaces
//!   workers that die, and shuts them all down within a grace period.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                ┌───────────────────────── Master ─────────────────────────┐
//!                │  Bus ─► SubscriberSet ─► LogWriter / custom subscribers  │
//!                │  Slot 1 ... Slot N   (fork, bootstrap deadline, re-fork) │
//!                └───────┬───────────────────────────────────────┬──────────┘
//!          JSON lines    │ Terminate ▲ Online / Listening / Exit │
//!                        ▼           │                           ▼
//!   ┌──────────────── WorkerRuntime ─┴───────────────┐        WorkerRuntime ...
//!   │  UnitTree                                      │
//!   │    services:   database  sessions  auth        │
//!   │    components: app ─┬─ api ── users            │
//!   │                     └─ admin                   │
//!   │  Loader: resolve ─► Load ─► Initialize ─► Start│
//!   │          Stop ─► Uninitialize ─► Unload        │
//!   └────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle of one unit
//! ```text
//! Unloaded ─load─► Loaded ─initialize─► Initialized ─start(deps)─► Started
//!                                                                     │
//! Unloaded ◄─unload─ Uninitialized ◄─uninitialize─ Stopped ◄─stop─────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Units**         | Lifecycle contract, identity, injected dependencies.      | [`Unit`], [`UnitDescriptor`], [`Dependencies`] |
//! | **Ordering**      | Dependency resolution with cycle paths.                   | [`resolve`], [`UnitTree`]                  |
//! | **Lifecycle**     | Phase passes with deadlines and events.                   | [`Loader`], [`Phase`], [`UnitState`]       |
//! | **Workers**       | Forking, restarts, graceful shutdown.                     | [`Master`], [`WorkerRuntime`], [`launch`]  |
//! | **Events**        | Structured runtime events and subscribers.                | [`Event`], [`Subscribe`], [`LogWriter`]    |
//! | **Configuration** | Runtime knobs and per-environment unit config.            | [`RuntimeConfig`], [`EnvConfig`]           |
//!
//! ## Optional features
//! - `facade` _(default)_: per-component command / proxy / mediator runtime ([`Facade`]).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use unitvisor::{
//!     Dependencies, Environment, Interface, Loader, RuntimeConfig, Unit, UnitDescriptor,
//!     UnitError, UnitState, UnitTree, Bus,
//! };
//!
//! struct Database(UnitDescriptor);
//!
//! #[async_trait]
//! impl Unit for Database {
//!     fn descriptor(&self) -> &UnitDescriptor { &self.0 }
//!     fn interface(&self) -> Option<Interface> { Some(Arc::new("postgres://db".to_string())) }
//! }
//!
//! struct App(UnitDescriptor);
//!
//! #[async_trait]
//! impl Unit for App {
//!     fn descriptor(&self) -> &UnitDescriptor { &self.0 }
//!     async fn start(&mut self, deps: Dependencies) -> Result<(), UnitError> {
//!         let url = deps.get::<String>("database").ok_or_else(|| UnitError::fail("no db"))?;
//!         assert_eq!(url.as_str(), "postgres://db");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut builder = UnitTree::builder(Box::new(App(
//!         UnitDescriptor::component("app").depends_on("database"),
//!     )));
//!     builder.service(Box::new(Database(UnitDescriptor::service("database"))));
//!     let mut tree = builder.build()?;
//!
//!     let cfg = RuntimeConfig::for_environment(Environment::Test);
//!     let loader = Loader::new(Bus::default(), &cfg);
//!     loader.bring_up(&mut tree).await?;
//!     assert!(tree.all_in(UnitState::Started));
//!
//!     assert!(loader.tear_down(&mut tree).await.is_empty());
//!     assert!(tree.all_in(UnitState::Unloaded));
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod units;

pub mod logging;
pub mod worker;

#[cfg(feature = "facade")]
pub mod facade;

// ---- Public re-exports ----

pub use config::{ENVIRONMENT_VAR, EnvConfig, Environment, RuntimeConfig};
pub use crate::core::{ComponentId, Loader, UnitTree, UnitTreeBuilder, resolve, shutdown_signal};
pub use error::{
    ConfigError, FacadeError, PhaseError, ProtocolError, ResolveError, RuntimeError, UnitError,
};
pub use events::{Bus, Event, EventKind};
pub use policies::RestartPolicy;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use units::{
    BoxRouter, BoxUnit, Dependencies, Interface, LoadContext, Phase, RouteTable, Router,
    Transition, Unit, UnitDescriptor, UnitKind, UnitState,
};
pub use worker::{
    Directive, Master, MasterBuilder, ProcessSpawner, Signal, Spawn, WorkerBuilder, WorkerRuntime,
    launch, worker_count, worker_id,
};

#[cfg(feature = "facade")]
pub use facade::{Command, Facade, Mediator, Notification, Notifier, Proxy};
