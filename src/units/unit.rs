//! # Unit abstraction.
//!
//! A [`Unit`] is anything the runtime drives through the six-phase lifecycle:
//! flat *services* that provide capabilities to other units, and hierarchical
//! *components* that own child components and expose a mountable router.
//!
//! Identity and declared dependencies live in a [`UnitDescriptor`]; behavior
//! lives in the trait methods. Every lifecycle method has a no-op default, so
//! a unit only implements the phases it cares about.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use unitvisor::{Dependencies, Unit, UnitDescriptor, UnitError};
//!
//! struct Sessions {
//!     desc: UnitDescriptor,
//! }
//!
//! #[async_trait]
//! impl Unit for Sessions {
//!     fn descriptor(&self) -> &UnitDescriptor {
//!         &self.desc
//!     }
//!
//!     async fn start(&mut self, deps: Dependencies) -> Result<(), UnitError> {
//!         if !deps.contains("database") {
//!             return Err(UnitError::Fatal { error: "database handle missing".into() });
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let unit = Sessions { desc: UnitDescriptor::service("sessions").depends_on("database") };
//! assert_eq!(unit.name(), "sessions");
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Environment;
use crate::error::UnitError;
use crate::units::deps::{Dependencies, Interface};
use crate::units::router::BoxRouter;

/// Whether a unit is a flat service or a node of the component tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Service,
    Component,
}

impl UnitKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            UnitKind::Service => "service",
            UnitKind::Component => "component",
        }
    }
}

/// Static identity of a unit: name, kind and declared dependencies.
///
/// Dependencies keep declaration order and are de-duplicated on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    name: Arc<str>,
    kind: UnitKind,
    dependencies: Vec<Arc<str>>,
}

impl UnitDescriptor {
    /// Creates a descriptor with no dependencies.
    pub fn new(name: impl Into<Arc<str>>, kind: UnitKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dependencies: Vec::new(),
        }
    }

    /// Shorthand for `UnitDescriptor::new(name, UnitKind::Service)`.
    pub fn service(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, UnitKind::Service)
    }

    /// Shorthand for `UnitDescriptor::new(name, UnitKind::Component)`.
    pub fn component(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, UnitKind::Component)
    }

    /// Declares a dependency on another unit by name.
    pub fn depends_on(mut self, dependency: impl Into<Arc<str>>) -> Self {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Returns the unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shared unit name (cheap to clone into events).
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Returns the unit kind.
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Returns declared dependency names in declaration order.
    pub fn dependencies(&self) -> &[Arc<str>] {
        &self.dependencies
    }
}

/// Context handed to [`Unit::load`].
///
/// Units use [`LoadContext::environment`] to pick their active configuration
/// out of an [`EnvConfig`](crate::EnvConfig).
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Active deployment environment.
    pub environment: Environment,
    /// Parent component, for child components.
    pub parent: Option<Arc<str>>,
    /// Mount segment under the parent, for child components.
    pub mount: Option<Arc<str>>,
}

/// # Lifecycle contract implemented by every service and component.
///
/// The loader calls these methods in dependency order, one phase at a time,
/// each wrapped in the configured phase timeout. Returning an error from a
/// forward phase aborts bring-up of the whole worker; errors from backward
/// phases are logged and teardown carries on.
///
/// Cancellation is by drop: a timed-out call's future is dropped, so
/// implementations must not leave half-applied state across an `.await`.
#[async_trait]
pub trait Unit: Send + Sync + 'static {
    /// Returns the unit identity and declared dependencies.
    fn descriptor(&self) -> &UnitDescriptor;

    /// Convenience: returns the unit name.
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Reads configuration for the active environment.
    async fn load(&mut self, _ctx: &LoadContext) -> Result<(), UnitError> {
        Ok(())
    }

    /// Prepares internal resources (pools, facades, caches).
    async fn initialize(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Starts serving. `deps` holds the interfaces of every declared
    /// dependency that exposes one; all of them are already started.
    async fn start(&mut self, _deps: Dependencies) -> Result<(), UnitError> {
        Ok(())
    }

    /// Stops serving. Any [`Dependencies`] kept from `start` should be dropped here.
    async fn stop(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Releases what `initialize` acquired.
    async fn uninitialize(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Forgets what `load` read.
    async fn unload(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    /// Public handle injected into dependents. Queried right after `start`.
    fn interface(&self) -> Option<Interface> {
        None
    }

    /// Component routes, queried right after `start`. Services return `None`.
    fn router(&self) -> Option<BoxRouter> {
        None
    }
}

/// Owned unit, as stored by the tree.
pub type BoxUnit = Box<dyn Unit>;
