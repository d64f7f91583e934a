//! Error types used by the unitvisor runtime and by units.
//!
//! - [`UnitError`] - returned by a unit's lifecycle methods.
//! - [`ResolveError`] - the dependency graph cannot be ordered.
//! - [`PhaseError`] - a named unit failed a named phase.
//! - [`FacadeError`] - command / proxy / mediator registry failures (local, recoverable).
//! - [`ConfigError`] - environment selection and config parsing.
//! - [`ProtocolError`] - malformed master↔worker control messages.
//! - [`RuntimeError`] - everything that ends a worker or the master.
//!
//! Every enum offers `as_label()`, a short stable snake_case label for logs/metrics.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::units::{Phase, UnitKind, UnitState};

/// # Errors produced by unit lifecycle calls.
///
/// A timeout is reported through the same type so that exceeding a phase
/// deadline is handled exactly like an explicit failure of that phase.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UnitError {
    /// The phase exceeded its deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable failure.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Ordinary failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The call was abandoned because the worker is shutting down.
    #[error("context cancelled")]
    Canceled,

    /// The loader refused to run the phase from the unit's current state.
    #[error("phase not allowed from state {state}")]
    InvalidState {
        /// State the unit was in.
        state: UnitState,
    },
}

impl UnitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unitvisor::UnitError;
    /// use std::time::Duration;
    ///
    /// let err = UnitError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "unit_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitError::Timeout { .. } => "unit_timeout",
            UnitError::Fatal { .. } => "unit_fatal",
            UnitError::Fail { .. } => "unit_failed",
            UnitError::Canceled => "unit_canceled",
            UnitError::InvalidState { .. } => "unit_invalid_state",
        }
    }

    /// Shorthand for [`UnitError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        UnitError::Fail {
            error: error.into(),
        }
    }
}

/// # Errors produced while ordering the unit graph.
///
/// All of them are fatal to the startup of the affected tree.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The graph contains a cycle; `path` starts and ends with the same unit.
    #[error("dependency cycle: {}", .path.join(" -> "))]
    Cycle {
        /// Units along the cycle, first unit repeated at the end.
        path: Vec<Arc<str>>,
    },

    /// A unit depends on a name that is not part of the run.
    #[error("unit {unit:?} depends on unknown unit {missing:?}")]
    MissingDependency {
        /// The unit declaring the dependency.
        unit: Arc<str>,
        /// The name that could not be found.
        missing: Arc<str>,
    },

    /// A unit lists itself as a dependency.
    #[error("unit {unit:?} depends on itself")]
    SelfDependency {
        /// The offending unit.
        unit: Arc<str>,
    },

    /// Two units share one name.
    #[error("unit name {name:?} registered twice")]
    DuplicateUnit {
        /// The duplicated name.
        name: Arc<str>,
    },

    /// A unit was registered in a slot meant for the other kind.
    #[error("unit {unit:?} must be a {}", .expected.as_label())]
    KindMismatch {
        /// The offending unit.
        unit: Arc<str>,
        /// Kind required by the slot.
        expected: UnitKind,
    },

    /// A child was mounted under a component handle from another builder.
    #[error("unit {unit:?} was mounted under a parent from another tree")]
    UnknownParent {
        /// The child being mounted.
        unit: Arc<str>,
    },
}

impl ResolveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolveError::Cycle { .. } => "resolve_cycle",
            ResolveError::MissingDependency { .. } => "resolve_missing_dependency",
            ResolveError::SelfDependency { .. } => "resolve_self_dependency",
            ResolveError::DuplicateUnit { .. } => "resolve_duplicate_unit",
            ResolveError::KindMismatch { .. } => "resolve_kind_mismatch",
            ResolveError::UnknownParent { .. } => "resolve_unknown_parent",
        }
    }
}

/// A named unit failed a named phase.
#[derive(Error, Debug)]
#[error("unit {unit:?} failed to {phase}: {source}")]
pub struct PhaseError {
    /// Unit that failed.
    pub unit: Arc<str>,
    /// Phase that failed.
    pub phase: Phase,
    /// What the unit (or the deadline) reported.
    #[source]
    pub source: UnitError,
}

impl PhaseError {
    /// Returns `true` if the phase hit its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self.source, UnitError::Timeout { .. })
    }
}

/// # Errors produced by facade registries.
///
/// Local to one component; the caller decides whether they matter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacadeError {
    /// A name is already registered; the existing entry was kept.
    #[error("{registry} {name:?} already registered")]
    DuplicateName {
        /// Registry kind: "command", "proxy" or "mediator".
        registry: &'static str,
        /// The duplicated name.
        name: Arc<str>,
    },

    /// No entry under that name.
    #[error("{registry} {name:?} not found")]
    NotFound {
        /// Registry kind: "command", "proxy" or "mediator".
        registry: &'static str,
        /// The unknown name.
        name: Arc<str>,
    },

    /// A command (or one of its sub-commands) failed.
    #[error("command {command:?} failed: {reason}")]
    CommandFailed {
        /// Name of the command that failed.
        command: Arc<str>,
        /// Failure message.
        reason: String,
    },

    /// A data proxy failed to fetch or update.
    #[error("proxy {proxy:?} failed: {reason}")]
    ProxyFailed {
        /// Name of the proxy that failed.
        proxy: Arc<str>,
        /// Failure message.
        reason: String,
    },
}

impl FacadeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FacadeError::DuplicateName { .. } => "facade_duplicate_name",
            FacadeError::NotFound { .. } => "facade_not_found",
            FacadeError::CommandFailed { .. } => "facade_command_failed",
            FacadeError::ProxyFailed { .. } => "facade_proxy_failed",
        }
    }
}

/// # Errors produced while selecting environment configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment name is not one of development/test/stage/production.
    #[error("unknown environment {name:?}")]
    UnknownEnvironment {
        /// The rejected name.
        name: String,
    },

    /// The config mapping has no entry for the active environment.
    #[error("no configuration for environment {environment}")]
    MissingEnvironment {
        /// Label of the active environment.
        environment: &'static str,
    },

    /// The config document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::UnknownEnvironment { .. } => "config_unknown_environment",
            ConfigError::MissingEnvironment { .. } => "config_missing_environment",
            ConfigError::Parse(_) => "config_parse",
        }
    }
}

/// # Errors on the master↔worker control link.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Reading or writing the link failed.
    #[error("control link i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A line was not a valid control message.
    #[error("malformed control message {line:?}: {source}")]
    Malformed {
        /// The offending line.
        line: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProtocolError::Io(_) => "protocol_io",
            ProtocolError::Malformed { .. } => "protocol_malformed",
        }
    }
}

/// # Errors that end a worker or the master.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The unit graph could not be ordered.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A forward phase failed.
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Environment configuration was unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The control link broke.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A worker process could not be spawned.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Worker slot id.
        worker: u32,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Shutdown grace period was exceeded; the listed workers were killed.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Workers that did not exit in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unitvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Resolve(e) => e.as_label(),
            RuntimeError::Phase(_) => "runtime_phase_failed",
            RuntimeError::Config(e) => e.as_label(),
            RuntimeError::Protocol(e) => e.as_label(),
            RuntimeError::Spawn { .. } => "runtime_spawn_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
