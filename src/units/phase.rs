//! # Lifecycle phases and per-unit state.
//!
//! Every unit walks the same six phases. The forward half brings it up, the
//! backward half tears it down again:
//!
//! ```text
//!            Load        Initialize        Start
//! Unloaded ───────► Loaded ───────► Initialized ───────► Started
//!    ▲                                                      │
//!    │  Unload             Uninitialize           Stop      │
//!    └──────── Uninitialized ◄─────────── Stopped ◄─────────┘
//! ```
//!
//! ## Rules
//! - Forward phases accept exactly one source state; anything else is an error.
//! - Backward phases also accept a partially started unit (`Initialized` for
//!   `Uninitialize`, `Loaded` for `Unload`) so teardown after a failed bring-up
//!   still reaches `Unloaded`.
//! - A backward phase that does not apply to the current state is skipped.

use std::fmt;

/// One step of the unit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Load,
    Initialize,
    Start,
    Stop,
    Uninitialize,
    Unload,
}

impl Phase {
    /// Bring-up phases in execution order.
    pub const FORWARD: [Phase; 3] = [Phase::Load, Phase::Initialize, Phase::Start];

    /// Teardown phases in execution order.
    pub const BACKWARD: [Phase; 3] = [Phase::Stop, Phase::Uninitialize, Phase::Unload];

    /// Returns `true` for `Load`, `Initialize` and `Start`.
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Phase::Load | Phase::Initialize | Phase::Start)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Initialize => "initialize",
            Phase::Start => "start",
            Phase::Stop => "stop",
            Phase::Uninitialize => "uninitialize",
            Phase::Unload => "unload",
        }
    }

    /// State a unit ends up in after this phase completes.
    pub fn target(self) -> UnitState {
        match self {
            Phase::Load => UnitState::Loaded,
            Phase::Initialize => UnitState::Initialized,
            Phase::Start => UnitState::Started,
            Phase::Stop => UnitState::Stopped,
            Phase::Uninitialize => UnitState::Uninitialized,
            Phase::Unload => UnitState::Unloaded,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Lifecycle position of one unit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitState {
    #[default]
    Unloaded,
    Loaded,
    Initialized,
    Started,
    Stopped,
    Uninitialized,
}

/// What the loader should do with a unit for a given phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Call the phase and move to `Phase::target`.
    Apply,
    /// The phase does not concern this unit (teardown of a unit that never got this far).
    Skip,
    /// The phase is not allowed from the current state.
    Invalid,
}

impl UnitState {
    /// Decides whether `phase` may run from this state.
    pub fn transition(self, phase: Phase) -> Transition {
        use UnitState::*;

        match (phase, self) {
            (Phase::Load, Unloaded)
            | (Phase::Initialize, Loaded)
            | (Phase::Start, Initialized)
            | (Phase::Stop, Started)
            | (Phase::Uninitialize, Stopped | Initialized)
            | (Phase::Unload, Uninitialized | Loaded) => Transition::Apply,

            (Phase::Stop, Unloaded | Loaded | Initialized | Stopped | Uninitialized)
            | (Phase::Uninitialize, Unloaded | Loaded | Uninitialized)
            | (Phase::Unload, Unloaded) => Transition::Skip,

            _ => Transition::Invalid,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            UnitState::Unloaded => "unloaded",
            UnitState::Loaded => "loaded",
            UnitState::Initialized => "initialized",
            UnitState::Started => "started",
            UnitState::Stopped => "stopped",
            UnitState::Uninitialized => "uninitialized",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
