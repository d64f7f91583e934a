//! # Run a single phase call on a single unit.
//!
//! Executes one lifecycle method of a [`Unit`] with an optional deadline and
//! publishes the outcome to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:  PhaseStarting → unit.<phase>() → Ok  → PhaseCompleted
//! Failure:  PhaseStarting → unit.<phase>() → Err → PhaseFailed
//! Timeout:  PhaseStarting → deadline hit → drop call → TimeoutHit → PhaseFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `PhaseCompleted` or `PhaseFailed`.
//! - `TimeoutHit` is published **in addition to** `PhaseFailed` on timeout.
//! - The timed-out future is dropped, which is the only cancellation a unit sees.

use std::time::Duration;

use tokio::time;

use crate::{
    error::UnitError,
    events::{Bus, Event, EventKind},
    units::{Dependencies, LoadContext, Phase, Unit},
};

/// Arguments of one lifecycle call.
pub(crate) enum Call<'a> {
    Load(&'a LoadContext),
    Initialize,
    Start(Dependencies),
    Stop,
    Uninitialize,
    Unload,
}

impl Call<'_> {
    pub(crate) fn phase(&self) -> Phase {
        match self {
            Call::Load(_) => Phase::Load,
            Call::Initialize => Phase::Initialize,
            Call::Start(_) => Phase::Start,
            Call::Stop => Phase::Stop,
            Call::Uninitialize => Phase::Uninitialize,
            Call::Unload => Phase::Unload,
        }
    }

    /// Argument-free call for `phase`; `Load` and `Start` need [`Call::Load`] / [`Call::Start`].
    pub(crate) fn plain(phase: Phase) -> Option<Call<'static>> {
        match phase {
            Phase::Initialize => Some(Call::Initialize),
            Phase::Stop => Some(Call::Stop),
            Phase::Uninitialize => Some(Call::Uninitialize),
            Phase::Unload => Some(Call::Unload),
            Phase::Load | Phase::Start => None,
        }
    }
}

/// Executes `call` on `unit`, publishing lifecycle events to `bus`.
pub(crate) async fn invoke(
    unit: &mut dyn Unit,
    call: Call<'_>,
    deadline: Option<Duration>,
    bus: &Bus,
) -> Result<(), UnitError> {
    let name = unit.descriptor().name_arc().clone();
    let phase = call.phase();
    bus.publish(
        Event::new(EventKind::PhaseStarting)
            .with_unit(name.clone())
            .with_phase(phase),
    );

    let fut = async {
        match call {
            Call::Load(ctx) => unit.load(ctx).await,
            Call::Initialize => unit.initialize().await,
            Call::Start(deps) => unit.start(deps).await,
            Call::Stop => unit.stop().await,
            Call::Uninitialize => unit.uninitialize().await,
            Call::Unload => unit.unload().await,
        }
    };

    let res = match deadline.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(r) => r,
            Err(_elapsed) => {
                bus.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_unit(name.clone())
                        .with_phase(phase)
                        .with_timeout(dur),
                );
                Err(UnitError::Timeout { timeout: dur })
            }
        },
        None => fut.await,
    };

    match &res {
        Ok(()) => bus.publish(
            Event::new(EventKind::PhaseCompleted)
                .with_unit(name)
                .with_phase(phase),
        ),
        Err(e) => bus.publish(
            Event::new(EventKind::PhaseFailed)
                .with_unit(name)
                .with_phase(phase)
                .with_reason(e.to_string()),
        ),
    }
    res
}
