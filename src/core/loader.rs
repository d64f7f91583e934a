//! # Loader: drives a [`UnitTree`] through the lifecycle phases.
//!
//! One phase runs over every unit before the next phase begins. Forward
//! phases walk the resolved order, backward phases walk it in reverse.
//!
//! ```text
//! bring_up:   Load ─► Initialize ─► Start ─► mount routers
//! tear_down:  Stop ─► Uninitialize ─► Unload        (reverse order)
//! ```
//!
//! ## Rules
//! - A forward failure aborts the pass and the remaining forward phases; the
//!   caller decides whether to tear down what already came up.
//! - A backward failure is recorded and the pass continues; the unit is still
//!   moved to the phase target so the next backward phase can run.
//! - A backward phase skips units that never reached the matching forward
//!   state, so tearing down a partially started tree is safe.
//! - At `Start` a unit receives only the interfaces of its declared
//!   dependencies, and only once each of them is `Started`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Environment, RuntimeConfig};
use crate::core::invoke::{Call, invoke};
use crate::core::tree::UnitTree;
use crate::error::{PhaseError, UnitError};
use crate::events::{Bus, Event, EventKind};
use crate::units::{
    BoxRouter, Dependencies, Interface, LoadContext, Phase, RouteTable, Transition, UnitState,
};

/// Runs lifecycle phases with a shared deadline and event bus.
#[derive(Clone)]
pub struct Loader {
    bus: Bus,
    environment: Environment,
    phase_timeout: Option<Duration>,
}

impl Loader {
    /// Creates a loader using the environment and phase timeout of `cfg`.
    pub fn new(bus: Bus, cfg: &RuntimeConfig) -> Self {
        Self {
            bus,
            environment: cfg.environment,
            phase_timeout: cfg.phase_deadline(),
        }
    }

    /// Event bus the loader publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs `Load`, `Initialize` and `Start`, stopping at the first failure.
    ///
    /// On success every unit is `Started` and component routers are mounted.
    pub async fn bring_up(&self, tree: &mut UnitTree) -> Result<(), PhaseError> {
        for phase in Phase::FORWARD {
            self.run_phase(tree, phase).await?;
        }
        Ok(())
    }

    /// Runs `Stop`, `Uninitialize` and `Unload`, always to completion.
    ///
    /// Returns every failure seen, in the order they happened.
    pub async fn tear_down(&self, tree: &mut UnitTree) -> Vec<PhaseError> {
        let mut failures = Vec::new();
        for phase in Phase::BACKWARD {
            failures.extend(self.backward(tree, phase).await);
        }
        failures
    }

    /// Runs a single phase over the whole tree.
    ///
    /// Forward phases return the first failure immediately. Backward phases
    /// visit every unit and return the first failure afterwards.
    pub async fn run_phase(&self, tree: &mut UnitTree, phase: Phase) -> Result<(), PhaseError> {
        if phase.is_forward() {
            self.forward(tree, phase).await?;
            if phase == Phase::Start {
                self.mount_routers(tree);
            }
            Ok(())
        } else {
            match self.backward(tree, phase).await.into_iter().next() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    async fn forward(&self, tree: &mut UnitTree, phase: Phase) -> Result<(), PhaseError> {
        for pos in tree.order.clone() {
            let name = tree.slots[pos].name().clone();
            let state = tree.slots[pos].state;
            if state.transition(phase) != Transition::Apply {
                return Err(self.refuse(name, phase, UnitError::InvalidState { state }));
            }

            let fail = |source| PhaseError {
                unit: name.clone(),
                phase,
                source,
            };
            match phase {
                Phase::Load => {
                    let ctx = LoadContext {
                        environment: self.environment,
                        parent: tree.slots[pos].parent.map(|p| tree.slots[p].name().clone()),
                        mount: tree.slots[pos].mount.clone(),
                    };
                    let slot = &mut tree.slots[pos];
                    invoke(slot.unit.as_mut(), Call::Load(&ctx), self.phase_timeout, &self.bus)
                        .await
                        .map_err(fail)?;
                }
                Phase::Start => {
                    let deps = match bind(tree, pos) {
                        Ok(deps) => deps,
                        Err(source) => return Err(self.refuse(name.clone(), phase, source)),
                    };
                    let slot = &mut tree.slots[pos];
                    invoke(
                        slot.unit.as_mut(),
                        Call::Start(deps.clone()),
                        self.phase_timeout,
                        &self.bus,
                    )
                    .await
                    .map_err(fail)?;
                    slot.bound = Some(deps);
                    slot.interface = slot.unit.interface();
                    slot.router = slot.unit.router();
                }
                _ => {
                    if let Some(call) = Call::plain(phase) {
                        let slot = &mut tree.slots[pos];
                        invoke(slot.unit.as_mut(), call, self.phase_timeout, &self.bus)
                            .await
                            .map_err(fail)?;
                    }
                }
            }
            tree.slots[pos].state = phase.target();
        }
        Ok(())
    }

    async fn backward(&self, tree: &mut UnitTree, phase: Phase) -> Vec<PhaseError> {
        let mut failures = Vec::new();
        for pos in tree.order.clone().into_iter().rev() {
            let slot = &mut tree.slots[pos];
            let name = slot.name().clone();
            match slot.state.transition(phase) {
                Transition::Skip => {
                    self.bus.publish(
                        Event::new(EventKind::PhaseSkipped)
                            .with_unit(name)
                            .with_phase(phase)
                            .with_reason(slot.state.as_label()),
                    );
                    continue;
                }
                Transition::Invalid => {
                    let source = UnitError::InvalidState { state: slot.state };
                    failures.push(self.refuse(name, phase, source));
                    continue;
                }
                Transition::Apply => {}
            }

            let Some(call) = Call::plain(phase) else {
                continue;
            };
            let res = invoke(slot.unit.as_mut(), call, self.phase_timeout, &self.bus).await;
            if phase == Phase::Stop {
                slot.release();
            }
            slot.state = phase.target();
            if let Err(source) = res {
                failures.push(PhaseError {
                    unit: name,
                    phase,
                    source,
                });
            }
        }
        failures
    }

    /// Reports a phase the loader refused to call, the same way a unit failure is reported.
    fn refuse(&self, unit: Arc<str>, phase: Phase, source: UnitError) -> PhaseError {
        self.bus.publish(
            Event::new(EventKind::PhaseFailed)
                .with_unit(unit.clone())
                .with_phase(phase)
                .with_reason(source.to_string()),
        );
        PhaseError {
            unit,
            phase,
            source,
        }
    }

    /// Mounts every child router into its parent's, deepest components first.
    ///
    /// A parent without its own router gets an empty [`RouteTable`] so that
    /// its children stay reachable.
    fn mount_routers(&self, tree: &mut UnitTree) {
        for pos in tree.order.clone().into_iter().rev() {
            let (Some(parent), Some(segment)) =
                (tree.slots[pos].parent, tree.slots[pos].mount.clone())
            else {
                continue;
            };
            let Some(child) = tree.slots[pos].router.take() else {
                continue;
            };
            let target = tree.slots[parent]
                .router
                .get_or_insert_with(|| Box::new(RouteTable::new()) as BoxRouter);
            target.mount(&segment, child);
            self.bus.publish(
                Event::new(EventKind::RouterMounted)
                    .with_unit(tree.slots[pos].name().clone())
                    .with_reason(segment),
            );
        }
    }
}

/// Collects the interfaces of the declared dependencies of `pos`.
///
/// Fails if any of them is not `Started`.
fn bind(tree: &UnitTree, pos: usize) -> Result<Dependencies, UnitError> {
    let mut map: BTreeMap<Arc<str>, Interface> = BTreeMap::new();
    for dep in tree.slots[pos].unit.descriptor().dependencies() {
        let Some(at) = tree.position(dep) else {
            return Err(UnitError::Fatal {
                error: format!("dependency {dep:?} is not registered"),
            });
        };
        let slot = &tree.slots[at];
        if slot.state != UnitState::Started {
            return Err(UnitError::Fatal {
                error: format!("dependency {dep:?} is not started ({})", slot.state),
            });
        }
        if let Some(iface) = &slot.interface {
            map.insert(dep.clone(), iface.clone());
        }
    }
    Ok(Dependencies::new(map))
}
