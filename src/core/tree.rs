//! # Unit tree: flat services plus one component hierarchy.
//!
//! Services are siblings injected by name. Components form a tree rooted at
//! exactly one root component; every child is mounted under a path segment of
//! its parent. The tree owns all units; a child never outlives its parent.
//!
//! ```text
//! services:  database   sessions   auth
//!
//! root ("")
//!  ├── api ("api")
//!  │    └── users ("users")
//!  └── admin ("admin")
//! ```
//!
//! ## Rules
//! - Names are unique across services and components.
//! - A child has an implicit ordering edge on its parent: the parent finishes
//!   each forward phase before the child starts it, and the reverse on teardown.
//! - Only declared dependencies are injected at start; the implicit parent
//!   edge only orders.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::resolver::resolve_indices;
use crate::error::ResolveError;
use crate::units::{
    BoxRouter, BoxUnit, Dependencies, Interface, Router, UnitDescriptor, UnitKind, UnitState,
};

static BUILDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle to a component registered in a [`UnitTreeBuilder`].
///
/// Only valid with the builder that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentId {
    builder: u64,
    index: usize,
}

/// One unit plus everything the loader tracks about it.
pub(crate) struct Slot {
    pub(crate) unit: BoxUnit,
    pub(crate) state: UnitState,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) mount: Option<Arc<str>>,
    /// Dependencies handed to `start`; present only while `Started`.
    pub(crate) bound: Option<Dependencies>,
    /// Interface exposed to dependents; present only while `Started`.
    pub(crate) interface: Option<Interface>,
    /// Assembled router; for children it moves into the parent once mounted.
    pub(crate) router: Option<BoxRouter>,
}

impl Slot {
    fn new(unit: BoxUnit, parent: Option<usize>, mount: Option<Arc<str>>) -> Self {
        Self {
            unit,
            state: UnitState::Unloaded,
            parent,
            children: Vec::new(),
            mount,
            bound: None,
            interface: None,
            router: None,
        }
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        self.unit.descriptor().name_arc()
    }

    /// Drops everything bound at start.
    pub(crate) fn release(&mut self) {
        self.bound = None;
        self.interface = None;
        self.router = None;
    }
}

/// Collects services and components, then validates and orders them.
///
/// ## Example
/// ```rust,ignore
/// let mut builder = UnitTree::builder(Box::new(App::new()));
/// builder.service(Box::new(Database::new()));
/// let api = builder.child(builder.root(), "api", Box::new(Api::new()));
/// builder.child(api, "users", Box::new(Users::new()));
/// let tree = builder.build()?;
/// ```
pub struct UnitTreeBuilder {
    id: u64,
    slots: Vec<Slot>,
    misplaced: Option<ResolveError>,
}

impl UnitTreeBuilder {
    fn new(root: BoxUnit) -> Self {
        let mut builder = Self {
            id: BUILDER_SEQ.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            misplaced: None,
        };
        builder.push(Slot::new(root, None, None), UnitKind::Component);
        builder
    }

    /// Returns the root component.
    pub fn root(&self) -> ComponentId {
        self.component(0)
    }

    fn component(&self, index: usize) -> ComponentId {
        ComponentId {
            builder: self.id,
            index,
        }
    }

    /// Registers a flat service.
    pub fn service(&mut self, unit: BoxUnit) -> &mut Self {
        self.push(Slot::new(unit, None, None), UnitKind::Service);
        self
    }

    /// Registers a child component mounted under `segment` of `parent`.
    ///
    /// A `parent` issued by another builder makes [`build`](Self::build) fail
    /// with [`ResolveError::UnknownParent`].
    pub fn child(
        &mut self,
        parent: ComponentId,
        segment: impl Into<Arc<str>>,
        unit: BoxUnit,
    ) -> ComponentId {
        let known = parent.builder == self.id && parent.index < self.slots.len();
        if !known && self.misplaced.is_none() {
            self.misplaced = Some(ResolveError::UnknownParent {
                unit: unit.descriptor().name_arc().clone(),
            });
        }
        let parent = known.then_some(parent.index);
        let id = self.push(
            Slot::new(unit, parent, Some(segment.into())),
            UnitKind::Component,
        );
        if let Some(p) = parent {
            self.slots[p].children.push(id);
        }
        self.component(id)
    }

    /// Validates kinds, resolves the order and freezes the tree.
    pub fn build(self) -> Result<UnitTree, ResolveError> {
        if let Some(err) = self.misplaced {
            return Err(err);
        }

        let descriptors: Vec<UnitDescriptor> = self
            .slots
            .iter()
            .map(|slot| {
                let desc = slot.unit.descriptor().clone();
                match slot.parent {
                    Some(p) => desc.depends_on(self.slots[p].name().clone()),
                    None => desc,
                }
            })
            .collect();
        let order = resolve_indices(&descriptors)?;

        let index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name().clone(), i))
            .collect();

        Ok(UnitTree {
            slots: self.slots,
            order,
            index,
        })
    }

    fn push(&mut self, slot: Slot, expected: UnitKind) -> usize {
        if slot.unit.descriptor().kind() != expected && self.misplaced.is_none() {
            self.misplaced = Some(ResolveError::KindMismatch {
                unit: slot.name().clone(),
                expected,
            });
        }
        self.slots.push(slot);
        self.slots.len() - 1
    }
}

/// Validated, ordered set of units owned by one worker.
pub struct UnitTree {
    pub(crate) slots: Vec<Slot>,
    /// Positions into `slots`, dependencies first.
    pub(crate) order: Vec<usize>,
    index: HashMap<Arc<str>, usize>,
}

impl UnitTree {
    /// Starts a tree with the given root component.
    pub fn builder(root: BoxUnit) -> UnitTreeBuilder {
        UnitTreeBuilder::new(root)
    }

    /// Number of units (services and components).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Unit names in resolved order.
    pub fn order(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.slots[i].name().as_ref()).collect()
    }

    /// Current state of `name`.
    pub fn state(&self, name: &str) -> Option<UnitState> {
        self.index.get(name).map(|&i| self.slots[i].state)
    }

    /// Returns `true` if every unit is in `state`.
    pub fn all_in(&self, state: UnitState) -> bool {
        self.slots.iter().all(|s| s.state == state)
    }

    /// Names of the direct children of component `name`, in registration order.
    pub fn children(&self, name: &str) -> Vec<&str> {
        self.index.get(name).map_or_else(Vec::new, |&i| {
            self.slots[i]
                .children
                .iter()
                .map(|&c| self.slots[c].name().as_ref())
                .collect()
        })
    }

    /// The root component's router with every child mounted; `None` unless started.
    pub fn router(&self) -> Option<&dyn Router> {
        self.slots.first()?.router.as_deref()
    }

    /// Dependencies bound to `name` at start; `None` unless it is `Started`.
    pub fn bound(&self, name: &str) -> Option<&Dependencies> {
        self.index.get(name).and_then(|&i| self.slots[i].bound.as_ref())
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;
    use async_trait::async_trait;

    struct Plain(UnitDescriptor);

    #[async_trait]
    impl Unit for Plain {
        fn descriptor(&self) -> &UnitDescriptor {
            &self.0
        }
    }

    fn component(name: &str) -> BoxUnit {
        Box::new(Plain(UnitDescriptor::component(name)))
    }

    fn service(name: &str) -> BoxUnit {
        Box::new(Plain(UnitDescriptor::service(name)))
    }

    #[test]
    fn parents_precede_children() {
        let mut builder = UnitTree::builder(component("app"));
        let api = builder.child(builder.root(), "api", component("api"));
        builder.child(api, "users", component("users"));
        builder.service(service("database"));
        let tree = builder.build().unwrap();

        assert_eq!(tree.order(), ["app", "api", "users", "database"]);
        assert_eq!(tree.children("app"), ["api"]);
        assert_eq!(tree.state("users"), Some(UnitState::Unloaded));
    }

    #[test]
    fn service_in_component_slot_is_rejected() {
        let mut builder = UnitTree::builder(component("app"));
        builder.child(builder.root(), "db", service("database"));
        assert!(matches!(
            builder.build(),
            Err(ResolveError::KindMismatch { expected: UnitKind::Component, .. })
        ));
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let mut builder = UnitTree::builder(component("app"));
        builder.service(service("app"));
        assert!(matches!(builder.build(), Err(ResolveError::DuplicateUnit { .. })));
    }

    #[test]
    fn parent_from_another_builder_is_rejected() {
        let mut other = UnitTree::builder(component("admin"));
        let foreign = other.child(other.root(), "panel", component("panel"));

        let mut builder = UnitTree::builder(component("app"));
        builder.child(foreign, "users", component("users"));
        match builder.build() {
            Err(ResolveError::UnknownParent { unit }) => assert_eq!(unit.as_ref(), "users"),
            other => panic!("expected unknown parent, got {:?}", other.err()),
        }
    }
}
