//! # Dependency resolver.
//!
//! Orders a set of [`UnitDescriptor`]s so that every unit comes after all of
//! its declared dependencies (Kahn's algorithm).
//!
//! ## Rules
//! - Ties between ready units are broken by declaration order, so the same
//!   input always yields the same order (stable startup logs).
//! - Validation happens before ordering, in declaration order: duplicate
//!   names, then self dependencies, then missing dependencies.
//! - A cycle is reported with its full path, first unit repeated at the end:
//!   `a -> b -> c -> a` reads "a depends on b, which depends on c, ...".
//!
//! ## Example
//! ```rust
//! use unitvisor::{UnitDescriptor, resolve};
//!
//! let units = [
//!     UnitDescriptor::component("app").depends_on("sessions"),
//!     UnitDescriptor::service("sessions").depends_on("database"),
//!     UnitDescriptor::service("database"),
//! ];
//! let order = resolve(&units).unwrap();
//! assert_eq!(order.iter().map(|n| n.as_ref()).collect::<Vec<_>>(), ["database", "sessions", "app"]);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::ResolveError;
use crate::units::UnitDescriptor;

/// Returns unit names in an order where dependencies precede dependents.
pub fn resolve(units: &[UnitDescriptor]) -> Result<Vec<Arc<str>>, ResolveError> {
    let order = resolve_indices(units)?;
    Ok(order
        .into_iter()
        .map(|i| units[i].name_arc().clone())
        .collect())
}

/// Same as [`resolve`] but returns positions into `units`.
pub(crate) fn resolve_indices(units: &[UnitDescriptor]) -> Result<Vec<usize>, ResolveError> {
    let graph = Graph::build(units)?;
    graph.sort(units)
}

/// Adjacency lists in both directions, by position.
struct Graph {
    /// `dependencies[i]` are the units `i` waits for.
    dependencies: Vec<Vec<usize>>,
    /// `dependents[j]` are the units waiting for `j`.
    dependents: Vec<Vec<usize>>,
}

impl Graph {
    fn build(units: &[UnitDescriptor]) -> Result<Self, ResolveError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if index.insert(unit.name(), i).is_some() {
                return Err(ResolveError::DuplicateUnit {
                    name: unit.name_arc().clone(),
                });
            }
        }

        let mut dependencies = vec![Vec::new(); units.len()];
        let mut dependents = vec![Vec::new(); units.len()];
        for (i, unit) in units.iter().enumerate() {
            for dep in unit.dependencies() {
                if dep.as_ref() == unit.name() {
                    return Err(ResolveError::SelfDependency {
                        unit: unit.name_arc().clone(),
                    });
                }
                let Some(&j) = index.get(dep.as_ref()) else {
                    return Err(ResolveError::MissingDependency {
                        unit: unit.name_arc().clone(),
                        missing: dep.clone(),
                    });
                };
                dependencies[i].push(j);
                dependents[j].push(i);
            }
        }
        Ok(Self {
            dependencies,
            dependents,
        })
    }

    fn sort(&self, units: &[UnitDescriptor]) -> Result<Vec<usize>, ResolveError> {
        let mut pending: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..units.len()).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(units.len());

        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &dependent in &self.dependents[i] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == units.len() {
            return Ok(order);
        }
        let path = self
            .cycle(&pending)
            .into_iter()
            .map(|i| units[i].name_arc().clone())
            .collect();
        Err(ResolveError::Cycle { path })
    }

    /// Walks unresolved edges from the first stuck unit until a unit repeats.
    ///
    /// Every stuck unit waits on at least one other stuck unit, so the walk
    /// always closes a loop.
    fn cycle(&self, pending: &[usize]) -> Vec<usize> {
        let stuck = |i: usize| pending[i] > 0;
        let mut seen: HashMap<usize, usize> = HashMap::new();
        let mut walk = Vec::new();
        let mut current = (0..pending.len()).find(|&i| stuck(i));

        while let Some(i) = current {
            if let Some(&pos) = seen.get(&i) {
                let mut path = walk.split_off(pos);
                path.push(i);
                return path;
            }
            seen.insert(i, walk.len());
            walk.push(i);
            current = self.dependencies[i].iter().copied().find(|&d| stuck(d));
        }
        walk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(order: Vec<Arc<str>>) -> Vec<String> {
        order.iter().map(|n| n.to_string()).collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn dependencies_come_first() {
        let units = [
            UnitDescriptor::component("admin").depends_on("auth").depends_on("orm"),
            UnitDescriptor::service("auth").depends_on("orm").depends_on("sessions"),
            UnitDescriptor::service("sessions"),
            UnitDescriptor::service("orm").depends_on("config"),
            UnitDescriptor::service("config"),
        ];
        let order = names(resolve(&units).unwrap());

        for unit in &units {
            for dep in unit.dependencies() {
                assert!(
                    position(&order, dep) < position(&order, unit.name()),
                    "{dep} must precede {} in {order:?}",
                    unit.name()
                );
            }
        }
    }

    #[test]
    fn ties_follow_declaration_order() {
        let units = [
            UnitDescriptor::service("c"),
            UnitDescriptor::service("a"),
            UnitDescriptor::service("b").depends_on("c"),
            UnitDescriptor::service("d"),
        ];
        assert_eq!(names(resolve(&units).unwrap()), ["c", "a", "b", "d"]);
        assert_eq!(names(resolve(&units).unwrap()), ["c", "a", "b", "d"]);
    }

    #[test]
    fn cycle_reports_full_path() {
        let units = [
            UnitDescriptor::service("entry").depends_on("a"),
            UnitDescriptor::service("a").depends_on("b"),
            UnitDescriptor::service("b").depends_on("c"),
            UnitDescriptor::service("c").depends_on("a"),
            UnitDescriptor::service("free"),
        ];
        let err = resolve(&units).unwrap_err();
        let ResolveError::Cycle { path } = &err else {
            panic!("expected cycle, got {err:?}");
        };
        let path: Vec<&str> = path.iter().map(|p| p.as_ref()).collect();
        assert_eq!(path, ["a", "b", "c", "a"]);
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> c -> a");
    }

    #[test]
    fn missing_dependency_names_both_sides() {
        let units = [
            UnitDescriptor::service("orm"),
            UnitDescriptor::component("machines").depends_on("orm").depends_on("telemetry"),
        ];
        assert_eq!(
            resolve(&units).unwrap_err(),
            ResolveError::MissingDependency {
                unit: "machines".into(),
                missing: "telemetry".into(),
            }
        );
    }

    #[test]
    fn self_and_duplicate_are_rejected() {
        let units = [UnitDescriptor::service("loop").depends_on("loop")];
        assert!(matches!(
            resolve(&units),
            Err(ResolveError::SelfDependency { .. })
        ));

        let units = [UnitDescriptor::service("orm"), UnitDescriptor::service("orm")];
        assert!(matches!(
            resolve(&units),
            Err(ResolveError::DuplicateUnit { .. })
        ));
    }

    #[test]
    fn empty_set_resolves_to_empty_order() {
        assert!(resolve(&[]).unwrap().is_empty());
    }
}
