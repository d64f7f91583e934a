//! # Resolved dependency handles.
//!
//! [`Dependencies`] is the value the loader builds for a unit right before its
//! `start` call: one entry per declared dependency that exposes an
//! [`Interface`]. It is immutable once built; the loader drops its copy when
//! the unit leaves the `Started` state.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased public interface of a started unit.
pub type Interface = Arc<dyn Any + Send + Sync>;

/// Read-only mapping from dependency name to its started interface.
#[derive(Clone, Default)]
pub struct Dependencies {
    handles: Arc<BTreeMap<Arc<str>, Interface>>,
}

impl Dependencies {
    pub(crate) fn new(handles: BTreeMap<Arc<str>, Interface>) -> Self {
        Self {
            handles: Arc::new(handles),
        }
    }

    /// Returns the interface of `name` downcast to `T`.
    ///
    /// `None` if the dependency exposes no interface or exposes a different type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let handle = self.handles.get(name)?.clone();
        handle.downcast::<T>().ok()
    }

    /// Returns the raw type-erased handle of `name`.
    pub fn raw(&self, name: &str) -> Option<&Interface> {
        self.handles.get(name)
    }

    /// Returns `true` if `name` was injected.
    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Injected dependency names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(|k| k.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pool(u32);

    #[test]
    fn typed_lookup() {
        let mut map: BTreeMap<Arc<str>, Interface> = BTreeMap::new();
        map.insert("database".into(), Arc::new(Pool(8)));
        let deps = Dependencies::new(map);

        assert_eq!(deps.get::<Pool>("database").as_deref(), Some(&Pool(8)));
        assert!(deps.get::<String>("database").is_none());
        assert!(deps.get::<Pool>("cache").is_none());
        assert_eq!(deps.names().collect::<Vec<_>>(), ["database"]);
    }
}
