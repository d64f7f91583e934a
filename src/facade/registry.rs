//! # Keyed store used by every facade registry.
//!
//! A flat name → instance map. Insertion never overwrites: a duplicate name
//! is rejected and the existing entry stays in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::FacadeError;

/// Name-keyed store of live instances.
pub struct Registry<T> {
    kind: &'static str,
    entries: BTreeMap<Arc<str>, T>,
}

impl<T> Registry<T> {
    /// Creates an empty registry; `kind` labels its errors ("command", "proxy", ...).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Adds `value` under `name`, or fails with [`FacadeError::DuplicateName`].
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: T) -> Result<(), FacadeError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(FacadeError::DuplicateName {
                registry: self.kind,
                name,
            });
        }
        self.entries.insert(name, value);
        Ok(())
    }

    /// Removes and returns the entry under `name`.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        self.entries.remove(name)
    }

    /// Like [`Registry::remove`], but an unknown name is [`FacadeError::NotFound`].
    pub fn take(&mut self, name: &str) -> Result<T, FacadeError> {
        self.remove(name).ok_or_else(|| self.not_found(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    /// Like [`Registry::get`], but an unknown name is [`FacadeError::NotFound`].
    pub fn lookup(&self, name: &str) -> Result<&T, FacadeError> {
        self.get(name).ok_or_else(|| self.not_found(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::mem::take(&mut self.entries).into_values()
    }

    fn not_found(&self, name: &str) -> FacadeError {
        FacadeError::NotFound {
            registry: self.kind,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_keeps_the_existing_entry() {
        let mut reg = Registry::new("proxy");
        reg.insert("users", 1).unwrap();

        let err = reg.insert("users", 2).unwrap_err();
        assert_eq!(
            err,
            FacadeError::DuplicateName {
                registry: "proxy",
                name: "users".into(),
            }
        );
        assert_eq!(reg.get("users"), Some(&1));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn take_reports_unknown_names() {
        let mut reg: Registry<u8> = Registry::new("command");
        assert!(matches!(reg.take("nope"), Err(FacadeError::NotFound { .. })));
        assert!(reg.remove("nope").is_none());
    }
}
