//! Variable registries.
//!
//! Each component owns a registry mapping fully-scoped variable names to
//! opaque backend handles. When a variable is created, its entry is merged
//! upward into every ancestor's registry through the explicit
//! [`VariableRegistry::merge_into`] operation — propagation is a testable
//! step, not a constructor side effect.

use std::collections::BTreeMap;

use graphwire_core::VarHandle;

/// Mapping from fully-scoped variable name to opaque variable handle.
#[derive(Debug, Default, Clone)]
pub struct VariableRegistry {
    entries: BTreeMap<String, VarHandle>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single entry. Returns `false` if the key already exists
    /// (the entry is left untouched in that case).
    pub fn insert(&mut self, key: impl Into<String>, handle: VarHandle) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, handle);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<VarHandle> {
        self.entries.get(key).copied()
    }

    /// Merge every entry of this registry into `parent`.
    ///
    /// Returns the first colliding key on failure; `parent` keeps the
    /// entries merged before the collision was found, which is fine since
    /// a duplicate key aborts the whole build anyway.
    pub fn merge_into(&self, parent: &mut VariableRegistry) -> Result<(), String> {
        for (key, handle) in &self.entries {
            if !parent.insert(key.clone(), *handle) {
                return Err(key.clone());
            }
        }
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
