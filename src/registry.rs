//! Group Registry
//!
//! Process-wide name → group lookup. Filled once at startup and read on every
//! inbound peer request; handed around explicitly rather than kept in a global.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::group::{Getter, Group};

#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Arc<RwLock<HashMap<String, Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == New Group ==
    /// Creates and registers a group. Names must be unique.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        cache_bytes: usize,
        getter: Arc<dyn Getter>,
    ) -> Result<Group> {
        let name = name.into();
        let mut groups = self.groups.write();
        if groups.contains_key(&name) {
            return Err(CacheError::DuplicateGroup(name));
        }

        let group = Group::new(name.clone(), cache_bytes, getter);
        groups.insert(name.clone(), group.clone());
        info!("registered group {} with {} cache bytes", name, cache_bytes);
        Ok(group)
    }

    // == Get Group ==
    pub fn get_group(&self, name: &str) -> Option<Group> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All registered groups, sorted by name.
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.name().cmp(b.name()));
        groups
    }
}
