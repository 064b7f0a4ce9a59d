//! Bidirectional project name ↔ id map

use std::collections::HashMap;

use uuid::Uuid;

/// Tracked projects, looked up by id or by display name.
///
/// Both directions are updated together so they can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMap {
    by_id: HashMap<Uuid, String>,
    by_name: HashMap<String, Uuid>,
}

impl ProjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a project, replacing any previous entry with the same id or name.
    pub fn insert(&mut self, id: Uuid, name: impl Into<String>) {
        let name = name.into();
        if let Some(old_name) = self.by_id.remove(&id) {
            self.by_name.remove(&old_name);
        }
        if let Some(old_id) = self.by_name.remove(&name) {
            self.by_id.remove(&old_id);
        }
        self.by_id.insert(id, name.clone());
        self.by_name.insert(name, id);
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<String> {
        let name = self.by_id.remove(id)?;
        self.by_name.remove(&name);
        Some(name)
    }

    pub fn name_of(&self, id: &Uuid) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<Uuid> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.by_id.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, &str)> + '_ {
        self.by_id.iter().map(|(id, name)| (*id, name.as_str()))
    }
}
