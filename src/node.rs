//! NetworkNode - generic attribute container owned by the scene.
//!
//! A node knows nothing about schemas: it stores whatever attributes it is
//! given plus a lock set. Schema enforcement lives in `Metanode`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::attrs::{AttrValue, Attrs};
use crate::errors::{MetaError, Result};
use crate::keys::A_META_TYPE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkNode {
    uuid: Uuid,
    name: String,
    pub attrs: Attrs,
    /// Names of locked attributes. Locked values reject writes until unlocked.
    #[serde(default)]
    locked: HashSet<String>,
}

impl NetworkNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            attrs: Attrs::new(),
            locked: HashSet::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames go through `Scene::rename_node` so the name index stays valid.
    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains(key)
    }

    pub fn get_attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Write an attribute value, honoring locks.
    pub fn set_attr(&mut self, key: &str, value: AttrValue) -> Result<()> {
        if self.locked.contains(key) {
            return Err(MetaError::AttrLocked(key.to_string()));
        }
        self.attrs.set(key, value);
        Ok(())
    }

    /// Create-if-missing. Existing values are left untouched.
    pub fn ensure_attr(&mut self, key: &str, default: AttrValue) {
        if !self.attrs.contains(key) {
            self.attrs.set(key, default);
        }
    }

    pub fn lock_attr(&mut self, key: &str) {
        self.locked.insert(key.to_string());
    }

    pub fn unlock_attr(&mut self, key: &str) {
        self.locked.remove(key);
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locked.contains(key)
    }

    /// Meta type marker, if this node is a metanode.
    pub fn meta_type(&self) -> Option<&str> {
        self.attrs.get_str(A_META_TYPE)
    }
}
