//! Scene: the host-side container owning all network nodes.
//!
//! Nodes are keyed by UUID in creation order; names are unique across the
//! scene and resolved through a runtime index. The scene is the unit of
//! serialization: `Scene::to_json` / `Scene::from_json`.
//!
//! The scene exposes exactly the host operations metanodes need: find node
//! by name, create node, delete node, plus raw node access. Attribute
//! traffic goes through the node itself.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{MetaError, Result};
use crate::keys::A_META_TYPE;
use crate::node::NetworkNode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// All nodes in creation order.
    nodes: IndexMap<Uuid, NetworkNode>,

    /// Runtime name index, rebuilt on load.
    #[serde(skip)]
    names: HashMap<String, Uuid>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new network node under `name`.
    ///
    /// Scene names are unique: a taken name fails with `NameCollision`
    /// rather than silently returning the existing node.
    pub fn create_node(&mut self, name: &str) -> Result<Uuid> {
        if self.names.contains_key(name) {
            return Err(MetaError::NameCollision(name.to_string()));
        }
        let node = NetworkNode::new(name);
        let uuid = node.uuid();
        self.names.insert(name.to_string(), uuid);
        self.nodes.insert(uuid, node);
        log::debug!("Scene::create_node '{}' -> {}", name, uuid);
        Ok(uuid)
    }

    /// Look up a node by scene name.
    pub fn find_node(&self, name: &str) -> Option<Uuid> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.nodes.contains_key(&uuid)
    }

    pub fn node(&self, uuid: Uuid) -> Result<&NetworkNode> {
        self.nodes.get(&uuid).ok_or(MetaError::NodeNotFound(uuid))
    }

    pub fn node_mut(&mut self, uuid: Uuid) -> Result<&mut NetworkNode> {
        self.nodes
            .get_mut(&uuid)
            .ok_or(MetaError::NodeNotFound(uuid))
    }

    /// Rename a node, keeping the name index consistent.
    pub fn rename_node(&mut self, uuid: Uuid, new_name: &str) -> Result<()> {
        if let Some(&holder) = self.names.get(new_name) {
            if holder != uuid {
                return Err(MetaError::NameCollision(new_name.to_string()));
            }
            return Ok(());
        }
        let node = self
            .nodes
            .get_mut(&uuid)
            .ok_or(MetaError::NodeNotFound(uuid))?;
        self.names.remove(node.name());
        node.set_name(new_name);
        self.names.insert(new_name.to_string(), uuid);
        Ok(())
    }

    /// Remove a node from the scene, returning it.
    ///
    /// References held by other nodes are left dangling; scene hygiene is
    /// the manager's job.
    pub fn delete_node(&mut self, uuid: Uuid) -> Result<NetworkNode> {
        let node = self
            .nodes
            .shift_remove(&uuid)
            .ok_or(MetaError::NodeNotFound(uuid))?;
        self.names.remove(node.name());
        log::debug!("Scene::delete_node '{}' ({})", node.name(), uuid);
        Ok(node)
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.values()
    }

    /// Nodes carrying the metanode marker attribute, in creation order.
    pub fn meta_nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes
            .values()
            .filter(|n| n.attrs.contains(A_META_TYPE))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rebuild the runtime name index. Called after deserialization.
    fn reindex(&mut self) {
        self.names = self
            .nodes
            .iter()
            .map(|(uuid, node)| (node.name().to_string(), *uuid))
            .collect();
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut scene: Scene = serde_json::from_str(json)?;
        scene.reindex();
        Ok(scene)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let path = if path.extension().and_then(|s| s.to_str()) != Some("json") {
            path.with_extension("json")
        } else {
            path.to_path_buf()
        };
        fs::write(&path, self.to_json()?)?;
        log::info!("Scene::save {} nodes -> {}", self.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let scene = Self::from_json(&json)?;
        log::info!(
            "Scene::load {} nodes <- {}",
            scene.len(),
            path.as_ref().display()
        );
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::AttrValue;

    #[test]
    fn test_create_and_find() {
        let mut scene = Scene::new();
        let id = scene.create_node("root").unwrap();
        assert_eq!(scene.find_node("root"), Some(id));
        assert_eq!(scene.find_node("missing"), None);
        assert_eq!(scene.node(id).unwrap().name(), "root");
    }

    #[test]
    fn test_name_collision() {
        let mut scene = Scene::new();
        scene.create_node("a").unwrap();
        assert!(matches!(
            scene.create_node("a"),
            Err(MetaError::NameCollision(_))
        ));
    }

    #[test]
    fn test_rename() {
        let mut scene = Scene::new();
        let a = scene.create_node("a").unwrap();
        let b = scene.create_node("b").unwrap();
        scene.rename_node(a, "c").unwrap();
        assert_eq!(scene.find_node("c"), Some(a));
        assert_eq!(scene.find_node("a"), None);
        // Renaming onto a taken name fails; onto your own name is a no-op.
        assert!(scene.rename_node(b, "c").is_err());
        scene.rename_node(b, "b").unwrap();
    }

    #[test]
    fn test_delete() {
        let mut scene = Scene::new();
        let a = scene.create_node("a").unwrap();
        scene.delete_node(a).unwrap();
        assert!(!scene.contains(a));
        assert_eq!(scene.find_node("a"), None);
        assert!(matches!(
            scene.delete_node(a),
            Err(MetaError::NodeNotFound(_))
        ));
        // Name is free again after delete.
        scene.create_node("a").unwrap();
    }

    #[test]
    fn test_meta_nodes_filter() {
        let mut scene = Scene::new();
        let a = scene.create_node("plain").unwrap();
        let b = scene.create_node("meta").unwrap();
        scene
            .node_mut(b)
            .unwrap()
            .attrs
            .set(A_META_TYPE, AttrValue::Str("demo.Rig".into()));
        let metas: Vec<Uuid> = scene.meta_nodes().map(|n| n.uuid()).collect();
        assert_eq!(metas, vec![b]);
        assert!(scene.contains(a));
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let mut scene = Scene::new();
        let a = scene.create_node("a").unwrap();
        scene
            .node_mut(a)
            .unwrap()
            .set_attr("count", AttrValue::Int(5))
            .unwrap();
        let json = scene.to_json().unwrap();
        let restored = Scene::from_json(&json).unwrap();
        assert_eq!(restored.find_node("a"), Some(a));
        assert_eq!(restored.node(a).unwrap().attrs.get_i32("count"), Some(5));
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut scene = Scene::new();
        scene.create_node("a").unwrap();
        scene.save(&path).unwrap();
        let restored = Scene::load(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.find_node("a").is_some());
    }
}
