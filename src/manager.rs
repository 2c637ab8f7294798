//! MetaManager - scene hygiene for metanodes.
//!
//! Scans a scene for metanodes that need fixing and applies the fixes:
//! - relink: meta types renamed or moved (config table)
//! - singleton: extra instances of singleton types
//! - orphaned: nodes whose spec's orphan predicate fires
//! - update: nodes whose lineal version lags the registered spec
//! - deprecated: meta types scheduled for removal (config table)
//!
//! `validate` only gathers; `fix` applies what was gathered; `fix_all`
//! loops the two until the scene is clean. All fixes return report lines.
//!
//! The manager is scan-based: the scene is plain data here, so there are
//! no creation callbacks to hook. Run it on scene load and before saves.

use std::collections::HashSet;
use uuid::Uuid;

use crate::attrs::AttrValue;
use crate::config::MetaConfig;
use crate::errors::Result;
use crate::keys::{A_LINEAL_VERSION, A_META_TYPE};
use crate::registry;
use crate::scene::Scene;

/// Gathering and fixing passes run in this order.
#[derive(Debug, Default)]
pub struct MetaManager {
    pub config: MetaConfig,
    relink: Vec<Uuid>,
    singleton: Vec<Uuid>,
    orphaned: Vec<Uuid>,
    update: Vec<Uuid>,
    deprecated: Vec<Uuid>,
}

impl MetaManager {
    pub fn new(config: MetaConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Gather nodes to fix without touching the scene.
    pub fn validate(&mut self, scene: &Scene) {
        self.collect_relink(scene);
        self.collect_extra_singletons(scene);
        self.collect_orphaned(scene);
        self.collect_updates(scene);
        self.collect_deprecated(scene);
        if self.has_issues() {
            log::info!(
                "validate: relink={} singleton={} orphaned={} update={} deprecated={}",
                self.relink.len(),
                self.singleton.len(),
                self.orphaned.len(),
                self.update.len(),
                self.deprecated.len()
            );
        }
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }

    pub fn issue_count(&self) -> usize {
        self.relink.len()
            + self.singleton.len()
            + self.orphaned.len()
            + self.update.len()
            + self.deprecated.len()
    }

    /// Apply all gathered fixes. Returns report lines.
    pub fn fix(&mut self, scene: &mut Scene) -> Result<Vec<String>> {
        let mut msgs = Vec::new();
        msgs.extend(self.fix_relink(scene)?);
        msgs.extend(self.delete_nodes(scene, Kind::Singleton)?);
        msgs.extend(self.delete_nodes(scene, Kind::Orphaned)?);
        msgs.extend(self.fix_updates(scene)?);
        msgs.extend(self.delete_nodes(scene, Kind::Deprecated)?);
        Ok(msgs)
    }

    /// Validate and fix until no issues remain.
    ///
    /// Fixes can expose new issues (a relinked type may itself be
    /// deprecated), so the loop re-validates after every pass.
    pub fn fix_all(&mut self, scene: &mut Scene) -> Result<Vec<String>> {
        let mut msgs = Vec::new();
        for _ in 0..MAX_FIX_PASSES {
            self.validate(scene);
            if !self.has_issues() {
                return Ok(msgs);
            }
            msgs.extend(self.fix(scene)?);
        }
        log::error!("fix_all did not converge after {} passes", MAX_FIX_PASSES);
        Ok(msgs)
    }

    // === RELINK ===

    fn collect_relink(&mut self, scene: &Scene) {
        self.relink = scene
            .meta_nodes()
            .filter(|n| {
                n.meta_type()
                    .is_some_and(|t| self.config.relink.contains_key(t))
            })
            .map(|n| n.uuid())
            .collect();
    }

    fn fix_relink(&mut self, scene: &mut Scene) -> Result<Vec<String>> {
        let mut msgs = Vec::new();
        for uuid in std::mem::take(&mut self.relink) {
            if !scene.contains(uuid) {
                continue;
            }
            let node = scene.node_mut(uuid)?;
            let Some(old_type) = node.meta_type().map(str::to_string) else {
                continue;
            };
            let Some(new_type) = self.config.relink.get(&old_type).cloned() else {
                continue;
            };
            node.unlock_attr(A_META_TYPE);
            node.set_attr(A_META_TYPE, AttrValue::Str(new_type.clone()))?;
            node.lock_attr(A_META_TYPE);
            msgs.push(format!(
                "Relinked outdated metanode: {} ({} -> {})",
                node.name(),
                old_type,
                new_type
            ));
        }
        Ok(msgs)
    }

    // === EXTRA SINGLETONS ===

    fn collect_extra_singletons(&mut self, scene: &Scene) {
        let mut seen: HashSet<&str> = HashSet::new();
        self.singleton = scene
            .meta_nodes()
            .filter(|n| {
                let Some(meta_type) = n.meta_type() else {
                    return false;
                };
                let Some(info) = registry::info(meta_type) else {
                    return false;
                };
                // First node in scene order is the recognized instance.
                info.singleton && !seen.insert(info.meta_type)
            })
            .map(|n| n.uuid())
            .collect();
    }

    // === ORPHANED ===

    fn collect_orphaned(&mut self, scene: &Scene) {
        self.orphaned = scene
            .meta_nodes()
            .filter(|n| {
                n.meta_type()
                    .and_then(registry::info)
                    .is_some_and(|info| (info.is_orphaned)(scene, n))
            })
            .map(|n| n.uuid())
            .collect();
    }

    // === UPDATE ===

    fn collect_updates(&mut self, scene: &Scene) {
        self.update = scene
            .meta_nodes()
            .filter(|n| {
                let Some(meta_type) = n.meta_type() else {
                    return false;
                };
                if !self.config.check.iter().any(|t| t.as_str() == meta_type) {
                    return false;
                }
                let Some(info) = registry::info(meta_type) else {
                    return false;
                };
                n.attrs.get_i32_or(A_LINEAL_VERSION, -1) < info.lineal_version
            })
            .map(|n| n.uuid())
            .collect();
    }

    fn fix_updates(&mut self, scene: &mut Scene) -> Result<Vec<String>> {
        let mut msgs = Vec::new();
        for uuid in std::mem::take(&mut self.update) {
            if !scene.contains(uuid) {
                continue;
            }
            let Some(info) = scene
                .node(uuid)?
                .meta_type()
                .and_then(registry::info)
            else {
                continue;
            };
            let (new_id, report) = (info.update)(scene, uuid)?;
            let name = scene.node(new_id)?.name().to_string();
            msgs.push(format!("Updated metanode: {}", name));
            if !report.missing.is_empty() {
                msgs.push(format!(
                    "  lacks previous attributes: {}",
                    report.missing.join(", ")
                ));
            }
            if !report.could_not_set.is_empty() {
                msgs.push(format!(
                    "  could not set attributes: {}",
                    report.could_not_set.join(", ")
                ));
            }
        }
        Ok(msgs)
    }

    // === DEPRECATED ===

    fn collect_deprecated(&mut self, scene: &Scene) {
        self.deprecated = scene
            .meta_nodes()
            .filter(|n| {
                n.meta_type()
                    .is_some_and(|t| self.config.remove.iter().any(|r| r.as_str() == t))
            })
            .map(|n| n.uuid())
            .collect();
    }

    fn delete_nodes(&mut self, scene: &mut Scene, kind: Kind) -> Result<Vec<String>> {
        let (list, message_base) = match kind {
            Kind::Singleton => (
                std::mem::take(&mut self.singleton),
                "Deleted duplicate singleton metanode",
            ),
            Kind::Orphaned => (
                std::mem::take(&mut self.orphaned),
                "Deleted orphaned metanode",
            ),
            Kind::Deprecated => (
                std::mem::take(&mut self.deprecated),
                "Deleted deprecated metanode",
            ),
        };
        let mut msgs = Vec::new();
        for uuid in list {
            if !scene.contains(uuid) {
                continue;
            }
            let node = scene.delete_node(uuid)?;
            msgs.push(format!("{}: {}", message_base, node.name()));
        }
        Ok(msgs)
    }
}

const MAX_FIX_PASSES: usize = 16;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Singleton,
    Orphaned,
    Deprecated,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::{AttrDef, AttrSchema, AttrType};
    use crate::meta::{MetaSpec, Metanode};
    use crate::node::NetworkNode;

    const PROP_DEFS: &[AttrDef] = &[
        AttrDef::new("label", AttrType::Str, 0),
        AttrDef::new("dead", AttrType::Bool, 0),
    ];
    static PROP_SCHEMA: AttrSchema = AttrSchema::new("Prop", PROP_DEFS);

    struct Prop;
    impl MetaSpec for Prop {
        const META_TYPE: &'static str = "mgr_test.Prop";
        const META_VERSION: i32 = 2;
        const ANCESTRY: &'static [i32] = &[1];

        fn schema() -> &'static AttrSchema {
            &PROP_SCHEMA
        }

        fn is_orphaned(_scene: &Scene, node: &NetworkNode) -> bool {
            node.attrs.get_bool_or("dead", false)
        }
    }

    const SETTINGS_DEFS: &[AttrDef] = &[AttrDef::new("fps", AttrType::Float, 0)];
    static SETTINGS_SCHEMA: AttrSchema = AttrSchema::new("Settings", SETTINGS_DEFS);

    struct Settings;
    impl MetaSpec for Settings {
        const META_TYPE: &'static str = "mgr_test.Settings";
        const SINGLETON: bool = true;

        fn schema() -> &'static AttrSchema {
            &SETTINGS_SCHEMA
        }
    }

    fn setup() -> (Scene, MetaManager) {
        registry::register::<Prop>();
        registry::register::<Settings>();
        (Scene::new(), MetaManager::new(MetaConfig::new()))
    }

    /// Fake a node written by an older deployment: marker present but the
    /// type string predates the current specs.
    fn make_legacy_node(scene: &mut Scene, name: &str, meta_type: &str) -> Uuid {
        let uuid = scene.create_node(name).unwrap();
        let node = scene.node_mut(uuid).unwrap();
        node.attrs.set(A_META_TYPE, AttrValue::Str(meta_type.into()));
        node.lock_attr(A_META_TYPE);
        uuid
    }

    #[test]
    fn test_clean_scene_has_no_issues() {
        let (mut scene, mut manager) = setup();
        Metanode::<Prop>::create(&mut scene, "p1").unwrap();
        manager.validate(&scene);
        assert!(!manager.has_issues());
    }

    #[test]
    fn test_relink_pass() {
        let (mut scene, mut manager) = setup();
        manager
            .config
            .relink
            .insert("old.Prop".into(), "mgr_test.Prop".into());
        let uuid = make_legacy_node(&mut scene, "p1", "old.Prop");

        manager.validate(&scene);
        assert_eq!(manager.issue_count(), 1);
        let msgs = manager.fix(&mut scene).unwrap();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("Relinked"));

        let node = scene.node(uuid).unwrap();
        assert_eq!(node.meta_type(), Some("mgr_test.Prop"));
        assert!(node.is_locked(A_META_TYPE));
    }

    #[test]
    fn test_deprecated_pass() {
        let (mut scene, mut manager) = setup();
        manager.config.remove.push("retired.Prop".into());
        let uuid = make_legacy_node(&mut scene, "p1", "retired.Prop");

        manager.validate(&scene);
        let msgs = manager.fix(&mut scene).unwrap();
        assert!(msgs[0].starts_with("Deleted deprecated"));
        assert!(!scene.contains(uuid));
    }

    #[test]
    fn test_orphan_pass() {
        let (mut scene, mut manager) = setup();
        let live = Metanode::<Prop>::create(&mut scene, "live").unwrap();
        let dead = Metanode::<Prop>::create(&mut scene, "dead").unwrap();
        dead.set(&mut scene, "dead", AttrValue::Bool(true)).unwrap();

        manager.validate(&scene);
        let msgs = manager.fix(&mut scene).unwrap();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].starts_with("Deleted orphaned"));
        assert!(scene.contains(live.node()));
        assert!(!scene.contains(dead.node()));
    }

    #[test]
    fn test_extra_singleton_pass() {
        let (mut scene, mut manager) = setup();
        let first = Metanode::<Settings>::create(&mut scene, "settings").unwrap();
        let extra1 = Metanode::<Settings>::create(&mut scene, "settings1").unwrap();
        let extra2 = Metanode::<Settings>::create(&mut scene, "settings2").unwrap();

        manager.validate(&scene);
        assert_eq!(manager.issue_count(), 2);
        let msgs = manager.fix(&mut scene).unwrap();
        assert_eq!(msgs.len(), 2);
        assert!(scene.contains(first.node()));
        assert!(!scene.contains(extra1.node()));
        assert!(!scene.contains(extra2.node()));
    }

    #[test]
    fn test_update_pass() {
        let (mut scene, mut manager) = setup();
        manager.config.check.push("mgr_test.Prop".into());
        let prop = Metanode::<Prop>::create(&mut scene, "p1").unwrap();
        prop.set(&mut scene, "label", AttrValue::Str("keep".into()))
            .unwrap();

        // Age the node: lower its lineal version behind the lock.
        {
            let node = scene.node_mut(prop.node()).unwrap();
            node.unlock_attr(A_LINEAL_VERSION);
            node.set_attr(A_LINEAL_VERSION, AttrValue::Int(1)).unwrap();
            node.lock_attr(A_LINEAL_VERSION);
        }

        manager.validate(&scene);
        assert_eq!(manager.issue_count(), 1);
        let msgs = manager.fix(&mut scene).unwrap();
        assert!(msgs[0].starts_with("Updated"));

        let uuid = scene.find_node("p1").unwrap();
        let rebuilt = Metanode::<Prop>::wrap(&scene, uuid).unwrap();
        assert_eq!(rebuilt.node_lineal(&scene).unwrap(), 3);
        assert_eq!(rebuilt.get_str(&scene, "label").unwrap(), "keep");

        // Converged: nothing left to fix.
        manager.validate(&scene);
        assert!(!manager.has_issues());
    }

    #[test]
    fn test_fix_all_chains_relink_into_removal() {
        let (mut scene, mut manager) = setup();
        // A type that first gets relinked, and whose new type is itself
        // deprecated. Needs two passes to fully clean up.
        manager
            .config
            .relink
            .insert("old.Junk".into(), "retired.Junk".into());
        manager.config.remove.push("retired.Junk".into());
        let uuid = make_legacy_node(&mut scene, "junk", "old.Junk");

        let msgs = manager.fix_all(&mut scene).unwrap();
        assert!(msgs.iter().any(|m| m.starts_with("Relinked")));
        assert!(msgs.iter().any(|m| m.starts_with("Deleted deprecated")));
        assert!(!scene.contains(uuid));
        assert!(!manager.has_issues());
    }
}
