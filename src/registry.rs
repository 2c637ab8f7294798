//! Process-global registry of meta types.
//!
//! Every spec a pipeline deploys gets registered once at startup via
//! `register::<S>()`. The registry lets type-erased code (the manager, the
//! wrap diagnostics) reason about meta types it cannot name at compile
//! time: schemas, versions, singleton flags and the orphan predicate all
//! travel as plain data and fn pointers.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::attrs::AttrSchema;
use crate::errors::Result;
use crate::meta::{MetaSpec, Metanode, UpdateReport};
use crate::node::NetworkNode;
use crate::scene::Scene;

/// Type-erased description of one registered meta type.
#[derive(Debug, Clone, Copy)]
pub struct MetaTypeInfo {
    pub meta_type: &'static str,
    pub version: i32,
    pub lineal_version: i32,
    pub singleton: bool,
    pub schema: &'static AttrSchema,
    pub dynamic_schema: &'static AttrSchema,
    /// Orphan predicate from the spec; drives the manager's orphan pass.
    pub is_orphaned: fn(&Scene, &NetworkNode) -> bool,
    /// Rebuild a node of this type against the current schema.
    pub update: fn(&mut Scene, Uuid) -> Result<(Uuid, UpdateReport)>,
}

static REGISTRY: Lazy<RwLock<HashMap<&'static str, MetaTypeInfo>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a spec. Re-registering the same type overwrites its entry.
pub fn register<S: MetaSpec>() {
    let info = MetaTypeInfo {
        meta_type: S::META_TYPE,
        version: S::META_VERSION,
        lineal_version: S::lineal_version(),
        singleton: S::SINGLETON,
        schema: S::schema(),
        dynamic_schema: S::dynamic_schema(),
        is_orphaned: S::is_orphaned,
        update: update_erased::<S>,
    };
    log::debug!("registering meta type {}", S::META_TYPE);
    REGISTRY
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(S::META_TYPE, info);
}

fn update_erased<S: MetaSpec>(scene: &mut Scene, node: Uuid) -> Result<(Uuid, UpdateReport)> {
    let meta = Metanode::<S>::wrap(scene, node)?;
    let (meta, report) = meta.update(scene)?;
    Ok((meta.node(), report))
}

pub fn info(meta_type: &str) -> Option<MetaTypeInfo> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(meta_type)
        .copied()
}

pub fn is_registered(meta_type: &str) -> bool {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .contains_key(meta_type)
}

pub fn registered_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .keys()
        .copied()
        .collect();
    types.sort_unstable();
    types
}
