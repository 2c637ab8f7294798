//! Metanode wrapper - schema-checked access to a network node.
//!
//! A `Metanode<S>` is a thin handle: one node UUID plus the spec type. It
//! owns nothing; every call resolves the node through the scene, so the
//! handle stays valid across scene mutations and goes stale only when the
//! node is deleted.
//!
//! `MetaSpec` is the subclassing contract: a spec supplies its meta type
//! string, versions and schemas, and nothing else. All get/set traffic is
//! validated against the schema before it touches the node.

use std::fmt;
use std::marker::PhantomData;

use uuid::Uuid;

use crate::attrs::{AttrDef, AttrSchema, AttrType, AttrValue, EMPTY_SCHEMA, FLAG_HIDDEN, FLAG_LOCKED};
use crate::errors::{MetaError, Result};
use crate::keys::{A_LINEAL_VERSION, A_META_TYPE, A_META_VERSION};
use crate::node::NetworkNode;
use crate::registry;
use crate::scene::Scene;

const CORE_DEFS: &[AttrDef] = &[
    AttrDef::new(A_META_TYPE, AttrType::Str, FLAG_LOCKED | FLAG_HIDDEN),
    AttrDef::new(A_META_VERSION, AttrType::Int, FLAG_LOCKED | FLAG_HIDDEN),
    AttrDef::new(A_LINEAL_VERSION, AttrType::Int, FLAG_LOCKED | FLAG_HIDDEN),
];

/// Core attributes every metanode carries, locked after creation.
pub static CORE_SCHEMA: AttrSchema = AttrSchema::new("Metanode", CORE_DEFS);

/// Static contract of one meta type.
///
/// Implementors declare their attribute layout; the wrapper does the rest.
/// Overriding the schema is the only required customization.
pub trait MetaSpec: 'static {
    /// Fully qualified meta type string, e.g. `"rigging.Rig"`.
    const META_TYPE: &'static str;

    /// Version of this spec. Bump on schema changes.
    const META_VERSION: i32 = 1;

    /// Version contributions of ancestor specs, for lineal versioning.
    const ANCESTRY: &'static [i32] = &[];

    /// At most one instance per scene (see `Metanode::instance`).
    const SINGLETON: bool = false;

    /// Attributes this spec adds to its network node.
    fn schema() -> &'static AttrSchema;

    /// Attributes that are serialized but not known at creation time.
    fn dynamic_schema() -> &'static AttrSchema {
        &EMPTY_SCHEMA
    }

    /// Total version across the spec lineage.
    fn lineal_version() -> i32 {
        Self::META_VERSION + Self::ANCESTRY.iter().sum::<i32>()
    }

    /// Whether a node of this type has lost its reason to exist.
    /// The manager deletes nodes this predicate fires on.
    fn is_orphaned(_scene: &Scene, _node: &NetworkNode) -> bool {
        false
    }
}

/// Attributes dropped or skipped while rebuilding a node (see
/// [`Metanode::update`]).
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// Old attributes with no slot in the current schema.
    pub missing: Vec<String>,
    /// Attributes whose stored value no longer fits the schema type.
    pub could_not_set: Vec<String>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.could_not_set.is_empty()
    }
}

/// Schema-checked handle to one metanode in a scene.
pub struct Metanode<S: MetaSpec> {
    node: Uuid,
    _spec: PhantomData<S>,
}

impl<S: MetaSpec> Clone for Metanode<S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<S: MetaSpec> Copy for Metanode<S> {}

impl<S: MetaSpec> PartialEq for Metanode<S> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}
impl<S: MetaSpec> Eq for Metanode<S> {}

impl<S: MetaSpec> fmt::Debug for Metanode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metanode<{}>({})", S::META_TYPE, self.node)
    }
}

impl<S: MetaSpec> Metanode<S> {
    /// Create a new metanode under `name`.
    ///
    /// Core attributes are written and locked, then every schema attribute
    /// is materialized with its default. Fails with `NameCollision` when
    /// the name is already bound in the scene.
    pub fn create(scene: &mut Scene, name: &str) -> Result<Self> {
        let uuid = scene.create_node(name)?;
        let node = scene.node_mut(uuid)?;

        node.set_attr(A_META_TYPE, AttrValue::Str(S::META_TYPE.to_string()))?;
        node.lock_attr(A_META_TYPE);
        node.set_attr(A_META_VERSION, AttrValue::Int(S::META_VERSION))?;
        node.lock_attr(A_META_VERSION);
        node.set_attr(A_LINEAL_VERSION, AttrValue::Int(S::lineal_version()))?;
        node.lock_attr(A_LINEAL_VERSION);

        for def in S::schema().iter() {
            node.ensure_attr(def.name, def.default_value());
            if def.is_locked() {
                node.lock_attr(def.name);
            }
        }

        log::debug!("created metanode '{}' of type {}", name, S::META_TYPE);
        Ok(Self {
            node: uuid,
            _spec: PhantomData,
        })
    }

    /// Bind a wrapper to an existing node.
    ///
    /// The node must carry the meta type marker and match `S::META_TYPE`;
    /// the diagnostics distinguish a plain node, an unregistered meta type
    /// and a different registered meta type.
    pub fn wrap(scene: &Scene, node_id: Uuid) -> Result<Self> {
        let node = scene.node(node_id)?;
        let meta_type = node.meta_type().ok_or_else(|| MetaError::IncompatibleNode {
            name: node.name().to_string(),
            reason: format!("missing '{}' attribute", A_META_TYPE),
        })?;

        if meta_type != S::META_TYPE {
            let reason = if registry::is_registered(meta_type) {
                format!(
                    "is of meta type '{}', expected '{}'",
                    meta_type,
                    S::META_TYPE
                )
            } else {
                format!("has an invalid meta type '{}'", meta_type)
            };
            return Err(MetaError::IncompatibleNode {
                name: node.name().to_string(),
                reason,
            });
        }

        Ok(Self {
            node: node_id,
            _spec: PhantomData,
        })
    }

    /// Find-or-create the scene's single instance of a `SINGLETON` spec.
    /// The created node is named after the last segment of the meta type.
    pub fn instance(scene: &mut Scene) -> Result<Self> {
        if let Some(uuid) = scene
            .meta_nodes()
            .find(|n| n.meta_type() == Some(S::META_TYPE))
            .map(|n| n.uuid())
        {
            return Self::wrap(scene, uuid);
        }
        let name = S::META_TYPE.rsplit('.').next().unwrap_or(S::META_TYPE);
        Self::create(scene, name)
    }

    fn attr_def(attr: &str) -> Result<&'static AttrDef> {
        S::schema()
            .find(attr)
            .or_else(|| S::dynamic_schema().find(attr))
            .ok_or_else(|| MetaError::UnknownAttribute {
                attr: attr.to_string(),
                meta_type: S::META_TYPE.to_string(),
            })
    }

    /// Read an attribute declared in the spec's schemas.
    ///
    /// Attributes are materialized lazily: a declared attribute the node
    /// does not carry yet reads as its schema default.
    pub fn get(&self, scene: &Scene, attr: &str) -> Result<AttrValue> {
        let def = Self::attr_def(attr)?;
        let node = scene.node(self.node)?;
        match node.get_attr(attr) {
            Some(value) => Ok(value.clone()),
            None => Ok(def.default_value()),
        }
    }

    /// Write an attribute declared in the spec's schemas.
    ///
    /// The value type must match the declaration; locked attributes reject
    /// the write. Mutates persistent scene state.
    pub fn set(&self, scene: &mut Scene, attr: &str, value: AttrValue) -> Result<()> {
        let def = Self::attr_def(attr)?;
        let got = value.attr_type();
        if got != def.ty {
            return Err(MetaError::TypeMismatch {
                attr: attr.to_string(),
                expected: def.ty,
                got,
            });
        }
        scene.node_mut(self.node)?.set_attr(attr, value)
    }

    // --- Typed convenience getters ---

    pub fn get_bool(&self, scene: &Scene, attr: &str) -> Result<bool> {
        match self.get(scene, attr)? {
            AttrValue::Bool(v) => Ok(v),
            other => Err(self.mismatch(attr, AttrType::Bool, &other)),
        }
    }

    pub fn get_i32(&self, scene: &Scene, attr: &str) -> Result<i32> {
        match self.get(scene, attr)? {
            AttrValue::Int(v) => Ok(v),
            other => Err(self.mismatch(attr, AttrType::Int, &other)),
        }
    }

    pub fn get_float(&self, scene: &Scene, attr: &str) -> Result<f32> {
        match self.get(scene, attr)? {
            AttrValue::Float(v) => Ok(v),
            other => Err(self.mismatch(attr, AttrType::Float, &other)),
        }
    }

    pub fn get_str(&self, scene: &Scene, attr: &str) -> Result<String> {
        match self.get(scene, attr)? {
            AttrValue::Str(v) => Ok(v),
            other => Err(self.mismatch(attr, AttrType::Str, &other)),
        }
    }

    /// Connected nodes of a `Node` or `NodeList` attribute, flattened.
    pub fn linked(&self, scene: &Scene, attr: &str) -> Result<Vec<Uuid>> {
        match self.get(scene, attr)? {
            AttrValue::Node(Some(uuid)) => Ok(vec![uuid]),
            AttrValue::Node(None) => Ok(Vec::new()),
            AttrValue::NodeList(list) => Ok(list),
            other => Err(self.mismatch(attr, AttrType::Node, &other)),
        }
    }

    fn mismatch(&self, attr: &str, expected: AttrType, got: &AttrValue) -> MetaError {
        MetaError::TypeMismatch {
            attr: attr.to_string(),
            expected,
            got: got.attr_type(),
        }
    }

    // --- Identity / introspection ---

    /// UUID of the wrapped node.
    pub fn node(&self) -> Uuid {
        self.node
    }

    /// Scene name of the wrapped node.
    pub fn name<'a>(&self, scene: &'a Scene) -> Result<&'a str> {
        Ok(scene.node(self.node)?.name())
    }

    /// Node's stored `metaVersion`, -1 when the attribute is missing.
    pub fn node_version(&self, scene: &Scene) -> Result<i32> {
        Ok(scene.node(self.node)?.attrs.get_i32_or(A_META_VERSION, -1))
    }

    /// Node's stored `linealVersion`, -1 when the attribute is missing.
    pub fn node_lineal(&self, scene: &Scene) -> Result<i32> {
        Ok(scene.node(self.node)?.attrs.get_i32_or(A_LINEAL_VERSION, -1))
    }

    /// Rebuild the node against the current schema.
    ///
    /// A fresh node is created under the same name, values are carried
    /// over where name and type still match, and references held by other
    /// nodes are remapped to the replacement. Returns the new wrapper and
    /// a report of what could not be carried.
    pub fn update(self, scene: &mut Scene) -> Result<(Self, UpdateReport)> {
        let old_id = self.node;
        let node = scene.node(old_id)?;
        let name = node.name().to_string();
        let stored: Vec<(String, AttrValue)> = node
            .attrs
            .iter()
            .filter(|(k, _)| !CORE_SCHEMA.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        scene.delete_node(old_id)?;
        let new = Self::create(scene, &name)?;

        let mut report = UpdateReport::default();
        for (key, value) in stored {
            let def = match S::schema().find(&key).or_else(|| S::dynamic_schema().find(&key)) {
                Some(def) => def,
                None => {
                    report.missing.push(key);
                    continue;
                }
            };
            if def.ty != value.attr_type() || def.is_locked() {
                report.could_not_set.push(key);
                continue;
            }
            scene.node_mut(new.node)?.set_attr(&key, value)?;
        }

        remap_references(scene, old_id, new.node);

        if !report.is_clean() {
            log::warn!(
                "update of '{}' dropped attrs: missing={:?} could_not_set={:?}",
                name,
                report.missing,
                report.could_not_set
            );
        }
        Ok((new, report))
    }
}

/// Rewrite every `Node`/`NodeList` attribute in the scene that points at
/// `old` to point at `new`. Keeps the graph intact across `update`.
fn remap_references(scene: &mut Scene, old: Uuid, new: Uuid) {
    let holders: Vec<Uuid> = scene.iter().map(|n| n.uuid()).collect();
    for holder in holders {
        let Ok(node) = scene.node_mut(holder) else {
            continue;
        };
        let keys: Vec<String> = node
            .attrs
            .iter()
            .filter_map(|(k, v)| match v {
                AttrValue::Node(Some(id)) if *id == old => Some(k.clone()),
                AttrValue::NodeList(list) if list.contains(&old) => Some(k.clone()),
                _ => None,
            })
            .collect();
        for key in keys {
            let value = match node.attrs.get(&key) {
                Some(AttrValue::Node(_)) => AttrValue::Node(Some(new)),
                Some(AttrValue::NodeList(list)) => AttrValue::NodeList(
                    list.iter().map(|id| if *id == old { new } else { *id }).collect(),
                ),
                _ => continue,
            };
            node.attrs.set(key, value);
        }
    }
}
