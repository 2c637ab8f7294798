//! Generic attribute storage plus the schema types that describe it.
//!
//! `Attrs` is the raw container every network node carries. Schema-checked
//! access goes through `Metanode`; the container itself performs no
//! validation.
//!
//! Schemas are declared as const slices of `AttrDef` and wrapped in a
//! `static AttrSchema` per meta type, so a type's attribute layout is fixed
//! at definition time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// === Attribute flags (bitmask) ===

/// Attribute may be animated by the host.
pub const FLAG_KEYABLE: u8 = 1 << 0;
/// Attribute is hidden from generic editors.
pub const FLAG_HIDDEN: u8 = 1 << 1;
/// Attribute is locked right after creation (core attributes).
pub const FLAG_LOCKED: u8 = 1 << 2;

/// Generic attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
    StrList(Vec<String>),
    /// Reference to another scene node. `None` means disconnected.
    Node(Option<Uuid>),
    /// Multi reference: ordered list of scene nodes.
    NodeList(Vec<Uuid>),
}

impl AttrValue {
    /// Schema type this value satisfies.
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Str(_) => AttrType::Str,
            AttrValue::StrList(_) => AttrType::StrList,
            AttrValue::Node(_) => AttrType::Node,
            AttrValue::NodeList(_) => AttrType::NodeList,
        }
    }
}

/// Attribute value type, as declared in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    Bool,
    Int,
    Float,
    Str,
    StrList,
    Node,
    NodeList,
}

impl AttrType {
    /// Zero value for this type.
    ///
    /// Matches host conventions: empty string and empty list rather than
    /// "no value", nil reference for a disconnected node slot.
    pub fn zero(&self) -> AttrValue {
        match self {
            AttrType::Bool => AttrValue::Bool(false),
            AttrType::Int => AttrValue::Int(0),
            AttrType::Float => AttrValue::Float(0.0),
            AttrType::Str => AttrValue::Str(String::new()),
            AttrType::StrList => AttrValue::StrList(Vec::new()),
            AttrType::Node => AttrValue::Node(None),
            AttrType::NodeList => AttrValue::NodeList(Vec::new()),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Float => "float",
            AttrType::Str => "string",
            AttrType::StrList => "stringList",
            AttrType::Node => "node",
            AttrType::NodeList => "nodeList",
        };
        f.write_str(s)
    }
}

/// Const-friendly default for an `AttrDef`.
///
/// `None` falls back to `AttrType::zero()` at materialization time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrDefault {
    None,
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(&'static str),
}

/// Single attribute declaration: name, type, flags, default.
#[derive(Debug, Clone, Copy)]
pub struct AttrDef {
    pub name: &'static str,
    pub ty: AttrType,
    pub flags: u8,
    pub default: AttrDefault,
}

impl AttrDef {
    pub const fn new(name: &'static str, ty: AttrType, flags: u8) -> Self {
        Self {
            name,
            ty,
            flags,
            default: AttrDefault::None,
        }
    }

    pub const fn with_default(self, default: AttrDefault) -> Self {
        Self {
            name: self.name,
            ty: self.ty,
            flags: self.flags,
            default,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.flags & FLAG_LOCKED != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.flags & FLAG_HIDDEN != 0
    }

    pub fn is_keyable(&self) -> bool {
        self.flags & FLAG_KEYABLE != 0
    }

    /// Concrete value used when the attribute is first materialized.
    pub fn default_value(&self) -> AttrValue {
        match self.default {
            AttrDefault::None => self.ty.zero(),
            AttrDefault::Bool(v) => AttrValue::Bool(v),
            AttrDefault::Int(v) => AttrValue::Int(v),
            AttrDefault::Float(v) => AttrValue::Float(v),
            AttrDefault::Str(v) => AttrValue::Str(v.to_string()),
        }
    }
}

/// Static attribute schema for one meta type.
#[derive(Debug, Clone, Copy)]
pub struct AttrSchema {
    pub name: &'static str,
    defs: &'static [AttrDef],
}

impl AttrSchema {
    pub const fn new(name: &'static str, defs: &'static [AttrDef]) -> Self {
        Self { name, defs }
    }

    pub fn find(&self, attr: &str) -> Option<&AttrDef> {
        self.defs.iter().find(|d| d.name == attr)
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.find(attr).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttrDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Schema with no attributes, for specs without a dynamic part.
pub static EMPTY_SCHEMA: AttrSchema = AttrSchema::new("", &[]);

/// Attribute container: string key → typed value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attrs {
    #[serde(default)]
    map: HashMap<String, AttrValue>,
}

impl Attrs {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.map.get(key) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.map.get(key) {
            Some(AttrValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get i32 value with custom default
    pub fn get_i32_or(&self, key: &str, default: i32) -> i32 {
        self.get_i32(key).unwrap_or(default)
    }

    /// Get bool value with custom default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Remove attribute by key
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.remove(key)
    }

    /// Iterate over all attributes (key, value)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Check if attribute exists
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
