//! metanode - typed metadata nodes for scene graphs
//!
//! Wraps plain network nodes (generic attribute containers owned by a
//! scene) with per-type attribute schemas. A `MetaSpec` declares which
//! attributes a meta type expects; `Metanode` mediates all get/set traffic
//! through that declaration. `MetaManager` keeps scenes healthy across
//! spec renames, version bumps and deletions.

pub mod attrs;
pub mod config;
pub mod errors;
pub mod keys;
pub mod manager;
pub mod meta;
pub mod node;
pub mod registry;
pub mod scene;

// Re-export the working set
pub use attrs::{
    AttrDef, AttrDefault, AttrSchema, AttrType, AttrValue, Attrs, EMPTY_SCHEMA, FLAG_HIDDEN,
    FLAG_KEYABLE, FLAG_LOCKED,
};
pub use config::MetaConfig;
pub use errors::{MetaError, Result};
pub use manager::MetaManager;
pub use meta::{CORE_SCHEMA, MetaSpec, Metanode, UpdateReport};
pub use node::NetworkNode;
pub use registry::{MetaTypeInfo, register};
pub use scene::Scene;
