//! Error types for metanode operations.
//!
//! Every failure mode a caller may want to branch on gets its own variant;
//! host-level IO/JSON errors are wrapped unchanged.

use thiserror::Error;
use uuid::Uuid;

use crate::attrs::AttrType;

#[derive(Error, Debug)]
pub enum MetaError {
    /// Scene name already bound to another node.
    #[error("name '{0}' is already in use")]
    NameCollision(String),

    /// Node handle does not resolve in this scene.
    #[error("node {0} not found in scene")]
    NodeNotFound(Uuid),

    /// Node cannot be wrapped by the requested meta type.
    #[error("node '{name}' is not a valid metanode: {reason}")]
    IncompatibleNode { name: String, reason: String },

    /// Meta type string not present in the registry.
    #[error("'{0}' is not a registered meta type")]
    UnknownMetaType(String),

    /// Attribute not declared in the spec's schemas.
    #[error("'{attr}' is not a registered attribute on meta type {meta_type}")]
    UnknownAttribute { attr: String, meta_type: String },

    /// Value type does not match the schema declaration.
    #[error("attribute '{attr}' expects {expected}, got {got}")]
    TypeMismatch {
        attr: String,
        expected: AttrType,
        got: AttrType,
    },

    /// Attribute is locked on the node.
    #[error("attribute '{0}' is locked")]
    AttrLocked(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for metanode operations.
pub type Result<T> = std::result::Result<T, MetaError>;
