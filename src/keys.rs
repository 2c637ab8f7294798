//! Attribute key constants for metanode access.
//!
//! Avoid string typos, enable IDE autocomplete.
//! Usage: `node.attrs.get_str(A_META_TYPE)`

/// Scene node type used for metanodes (generic attribute container).
pub const NODE_TYPE: &str = "network";

// === Core metanode attributes (locked after creation) ===
/// Fully qualified meta type string
pub const A_META_TYPE: &str = "metaType";
/// Version of the owning spec
pub const A_META_VERSION: &str = "metaVersion";
/// Summed version across the spec lineage
pub const A_LINEAL_VERSION: &str = "linealVersion";
