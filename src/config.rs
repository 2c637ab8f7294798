//! Deployment-owned tables steering scene hygiene.
//!
//! A pipeline ships one of these next to its registered specs; the manager
//! consults it when validating a scene. Loadable from JSON so the
//! `metacheck` tool can pick it up without code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Old meta type → new meta type rewrites (moved/renamed specs).
    #[serde(default)]
    pub relink: HashMap<String, String>,

    /// Meta types whose lineal version is checked against the registry.
    #[serde(default)]
    pub check: Vec<String>,

    /// Deprecated meta types, deleted on sight.
    #[serde(default)]
    pub remove: Vec<String>,
}

impl MetaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }
}
