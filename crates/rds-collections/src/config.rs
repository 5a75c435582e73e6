use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CollectionError, CollectionResult};

/// Naming conventions shared by every adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    /// Namespace prepended to a tree's key to form its flat node map key.
    pub tree_prefix: String,
    /// Prefix for keys generated by algebra and copy operations.
    pub derived_key_prefix: String,
    /// Prefix for the placeholder written during interior list deletes.
    pub sentinel_prefix: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            tree_prefix: "tree:".into(),
            derived_key_prefix: String::new(),
            sentinel_prefix: "__rds_sentinel:".into(),
        }
    }
}

impl CollectionsConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> CollectionResult<Self> {
        toml::from_str(s).map_err(|e| CollectionError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> CollectionResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CollectionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}
