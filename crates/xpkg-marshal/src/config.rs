//! Marshaler configuration
//!
//! Loaded from YAML, e.g.:
//!
//! ```yaml
//! defaultRegistry: xpkg.upbound.io
//! duplicateSchemas: reject
//! classification: strict
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use xpkg_core::ClassificationMode;
use xpkg_schema::DuplicatePolicy;

use crate::error::{MarshalError, Result};
use crate::package::DEFAULT_REGISTRY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarshalerConfig {
    /// Registry assumed when the caller does not name one
    pub default_registry: String,

    /// How duplicate GVK declarations are handled
    pub duplicate_schemas: DuplicatePolicy,

    /// How unrecognized meta kinds are classified
    pub classification: ClassificationMode,
}

impl Default for MarshalerConfig {
    fn default() -> Self {
        Self {
            default_registry: DEFAULT_REGISTRY.to_string(),
            duplicate_schemas: DuplicatePolicy::default(),
            classification: ClassificationMode::default(),
        }
    }
}

impl MarshalerConfig {
    /// Load configuration from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| MarshalError::Config {
            message: e.to_string(),
        })
    }
}
