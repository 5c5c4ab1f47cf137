//! Error types for xpkg-schema

use thiserror::Error;
use xpkg_core::GroupVersionKind;

/// Result type for xpkg-schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while turning body objects into validators
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// Body object is not one of the schema-bearing shapes
    #[error("object is not a known type: {api_version}, Kind={kind} '{name}'")]
    UnknownObjectType {
        api_version: String,
        kind: String,
        name: String,
    },

    /// Schema definition could not be converted
    #[error("failed to convert schema of {object}: {message}")]
    Conversion { object: String, message: String },

    /// Converted schema was rejected by the schema compiler
    #[error("failed to compile schema of {object}: {message}")]
    Compile { object: String, message: String },

    /// Two versions declare the same GVK under the reject policy
    #[error("conflicting schemas for {gvk}")]
    Conflicting { gvk: GroupVersionKind },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn conversion(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            object: object.into(),
            message: message.into(),
        }
    }
}
