//! Error types for package marshaling

use thiserror::Error;
use xpkg_core::{CoreError, LintError};
use xpkg_schema::SchemaError;

use crate::image::ImageError;

/// Marshaling errors
///
/// Each variant names the stage that failed and wraps the underlying cause.
#[derive(Debug, Error)]
pub enum MarshalError {
    // ============ Acquisition Errors ============
    #[error("failed to open package stream: {path} not found")]
    NotFound { path: String },

    #[error("invalid package path '{path}': expected <directory>@<version>")]
    InvalidInputPath { path: String },

    #[error("failed to pull digest from image: {message}")]
    DigestUnavailable { message: String },

    #[error("failed to read package image: {0}")]
    Image(#[from] ImageError),

    // ============ Parse / Lint Errors ============
    #[error("failed to parse package: {0}")]
    Parse(#[from] CoreError),

    #[error("package must contain exactly one meta object, found {found}")]
    NotExactlyOneMeta { found: usize },

    #[error("unknown package meta kind: {kind}")]
    UnknownMetaKind { kind: String },

    #[error("failed to lint package: {0}")]
    Lint(#[from] LintError),

    // ============ Finalize Errors ============
    #[error("failed to convert dependencies: meta object kind {kind} is not a package")]
    NotAPackage { kind: String },

    #[error("failed to build schema validators: {0}")]
    Schema(#[from] SchemaError),

    // ============ Configuration / IO Errors ============
    #[error("invalid marshaler configuration: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for marshaling operations
pub type Result<T> = std::result::Result<T, MarshalError>;

/// Flat error taxonomy for callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInputPath,
    ParseFailure,
    NotExactlyOneMeta,
    LintFailure,
    DependencyConversionFailure,
    UnknownObjectType,
    SchemaConversionFailure,
    DigestUnavailable,
    ConflictingSchema,
    UnknownMetaKind,
    /// The marshaler configuration itself is invalid
    Config,
    Io,
}

impl MarshalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInputPath { .. } => ErrorKind::InvalidInputPath,
            Self::DigestUnavailable { .. } => ErrorKind::DigestUnavailable,
            Self::Image(_) | Self::Io(_) => ErrorKind::Io,
            Self::Parse(CoreError::Io(_)) => ErrorKind::Io,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Config { .. } => ErrorKind::Config,
            Self::NotExactlyOneMeta { .. } => ErrorKind::NotExactlyOneMeta,
            Self::UnknownMetaKind { .. } => ErrorKind::UnknownMetaKind,
            Self::Lint(_) => ErrorKind::LintFailure,
            Self::NotAPackage { .. } => ErrorKind::DependencyConversionFailure,
            Self::Schema(SchemaError::UnknownObjectType { .. }) => ErrorKind::UnknownObjectType,
            Self::Schema(SchemaError::Conflicting { .. }) => ErrorKind::ConflictingSchema,
            Self::Schema(_) => ErrorKind::SchemaConversionFailure,
        }
    }
}
