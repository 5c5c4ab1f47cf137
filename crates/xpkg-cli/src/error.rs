//! CLI error types with exit code handling
//!
//! Every command returns a [`CliError`]; `main` renders it through miette
//! and exits with [`CliError::exit_code`].

use miette::Diagnostic;
use thiserror::Error;
use xpkg_marshal::{ErrorKind, MarshalError};

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// One or more resources failed schema validation
    #[error("Validation failed: {message}")]
    #[diagnostic(code(xpkg::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The package could not be marshaled
    #[error("Package error: {message}")]
    #[diagnostic(code(xpkg::cli::package))]
    Package {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Bad arguments (malformed package path, unreadable config)
    #[error("Invalid input: {message}")]
    #[diagnostic(code(xpkg::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(xpkg::cli::io))]
    Io { message: String },

    /// Internal error (unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(xpkg::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Package { .. } => exit_codes::PACKAGE_ERROR,
            CliError::Input { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<MarshalError> for CliError {
    fn from(err: MarshalError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::Io => CliError::Io { message },
            ErrorKind::InvalidInputPath => CliError::Input {
                message,
                help: Some("package directories are named <name>@<version>".to_string()),
            },
            ErrorKind::Config => CliError::Input {
                message,
                help: Some("see --config and XPKG_CONFIG".to_string()),
            },
            kind => CliError::Package {
                message,
                help: package_help(kind).map(str::to_string),
            },
        }
    }
}

fn package_help(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::NotExactlyOneMeta => {
            Some("a package declares exactly one meta.pkg.crossplane.io object")
        }
        ErrorKind::LintFailure => Some(
            "providers may only contain CRDs; configurations may only contain XRDs and Compositions",
        ),
        ErrorKind::ConflictingSchema => {
            Some("set `duplicateSchemas: last-write-wins` to let the last definition win")
        }
        ErrorKind::UnknownMetaKind => {
            Some("set `classification: lenient` to treat unknown kinds as providers")
        }
        _ => None,
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
