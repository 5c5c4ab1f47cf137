//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("document {index}: missing '{field}' field")]
    MissingField { index: usize, field: String },

    #[error("document {index}: expected a mapping, got {found}")]
    NotAnObject { index: usize, found: String },

    #[error("invalid {kind} '{name}': {message}")]
    InvalidObject {
        kind: String,
        name: String,
        message: String,
    },

    #[error("Failed to parse package YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to decode object: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Structural complaint raised by a package linter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LintError {
    #[error("not exactly one package meta type (found {found})")]
    NotExactlyOneMeta { found: usize },

    #[error("package meta kind is {found}, expected {expected}")]
    WrongMetaKind { expected: String, found: String },

    #[error("invalid Crossplane version constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    #[error("object {kind} '{name}' is not allowed in this package: expected {expected}")]
    UnexpectedObject {
        kind: String,
        name: String,
        expected: String,
    },
}
