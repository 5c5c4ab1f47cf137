//! xpkg Schema - validators for the resources a package defines
//!
//! This crate turns schema-bearing body objects into compiled validators:
//! - CustomResourceDefinitions (`v1beta1` and `v1`)
//! - CompositeResourceDefinitions (`v1beta1` and `v1`)
//!
//! Kubernetes structural schemas are converted to JSON Schema and compiled
//! with the `jsonschema` crate. The result is a [`SchemaIndex`] keyed by the
//! group/version/kind of each defined resource.

pub mod builder;
pub mod canonical;
pub mod error;
pub mod formats;
pub mod openapi;
pub mod validator;

pub use builder::{DuplicatePolicy, SchemaIndex, ValidatorBuilder, build_validators};
pub use canonical::{CanonicalDefinition, CanonicalVersion};
pub use error::{Result, SchemaError};
pub use validator::{SchemaValidator, ValidationErrorInfo, ValidationResult};
