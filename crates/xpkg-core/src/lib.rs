//! xpkg Core - Package object model, parsing and linting
//!
//! This crate provides the foundational types for reading Crossplane packages:
//! - `PackageMeta`: The package's own description (Provider / Configuration)
//! - `Object`: Schema-bearing body objects (CRDs, XRDs)
//! - `PackageParser`: Multi-document stream decoding
//! - `Linter`: Per-type structural checks

pub mod classify;
pub mod constraint;
pub mod error;
pub mod lint;
pub mod meta;
pub mod object;
pub mod package;
pub mod parser;
pub mod resource;

pub use classify::{ClassificationMode, UnknownMetaKind, classify};
pub use constraint::Constraint;
pub use error::{CoreError, LintError, Result};
pub use lint::{Linter, PackageLinter, configuration_linter, linter_for, provider_linter};
pub use meta::{
    CrossplaneConstraints, Dependency, MetaSpec, PackageMeta, PackageRef, PackageType,
};
pub use object::{DynamicObject, GroupVersionKind, ObjectMeta};
pub use package::Package;
pub use parser::{PackageParser, YamlParser};
pub use resource::{
    CompositeResourceDefinition, LegacyCustomResourceDefinition, Object, RawExtension,
};
