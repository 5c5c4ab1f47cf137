//! Structural package linting
//!
//! A linter runs three groups of checks: checks over the whole package,
//! checks over each meta object, and checks over each body object. The
//! first failure is reported.

use crate::constraint::Constraint;
use crate::error::LintError;
use crate::meta::{CONFIGURATION_KIND, PROVIDER_KIND, PackageMeta, PackageType};
use crate::package::Package;
use crate::resource::Object;

pub type PackageCheck = fn(&Package) -> Result<(), LintError>;
pub type MetaCheck = fn(&PackageMeta) -> Result<(), LintError>;
pub type ObjectCheck = fn(&Object) -> Result<(), LintError>;

/// Validates the structure of a decoded package
pub trait Linter: Send + Sync {
    fn lint(&self, package: &Package) -> Result<(), LintError>;
}

/// Linter assembled from check functions
#[derive(Debug, Clone, Default)]
pub struct PackageLinter {
    package_checks: Vec<PackageCheck>,
    meta_checks: Vec<MetaCheck>,
    object_checks: Vec<ObjectCheck>,
}

impl PackageLinter {
    pub fn new(
        package_checks: Vec<PackageCheck>,
        meta_checks: Vec<MetaCheck>,
        object_checks: Vec<ObjectCheck>,
    ) -> Self {
        Self {
            package_checks,
            meta_checks,
            object_checks,
        }
    }
}

impl Linter for PackageLinter {
    fn lint(&self, package: &Package) -> Result<(), LintError> {
        for check in &self.package_checks {
            check(package)?;
        }
        for meta in package.meta() {
            for check in &self.meta_checks {
                check(meta)?;
            }
        }
        for object in package.objects() {
            for check in &self.object_checks {
                check(object)?;
            }
        }
        Ok(())
    }
}

/// Linter for provider packages
///
/// Requires one `Provider` meta object with a valid Crossplane constraint;
/// every body object must be a CustomResourceDefinition.
pub fn provider_linter() -> PackageLinter {
    PackageLinter::new(
        vec![one_meta],
        vec![is_provider, valid_crossplane_constraint],
        vec![is_crd],
    )
}

/// Linter for configuration packages
///
/// Requires one `Configuration` meta object with a valid Crossplane
/// constraint; every body object must be a CompositeResourceDefinition or
/// a Composition.
pub fn configuration_linter() -> PackageLinter {
    PackageLinter::new(
        vec![one_meta],
        vec![is_configuration, valid_crossplane_constraint],
        vec![is_xrd_or_composition],
    )
}

/// The linter for a package type
pub fn linter_for(package_type: PackageType) -> PackageLinter {
    match package_type {
        PackageType::Provider => provider_linter(),
        PackageType::Configuration => configuration_linter(),
    }
}

pub fn one_meta(package: &Package) -> Result<(), LintError> {
    match package.meta().len() {
        1 => Ok(()),
        found => Err(LintError::NotExactlyOneMeta { found }),
    }
}

pub fn is_provider(meta: &PackageMeta) -> Result<(), LintError> {
    match meta {
        PackageMeta::Provider(_) => Ok(()),
        other => Err(LintError::WrongMetaKind {
            expected: PROVIDER_KIND.to_string(),
            found: other.kind().to_string(),
        }),
    }
}

pub fn is_configuration(meta: &PackageMeta) -> Result<(), LintError> {
    match meta {
        PackageMeta::Configuration(_) => Ok(()),
        other => Err(LintError::WrongMetaKind {
            expected: CONFIGURATION_KIND.to_string(),
            found: other.kind().to_string(),
        }),
    }
}

/// An absent constraint is valid; a present one must parse
pub fn valid_crossplane_constraint(meta: &PackageMeta) -> Result<(), LintError> {
    let Some(constraint) = meta.crossplane_constraint() else {
        return Ok(());
    };
    Constraint::parse(constraint)
        .map(|_| ())
        .map_err(|e| LintError::InvalidConstraint {
            constraint: constraint.to_string(),
            reason: e.to_string(),
        })
}

pub fn is_crd(object: &Object) -> Result<(), LintError> {
    if object.is_crd() {
        return Ok(());
    }
    Err(unexpected(object, "CustomResourceDefinition"))
}

pub fn is_xrd_or_composition(object: &Object) -> Result<(), LintError> {
    if object.is_xrd() || object.is_composition() {
        return Ok(());
    }
    Err(unexpected(
        object,
        "CompositeResourceDefinition or Composition",
    ))
}

fn unexpected(object: &Object, expected: &str) -> LintError {
    LintError::UnexpectedObject {
        kind: object.gvk().to_string(),
        name: object.name().to_string(),
        expected: expected.to_string(),
    }
}
