//! Dependency extraction

use serde::Serialize;
use xpkg_core::{Dependency, PackageMeta, PackageType};

use crate::error::{MarshalError, Result};

/// A declared dependency in the form consumed by resolvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySpec {
    /// Package reference (e.g. `xpkg.upbound.io/crossplane-contrib/provider-aws`)
    pub package: String,
    #[serde(rename = "type")]
    pub package_type: PackageType,
    /// Version constraint, as written
    pub constraints: String,
}

impl From<&Dependency> for DependencySpec {
    fn from(dep: &Dependency) -> Self {
        Self {
            package: dep.package.package().to_string(),
            package_type: dep.package.package_type(),
            constraints: dep.version.clone(),
        }
    }
}

/// Extract the dependencies declared by a meta object, in declaration order
pub fn extract_dependencies(meta: &PackageMeta) -> Result<Vec<DependencySpec>> {
    let spec = meta.package_spec().ok_or_else(|| MarshalError::NotAPackage {
        kind: meta.kind().to_string(),
    })?;
    Ok(spec.depends_on.iter().map(DependencySpec::from).collect())
}
