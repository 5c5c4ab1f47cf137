//! The parsed package descriptor

use serde::Serialize;
use xpkg_core::{GroupVersionKind, Object, PackageMeta, PackageType};
use xpkg_schema::SchemaIndex;

use crate::deps::DependencySpec;

/// The public registry; packages hosted there are named by repository alone
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

/// Where a package came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageIdentity {
    /// Derived package name (see [`derive_package_name`])
    pub name: String,
    pub registry: String,
    pub repo_path: String,
    pub version: String,
    /// `sha256:<hex>`, or empty when the source carried no digest
    pub digest: String,
}

impl PackageIdentity {
    pub fn new(
        registry: impl Into<String>,
        repo_path: impl Into<String>,
        version: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        let registry = registry.into();
        let repo_path = repo_path.into();
        Self {
            name: derive_package_name(&registry, &repo_path),
            registry,
            repo_path,
            version: version.into(),
            digest: digest.into(),
        }
    }
}

/// Package name for a registry and repository path
pub fn derive_package_name(registry: &str, repo_path: &str) -> String {
    if registry == DEFAULT_REGISTRY {
        repo_path.to_string()
    } else {
        format!("{}/{}", registry, repo_path)
    }
}

/// A validated package, ready for dependency resolution
///
/// Built once per marshal call and never modified afterwards.
#[derive(Debug, Clone)]
pub struct ParsedPackage {
    pub(crate) meta: PackageMeta,
    pub(crate) objects: Vec<Object>,
    pub(crate) package_type: PackageType,
    pub(crate) dependencies: Vec<DependencySpec>,
    pub(crate) validators: SchemaIndex,
    pub(crate) identity: PackageIdentity,
}

impl ParsedPackage {
    pub fn meta(&self) -> &PackageMeta {
        &self.meta
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    pub fn validators(&self) -> &SchemaIndex {
        &self.validators
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn registry(&self) -> &str {
        &self.identity.registry
    }

    pub fn version(&self) -> &str {
        &self.identity.version
    }

    pub fn digest(&self) -> &str {
        &self.identity.digest
    }

    /// GVKs of every resource this package defines
    pub fn gvks(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.validators.gvks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_package_name() {
        assert_eq!(derive_package_name("index.docker.io", "myrepo"), "myrepo");
        assert_eq!(
            derive_package_name("index.docker.io", "crossplane/provider-aws"),
            "crossplane/provider-aws"
        );
        assert_eq!(
            derive_package_name("xpkg.upbound.io", "crossplane/provider-aws"),
            "xpkg.upbound.io/crossplane/provider-aws"
        );
        assert_eq!(derive_package_name("", "repo"), "/repo");
    }

    #[test]
    fn test_identity() {
        let id = PackageIdentity::new("registry.example.com", "team/pkg", "v0.1.0", "sha256:00");
        assert_eq!(id.name, "registry.example.com/team/pkg");
        assert_eq!(id.repo_path, "team/pkg");
        assert_eq!(id.version, "v0.1.0");
    }
}
