//! Package meta objects (`meta.pkg.crossplane.io`)
//!
//! Every package carries exactly one meta object describing the package
//! itself: its kind, the Crossplane versions it supports, and the packages
//! it depends on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::object::{DynamicObject, GroupVersionKind, ObjectMeta, split_api_version};

/// API group of package meta objects
pub const META_GROUP: &str = "meta.pkg.crossplane.io";

/// Kind of a provider package meta object
pub const PROVIDER_KIND: &str = "Provider";

/// Kind of a configuration package meta object
pub const CONFIGURATION_KIND: &str = "Configuration";

/// Package type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageType {
    Provider,
    Configuration,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => write!(f, "Provider"),
            Self::Configuration => write!(f, "Configuration"),
        }
    }
}

/// Reference to a depended-upon package, tagged with its type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageRef {
    Provider(String),
    Configuration(String),
}

impl PackageRef {
    /// The package reference (e.g. `xpkg.upbound.io/crossplane/provider-aws`)
    pub fn package(&self) -> &str {
        match self {
            Self::Provider(p) | Self::Configuration(p) => p,
        }
    }

    pub fn package_type(&self) -> PackageType {
        match self {
            Self::Provider(_) => PackageType::Provider,
            Self::Configuration(_) => PackageType::Configuration,
        }
    }
}

/// A dependency declared in `spec.dependsOn`
///
/// On the wire exactly one of `provider` or `configuration` is set.
/// Documents setting both or neither are rejected during decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DependencyDoc", into = "DependencyDoc")]
pub struct Dependency {
    /// The referenced package
    pub package: PackageRef,

    /// Version constraint (semver range)
    pub version: String,
}

#[derive(Serialize, Deserialize)]
struct DependencyDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    configuration: Option<String>,

    #[serde(default)]
    version: String,
}

impl TryFrom<DependencyDoc> for Dependency {
    type Error = String;

    fn try_from(doc: DependencyDoc) -> std::result::Result<Self, Self::Error> {
        let package = match (doc.provider, doc.configuration) {
            (Some(p), None) => PackageRef::Provider(p),
            (None, Some(c)) => PackageRef::Configuration(c),
            (Some(p), Some(c)) => {
                return Err(format!(
                    "dependency sets both provider '{}' and configuration '{}'",
                    p, c
                ));
            }
            (None, None) => {
                return Err("dependency must set one of provider or configuration".to_string());
            }
        };

        Ok(Self {
            package,
            version: doc.version,
        })
    }
}

impl From<Dependency> for DependencyDoc {
    fn from(dep: Dependency) -> Self {
        let (provider, configuration) = match dep.package {
            PackageRef::Provider(p) => (Some(p), None),
            PackageRef::Configuration(c) => (None, Some(c)),
        };
        Self {
            provider,
            configuration,
            version: dep.version,
        }
    }
}

/// Crossplane version constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossplaneConstraints {
    /// Semver range of supported Crossplane versions
    pub version: String,
}

/// Spec fields shared by every package meta kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossplane: Option<CrossplaneConstraints>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Dependency>,
}

/// Controller configuration of a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerSpec>,

    #[serde(flatten)]
    pub meta: MetaSpec,
}

/// `Provider` meta object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMeta {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ProviderSpec,
}

/// `Configuration` meta object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationMeta {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MetaSpec,
}

/// A decoded package meta object
#[derive(Debug, Clone, PartialEq)]
pub enum PackageMeta {
    Provider(ProviderMeta),
    Configuration(ConfigurationMeta),
    /// A meta-group object of a kind this crate has no typed model for
    Other(DynamicObject),
}

impl PackageMeta {
    /// Whether an `apiVersion` belongs to the package meta group
    pub fn is_meta_api_version(api_version: &str) -> bool {
        split_api_version(api_version).0 == META_GROUP
    }

    /// Decode a meta-group document
    pub fn decode(index: usize, value: Value) -> Result<Self> {
        let obj = DynamicObject::from_value(index, value)?;
        let invalid = |e: serde_json::Error, obj: &DynamicObject| CoreError::InvalidObject {
            kind: obj.kind.clone(),
            name: obj.metadata.name.clone(),
            message: e.to_string(),
        };

        match obj.kind.as_str() {
            PROVIDER_KIND => serde_json::from_value(obj.data.clone())
                .map(Self::Provider)
                .map_err(|e| invalid(e, &obj)),
            CONFIGURATION_KIND => serde_json::from_value(obj.data.clone())
                .map(Self::Configuration)
                .map_err(|e| invalid(e, &obj)),
            _ => Ok(Self::Other(obj)),
        }
    }

    pub fn api_version(&self) -> &str {
        match self {
            Self::Provider(p) => &p.api_version,
            Self::Configuration(c) => &c.api_version,
            Self::Other(o) => &o.api_version,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Provider(p) => &p.kind,
            Self::Configuration(c) => &c.kind,
            Self::Other(o) => &o.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Provider(p) => &p.metadata.name,
            Self::Configuration(c) => &c.metadata.name,
            Self::Other(o) => &o.metadata.name,
        }
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(self.api_version(), self.kind())
    }

    /// The package description of this meta object
    ///
    /// `None` when the kind carries no typed package description.
    pub fn package_spec(&self) -> Option<&MetaSpec> {
        match self {
            Self::Provider(p) => Some(&p.spec.meta),
            Self::Configuration(c) => Some(&c.spec),
            Self::Other(_) => None,
        }
    }

    /// Supported Crossplane version constraint, if declared
    pub fn crossplane_constraint(&self) -> Option<&str> {
        self.package_spec()
            .and_then(|s| s.crossplane.as_ref())
            .map(|c| c.version.as_str())
    }
}
