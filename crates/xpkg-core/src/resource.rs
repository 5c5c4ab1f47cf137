//! Body objects carried by a package
//!
//! Body objects are modeled as a closed set of schema-bearing shapes:
//!
//! | apiVersion                            | kind                         |
//! |---------------------------------------|------------------------------|
//! | `apiextensions.k8s.io/v1beta1`        | CustomResourceDefinition     |
//! | `apiextensions.k8s.io/v1`             | CustomResourceDefinition     |
//! | `apiextensions.crossplane.io/v1beta1` | CompositeResourceDefinition  |
//! | `apiextensions.crossplane.io/v1`      | CompositeResourceDefinition  |
//!
//! Anything else decodes into [`Object::Unknown`] so the caller decides
//! whether it is acceptable.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1 as crd_v1;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::object::{DynamicObject, GroupVersionKind, ObjectMeta};

pub use crd_v1::{CustomResourceDefinition, CustomResourceValidation, JSONSchemaProps};

/// API group of Kubernetes resource definitions
pub const K8S_APIEXTENSIONS_GROUP: &str = "apiextensions.k8s.io";

/// API group of Crossplane composite resource definitions and compositions
pub const XP_APIEXTENSIONS_GROUP: &str = "apiextensions.crossplane.io";

pub const CRD_KIND: &str = "CustomResourceDefinition";
pub const XRD_KIND: &str = "CompositeResourceDefinition";
pub const COMPOSITION_KIND: &str = "Composition";

/// Names of a defined resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNames {
    pub kind: String,

    #[serde(default)]
    pub plural: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_kind: Option<String>,
}

/// A `apiextensions.k8s.io/v1beta1` CustomResourceDefinition
///
/// The legacy generation allows a single top-level `spec.validation` schema
/// shared by every version, and a single `spec.version` in place of a
/// version list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCustomResourceDefinition {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: LegacyCrdSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCrdSpec {
    pub group: String,

    pub names: ResourceNames,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Single served version (superseded by `versions`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<LegacyCrdVersion>,

    /// Schema applied to every version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<CustomResourceValidation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCrdVersion {
    pub name: String,

    #[serde(default = "default_true")]
    pub served: bool,

    #[serde(default)]
    pub storage: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<CustomResourceValidation>,
}

/// A Crossplane CompositeResourceDefinition (either generation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinition {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: XrdSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XrdSpec {
    pub group: String,

    pub names: ResourceNames,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_names: Option<ResourceNames>,

    #[serde(default)]
    pub versions: Vec<XrdVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XrdVersion {
    pub name: String,

    #[serde(default = "default_true")]
    pub referenceable: bool,

    #[serde(default = "default_true")]
    pub served: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<XrdValidation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XrdValidation {
    #[serde(
        rename = "openAPIV3Schema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub open_api_v3_schema: Option<RawExtension>,
}

/// Embedded document kept as serialized JSON bytes
///
/// XRD schemas are not interpreted while decoding the package; they are
/// decoded into a schema definition only when validators are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtension(pub Vec<u8>);

impl RawExtension {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RawExtension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        serde_json::to_vec(&value)
            .map(RawExtension)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for RawExtension {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value: Value = serde_json::from_slice(&self.0).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

fn default_true() -> bool {
    true
}

/// A package body object
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// `apiextensions.k8s.io/v1beta1` CustomResourceDefinition
    CrdV1Beta1(Box<LegacyCustomResourceDefinition>),
    /// `apiextensions.k8s.io/v1` CustomResourceDefinition
    CrdV1(Box<CustomResourceDefinition>),
    /// `apiextensions.crossplane.io/v1beta1` CompositeResourceDefinition
    XrdV1Beta1(Box<CompositeResourceDefinition>),
    /// `apiextensions.crossplane.io/v1` CompositeResourceDefinition
    XrdV1(Box<CompositeResourceDefinition>),
    /// Any other object
    Unknown(Box<DynamicObject>),
}

impl Object {
    /// Decode a body document into its concrete shape
    ///
    /// Documents whose apiVersion and kind name a known shape must decode
    /// cleanly; a malformed CRD is an error, not an unknown object.
    pub fn decode(index: usize, value: Value) -> Result<Self> {
        let obj = DynamicObject::from_value(index, value)?;
        let gvk = obj.gvk();

        let decoded = match (gvk.group.as_str(), gvk.version.as_str(), gvk.kind.as_str()) {
            (K8S_APIEXTENSIONS_GROUP, "v1beta1", CRD_KIND) => {
                serde_json::from_value(obj.data.clone()).map(|c| Self::CrdV1Beta1(Box::new(c)))
            }
            (K8S_APIEXTENSIONS_GROUP, "v1", CRD_KIND) => {
                serde_json::from_value(obj.data.clone()).map(|c| Self::CrdV1(Box::new(c)))
            }
            (XP_APIEXTENSIONS_GROUP, "v1beta1", XRD_KIND) => {
                serde_json::from_value(obj.data.clone()).map(|x| Self::XrdV1Beta1(Box::new(x)))
            }
            (XP_APIEXTENSIONS_GROUP, "v1", XRD_KIND) => {
                serde_json::from_value(obj.data.clone()).map(|x| Self::XrdV1(Box::new(x)))
            }
            _ => return Ok(Self::Unknown(Box::new(obj))),
        };

        decoded.map_err(|e| CoreError::InvalidObject {
            kind: gvk.kind.clone(),
            name: obj.metadata.name.clone(),
            message: e.to_string(),
        })
    }

    /// GVK of the object itself (not of the resource it defines)
    pub fn gvk(&self) -> GroupVersionKind {
        match self {
            Self::CrdV1Beta1(_) => GroupVersionKind::new(K8S_APIEXTENSIONS_GROUP, "v1beta1", CRD_KIND),
            Self::CrdV1(_) => GroupVersionKind::new(K8S_APIEXTENSIONS_GROUP, "v1", CRD_KIND),
            Self::XrdV1Beta1(_) => GroupVersionKind::new(XP_APIEXTENSIONS_GROUP, "v1beta1", XRD_KIND),
            Self::XrdV1(_) => GroupVersionKind::new(XP_APIEXTENSIONS_GROUP, "v1", XRD_KIND),
            Self::Unknown(o) => o.gvk(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::CrdV1Beta1(c) => &c.metadata.name,
            Self::CrdV1(c) => c.metadata.name.as_deref().unwrap_or_default(),
            Self::XrdV1Beta1(x) | Self::XrdV1(x) => &x.metadata.name,
            Self::Unknown(o) => &o.metadata.name,
        }
    }

    /// Whether this is a CustomResourceDefinition of either generation
    pub fn is_crd(&self) -> bool {
        matches!(self, Self::CrdV1Beta1(_) | Self::CrdV1(_))
    }

    /// Whether this is a CompositeResourceDefinition of either generation
    pub fn is_xrd(&self) -> bool {
        matches!(self, Self::XrdV1Beta1(_) | Self::XrdV1(_))
    }

    /// Whether this is a Crossplane Composition
    pub fn is_composition(&self) -> bool {
        let gvk = self.gvk();
        gvk.group == XP_APIEXTENSIONS_GROUP && gvk.kind == COMPOSITION_KIND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_crd() -> Value {
        json!({
            "apiVersion": "apiextensions.k8s.io/v1beta1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": "buckets.storage.example.org" },
            "spec": {
                "group": "storage.example.org",
                "names": { "kind": "Bucket", "plural": "buckets" },
                "version": "v1alpha1",
                "validation": {
                    "openAPIV3Schema": {
                        "type": "object",
                        "properties": { "spec": { "type": "object" } }
                    }
                }
            }
        })
    }

    #[test]
    fn test_decode_legacy_crd() {
        let obj = Object::decode(0, legacy_crd()).unwrap();
        let Object::CrdV1Beta1(crd) = &obj else {
            panic!("expected legacy CRD, got {:?}", obj);
        };

        assert_eq!(crd.spec.group, "storage.example.org");
        assert_eq!(crd.spec.version.as_deref(), Some("v1alpha1"));
        assert!(crd.spec.versions.is_empty());
        assert!(crd.spec.validation.is_some());
        assert!(obj.is_crd());
        assert_eq!(obj.name(), "buckets.storage.example.org");
    }

    #[test]
    fn test_decode_v1_crd() {
        let obj = Object::decode(
            1,
            json!({
                "apiVersion": "apiextensions.k8s.io/v1",
                "kind": "CustomResourceDefinition",
                "metadata": { "name": "queues.messaging.example.org" },
                "spec": {
                    "group": "messaging.example.org",
                    "scope": "Namespaced",
                    "names": { "kind": "Queue", "plural": "queues" },
                    "versions": [{
                        "name": "v1",
                        "served": true,
                        "storage": true,
                        "schema": { "openAPIV3Schema": { "type": "object" } }
                    }]
                }
            }),
        )
        .unwrap();

        let Object::CrdV1(crd) = &obj else {
            panic!("expected v1 CRD, got {:?}", obj);
        };
        assert_eq!(crd.spec.names.kind, "Queue");
        assert_eq!(obj.name(), "queues.messaging.example.org");
    }

    #[test]
    fn test_decode_xrd_keeps_raw_schema() {
        let obj = Object::decode(
            0,
            json!({
                "apiVersion": "apiextensions.crossplane.io/v1",
                "kind": "CompositeResourceDefinition",
                "metadata": { "name": "xdatabases.platform.example.org" },
                "spec": {
                    "group": "platform.example.org",
                    "names": { "kind": "XDatabase", "plural": "xdatabases" },
                    "versions": [{
                        "name": "v1alpha1",
                        "served": true,
                        "referenceable": true,
                        "schema": {
                            "openAPIV3Schema": {
                                "type": "object",
                                "required": ["spec"]
                            }
                        }
                    }]
                }
            }),
        )
        .unwrap();

        let Object::XrdV1(xrd) = &obj else {
            panic!("expected v1 XRD, got {:?}", obj);
        };
        let raw = xrd.spec.versions[0]
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .unwrap();
        let schema: Value = serde_json::from_slice(raw.as_bytes()).unwrap();
        assert_eq!(schema["required"], json!(["spec"]));
        assert!(obj.is_xrd());
    }

    #[test]
    fn test_decode_unknown_object() {
        let obj = Object::decode(
            0,
            json!({
                "apiVersion": "apiextensions.crossplane.io/v1",
                "kind": "Composition",
                "metadata": { "name": "xdatabases.aws" }
            }),
        )
        .unwrap();

        assert!(matches!(obj, Object::Unknown(_)));
        assert!(obj.is_composition());
        assert!(!obj.is_crd());
    }

    #[test]
    fn test_decode_malformed_crd_is_error() {
        let err = Object::decode(
            0,
            json!({
                "apiVersion": "apiextensions.k8s.io/v1beta1",
                "kind": "CustomResourceDefinition",
                "metadata": { "name": "broken" },
                "spec": { "names": { "kind": "Broken" } }
            }),
        )
        .unwrap_err();

        assert!(err.to_string().contains("broken"));
        assert!(err.to_string().contains("group"));
    }
}
