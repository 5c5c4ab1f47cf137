//! Canonical representation of resource definitions
//!
//! Both CRD generations and both XRD generations are reduced to the same
//! shape: a group, a kind, and a list of versions each carrying an
//! optional schema. Legacy CRDs may also carry one schema shared by all
//! versions.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceValidation, JSONSchemaProps,
};
use xpkg_core::{CompositeResourceDefinition, GroupVersionKind, LegacyCustomResourceDefinition};

use crate::error::{Result, SchemaError};

/// A resource definition reduced to what validator building needs
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDefinition {
    /// Name of the defining object (e.g. `buckets.storage.example.org`)
    pub name: String,
    pub group: String,
    pub kind: String,
    /// Schema applied to every version, when present
    pub shared: Option<JSONSchemaProps>,
    pub versions: Vec<CanonicalVersion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalVersion {
    pub name: String,
    pub schema: Option<JSONSchemaProps>,
}

impl CanonicalDefinition {
    /// Reduce a legacy (`v1beta1`) CRD
    ///
    /// A CRD declaring only `spec.version` gets a single-entry version list;
    /// otherwise `spec.versions` is authoritative. Without a shared schema,
    /// a version that declares none gets the empty schema, which accepts
    /// any document.
    pub fn from_legacy_crd(crd: &LegacyCustomResourceDefinition) -> Result<Self> {
        let spec = &crd.spec;
        let name = crd.metadata.name.clone();
        let shared = validation_schema(spec.validation.as_ref());

        let mut versions = match (&spec.version, spec.versions.as_slice()) {
            (Some(version), []) => vec![CanonicalVersion {
                name: version.clone(),
                schema: None,
            }],
            (None, []) => {
                return Err(SchemaError::conversion(
                    name,
                    "neither spec.version nor spec.versions is set",
                ));
            }
            (_, listed) => listed
                .iter()
                .map(|v| CanonicalVersion {
                    name: v.name.clone(),
                    schema: validation_schema(v.schema.as_ref()),
                })
                .collect::<Vec<_>>(),
        };

        if shared.is_none() {
            for version in versions.iter_mut().filter(|v| v.schema.is_none()) {
                tracing::debug!(crd = %name, version = %version.name, "No schema declared, accepting any document");
                version.schema = Some(JSONSchemaProps::default());
            }
        }

        Ok(Self {
            name,
            group: spec.group.clone(),
            kind: spec.names.kind.clone(),
            shared,
            versions,
        })
    }

    /// Reduce a current (`v1`) CRD
    pub fn from_crd(crd: &CustomResourceDefinition) -> Self {
        let spec = &crd.spec;
        Self {
            name: crd.metadata.name.clone().unwrap_or_default(),
            group: spec.group.clone(),
            kind: spec.names.kind.clone(),
            shared: None,
            versions: spec
                .versions
                .iter()
                .map(|v| CanonicalVersion {
                    name: v.name.clone(),
                    schema: validation_schema(v.schema.as_ref()),
                })
                .collect(),
        }
    }

    /// Reduce an XRD of either generation
    ///
    /// XRD schemas arrive as raw JSON and are decoded here.
    pub fn from_xrd(xrd: &CompositeResourceDefinition) -> Result<Self> {
        let name = xrd.metadata.name.clone();
        let versions = xrd
            .spec
            .versions
            .iter()
            .map(|v| {
                let schema = match v.schema.as_ref().and_then(|s| s.open_api_v3_schema.as_ref()) {
                    Some(raw) => Some(
                        serde_json::from_slice::<JSONSchemaProps>(raw.as_bytes()).map_err(|e| {
                            SchemaError::conversion(
                                format!("{} version {}", name, v.name),
                                e.to_string(),
                            )
                        })?,
                    ),
                    None => None,
                };
                Ok(CanonicalVersion {
                    name: v.name.clone(),
                    schema,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            group: xrd.spec.group.clone(),
            kind: xrd.spec.names.kind.clone(),
            shared: None,
            versions,
            name,
        })
    }

    pub fn gvk(&self, version: &CanonicalVersion) -> GroupVersionKind {
        GroupVersionKind::new(&self.group, &version.name, &self.kind)
    }
}

fn validation_schema(validation: Option<&CustomResourceValidation>) -> Option<JSONSchemaProps> {
    validation.and_then(|v| v.open_api_v3_schema.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xpkg_core::Object;

    fn decode(yaml: &str) -> Object {
        let value: serde_json::Value = serde_yaml::from_str(yaml).unwrap();
        Object::decode(0, value).unwrap()
    }

    #[test]
    fn test_legacy_single_version_is_expanded() {
        let Object::CrdV1Beta1(crd) = decode(
            r#"
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: buckets.storage.example.org
spec:
  group: storage.example.org
  version: v1alpha1
  names:
    kind: Bucket
    plural: buckets
  validation:
    openAPIV3Schema:
      type: object
"#,
        ) else {
            panic!("expected legacy CRD");
        };

        let def = CanonicalDefinition::from_legacy_crd(&crd).unwrap();
        assert_eq!(def.versions.len(), 1);
        assert_eq!(def.versions[0].name, "v1alpha1");
        assert!(def.shared.is_some());
        assert_eq!(
            def.gvk(&def.versions[0]),
            GroupVersionKind::new("storage.example.org", "v1alpha1", "Bucket")
        );
    }

    #[test]
    fn test_legacy_versions_list_is_authoritative() {
        let Object::CrdV1Beta1(crd) = decode(
            r#"
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: buckets.storage.example.org
spec:
  group: storage.example.org
  version: v1
  versions:
    - name: v1alpha1
      served: true
      storage: true
    - name: v1
      served: true
      storage: false
  names:
    kind: Bucket
    plural: buckets
"#,
        ) else {
            panic!("expected legacy CRD");
        };

        let def = CanonicalDefinition::from_legacy_crd(&crd).unwrap();
        let names: Vec<&str> = def.versions.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["v1alpha1", "v1"]);
    }

    #[test]
    fn test_legacy_version_without_schema_gets_empty_schema() {
        let Object::CrdV1Beta1(crd) = decode(
            r#"
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: plain.example.org
spec:
  group: example.org
  version: v1
  names:
    kind: Plain
    plural: plains
"#,
        ) else {
            panic!("expected legacy CRD");
        };

        let def = CanonicalDefinition::from_legacy_crd(&crd).unwrap();
        assert!(def.shared.is_none());
        assert_eq!(def.versions[0].schema, Some(JSONSchemaProps::default()));
    }

    #[test]
    fn test_xrd_raw_schema_is_decoded() {
        let Object::XrdV1Beta1(xrd) = decode(
            r#"
apiVersion: apiextensions.crossplane.io/v1beta1
kind: CompositeResourceDefinition
metadata:
  name: xnetworks.platform.example.org
spec:
  group: platform.example.org
  names:
    kind: XNetwork
    plural: xnetworks
  versions:
    - name: v1alpha1
      referenceable: true
      served: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [cidr]
"#,
        ) else {
            panic!("expected legacy XRD");
        };

        let def = CanonicalDefinition::from_xrd(&xrd).unwrap();
        let schema = def.versions[0].schema.as_ref().unwrap();
        let spec = &schema.properties.as_ref().unwrap()["spec"];
        assert_eq!(spec.required.as_deref(), Some(&["cidr".to_string()][..]));
    }
}
