//! Package stream parsing
//!
//! A package stream is a multi-document YAML stream. Documents in the
//! `meta.pkg.crossplane.io` group become meta objects; everything else
//! becomes a body object.

use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

use crate::error::{CoreError, Result};
use crate::meta::PackageMeta;
use crate::package::Package;
use crate::resource::Object;

/// Turns a package stream into a [`Package`]
pub trait PackageParser: Send + Sync {
    fn parse(&self, reader: &mut dyn Read) -> Result<Package>;
}

/// Default parser for multi-document YAML (and JSON) streams
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl YamlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an in-memory stream
    pub fn parse_str(&self, content: &str) -> Result<Package> {
        let mut meta = Vec::new();
        let mut objects = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
            let value = Value::deserialize(document)?;

            match &value {
                // Empty documents (`---\n---`) and comment-only documents
                Value::Null => continue,
                Value::Object(_) => {}
                other => {
                    return Err(CoreError::NotAnObject {
                        index,
                        found: value_kind(other).to_string(),
                    });
                }
            }

            let is_meta = value
                .get("apiVersion")
                .and_then(Value::as_str)
                .is_some_and(PackageMeta::is_meta_api_version);

            if is_meta {
                meta.push(PackageMeta::decode(index, value)?);
            } else {
                objects.push(Object::decode(index, value)?);
            }
        }

        tracing::debug!(
            meta = meta.len(),
            objects = objects.len(),
            "Parsed package stream"
        );

        Ok(Package::new(meta, objects))
    }
}

impl PackageParser for YamlParser {
    fn parse(&self, reader: &mut dyn Read) -> Result<Package> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.parse_str(&content)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = r#"
apiVersion: meta.pkg.crossplane.io/v1
kind: Provider
metadata:
  name: provider-example
spec:
  crossplane:
    version: ">=v1.0.0"
---
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.org
spec:
  group: example.org
  scope: Cluster
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
"#;

    #[test]
    fn test_parse_splits_meta_and_objects() {
        let pkg = YamlParser::new().parse_str(STREAM).unwrap();
        assert_eq!(pkg.meta().len(), 1);
        assert_eq!(pkg.objects().len(), 1);
        assert_eq!(pkg.meta()[0].name(), "provider-example");
        assert!(pkg.objects()[0].is_crd());
    }

    #[test]
    fn test_parse_from_reader() {
        let mut reader = STREAM.as_bytes();
        let pkg = YamlParser::new().parse(&mut reader).unwrap();
        assert_eq!(pkg.meta().len(), 1);
    }

    #[test]
    fn test_parse_skips_empty_documents() {
        let pkg = YamlParser::new()
            .parse_str("---\n---\n# only a comment\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n")
            .unwrap();
        assert!(pkg.meta().is_empty());
        assert_eq!(pkg.objects().len(), 1);
    }

    #[test]
    fn test_parse_empty_stream() {
        let pkg = YamlParser::new().parse_str("").unwrap();
        assert!(pkg.meta().is_empty());
        assert!(pkg.objects().is_empty());
    }

    #[test]
    fn test_parse_rejects_scalar_document() {
        let err = YamlParser::new()
            .parse_str("apiVersion: v1\nkind: ConfigMap\n---\njust a string\n")
            .unwrap_err();
        assert!(matches!(err, CoreError::NotAnObject { index: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_invalid_yaml() {
        let err = YamlParser::new().parse_str("kind: [unclosed").unwrap_err();
        assert!(matches!(err, CoreError::YamlParse(_)));
    }

    #[test]
    fn test_parse_keeps_multiple_meta_objects() {
        let stream = "apiVersion: meta.pkg.crossplane.io/v1\nkind: Provider\nmetadata:\n  name: a\n---\napiVersion: meta.pkg.crossplane.io/v1\nkind: Configuration\nmetadata:\n  name: b\n";
        let pkg = YamlParser::new().parse_str(stream).unwrap();
        assert_eq!(pkg.meta().len(), 2);
    }
}
