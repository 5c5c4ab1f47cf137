//! Validator index construction
//!
//! Every body object must be one of the four schema-bearing shapes. Each
//! declared version contributes one compiled validator, keyed by the GVK
//! of the resource it defines.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use xpkg_core::{GroupVersionKind, Object};

use crate::canonical::CanonicalDefinition;
use crate::error::{Result, SchemaError};
use crate::validator::{SchemaValidator, ValidationResult};

/// What to do when two versions declare the same GVK
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later declaration replaces the earlier one
    #[default]
    LastWriteWins,
    /// Fail the build
    Reject,
}

/// Compiled validators keyed by group/version/kind
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    validators: BTreeMap<GroupVersionKind, Arc<SchemaValidator>>,
}

impl SchemaIndex {
    pub fn get(&self, gvk: &GroupVersionKind) -> Option<&Arc<SchemaValidator>> {
        self.validators.get(gvk)
    }

    pub fn contains(&self, gvk: &GroupVersionKind) -> bool {
        self.validators.contains_key(gvk)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// GVKs in sorted order
    pub fn gvks(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.validators.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupVersionKind, &Arc<SchemaValidator>)> {
        self.validators.iter()
    }

    /// Validate a resource document by its own `apiVersion` and `kind`
    ///
    /// Returns `None` when the document names no indexed GVK.
    pub fn validate(&self, document: &Value) -> Option<ValidationResult> {
        let api_version = document.get("apiVersion")?.as_str()?;
        let kind = document.get("kind")?.as_str()?;
        let gvk = GroupVersionKind::from_api_version(api_version, kind);
        self.get(&gvk).map(|v| v.validate(document))
    }
}

/// Builds a [`SchemaIndex`] from body objects
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorBuilder {
    policy: DuplicatePolicy,
}

impl ValidatorBuilder {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn build(&self, objects: &[Object]) -> Result<SchemaIndex> {
        let mut index = SchemaIndex::default();

        for object in objects {
            let definition = match object {
                Object::CrdV1Beta1(crd) => CanonicalDefinition::from_legacy_crd(crd)?,
                Object::CrdV1(crd) => CanonicalDefinition::from_crd(crd),
                Object::XrdV1Beta1(xrd) | Object::XrdV1(xrd) => CanonicalDefinition::from_xrd(xrd)?,
                Object::Unknown(other) => {
                    return Err(SchemaError::UnknownObjectType {
                        api_version: other.api_version.clone(),
                        kind: other.kind.clone(),
                        name: other.metadata.name.clone(),
                    });
                }
            };
            self.add_definition(&mut index, &definition)?;
        }

        tracing::debug!(validators = index.len(), "Built schema index");
        Ok(index)
    }

    fn add_definition(&self, index: &mut SchemaIndex, def: &CanonicalDefinition) -> Result<()> {
        // A shared schema is compiled once and backs every version
        let shared = def
            .shared
            .as_ref()
            .map(|props| SchemaValidator::from_props(&def.name, props).map(Arc::new))
            .transpose()?;

        for version in &def.versions {
            let validator = match (&shared, &version.schema) {
                (Some(shared), _) => Arc::clone(shared),
                (None, Some(props)) => Arc::new(SchemaValidator::from_props(
                    &format!("{} version {}", def.name, version.name),
                    props,
                )?),
                (None, None) => {
                    return Err(SchemaError::conversion(
                        &def.name,
                        format!("version {} has no schema", version.name),
                    ));
                }
            };
            self.insert(index, def.gvk(version), validator)?;
        }
        Ok(())
    }

    fn insert(
        &self,
        index: &mut SchemaIndex,
        gvk: GroupVersionKind,
        validator: Arc<SchemaValidator>,
    ) -> Result<()> {
        if index.contains(&gvk) {
            match self.policy {
                DuplicatePolicy::Reject => return Err(SchemaError::Conflicting { gvk }),
                DuplicatePolicy::LastWriteWins => {
                    tracing::warn!(%gvk, "Duplicate schema declaration, keeping the last one");
                }
            }
        }
        index.validators.insert(gvk, validator);
        Ok(())
    }
}

/// Build validators with the default duplicate policy
pub fn build_validators(objects: &[Object]) -> Result<SchemaIndex> {
    ValidatorBuilder::default().build(objects)
}
