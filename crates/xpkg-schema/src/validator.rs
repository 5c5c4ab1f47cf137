//! Compiled resource validators

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{Result, SchemaError};
use crate::{formats, openapi};

/// A single validation complaint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorInfo {
    /// JSON pointer into the validated document (`(root)` for the document itself)
    pub path: String,
    pub message: String,
}

/// Result of schema validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Whether the document is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ValidationErrorInfo>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    /// Create a failed validation result with errors
    pub fn failure(errors: Vec<ValidationErrorInfo>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// Schema validator with cached compiled schema
pub struct SchemaValidator {
    /// The converted JSON Schema
    schema: Value,

    /// Compiled JSON Schema validator
    compiled: jsonschema::Validator,
}

impl SchemaValidator {
    /// Compile a JSON Schema document
    ///
    /// `object` names the definition the schema came from, for error messages.
    pub fn compile(object: &str, schema: Value) -> Result<Self> {
        let mut options = jsonschema::options();
        options
            .with_draft(jsonschema::Draft::Draft7)
            .should_validate_formats(true);
        for (name, check) in formats::CUSTOM_FORMATS {
            options.with_format(*name, *check);
        }

        let compiled = options
            .build(&schema)
            .map_err(|e| SchemaError::Compile {
                object: object.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { schema, compiled })
    }

    /// Convert a structural schema and compile it
    pub fn from_props(object: &str, props: &JSONSchemaProps) -> Result<Self> {
        let schema = openapi::to_json_schema(props)
            .map_err(|e| SchemaError::conversion(object, e.to_string()))?;
        Self::compile(object, schema)
    }

    /// Validate a document against the schema
    pub fn validate(&self, document: &Value) -> ValidationResult {
        if self.compiled.is_valid(document) {
            return ValidationResult::success();
        }

        let errors = self
            .compiled
            .iter_errors(document)
            .map(|e| {
                let path = e.instance_path.to_string();
                ValidationErrorInfo {
                    path: if path.is_empty() {
                        "(root)".to_string()
                    } else {
                        path
                    },
                    message: e.to_string().replace('"', "'"),
                }
            })
            .collect();

        ValidationResult::failure(errors)
    }

    pub fn is_valid(&self, document: &Value) -> bool {
        self.compiled.is_valid(document)
    }

    /// The converted JSON Schema
    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
