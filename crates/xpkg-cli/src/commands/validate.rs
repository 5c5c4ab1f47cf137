//! Validate command - validate resources against a package's schemas

use console::style;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use xpkg_marshal::Marshaler;

use crate::commands::inspect::marshal_dir;
use crate::display::{ValidationReport, pluralize};
use crate::error::{CliError, Result};

pub fn run(
    marshaler: &Marshaler,
    path: &str,
    resource_path: &Path,
    registry: Option<&str>,
    repo: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let pkg = marshal_dir(marshaler, path, registry, repo)?;

    if !json_output {
        println!(
            "{} Validating {} against {} {}",
            style("→").blue(),
            resource_path.display(),
            pkg.name(),
            pkg.version()
        );
    }

    let content = std::fs::read_to_string(resource_path)?;
    let documents = parse_documents(&content).map_err(|e| {
        CliError::input(format!("failed to parse {}: {}", resource_path.display(), e))
    })?;
    if documents.is_empty() {
        return Err(CliError::input(format!(
            "no resources found in {}",
            resource_path.display()
        )));
    }

    let mut report = ValidationReport::new();
    let mut results = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        let label = resource_label(index, document);
        report.validated_count += 1;

        match pkg.validators().validate(document) {
            Some(result) => {
                for error in &result.errors {
                    report.add_error(&label, &error.path, &error.message, None);
                }
                results.push(serde_json::json!({
                    "resource": label,
                    "valid": result.is_valid,
                    "errors": result.errors,
                }));
            }
            None => {
                let message = format!(
                    "no schema for {} in this package",
                    type_label(document)
                );
                let known = pkg
                    .gvks()
                    .map(|gvk| format!("{}/{}", gvk.api_version(), gvk.kind))
                    .collect::<Vec<_>>();
                let hint = if known.is_empty() {
                    "the package defines no resource types".to_string()
                } else {
                    format!("the package defines: {}", known.join(", "))
                };
                report.add_error(&label, "", &message, Some(hint));
                results.push(serde_json::json!({
                    "resource": label,
                    "valid": false,
                    "errors": [{ "path": "", "message": message }],
                }));
            }
        }
    }

    if json_output {
        let output = serde_json::json!({
            "valid": !report.has_errors(),
            "package": {
                "name": pkg.name(),
                "version": pkg.version(),
            },
            "resources": results,
        });
        let output = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", output);
    } else {
        report.display();
        println!();
        report.print_summary();
    }

    if report.has_errors() {
        return Err(CliError::validation_with_help(
            format!(
                "{} in {}",
                pluralize(report.issues.len(), "error", "errors"),
                resource_path.display()
            ),
            "resources are matched to schemas by apiVersion and kind",
        ));
    }

    Ok(())
}

/// Parse every non-empty YAML document of a stream
fn parse_documents(content: &str) -> std::result::Result<Vec<Value>, serde_yaml::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn type_label(document: &Value) -> String {
    let api_version = document
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or("<no apiVersion>");
    let kind = document
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("<no kind>");
    format!("{}/{}", api_version, kind)
}

/// `Kind/name` for display, falling back to the document position
fn resource_label(index: usize, document: &Value) -> String {
    let kind = document.get("kind").and_then(Value::as_str);
    let name = document.pointer("/metadata/name").and_then(Value::as_str);
    match (kind, name) {
        (Some(kind), Some(name)) => format!("{}/{}", kind, name),
        (Some(kind), None) => format!("{} (document {})", kind, index + 1),
        _ => format!("document {}", index + 1),
    }
}
