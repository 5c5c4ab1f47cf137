//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Marshaled package summaries (human and JSON)
//! - Validation errors grouped by resource

use console::style;
use serde::Serialize;
use std::collections::BTreeMap;
use xpkg_core::PackageType;
use xpkg_marshal::{DependencySpec, PackageIdentity, ParsedPackage};

use crate::util::truncate_hash;

/// Serializable view of a marshaled package
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary<'a> {
    #[serde(flatten)]
    pub identity: &'a PackageIdentity,
    #[serde(rename = "type")]
    pub package_type: PackageType,
    pub meta_name: &'a str,
    pub crossplane: Option<&'a str>,
    pub objects: usize,
    pub dependencies: &'a [DependencySpec],
    pub gvks: Vec<String>,
}

impl<'a> PackageSummary<'a> {
    pub fn new(pkg: &'a ParsedPackage) -> Self {
        Self {
            identity: pkg.identity(),
            package_type: pkg.package_type(),
            meta_name: pkg.meta().name(),
            crossplane: pkg.meta().crossplane_constraint(),
            objects: pkg.objects().len(),
            dependencies: pkg.dependencies(),
            gvks: pkg.gvks().map(ToString::to_string).collect(),
        }
    }

    /// Print the summary for humans
    pub fn display(&self) {
        println!(
            "{} {} {}",
            style(self.package_type).cyan().bold(),
            self.identity.name,
            self.identity.version
        );
        println!();

        println!("  {}: {}", style("Meta").dim(), self.meta_name);
        println!("  {}: {}", style("Registry").dim(), self.identity.registry);
        if !self.identity.digest.is_empty() {
            println!(
                "  {}: {}...",
                style("Digest").dim(),
                truncate_hash(&self.identity.digest, 23)
            );
        }
        if let Some(constraint) = self.crossplane {
            println!("  {}: {}", style("Crossplane").dim(), constraint);
        }
        println!();

        println!(
            "{} ({}):",
            style("Dependencies").bold(),
            self.dependencies.len()
        );
        for dep in self.dependencies {
            println!(
                "  {} {} {}",
                style(dep.package_type).dim(),
                dep.package,
                style(&dep.constraints).yellow()
            );
        }
        println!();

        println!(
            "{} ({}, from {}):",
            style("Schemas").bold(),
            self.gvks.len(),
            pluralize(self.objects, "object", "objects")
        );
        for gvk in &self.gvks {
            println!("  {}", gvk);
        }
    }
}

/// A validation error with location information
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub resource: String,
    pub path: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Grouped validation results for display
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub validated_count: usize,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(
        &mut self,
        resource: &str,
        path: &str,
        message: &str,
        suggestion: Option<String>,
    ) {
        self.issues.push(ValidationIssue {
            resource: resource.to_string(),
            path: path.to_string(),
            message: message.to_string(),
            suggestion,
        });
    }

    /// Display errors grouped by resource
    pub fn display(&self) {
        let mut by_resource: BTreeMap<&str, Vec<&ValidationIssue>> = BTreeMap::new();
        for issue in &self.issues {
            by_resource.entry(&issue.resource).or_default().push(issue);
        }

        for (resource, issues) in by_resource {
            println!();
            println!("{}", style(resource).cyan().bold());

            for issue in issues {
                let path_display = if issue.path.is_empty() {
                    String::new()
                } else {
                    format!(" at {}", style(&issue.path).dim())
                };

                println!("  {} {}{}", style("✗").red(), issue.message, path_display);

                if let Some(suggestion) = &issue.suggestion {
                    println!("    {} {}", style("hint:").blue(), suggestion);
                }
            }
        }
    }

    /// Print summary line
    pub fn print_summary(&self) {
        if self.has_errors() {
            println!(
                "{} Validation failed: {} in {}",
                style("✗").red().bold(),
                pluralize(self.issues.len(), "error", "errors"),
                pluralize(self.validated_count, "resource", "resources")
            );
        } else {
            println!(
                "{} {} valid",
                style("✓").green().bold(),
                pluralize(self.validated_count, "resource", "resources")
            );
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
