//! The package marshaler
//!
//! Turns an image or a package directory into a [`ParsedPackage`]:
//!
//! 1. acquire the package stream (and content digest)
//! 2. parse it into meta and body objects
//! 3. classify the package from its single meta object and lint it
//! 4. extract dependencies and build schema validators
//! 5. assemble the package identity

use std::io::Read;
use xpkg_core::{
    Linter, Package, PackageMeta, PackageParser, PackageType, YamlParser, classify, linter_for,
};
use xpkg_schema::ValidatorBuilder;

use crate::config::MarshalerConfig;
use crate::deps::extract_dependencies;
use crate::error::{MarshalError, Result};
use crate::fs::PackageFs;
use crate::image::PackageImage;
use crate::package::{PackageIdentity, ParsedPackage};
use crate::stream::{acquire_from_directory, acquire_from_image};

/// Marshals packages; holds no per-call state and may be shared across threads
pub struct Marshaler {
    parser: Box<dyn PackageParser>,
    config: MarshalerConfig,
}

impl Default for Marshaler {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Marshaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Package contents that passed classification and linting
struct LintedPackage {
    meta: PackageMeta,
    package: Package,
    package_type: PackageType,
}

impl Marshaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MarshalerBuilder {
        MarshalerBuilder::default()
    }

    pub fn config(&self) -> &MarshalerConfig {
        &self.config
    }

    /// Marshal a package image
    ///
    /// The version is taken as given; the digest comes from the image.
    pub fn from_image(
        &self,
        registry: &str,
        repo: &str,
        version: &str,
        image: &dyn PackageImage,
    ) -> Result<ParsedPackage> {
        let stream = acquire_from_image(image)?;
        let mut reader = stream.reader;
        let linted = self.parse(&mut reader)?;
        self.finalize(registry, repo, version, &stream.digest, linted)
    }

    /// Marshal a package directory named `<directory>@<version>`
    pub fn from_dir(
        &self,
        fs: &dyn PackageFs,
        path: &str,
        registry: &str,
        repo: &str,
    ) -> Result<ParsedPackage> {
        let dir = acquire_from_directory(fs, path)?;
        let mut reader = dir.stream.reader;
        let linted = self.parse(&mut reader)?;
        self.finalize(registry, repo, &dir.version, &dir.stream.digest, linted)
    }

    /// Marshal a package directory with the configured default registry
    pub fn from_dir_default_registry(
        &self,
        fs: &dyn PackageFs,
        path: &str,
        repo: &str,
    ) -> Result<ParsedPackage> {
        self.from_dir(fs, path, &self.config.default_registry, repo)
    }

    fn parse(&self, reader: &mut dyn Read) -> Result<LintedPackage> {
        let package = self.parser.parse(reader)?;

        let meta = match package.meta() {
            [meta] => meta.clone(),
            metas => {
                return Err(MarshalError::NotExactlyOneMeta { found: metas.len() });
            }
        };

        let package_type = classify(&meta, self.config.classification).map_err(|unknown| {
            MarshalError::UnknownMetaKind { kind: unknown.0 }
        })?;

        linter_for(package_type).lint(&package)?;

        tracing::debug!(
            name = meta.name(),
            %package_type,
            objects = package.objects().len(),
            "Linted package"
        );

        Ok(LintedPackage {
            meta,
            package,
            package_type,
        })
    }

    fn finalize(
        &self,
        registry: &str,
        repo: &str,
        version: &str,
        digest: &str,
        linted: LintedPackage,
    ) -> Result<ParsedPackage> {
        let dependencies = extract_dependencies(&linted.meta)?;

        let (_, objects) = linted.package.into_parts();
        let validators = ValidatorBuilder::new(self.config.duplicate_schemas).build(&objects)?;

        let identity = PackageIdentity::new(registry, repo, version, digest);
        tracing::debug!(
            name = %identity.name,
            version = %identity.version,
            dependencies = dependencies.len(),
            validators = validators.len(),
            "Marshaled package"
        );

        Ok(ParsedPackage {
            meta: linted.meta,
            objects,
            package_type: linted.package_type,
            dependencies,
            validators,
            identity,
        })
    }
}

/// Builder for [`Marshaler`]
#[derive(Default)]
pub struct MarshalerBuilder {
    parser: Option<Box<dyn PackageParser>>,
    config: MarshalerConfig,
}

impl MarshalerBuilder {
    /// Use a custom package parser instead of [`YamlParser`]
    #[must_use]
    pub fn parser(mut self, parser: impl PackageParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    #[must_use]
    pub fn config(mut self, config: MarshalerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn default_registry(mut self, registry: impl Into<String>) -> Self {
        self.config.default_registry = registry.into();
        self
    }

    #[must_use]
    pub fn duplicate_schemas(mut self, policy: xpkg_schema::DuplicatePolicy) -> Self {
        self.config.duplicate_schemas = policy;
        self
    }

    #[must_use]
    pub fn classification(mut self, mode: xpkg_core::ClassificationMode) -> Self {
        self.config.classification = mode;
        self
    }

    pub fn build(self) -> Marshaler {
        Marshaler {
            parser: self.parser.unwrap_or_else(|| Box::new(YamlParser::new())),
            config: self.config,
        }
    }
}
