//! Inspect-image command - marshal a package image saved as a tar archive

use std::path::Path;
use xpkg_marshal::{LayeredImage, MarshalError, Marshaler};

use crate::commands::inspect::report;
use crate::error::Result;

pub fn run(
    marshaler: &Marshaler,
    archive: &Path,
    version: &str,
    registry: Option<&str>,
    repo: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let image = LayeredImage::from_archive(archive).map_err(MarshalError::from)?;

    let repo = match repo {
        Some(repo) => repo.to_string(),
        None => archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let registry = registry.unwrap_or(&marshaler.config().default_registry);

    let pkg = marshaler.from_image(registry, &repo, version, &image)?;
    report(&pkg, json_output)
}
