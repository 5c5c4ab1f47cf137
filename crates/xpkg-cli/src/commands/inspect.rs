//! Inspect command - marshal a package directory and show what it declares

use xpkg_marshal::{Marshaler, OsFs, ParsedPackage};

use crate::display::PackageSummary;
use crate::error::{CliError, Result};
use crate::util::default_repo;

pub fn run(
    marshaler: &Marshaler,
    path: &str,
    registry: Option<&str>,
    repo: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let pkg = marshal_dir(marshaler, path, registry, repo)?;
    report(&pkg, json_output)
}

/// Marshal a package directory from the local filesystem
pub(crate) fn marshal_dir(
    marshaler: &Marshaler,
    path: &str,
    registry: Option<&str>,
    repo: Option<&str>,
) -> Result<ParsedPackage> {
    let repo = repo.map_or_else(|| default_repo(path), str::to_string);
    let pkg = match registry {
        Some(registry) => marshaler.from_dir(&OsFs, path, registry, &repo)?,
        None => marshaler.from_dir_default_registry(&OsFs, path, &repo)?,
    };
    Ok(pkg)
}

/// Print a marshaled package, as JSON or for humans
pub(crate) fn report(pkg: &ParsedPackage, json_output: bool) -> Result<()> {
    let summary = PackageSummary::new(pkg);

    if json_output {
        let output = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", output);
    } else {
        summary.display();
    }

    Ok(())
}
