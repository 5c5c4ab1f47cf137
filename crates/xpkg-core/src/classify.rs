//! Package type classification

use serde::{Deserialize, Serialize};

use crate::meta::{PackageMeta, PackageType};

/// How meta objects of an unrecognized kind are classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMode {
    /// Anything that is not a `Configuration` is treated as a provider
    #[default]
    Lenient,
    /// Only `Provider` and `Configuration` are accepted
    Strict,
}

/// Meta kind rejected by strict classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetaKind(pub String);

/// Decide the package type from its meta object
pub fn classify(
    meta: &PackageMeta,
    mode: ClassificationMode,
) -> Result<PackageType, UnknownMetaKind> {
    match (meta, mode) {
        (PackageMeta::Configuration(_), _) => Ok(PackageType::Configuration),
        (PackageMeta::Provider(_), _) => Ok(PackageType::Provider),
        (PackageMeta::Other(_), ClassificationMode::Lenient) => Ok(PackageType::Provider),
        (PackageMeta::Other(o), ClassificationMode::Strict) => Err(UnknownMetaKind(o.kind.clone())),
    }
}
