//! xpkg Marshal - from package artifact to validated package descriptor
//!
//! This crate provides:
//! - Stream acquisition from images ([`PackageImage`]) and directories ([`PackageFs`])
//! - Dependency extraction into a resolver-friendly shape
//! - The [`Marshaler`], producing immutable [`ParsedPackage`] values
//!
//! # Example
//!
//! ```no_run
//! use xpkg_marshal::{Marshaler, OsFs};
//!
//! let marshaler = Marshaler::new();
//! let pkg = marshaler.from_dir(
//!     &OsFs,
//!     "/cache/xpkg.upbound.io/crossplane/provider-aws@v0.20.0",
//!     "xpkg.upbound.io",
//!     "crossplane/provider-aws",
//! )?;
//!
//! for dep in pkg.dependencies() {
//!     println!("{} {}", dep.package, dep.constraints);
//! }
//! # Ok::<(), xpkg_marshal::MarshalError>(())
//! ```

pub mod config;
pub mod deps;
pub mod error;
pub mod fs;
pub mod image;
pub mod marshaler;
pub mod package;
pub mod stream;

pub use config::MarshalerConfig;
pub use deps::{DependencySpec, extract_dependencies};
pub use error::{ErrorKind, MarshalError, Result};
pub use fs::{FsEntry, MemFs, OsFs, PackageFs};
pub use image::{ImageError, Layer, LayeredImage, PackageImage};
pub use marshaler::{Marshaler, MarshalerBuilder};
pub use package::{DEFAULT_REGISTRY, PackageIdentity, ParsedPackage, derive_package_name};
pub use stream::{DIGEST_PREFIX, STREAM_FILE};
