//! Package images
//!
//! A package image is an ordered list of filesystem layers. Its content is
//! read by flattening the layers into a single tar stream: later layers
//! overwrite earlier ones and OCI whiteout entries delete paths from the
//! layers below.

use flate2::read::GzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tar::{Archive, Builder, Header};
use thiserror::Error;

use crate::stream::DIGEST_PREFIX;

/// Prefix marking a deleted path in a layer
const WHITEOUT_PREFIX: &str = ".wh.";

/// Marker hiding every lower-layer entry of its directory
const OPAQUE_WHITEOUT: &str = ".wh..wh..opq";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image has no content digest")]
    NoDigest,

    #[error("failed to read layer {index}: {source}")]
    Layer {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid image archive: {message}")]
    Archive { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid image manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// A container image holding a package
pub trait PackageImage {
    /// Content digest of the image (`sha256:<hex>`)
    fn digest(&self) -> Result<String, ImageError>;

    /// Reader over the flattened image content, as a tar stream
    fn extract(&self) -> Result<Box<dyn Read + '_>, ImageError>;
}

/// One filesystem layer blob (plain or gzip-compressed tar)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Layer {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    fn reader(&self) -> Box<dyn Read + '_> {
        if self.data.starts_with(&GZIP_MAGIC) {
            Box::new(GzDecoder::new(self.data.as_slice()))
        } else {
            Box::new(self.data.as_slice())
        }
    }
}

/// An image held in memory as its layers
#[derive(Debug, Clone, Default)]
pub struct LayeredImage {
    digest: Option<String>,
    layers: Vec<Layer>,
}

impl LayeredImage {
    /// Build from a manifest and its layers; the digest is the manifest's SHA-256
    pub fn new(manifest: &[u8], layers: Vec<Layer>) -> Self {
        Self {
            digest: Some(sha256_digest(manifest)),
            layers,
        }
    }

    /// Build from layers alone; such an image reports no digest
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        Self {
            digest: None,
            layers,
        }
    }

    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Load an image saved as a tar archive
    ///
    /// An OCI image layout (`index.json` plus `blobs/sha256/`) is preferred:
    /// the image digest is the manifest digest `index.json` records, checked
    /// against the manifest blob. A legacy `docker save` archive only has a
    /// tagged `manifest.json`, so it loads without a digest.
    pub fn from_archive(path: &Path) -> Result<Self, ImageError> {
        let mut blobs = BTreeMap::new();
        let mut archive = Archive::new(File::open(path)?);
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = normalize_path(&entry.path()?.to_string_lossy());
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            blobs.insert(name, data);
        }

        let image = if let Some(index) = blobs.get("index.json") {
            Self::from_oci_layout(index, &blobs)?
        } else if let Some(manifest) = blobs.get("manifest.json") {
            Self::from_docker_save(manifest, &blobs)?
        } else {
            return Err(ImageError::Archive {
                message: "neither index.json nor manifest.json found".to_string(),
            });
        };

        tracing::debug!(
            path = %path.display(),
            layers = image.layers.len(),
            digest = image.digest.as_deref().unwrap_or("<none>"),
            "Loaded image archive"
        );
        Ok(image)
    }

    fn from_oci_layout(index: &[u8], blobs: &BTreeMap<String, Vec<u8>>) -> Result<Self, ImageError> {
        let index: OciIndex = serde_json::from_slice(index)?;
        let descriptor = index.manifests.first().ok_or_else(|| ImageError::Archive {
            message: "index.json lists no manifests".to_string(),
        })?;

        let manifest_bytes = oci_blob(blobs, &descriptor.digest)?;
        if sha256_digest(manifest_bytes) != descriptor.digest {
            return Err(ImageError::Archive {
                message: format!("manifest blob does not match digest {}", descriptor.digest),
            });
        }

        let manifest: OciManifest = serde_json::from_slice(manifest_bytes)?;
        let layers = manifest
            .layers
            .iter()
            .map(|layer| {
                oci_blob(blobs, &layer.digest)
                    .map(|data| Layer::new(layer.media_type.as_str(), data.to_vec()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(manifest_bytes, layers))
    }

    fn from_docker_save(manifest: &[u8], blobs: &BTreeMap<String, Vec<u8>>) -> Result<Self, ImageError> {
        let manifests: Vec<ArchiveManifest> = serde_json::from_slice(manifest)?;
        let manifest = manifests.first().ok_or_else(|| ImageError::Archive {
            message: "manifest.json lists no images".to_string(),
        })?;

        let layers = manifest
            .layers
            .iter()
            .map(|name| {
                blobs
                    .get(&normalize_path(name))
                    .map(|data| Layer::new(LAYER_MEDIA_TYPE, data.clone()))
                    .ok_or_else(|| ImageError::Archive {
                        message: format!("layer {} not found", name),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_layers(layers))
    }

    /// Apply every layer in order and return the resulting files
    pub fn flatten(&self) -> Result<BTreeMap<String, Vec<u8>>, ImageError> {
        let mut files = BTreeMap::new();
        for (index, layer) in self.layers.iter().enumerate() {
            apply_layer(&mut files, layer).map_err(|source| ImageError::Layer { index, source })?;
        }
        Ok(files)
    }
}

impl PackageImage for LayeredImage {
    fn digest(&self) -> Result<String, ImageError> {
        self.digest.clone().ok_or(ImageError::NoDigest)
    }

    fn extract(&self) -> Result<Box<dyn Read + '_>, ImageError> {
        let files = self.flatten()?;
        let mut builder = Builder::new(Vec::new());
        for (path, content) in &files {
            let mut header = Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            header.set_cksum();
            builder.append_data(&mut header, path, content.as_slice())?;
        }
        Ok(Box::new(Cursor::new(builder.into_inner()?)))
    }
}

impl From<oci_distribution::client::ImageData> for LayeredImage {
    fn from(image: oci_distribution::client::ImageData) -> Self {
        Self {
            digest: image.digest,
            layers: image
                .layers
                .into_iter()
                .map(|l| Layer::new(l.media_type, l.data))
                .collect(),
        }
    }
}

const LAYER_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar";

/// One image entry of a `docker save` manifest.json
#[derive(Deserialize)]
struct ArchiveManifest {
    #[serde(rename = "Layers", default)]
    layers: Vec<String>,
}

#[derive(Deserialize)]
struct OciIndex {
    #[serde(default)]
    manifests: Vec<OciDescriptor>,
}

#[derive(Deserialize)]
struct OciManifest {
    #[serde(default)]
    layers: Vec<OciDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OciDescriptor {
    #[serde(default = "default_layer_media_type")]
    media_type: String,
    digest: String,
}

fn default_layer_media_type() -> String {
    LAYER_MEDIA_TYPE.to_string()
}

/// Look up `sha256:<hex>` under `blobs/sha256/<hex>`
fn oci_blob<'a>(blobs: &'a BTreeMap<String, Vec<u8>>, digest: &str) -> Result<&'a [u8], ImageError> {
    let hex = digest
        .strip_prefix(DIGEST_PREFIX)
        .ok_or_else(|| ImageError::Archive {
            message: format!("unsupported digest {}", digest),
        })?;
    blobs
        .get(&format!("blobs/sha256/{}", hex))
        .map(Vec::as_slice)
        .ok_or_else(|| ImageError::Archive {
            message: format!("blob {} not found", digest),
        })
}

/// `sha256:<hex>` digest of some bytes
pub fn sha256_digest(data: &[u8]) -> String {
    format!("{}{}", DIGEST_PREFIX, hex::encode(Sha256::digest(data)))
}

fn apply_layer(files: &mut BTreeMap<String, Vec<u8>>, layer: &Layer) -> std::io::Result<()> {
    let mut deleted = BTreeSet::new();
    let mut opaque = BTreeSet::new();
    let mut added = Vec::new();

    let mut archive = Archive::new(layer.reader());
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = normalize_path(&entry.path()?.to_string_lossy());
        let (dir, base) = match path.rsplit_once('/') {
            Some((dir, base)) => (dir.to_string(), base.to_string()),
            None => (String::new(), path.clone()),
        };

        if base == OPAQUE_WHITEOUT {
            opaque.insert(dir);
        } else if let Some(hidden) = base.strip_prefix(WHITEOUT_PREFIX) {
            deleted.insert(join(&dir, hidden));
        } else if entry.header().entry_type().is_file() {
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            added.push((path, data));
        }
    }

    // Whiteouts only hide lower layers; entries of this layer are kept
    files.retain(|path, _| {
        !deleted.iter().any(|d| is_within(path, d)) && !opaque.iter().any(|d| is_below(path, d))
    });
    files.extend(added);
    Ok(())
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// `path` is `target` or lies below it
fn is_within(path: &str, target: &str) -> bool {
    path == target || is_below(path, target)
}

/// `path` lies strictly below directory `dir` (the empty string is the root)
fn is_below(path: &str, dir: &str) -> bool {
    dir.is_empty()
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn normalize_path(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_start_matches('/')
        .trim_end_matches('/')
        .to_string()
}
