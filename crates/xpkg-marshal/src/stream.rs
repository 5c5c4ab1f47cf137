//! Package stream acquisition
//!
//! Locates the package manifest stream inside an image, or assembles it
//! from the files of a package directory.

use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use tar::Archive;

use crate::error::{MarshalError, Result};
use crate::fs::PackageFs;
use crate::image::PackageImage;

/// Name of the package manifest stream inside an image
pub const STREAM_FILE: &str = "package.yaml";

/// Prefix of content digests, and of the digest marker file in a package directory
pub const DIGEST_PREFIX: &str = "sha256:";

/// Separator between files of a directory stream
const DOCUMENT_SEPARATOR: &[u8] = b"\n---\n";

/// A package stream and the digest of the content it came from
pub struct AcquiredStream<'a> {
    /// Content digest, empty when the source carries none
    pub digest: String,
    pub reader: Box<dyn Read + 'a>,
}

/// A stream acquired from a `<directory>@<version>` path
pub struct DirectoryPackage<'a> {
    /// The directory that was read (the full input path)
    pub directory: PathBuf,
    /// Version tag taken from the input path
    pub version: String,
    pub stream: AcquiredStream<'a>,
}

/// Open the package stream of an image
///
/// The digest is read first; an image without one cannot be marshaled.
pub fn acquire_from_image(image: &dyn PackageImage) -> Result<AcquiredStream<'static>> {
    let digest = image
        .digest()
        .map_err(|e| MarshalError::DigestUnavailable {
            message: e.to_string(),
        })?;

    let mut archive = Archive::new(image.extract()?);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_stream = entry
            .path()?
            .components()
            .eq(Path::new(STREAM_FILE).components());
        if is_stream {
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            tracing::debug!(%digest, bytes = content.len(), "Opened image package stream");
            return Ok(AcquiredStream {
                digest,
                reader: Box::new(Cursor::new(content)),
            });
        }
    }

    Err(MarshalError::NotFound {
        path: STREAM_FILE.to_string(),
    })
}

/// Split `<directory>@<version>`; exactly one `@` is allowed
pub fn split_versioned_path(path: &str) -> Result<&str> {
    match path.split('@').collect::<Vec<_>>().as_slice() {
        [_, version] => Ok(*version),
        _ => Err(MarshalError::InvalidInputPath {
            path: path.to_string(),
        }),
    }
}

/// Assemble the package stream of a directory
///
/// Every file below the directory joins the stream, in walk order, except a
/// file whose name starts with `sha256:`: that name is the content digest.
/// When several such files exist the last one walked wins.
pub fn acquire_from_directory<'a>(
    fs: &'a dyn PackageFs,
    path: &str,
) -> Result<DirectoryPackage<'a>> {
    let version = split_versioned_path(path)?.to_string();
    let directory = PathBuf::from(path);

    let entries = fs.walk(&directory).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MarshalError::NotFound {
            path: path.to_string(),
        },
        _ => MarshalError::Io(e),
    })?;

    let mut digest = String::new();
    let mut files = Vec::new();
    for entry in entries.into_iter().filter(|e| !e.is_dir) {
        let base = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if base.starts_with(DIGEST_PREFIX) {
            digest = base;
        } else {
            files.push(entry.path);
        }
    }

    tracing::debug!(
        directory = %directory.display(),
        files = files.len(),
        digest = %digest,
        "Collected package directory"
    );

    Ok(DirectoryPackage {
        directory,
        version,
        stream: AcquiredStream {
            digest,
            reader: Box::new(DirectoryStream::new(fs, files)),
        },
    })
}

/// Lazily concatenates files, separated by a YAML document break
pub struct DirectoryStream<'a> {
    fs: &'a dyn PackageFs,
    files: std::vec::IntoIter<PathBuf>,
    current: Option<Box<dyn Read + 'a>>,
    separator: &'static [u8],
    started: bool,
}

impl<'a> DirectoryStream<'a> {
    pub fn new(fs: &'a dyn PackageFs, files: Vec<PathBuf>) -> Self {
        Self {
            fs,
            files: files.into_iter(),
            current: None,
            separator: &[],
            started: false,
        }
    }
}

impl Read for DirectoryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if !self.separator.is_empty() {
                let n = self.separator.len().min(buf.len());
                buf[..n].copy_from_slice(&self.separator[..n]);
                self.separator = &self.separator[n..];
                return Ok(n);
            }

            if let Some(reader) = self.current.as_mut() {
                let n = reader.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
                self.current = None;
            }

            let Some(path) = self.files.next() else {
                return Ok(0);
            };
            if self.started {
                self.separator = DOCUMENT_SEPARATOR;
            }
            self.started = true;
            self.current = Some(self.fs.open(&path)?);
        }
    }
}
