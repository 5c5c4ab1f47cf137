//! Filesystem abstraction for directory packages
//!
//! Directory packages are read through [`PackageFs`] so the same code path
//! serves the host filesystem ([`OsFs`]) and in-memory trees ([`MemFs`]).

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// An entry returned by a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Read-only filesystem view
pub trait PackageFs: Send + Sync {
    /// List the immediate children of a directory, sorted by name
    fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>>;

    /// Open a file for reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// List everything below `root`, depth first, sorted by name
    ///
    /// A directory is listed before its contents; `root` itself is not listed.
    fn walk(&self, root: &Path) -> io::Result<Vec<FsEntry>> {
        let mut entries = Vec::new();
        for entry in self.read_dir(root)? {
            let descend = entry.is_dir.then(|| entry.path.clone());
            entries.push(entry);
            if let Some(dir) = descend {
                entries.extend(self.walk(&dir)?);
            }
        }
        Ok(entries)
    }
}

/// The host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl PackageFs for OsFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| -> io::Result<FsEntry> {
                let entry = entry?;
                Ok(FsEntry {
                    path: entry.path(),
                    is_dir: entry.file_type()?.is_dir(),
                })
            })
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn walk(&self, root: &Path) -> io::Result<Vec<FsEntry>> {
        walkdir::WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| -> io::Result<FsEntry> {
                let entry = entry?;
                Ok(FsEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                })
            })
            .collect()
    }
}

/// An in-memory filesystem
///
/// Only files are stored; directories exist implicitly as path prefixes.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style [`MemFs::insert`]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }
}

impl PackageFs for MemFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        if self.files.contains_key(path) {
            return Err(io::Error::other(format!("{} is not a directory", path.display())));
        }

        let mut children: BTreeMap<PathBuf, bool> = BTreeMap::new();
        for file in self.files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let is_dir = components.next().is_some();
            *children.entry(path.join(first)).or_default() |= is_dir;
        }

        if children.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }

        Ok(children
            .into_iter()
            .map(|(path, is_dir)| FsEntry { path, is_dir })
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        self.files
            .get(path)
            .map(|content| Box::new(Cursor::new(content.as_slice())) as Box<dyn Read + '_>)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                )
            })
    }
}
