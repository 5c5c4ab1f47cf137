//! Shared utility functions for CLI commands

use std::path::Path;

/// Safely truncate a hash string to a maximum length
///
/// Keeps at most `max_len` characters, so the cut always lands on a char
/// boundary. Returns the entire string if it's shorter than `max_len`.
#[must_use]
pub fn truncate_hash(hash: &str, max_len: usize) -> &str {
    hash.char_indices()
        .nth(max_len)
        .map_or(hash, |(end, _)| &hash[..end])
}

/// Repository path assumed for a package directory when none is given
///
/// `/cache/provider-aws@v0.20.0` becomes `provider-aws`.
#[must_use]
pub fn default_repo(path: &str) -> String {
    let base = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match base.split_once('@') {
        Some((name, _)) => name.to_string(),
        None => base,
    }
}
