//! Shared handling for destinations that already exist.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FsOpsError, FsOpsResult};

/// What currently occupies `destination`: the referent for a symlink, the
/// destination path itself otherwise. `None` when nothing is there.
pub(crate) fn existing_entry(destination: &Path) -> Option<PathBuf> {
    let metadata = fs::symlink_metadata(destination).ok()?;
    if metadata.file_type().is_symlink() {
        Some(fs::read_link(destination).unwrap_or_else(|_| destination.to_path_buf()))
    } else {
        Some(destination.to_path_buf())
    }
}

/// Remove whatever occupies `destination`; symlinks are removed without
/// touching their referent.
pub(crate) fn remove_existing(operation: &'static str, destination: &Path) -> FsOpsResult<()> {
    let metadata = match fs::symlink_metadata(destination) {
        Ok(metadata) => metadata,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(FsOpsError::io(operation, destination, source)),
    };
    let removal = if metadata.file_type().is_dir() {
        fs::remove_dir_all(destination)
    } else {
        fs::remove_file(destination)
    };
    removal.map_err(|source| FsOpsError::io(operation, destination, source))
}

/// One-line failure description carrying the underlying error detail.
pub(crate) fn failure_detail(error: &FsOpsError) -> String {
    use std::error::Error as _;
    error.source().map_or_else(
        || error.to_string(),
        |source| format!("{error}: {source}"),
    )
}
