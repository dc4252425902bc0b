//! Temporary filesystem fixtures.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tempfile::{Builder, TempDir};

/// Create a labelled temporary directory.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn temp_dir(prefix: &str) -> anyhow::Result<TempDir> {
    Builder::new()
        .prefix(prefix)
        .tempdir()
        .context("failed to create temporary directory")
}

/// Write `files` under `root` as (relative path, contents) pairs, creating
/// parent directories as needed.
///
/// # Errors
///
/// Returns an error when a directory or file cannot be written.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> anyhow::Result<()> {
    for (relative, contents) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        fs::write(&path, contents)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
    }
    Ok(())
}
