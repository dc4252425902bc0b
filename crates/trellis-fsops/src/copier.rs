//! Copy execution against the real filesystem.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use trellis_config::{ConflictChoice, ItemKind};
use trellis_core::{ConflictResolver, CopyEngine, CopyOutcome, PlannedOperation};
use walkdir::WalkDir;

use crate::conflict::{existing_entry, failure_detail, remove_existing};
use crate::error::{FsOpsError, FsOpsResult};

/// [`CopyEngine`] backed by the real filesystem.
///
/// Failures of individual operations are reported inside the returned
/// outcomes; an `Err` from a batch only signals that a conflict decision
/// could not be obtained.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FsCopier {
    /// Create a copy engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn copy_batch(
        operations: &[PlannedOperation],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<Vec<CopyOutcome>> {
        let mut outcomes = Vec::with_capacity(operations.len());
        for operation in operations {
            outcomes.push(copy_operation(operation, resolver).await?);
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl CopyEngine for FsCopier {
    async fn copy_files(
        &self,
        operations: &[PlannedOperation],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<Vec<CopyOutcome>> {
        Self::copy_batch(operations, resolver).await
    }

    async fn copy_directories(
        &self,
        operations: &[PlannedOperation],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<Vec<CopyOutcome>> {
        Self::copy_batch(operations, resolver).await
    }
}

async fn copy_operation(
    operation: &PlannedOperation,
    resolver: &dyn ConflictResolver,
) -> anyhow::Result<CopyOutcome> {
    let source = operation.source.as_path();
    let destination = operation.destination.as_path();

    if let Some(existing) = existing_entry(destination) {
        match resolver
            .resolve_existing_target(source, destination, &existing)
            .await?
        {
            ConflictChoice::Skip => {
                debug!(
                    destination = %destination.display(),
                    "destination exists, skipping copy"
                );
                return Ok(CopyOutcome::succeeded(source.into(), destination.into()));
            }
            ConflictChoice::Abort => {
                return Ok(CopyOutcome::failed(
                    source.into(),
                    destination.into(),
                    "destination already exists",
                ));
            }
            ConflictChoice::Overwrite => {
                if let Err(error) = remove_existing("copy.overwrite", destination) {
                    return Ok(CopyOutcome::failed(
                        source.into(),
                        destination.into(),
                        failure_detail(&error),
                    ));
                }
            }
        }
    }

    let copied = match operation.kind {
        ItemKind::File => copy_file(source, destination),
        ItemKind::Directory => copy_tree(source, destination),
    };
    match copied {
        Ok(()) => Ok(CopyOutcome::succeeded(source.into(), destination.into())),
        Err(error) => {
            debug!(
                source = %source.display(),
                destination = %destination.display(),
                error = %error,
                "copy failed"
            );
            Ok(CopyOutcome::failed(
                source.into(),
                destination.into(),
                failure_detail(&error),
            ))
        }
    }
}

fn copy_file(source: &Path, destination: &Path) -> FsOpsResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| FsOpsError::io("copy.prepare", parent, error))?;
    }
    fs::copy(source, destination).map_err(|error| FsOpsError::io("copy.file", destination, error))?;
    Ok(())
}

fn copy_tree(source: &Path, destination: &Path) -> FsOpsResult<()> {
    for result in WalkDir::new(source).follow_links(false) {
        let entry = result.map_err(|error| FsOpsError::walkdir("copy.walk", source, error))?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|error| FsOpsError::io("copy.prepare", &target, error))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|error| FsOpsError::io("copy.prepare", parent, error))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|error| FsOpsError::io("copy.file", &target, error))?;
        }
    }
    Ok(())
}
