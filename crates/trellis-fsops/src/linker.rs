//! Symlink and hardlink creation against the real filesystem.

use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use trellis_config::{ActionKind, ConflictChoice, ItemKind};
use trellis_core::{ConflictResolver, LinkEngine, PlannedOperation};

use crate::conflict::{existing_entry, remove_existing};
use crate::error::FsOpsError;

/// [`LinkEngine`] backed by the real filesystem.
///
/// Unlike copies, link failures are returned as errors; the workflow treats
/// them as fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLinker;

impl FsLinker {
    /// Create a link engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkEngine for FsLinker {
    async fn link_file(
        &self,
        operation: &PlannedOperation,
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<()> {
        link_operation(operation, resolver).await
    }

    async fn link_directory(
        &self,
        operation: &PlannedOperation,
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<()> {
        link_operation(operation, resolver).await
    }
}

async fn link_operation(
    operation: &PlannedOperation,
    resolver: &dyn ConflictResolver,
) -> anyhow::Result<()> {
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
                    "destination exists, skipping link"
                );
                return Ok(());
            }
            ConflictChoice::Abort => {
                return Err(FsOpsError::aborted("link.existing", destination).into());
            }
            ConflictChoice::Overwrite => remove_existing("link.overwrite", destination)?,
        }
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| FsOpsError::io("link.prepare", parent, error))?;
    }

    match operation.action {
        ActionKind::Symlink => create_symlink(source, destination, operation.kind)
            .map_err(|error| FsOpsError::io("link.symlink", destination, error))?,
        ActionKind::Hardlink => fs::hard_link(source, destination)
            .map_err(|error| FsOpsError::io("link.hardlink", destination, error))?,
        ActionKind::Copy => {
            return Err(FsOpsError::InvalidInput {
                field: "action",
                reason: "copy operations are not handled by the link engine",
                value: Some(operation.action.to_string()),
            }
            .into());
        }
    }
    debug!(
        source = %source.display(),
        destination = %destination.display(),
        action = %operation.action,
        "link created"
    );
    Ok(())
}

#[cfg(unix)]
fn create_symlink(source: &Path, destination: &Path, _kind: ItemKind) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn create_symlink(source: &Path, destination: &Path, kind: ItemKind) -> io::Result<()> {
    match kind {
        ItemKind::File => std::os::windows::fs::symlink_file(source, destination),
        ItemKind::Directory => std::os::windows::fs::symlink_dir(source, destination),
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, _destination: &Path, _kind: ItemKind) -> io::Result<()> {
    Err(io::Error::other(
        "symbolic links are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use trellis_core::SilentResolver;

    use super::*;

    type TestResult<T = ()> = anyhow::Result<T>;

    fn temp_dir() -> TestResult<tempfile::TempDir> {
        Ok(tempfile::Builder::new()
            .prefix("trellis-linker-")
            .tempdir()?)
    }

    fn operation(
        kind: ItemKind,
        action: ActionKind,
        source: PathBuf,
        destination: PathBuf,
    ) -> PlannedOperation {
        PlannedOperation {
            kind,
            action,
            attributes: None,
            source,
            destination,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_files_to_their_sources() -> TestResult {
        let temp = temp_dir()?;
        let source = temp.path().join("a.txt");
        fs::write(&source, "payload")?;
        let destination = temp.path().join("view").join("a.txt");

        FsLinker::new()
            .link_file(
                &operation(
                    ItemKind::File,
                    ActionKind::Symlink,
                    source.clone(),
                    destination.clone(),
                ),
                &SilentResolver::new(ConflictChoice::Skip),
            )
            .await?;

        assert!(fs::symlink_metadata(&destination)?.file_type().is_symlink());
        assert_eq!(fs::read_link(&destination)?, source);
        assert_eq!(fs::read_to_string(&destination)?, "payload");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_whole_directories() -> TestResult {
        let temp = temp_dir()?;
        let source = temp.path().join("tree");
        fs::create_dir_all(&source)?;
        fs::write(source.join("leaf.txt"), "leaf")?;
        let destination = temp.path().join("view").join("tree");

        FsLinker::new()
            .link_directory(
                &operation(
                    ItemKind::Directory,
                    ActionKind::Symlink,
                    source.clone(),
                    destination.clone(),
                ),
                &SilentResolver::new(ConflictChoice::Skip),
            )
            .await?;

        assert!(fs::symlink_metadata(&destination)?.file_type().is_symlink());
        assert_eq!(fs::read_to_string(destination.join("leaf.txt"))?, "leaf");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hardlinks_share_the_inode() -> TestResult {
        use std::os::unix::fs::MetadataExt;

        let temp = temp_dir()?;
        let source = temp.path().join("a.txt");
        fs::write(&source, "payload")?;
        let destination = temp.path().join("view").join("a.txt");

        FsLinker::new()
            .link_file(
                &operation(
                    ItemKind::File,
                    ActionKind::Hardlink,
                    source.clone(),
                    destination.clone(),
                ),
                &SilentResolver::new(ConflictChoice::Skip),
            )
            .await?;

        assert_eq!(
            fs::metadata(&source)?.ino(),
            fs::metadata(&destination)?.ino()
        );
        Ok(())
    }

    #[tokio::test]
    async fn abort_choice_fails_the_link() -> TestResult {
        let temp = temp_dir()?;
        let source = temp.path().join("a.txt");
        fs::write(&source, "new")?;
        let destination = temp.path().join("a-link.txt");
        fs::write(&destination, "old")?;

        let err = FsLinker::new()
            .link_file(
                &operation(
                    ItemKind::File,
                    ActionKind::Hardlink,
                    source,
                    destination.clone(),
                ),
                &SilentResolver::new(ConflictChoice::Abort),
            )
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("abort should fail the link"))?;

        let fsops = err
            .downcast_ref::<FsOpsError>()
            .ok_or_else(|| anyhow::anyhow!("error should be an fsops error"))?;
        assert!(matches!(
            fsops,
            FsOpsError::Aborted {
                operation: "link.existing",
                ..
            }
        ));
        assert_eq!(fs::read_to_string(destination)?, "old");
        Ok(())
    }

    #[tokio::test]
    async fn skip_choice_leaves_the_destination_alone() -> TestResult {
        let temp = temp_dir()?;
        let source = temp.path().join("a.txt");
        fs::write(&source, "new")?;
        let destination = temp.path().join("a-link.txt");
        fs::write(&destination, "old")?;

        FsLinker::new()
            .link_file(
                &operation(ItemKind::File, ActionKind::Hardlink, source, destination.clone()),
                &SilentResolver::new(ConflictChoice::Skip),
            )
            .await?;

        assert!(!fs::symlink_metadata(&destination)?.file_type().is_symlink());
        assert_eq!(fs::read_to_string(destination)?, "old");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn overwrite_choice_replaces_an_existing_file() -> TestResult {
        let temp = temp_dir()?;
        let source = temp.path().join("a.txt");
        fs::write(&source, "new")?;
        let destination = temp.path().join("a-link.txt");
        fs::write(&destination, "old")?;

        FsLinker::new()
            .link_file(
                &operation(
                    ItemKind::File,
                    ActionKind::Symlink,
                    source.clone(),
                    destination.clone(),
                ),
                &SilentResolver::new(ConflictChoice::Overwrite),
            )
            .await?;

        assert!(fs::symlink_metadata(&destination)?.file_type().is_symlink());
        assert_eq!(fs::read_link(&destination)?, source);
        Ok(())
    }
}
