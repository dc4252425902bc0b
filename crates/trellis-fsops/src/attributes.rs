//! Attribute adjustment for materialized destinations.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use trellis_config::{ConflictChoice, ItemKind};
use trellis_core::{AttributeAdjuster, AttributeAdjustment, ConflictResolver};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Name of the prior-state record written under the target root.
pub const BACKUP_FILE_NAME: &str = ".trellis-attributes.csv";

/// [`AttributeAdjuster`] backed by the real filesystem.
///
/// Directory adjustments recurse through the destination, following links so
/// that symlinked trees are adjusted through the view. Prior readonly states
/// are recorded in a CSV backup under the target root before anything
/// changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAttributeAdjuster;

impl FsAttributeAdjuster {
    /// Create an attribute adjuster.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttributeAdjuster for FsAttributeAdjuster {
    async fn apply(
        &self,
        adjustments: &[AttributeAdjustment],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<()> {
        let mut grouped: BTreeMap<&Path, Vec<&AttributeAdjustment>> = BTreeMap::new();
        for adjustment in adjustments {
            grouped
                .entry(adjustment.target_root.as_path())
                .or_default()
                .push(adjustment);
        }
        for (target_root, group) in grouped {
            apply_group(target_root, &group, resolver).await?;
        }
        Ok(())
    }
}

struct TargetState {
    path: PathBuf,
    was_read_only: bool,
    read_only: bool,
}

async fn apply_group(
    target_root: &Path,
    adjustments: &[&AttributeAdjustment],
    resolver: &dyn ConflictResolver,
) -> anyhow::Result<()> {
    let targets = collect_targets(adjustments)?;
    if targets.is_empty() {
        return Ok(());
    }
    write_backup(target_root, &targets, resolver).await?;
    for target in &targets {
        set_read_only(&target.path, target.read_only)?;
    }
    debug!(
        target_root = %target_root.display(),
        targets = targets.len(),
        "attributes adjusted"
    );
    Ok(())
}

fn collect_targets(adjustments: &[&AttributeAdjustment]) -> FsOpsResult<Vec<TargetState>> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for adjustment in adjustments {
        let read_only = adjustment.spec.read_only;
        match adjustment.kind {
            ItemKind::File => {
                push_target(&mut seen, &mut targets, adjustment.destination.clone(), read_only)?;
            }
            ItemKind::Directory => {
                for result in WalkDir::new(&adjustment.destination).follow_links(true) {
                    let entry = result.map_err(|error| {
                        FsOpsError::walkdir("attributes.walk", &adjustment.destination, error)
                    })?;
                    push_target(&mut seen, &mut targets, entry.path().to_path_buf(), read_only)?;
                }
            }
        }
    }
    Ok(targets)
}

fn push_target(
    seen: &mut HashSet<PathBuf>,
    targets: &mut Vec<TargetState>,
    path: PathBuf,
    read_only: bool,
) -> FsOpsResult<()> {
    if !seen.insert(path.clone()) {
        return Ok(());
    }
    let metadata =
        fs::metadata(&path).map_err(|error| FsOpsError::io("attributes.inspect", &path, error))?;
    targets.push(TargetState {
        was_read_only: metadata.permissions().readonly(),
        read_only,
        path,
    });
    Ok(())
}

async fn write_backup(
    target_root: &Path,
    targets: &[TargetState],
    resolver: &dyn ConflictResolver,
) -> anyhow::Result<()> {
    let backup_path = target_root.join(BACKUP_FILE_NAME);
    if backup_path.exists() {
        match resolver.resolve_existing_backup(&backup_path).await? {
            ConflictChoice::Overwrite => {}
            ConflictChoice::Skip => {
                debug!(
                    path = %backup_path.display(),
                    "keeping existing attribute backup"
                );
                return Ok(());
            }
            ConflictChoice::Abort => {
                return Err(FsOpsError::aborted("attributes.backup", backup_path).into());
            }
        }
    }

    fs::create_dir_all(target_root)
        .map_err(|error| FsOpsError::io("attributes.backup", target_root, error))?;
    let mut contents = String::from("path,readonly\n");
    for target in targets {
        contents.push_str(&format!(
            "{},{}\n",
            target.path.display(),
            target.was_read_only
        ));
    }
    fs::write(&backup_path, contents)
        .map_err(|error| FsOpsError::io("attributes.backup", &backup_path, error))?;
    Ok(())
}

fn set_read_only(path: &Path, read_only: bool) -> FsOpsResult<()> {
    let metadata =
        fs::metadata(path).map_err(|error| FsOpsError::io("attributes.inspect", path, error))?;
    let mut permissions = metadata.permissions();
    if permissions.readonly() == read_only {
        return Ok(());
    }
    permissions.set_readonly(read_only);
    fs::set_permissions(path, permissions)
        .map_err(|error| FsOpsError::io("attributes.apply", path, error))
}

#[cfg(test)]
mod tests {
    use trellis_config::{ActionKind, AttributeSpec};
    use trellis_core::SilentResolver;

    use super::*;

    type TestResult<T = ()> = anyhow::Result<T>;

    fn temp_dir() -> TestResult<tempfile::TempDir> {
        Ok(tempfile::Builder::new()
            .prefix("trellis-attributes-")
            .tempdir()?)
    }

    fn adjustment(
        kind: ItemKind,
        destination: PathBuf,
        target_root: PathBuf,
        read_only: bool,
    ) -> AttributeAdjustment {
        AttributeAdjustment {
            kind,
            action: ActionKind::Symlink,
            spec: AttributeSpec { read_only },
            source: destination.clone(),
            destination,
            target_root,
        }
    }

    fn restore_writable(root: &Path) -> TestResult {
        for entry in WalkDir::new(root) {
            let entry = entry?;
            let mut permissions = fs::metadata(entry.path())?.permissions();
            permissions.set_readonly(false);
            fs::set_permissions(entry.path(), permissions)?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn adjusts_a_file_and_records_its_prior_state() -> TestResult {
        let temp = temp_dir()?;
        let destination = temp.path().join("a.txt");
        fs::write(&destination, "payload")?;

        FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::File,
                    destination.clone(),
                    temp.path().to_path_buf(),
                    true,
                )],
                &SilentResolver::new(ConflictChoice::Overwrite),
            )
            .await?;

        assert!(fs::metadata(&destination)?.permissions().readonly());
        let backup = fs::read_to_string(temp.path().join(BACKUP_FILE_NAME))?;
        assert!(backup.starts_with("path,readonly\n"));
        assert!(backup.contains(&format!("{},false", destination.display())));

        restore_writable(temp.path())?;
        Ok(())
    }

    #[tokio::test]
    async fn directory_adjustments_recurse() -> TestResult {
        let temp = temp_dir()?;
        let tree = temp.path().join("tree");
        fs::create_dir_all(tree.join("nested"))?;
        let leaf = tree.join("nested").join("leaf.txt");
        fs::write(&leaf, "leaf")?;

        FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::Directory,
                    tree.clone(),
                    temp.path().to_path_buf(),
                    true,
                )],
                &SilentResolver::new(ConflictChoice::Overwrite),
            )
            .await?;

        assert!(fs::metadata(&tree)?.permissions().readonly());
        assert!(fs::metadata(&leaf)?.permissions().readonly());

        restore_writable(temp.path())?;
        Ok(())
    }

    #[tokio::test]
    async fn clearing_read_only_restores_write_access() -> TestResult {
        let temp = temp_dir()?;
        let destination = temp.path().join("a.txt");
        fs::write(&destination, "payload")?;
        let mut permissions = fs::metadata(&destination)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&destination, permissions)?;

        FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::File,
                    destination.clone(),
                    temp.path().to_path_buf(),
                    false,
                )],
                &SilentResolver::new(ConflictChoice::Overwrite),
            )
            .await?;

        assert!(!fs::metadata(&destination)?.permissions().readonly());
        let backup = fs::read_to_string(temp.path().join(BACKUP_FILE_NAME))?;
        assert!(backup.contains(&format!("{},true", destination.display())));
        Ok(())
    }

    #[tokio::test]
    async fn skip_keeps_the_existing_backup_but_still_adjusts() -> TestResult {
        let temp = temp_dir()?;
        let destination = temp.path().join("a.txt");
        fs::write(&destination, "payload")?;
        let backup_path = temp.path().join(BACKUP_FILE_NAME);
        fs::write(&backup_path, "path,readonly\nsentinel,true\n")?;

        FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::File,
                    destination.clone(),
                    temp.path().to_path_buf(),
                    true,
                )],
                &SilentResolver::new(ConflictChoice::Skip),
            )
            .await?;

        assert!(fs::metadata(&destination)?.permissions().readonly());
        assert_eq!(
            fs::read_to_string(&backup_path)?,
            "path,readonly\nsentinel,true\n"
        );

        restore_writable(temp.path())?;
        Ok(())
    }

    #[tokio::test]
    async fn abort_on_existing_backup_applies_nothing() -> TestResult {
        let temp = temp_dir()?;
        let destination = temp.path().join("a.txt");
        fs::write(&destination, "payload")?;
        fs::write(
            temp.path().join(BACKUP_FILE_NAME),
            "path,readonly\nsentinel,true\n",
        )?;

        let err = FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::File,
                    destination.clone(),
                    temp.path().to_path_buf(),
                    true,
                )],
                &SilentResolver::new(ConflictChoice::Abort),
            )
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("abort should fail the adjustment"))?;

        let fsops = err
            .downcast_ref::<FsOpsError>()
            .ok_or_else(|| anyhow::anyhow!("error should be an fsops error"))?;
        assert!(matches!(
            fsops,
            FsOpsError::Aborted {
                operation: "attributes.backup",
                ..
            }
        ));
        assert!(!fs::metadata(&destination)?.permissions().readonly());
        Ok(())
    }

    #[tokio::test]
    async fn overwrite_replaces_the_existing_backup() -> TestResult {
        let temp = temp_dir()?;
        let destination = temp.path().join("a.txt");
        fs::write(&destination, "payload")?;
        let backup_path = temp.path().join(BACKUP_FILE_NAME);
        fs::write(&backup_path, "path,readonly\nsentinel,true\n")?;

        FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::File,
                    destination.clone(),
                    temp.path().to_path_buf(),
                    true,
                )],
                &SilentResolver::new(ConflictChoice::Overwrite),
            )
            .await?;

        let backup = fs::read_to_string(&backup_path)?;
        assert!(!backup.contains("sentinel"));
        assert!(backup.contains(&format!("{},false", destination.display())));

        restore_writable(temp.path())?;
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn adjustments_follow_file_symlinks() -> TestResult {
        let temp = temp_dir()?;
        let source = temp.path().join("source.txt");
        fs::write(&source, "payload")?;
        let destination = temp.path().join("view.txt");
        std::os::unix::fs::symlink(&source, &destination)?;

        FsAttributeAdjuster::new()
            .apply(
                &[adjustment(
                    ItemKind::File,
                    destination,
                    temp.path().to_path_buf(),
                    true,
                )],
                &SilentResolver::new(ConflictChoice::Overwrite),
            )
            .await?;

        assert!(fs::metadata(&source)?.permissions().readonly());

        restore_writable(temp.path())?;
        Ok(())
    }
}
