//! Redundancy elimination for operation plans.
//!
//! Two rules, applied per group and then across groups:
//! exact duplicates collapse on `(source, destination)` with the first
//! occurrence winning, and an operation is pruned when a directory operation
//! already materializes it at the same relative destination.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};
use trellis_config::{ActionKind, ItemKind};
use trellis_core::PlannedOperation;

use crate::plan::OperationBuckets;

/// Collapse redundant operations across the plan's buckets.
///
/// The copy group (directory and file copies) and the link group (directory
/// symlinks, hardlinks, file symlinks) are deduplicated independently, then a
/// final pass runs over the merged survivors with copy-group entries ordered
/// first. Returns the surviving buckets and the number of removed operations.
///
/// Pruning only ever removes operations; the refilter at the end partitions
/// by each operation's original kind and action.
#[must_use]
pub fn dedupe_buckets(buckets: OperationBuckets) -> (OperationBuckets, u64) {
    let before = buckets.total_operations();

    let (copy_dirs, copy_files) = dedupe_group(buckets.copy_dirs, buckets.copy_files);
    let link_group_files: Vec<PlannedOperation> = buckets
        .hardlink_files
        .into_iter()
        .chain(buckets.link_files)
        .collect();
    let (link_dirs, link_files) = dedupe_group(buckets.link_dirs, link_group_files);

    let merged_dirs: Vec<PlannedOperation> = copy_dirs.into_iter().chain(link_dirs).collect();
    let merged_files: Vec<PlannedOperation> = copy_files.into_iter().chain(link_files).collect();
    let (dirs, files) = dedupe_group(merged_dirs, merged_files);

    let mut result = OperationBuckets::default();
    for operation in dirs.into_iter().chain(files) {
        refilter(&mut result, operation);
    }

    let removed = before.saturating_sub(result.total_operations());
    if removed > 0 {
        debug!(removed, "removed redundant operations");
    }
    (result, removed)
}

/// One dedup pass over a directory set and a file set.
fn dedupe_group(
    dirs: Vec<PlannedOperation>,
    files: Vec<PlannedOperation>,
) -> (Vec<PlannedOperation>, Vec<PlannedOperation>) {
    let dirs = dedupe_exact(dirs);
    let files = dedupe_exact(files);
    let dirs = prune_covered_dirs(dirs);
    let files = prune_covered_files(files, &dirs);
    (dirs, files)
}

/// Keep the first operation for each `(source, destination)` pair.
fn dedupe_exact(operations: Vec<PlannedOperation>) -> Vec<PlannedOperation> {
    let mut seen: HashSet<(PathBuf, PathBuf)> = HashSet::new();
    operations
        .into_iter()
        .filter(|operation| seen.insert((operation.source.clone(), operation.destination.clone())))
        .collect()
}

/// Whether `covering` (a directory operation) already materializes
/// `operation` at the destination its relative path implies.
fn covers(covering: &PlannedOperation, operation: &PlannedOperation) -> bool {
    if operation.source == covering.source {
        return false;
    }
    let Ok(relative) = operation.source.strip_prefix(&covering.source) else {
        return false;
    };
    covering.destination.join(relative) == operation.destination
}

/// Remove directory operations covered by another directory operation.
///
/// Coverage is transitive along destination chains, so testing against the
/// full input set and testing against survivors select the same set.
fn prune_covered_dirs(dirs: Vec<PlannedOperation>) -> Vec<PlannedOperation> {
    let snapshot = dirs.clone();
    dirs.into_iter()
        .filter(|operation| !snapshot.iter().any(|other| covers(other, operation)))
        .collect()
}

/// Remove file operations covered by a surviving directory operation.
fn prune_covered_files(
    files: Vec<PlannedOperation>,
    dirs: &[PlannedOperation],
) -> Vec<PlannedOperation> {
    files
        .into_iter()
        .filter(|operation| !dirs.iter().any(|dir| covers(dir, operation)))
        .collect()
}

fn refilter(buckets: &mut OperationBuckets, operation: PlannedOperation) {
    match (operation.kind, operation.action) {
        (ItemKind::Directory, ActionKind::Copy) => buckets.copy_dirs.push(operation),
        (ItemKind::File, ActionKind::Copy) => buckets.copy_files.push(operation),
        (ItemKind::Directory, ActionKind::Symlink) => buckets.link_dirs.push(operation),
        (ItemKind::File, ActionKind::Hardlink) => buckets.hardlink_files.push(operation),
        (ItemKind::File, ActionKind::Symlink) => buckets.link_files.push(operation),
        (ItemKind::Directory, ActionKind::Hardlink) => {
            debug_assert!(false, "dedupe must never change an operation's action");
            warn!(
                source = %operation.source.display(),
                "dropping directory hardlink operation surfaced during dedupe"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(
        kind: ItemKind,
        action: ActionKind,
        source: &str,
        destination: &str,
    ) -> PlannedOperation {
        PlannedOperation {
            kind,
            action,
            attributes: None,
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
        }
    }

    fn dir_link(source: &str, destination: &str) -> PlannedOperation {
        operation(ItemKind::Directory, ActionKind::Symlink, source, destination)
    }

    fn file_link(source: &str, destination: &str) -> PlannedOperation {
        operation(ItemKind::File, ActionKind::Symlink, source, destination)
    }

    #[test]
    fn ancestor_prunes_descendant_directories() {
        let mut buckets = OperationBuckets::default();
        buckets.push(dir_link("/s/a", "/t/a"));
        buckets.push(dir_link("/s/a/b", "/t/a/b"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 1);
        assert_eq!(deduped.link_dirs.len(), 1);
        assert_eq!(deduped.link_dirs[0].source, PathBuf::from("/s/a"));
    }

    #[test]
    fn divergent_destination_mapping_is_kept() {
        let mut buckets = OperationBuckets::default();
        buckets.push(dir_link("/s/a", "/t/a"));
        buckets.push(dir_link("/s/a/b", "/t/elsewhere/b"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 0);
        assert_eq!(deduped.link_dirs.len(), 2);
    }

    #[test]
    fn exact_duplicates_keep_first_occurrence() {
        let mut first = file_link("/s/x", "/t/x");
        first.attributes = Some(trellis_config::AttributeSpec { read_only: true });
        let mut buckets = OperationBuckets::default();
        buckets.push(first.clone());
        buckets.push(file_link("/s/x", "/t/x"));
        buckets.push(file_link("/s/x", "/t/x"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 2);
        assert_eq!(deduped.link_files.len(), 1);
        assert_eq!(deduped.link_files[0], first);
    }

    #[test]
    fn fan_out_destinations_both_survive() {
        let mut buckets = OperationBuckets::default();
        buckets.push(file_link("/s/x", "/t/one"));
        buckets.push(file_link("/s/x", "/t/two"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 0);
        assert_eq!(deduped.link_files.len(), 2);
    }

    #[test]
    fn files_under_pruned_directories_are_still_removed() {
        // /s/a covers /s/a/b, and /s/a/b covers the file; transitivity must
        // remove the file even though its direct coverer was pruned.
        let mut buckets = OperationBuckets::default();
        buckets.push(dir_link("/s/a", "/t/a"));
        buckets.push(dir_link("/s/a/b", "/t/a/b"));
        buckets.push(file_link("/s/a/b/f.txt", "/t/a/b/f.txt"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 2);
        assert_eq!(deduped.link_dirs.len(), 1);
        assert!(deduped.link_files.is_empty());
    }

    #[test]
    fn copy_directory_covers_linked_file_across_groups() {
        let mut buckets = OperationBuckets::default();
        buckets.push(operation(ItemKind::Directory, ActionKind::Copy, "/s/a", "/t/a"));
        buckets.push(file_link("/s/a/f.txt", "/t/a/f.txt"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 1);
        assert_eq!(deduped.copy_dirs.len(), 1);
        assert!(deduped.link_files.is_empty());
    }

    #[test]
    fn groups_do_not_prune_each_other_before_the_merge() {
        // A linked file under a copied directory with a different relative
        // destination survives every pass.
        let mut buckets = OperationBuckets::default();
        buckets.push(operation(ItemKind::Directory, ActionKind::Copy, "/s/a", "/t/a"));
        buckets.push(file_link("/s/a/f.txt", "/t/flat/f.txt"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 0);
        assert_eq!(deduped.copy_dirs.len(), 1);
        assert_eq!(deduped.link_files.len(), 1);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let mut buckets = OperationBuckets::default();
        buckets.push(dir_link("/s/a", "/t/a"));
        buckets.push(dir_link("/s/a/b", "/t/a/b"));
        buckets.push(file_link("/s/a/c.txt", "/t/a/c.txt"));
        buckets.push(file_link("/s/other.txt", "/t/other.txt"));
        buckets.push(operation(ItemKind::Directory, ActionKind::Copy, "/s/copy", "/t/copy"));
        buckets.push(operation(ItemKind::File, ActionKind::Hardlink, "/s/h.txt", "/t/h.txt"));

        let (once, _) = dedupe_buckets(buckets);
        let (twice, removed_again) = dedupe_buckets(once.clone());
        assert_eq!(removed_again, 0);
        assert_eq!(twice, once);
    }

    #[test]
    fn actions_are_preserved_through_the_merge() {
        let mut buckets = OperationBuckets::default();
        buckets.push(operation(ItemKind::Directory, ActionKind::Copy, "/s/a", "/t/a"));
        buckets.push(dir_link("/s/b", "/t/b"));
        buckets.push(operation(ItemKind::File, ActionKind::Copy, "/s/c.txt", "/t/c.txt"));
        buckets.push(operation(ItemKind::File, ActionKind::Hardlink, "/s/d.txt", "/t/d.txt"));
        buckets.push(file_link("/s/e.txt", "/t/e.txt"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 0);
        for op in &deduped.copy_dirs {
            assert_eq!((op.kind, op.action), (ItemKind::Directory, ActionKind::Copy));
        }
        for op in &deduped.link_dirs {
            assert_eq!((op.kind, op.action), (ItemKind::Directory, ActionKind::Symlink));
        }
        for op in &deduped.copy_files {
            assert_eq!((op.kind, op.action), (ItemKind::File, ActionKind::Copy));
        }
        for op in &deduped.hardlink_files {
            assert_eq!((op.kind, op.action), (ItemKind::File, ActionKind::Hardlink));
        }
        for op in &deduped.link_files {
            assert_eq!((op.kind, op.action), (ItemKind::File, ActionKind::Symlink));
        }
    }

    #[test]
    fn identical_source_and_destination_pairs_merge_across_groups() {
        // A directory both copied and linked to the same destination keeps
        // only the copy, which is ordered first in the merge pass.
        let mut buckets = OperationBuckets::default();
        buckets.push(operation(ItemKind::Directory, ActionKind::Copy, "/s/a", "/t/a"));
        buckets.push(dir_link("/s/a", "/t/a"));

        let (deduped, removed) = dedupe_buckets(buckets);
        assert_eq!(removed, 1);
        assert_eq!(deduped.copy_dirs.len(), 1);
        assert!(deduped.link_dirs.is_empty());
    }
}
