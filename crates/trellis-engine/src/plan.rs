//! Plan construction: destination resolution, operation discovery, and
//! classification into action buckets.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use serde::Serialize;
use tracing::{debug, warn};
use trellis_config::{
    ActionKind, ItemKind, OperationSpec, PatternValue, SearchPattern, WorkspaceProfile,
};
use trellis_core::{PlannedOperation, SourceDiscovery};

use crate::error::{EngineError, EngineResult};

/// Resolve the configured target directory against an optional workspace root.
///
/// Absolute targets pass through unchanged. Relative targets require a root;
/// its absence is fatal before any discovery happens.
///
/// # Errors
///
/// Returns [`EngineError::WorkspaceRootMissing`] for a relative target
/// without a workspace root.
pub fn resolve_target_root(
    target_dir: &str,
    workspace_root: Option<&Path>,
) -> EngineResult<PathBuf> {
    let target = Path::new(target_dir);
    if target.is_absolute() {
        return Ok(target.to_path_buf());
    }
    let Some(root) = workspace_root else {
        return Err(EngineError::WorkspaceRootMissing {
            target_dir: target.to_path_buf(),
        });
    };
    let resolved = root.join(target);
    debug!(target = %resolved.display(), "resolved relative target directory");
    Ok(resolved)
}

/// Operations partitioned by (item kind, action), in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationBuckets {
    /// Directories to copy recursively.
    pub copy_dirs: Vec<PlannedOperation>,
    /// Files to copy.
    pub copy_files: Vec<PlannedOperation>,
    /// Directories to symlink.
    pub link_dirs: Vec<PlannedOperation>,
    /// Files to hardlink.
    pub hardlink_files: Vec<PlannedOperation>,
    /// Files to symlink.
    pub link_files: Vec<PlannedOperation>,
}

impl OperationBuckets {
    /// Total number of planned operations across all buckets.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        let count = self.copy_dirs.len()
            + self.copy_files.len()
            + self.link_dirs.len()
            + self.hardlink_files.len()
            + self.link_files.len();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    /// Whether the plan contains no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_operations() == 0
    }

    /// Iterate every operation in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &PlannedOperation> {
        self.copy_dirs
            .iter()
            .chain(&self.copy_files)
            .chain(&self.link_dirs)
            .chain(&self.hardlink_files)
            .chain(&self.link_files)
    }

    /// Route one operation into its bucket.
    ///
    /// The (directory, hardlink) combination is rejected by profile
    /// validation; an operation that still carries it is dropped with a
    /// warning rather than misfiled.
    pub fn push(&mut self, operation: PlannedOperation) {
        match (operation.kind, operation.action) {
            (ItemKind::Directory, ActionKind::Copy) => self.copy_dirs.push(operation),
            (ItemKind::File, ActionKind::Copy) => self.copy_files.push(operation),
            (ItemKind::Directory, ActionKind::Symlink) => self.link_dirs.push(operation),
            (ItemKind::File, ActionKind::Hardlink) => self.hardlink_files.push(operation),
            (ItemKind::File, ActionKind::Symlink) => self.link_files.push(operation),
            (ItemKind::Directory, ActionKind::Hardlink) => {
                warn!(
                    source = %operation.source.display(),
                    "dropping directory hardlink operation"
                );
            }
        }
    }
}

/// A fully resolved execution plan.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowPlan {
    /// Absolute root every destination lives under.
    pub target_root: PathBuf,
    /// Planned operations by action bucket.
    pub buckets: OperationBuckets,
    /// Operations removed as redundant during deduplication.
    pub deduped: u64,
}

/// Builds operation buckets from a profile via the discovery collaborator.
pub struct Planner<'a> {
    discovery: &'a dyn SourceDiscovery,
}

impl<'a> Planner<'a> {
    /// Create a planner over the given discovery collaborator.
    #[must_use]
    pub const fn new(discovery: &'a dyn SourceDiscovery) -> Self {
        Self { discovery }
    }

    /// Discover and classify every operation declared by `profile`.
    ///
    /// # Errors
    ///
    /// Returns an error when the discovery collaborator fails for one of the
    /// declared patterns.
    pub async fn build(
        &self,
        profile: &WorkspaceProfile,
        target_root: &Path,
    ) -> EngineResult<OperationBuckets> {
        let mut buckets = OperationBuckets::default();
        for spec in &profile.operations {
            self.plan_operation(spec, target_root, &mut buckets)
                .await?;
        }
        debug!(
            operations = buckets.total_operations(),
            "operation plan assembled"
        );
        Ok(buckets)
    }

    async fn plan_operation(
        &self,
        spec: &OperationSpec,
        target_root: &Path,
        buckets: &mut OperationBuckets,
    ) -> EngineResult<()> {
        let base_dir = Path::new(&spec.base_dir);
        let dest_base = spec
            .destination
            .as_ref()
            .map_or_else(|| target_root.to_path_buf(), |sub| target_root.join(sub));

        // Mapping entries expand directly, one planned operation per entry.
        // The same source may fan out to several destinations.
        for pattern in &spec.patterns {
            for mapping in pattern.pattern.mappings() {
                buckets.push(PlannedOperation {
                    kind: spec.kind,
                    action: spec.action,
                    attributes: spec.attributes,
                    source: base_dir.join(&mapping.source),
                    destination: dest_base.join(&mapping.destination),
                });
            }
        }

        let searchable = searchable_patterns(spec);
        if searchable.is_empty() {
            return Ok(());
        }

        let discovered = match spec.kind {
            ItemKind::File => self.discovery.discover_files(base_dir, &searchable).await,
            ItemKind::Directory => {
                self.discovery
                    .discover_directories(base_dir, &searchable)
                    .await
            }
        }
        .map_err(|source| EngineError::discovery("plan.discover", source))?;

        for source in discovered {
            let relative = source.strip_prefix(base_dir).map_err(|_| {
                EngineError::discovery(
                    "plan.relativize",
                    anyhow!(
                        "discovered path '{}' is outside base directory '{}'",
                        source.display(),
                        base_dir.display()
                    ),
                )
            })?;
            buckets.push(PlannedOperation {
                kind: spec.kind,
                action: spec.action,
                attributes: spec.attributes,
                destination: dest_base.join(relative),
                source,
            });
        }
        Ok(())
    }
}

/// Patterns forwarded to discovery, with mapping entries stripped.
///
/// A pattern whose value carries only mappings contributes nothing here; the
/// planner has already expanded it.
fn searchable_patterns(spec: &OperationSpec) -> Vec<SearchPattern> {
    spec.patterns
        .iter()
        .filter_map(|pattern| {
            let value = match &pattern.pattern {
                PatternValue::Literal(_) | PatternValue::Sequence(_) => pattern.pattern.clone(),
                PatternValue::Mapping(_) => return None,
                PatternValue::Mixed(_) => {
                    let literals = pattern.pattern.literals();
                    if literals.is_empty() {
                        return None;
                    }
                    PatternValue::Sequence(literals.into_iter().map(str::to_string).collect())
                }
            };
            Some(SearchPattern {
                kind: pattern.kind,
                pattern: value,
            })
        })
        .collect()
}
