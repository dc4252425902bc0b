//! Workflow orchestration: threshold gate, fixed-order execution, copy
//! failure reconciliation, attribute bridge, and post-commands.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use trellis_config::{ActionKind, WorkspaceProfile, validate_profile};
use trellis_core::{
    AttributeAdjuster, AttributeAdjustment, CancelReason, CommandRunner, ConflictResolver,
    CopyEngine, CopyOutcome, LinkEngine, ProgressSink, ProgressUpdate, Prompter, SilentResolver,
    SourceDiscovery, WorkflowOutcome,
};

use crate::dedupe::dedupe_buckets;
use crate::error::{EngineError, EngineResult};
use crate::plan::{Planner, WorkflowPlan, resolve_target_root};
use crate::progress::{ExecutionContext, VALIDATED_OFFSET};

/// Collaborator handles the engine executes through.
pub struct EngineDeps {
    /// Pattern-based source discovery.
    pub discovery: Arc<dyn SourceDiscovery>,
    /// Batched copy execution.
    pub copier: Arc<dyn CopyEngine>,
    /// Link creation.
    pub linker: Arc<dyn LinkEngine>,
    /// Attribute adjustment.
    pub attributes: Arc<dyn AttributeAdjuster>,
    /// Post-command execution.
    pub commands: Arc<dyn CommandRunner>,
    /// Confirmation prompts (threshold gate, copy-failure reconciliation).
    pub prompter: Arc<dyn Prompter>,
    /// Conflict decisions for interactive runs; silent profiles substitute
    /// a fixed-choice resolver and never consult this one.
    pub resolver: Arc<dyn ConflictResolver>,
    /// Progress reporting.
    pub progress: Arc<dyn ProgressSink>,
}

/// Drives one workflow run from profile to outcome.
pub struct WorkflowEngine {
    deps: EngineDeps,
}

impl WorkflowEngine {
    /// Create an engine over the given collaborators.
    #[must_use]
    pub const fn new(deps: EngineDeps) -> Self {
        Self { deps }
    }

    /// Validate the profile and build the deduplicated plan without
    /// executing it.
    ///
    /// # Errors
    ///
    /// Returns an error when the profile fails validation, the target cannot
    /// be resolved, or discovery fails.
    pub async fn plan(
        &self,
        profile: &WorkspaceProfile,
        workspace_root: Option<&Path>,
    ) -> EngineResult<WorkflowPlan> {
        validate_profile(profile).map_err(|source| EngineError::InvalidProfile { source })?;
        self.assemble_plan(profile, workspace_root).await
    }

    /// Execute the full workflow.
    ///
    /// Returns `Ok(Cancelled { .. })` when the operator declines the
    /// threshold gate or aborts after copy failures; `Err` is reserved for
    /// real failures.
    ///
    /// # Errors
    ///
    /// Returns an error when planning fails, a prompt cannot be answered, or
    /// a link/attribute collaborator reports a failure. Per-item copy
    /// failures are reconciled through the prompter instead of failing the
    /// run.
    pub async fn run(
        &self,
        profile: &WorkspaceProfile,
        workspace_root: Option<&Path>,
    ) -> EngineResult<WorkflowOutcome> {
        validate_profile(profile).map_err(|source| EngineError::InvalidProfile { source })?;
        self.deps
            .progress
            .report(ProgressUpdate::with_message(VALIDATED_OFFSET, "profile validated"));

        let plan = self.assemble_plan(profile, workspace_root).await?;
        self.execute(profile, &plan).await
    }

    async fn assemble_plan(
        &self,
        profile: &WorkspaceProfile,
        workspace_root: Option<&Path>,
    ) -> EngineResult<WorkflowPlan> {
        let target_root = resolve_target_root(&profile.target_dir, workspace_root)?;
        let planner = Planner::new(self.deps.discovery.as_ref());
        let buckets = planner.build(profile, &target_root).await?;
        let (buckets, deduped) = if profile.dedupe_sources {
            dedupe_buckets(buckets)
        } else {
            debug!("deduplication disabled by profile; keeping the raw plan");
            (buckets, 0)
        };
        info!(
            operations = buckets.total_operations(),
            deduped,
            target = %target_root.display(),
            "workflow plan ready"
        );
        Ok(WorkflowPlan {
            target_root,
            buckets,
            deduped,
        })
    }

    async fn execute(
        &self,
        profile: &WorkspaceProfile,
        plan: &WorkflowPlan,
    ) -> EngineResult<WorkflowOutcome> {
        let silent;
        let resolver: &dyn ConflictResolver = if profile.silent {
            silent = SilentResolver::new(profile.on_conflict);
            &silent
        } else {
            self.deps.resolver.as_ref()
        };

        let pending_files = self.count_pending_files(plan).await?;
        if pending_files > profile.prompt_threshold {
            info!(
                pending_files,
                threshold = profile.prompt_threshold,
                "file count exceeds the confirmation threshold"
            );
            let message = format!(
                "{pending_files} files will be materialized under '{}'. Continue?",
                plan.target_root.display()
            );
            let confirmed = self
                .deps
                .prompter
                .confirm(&message)
                .await
                .map_err(|source| EngineError::prompt("threshold", source))?;
            if !confirmed {
                return Ok(WorkflowOutcome::Cancelled {
                    reason: CancelReason::ThresholdDeclined { pending_files },
                });
            }
        }

        let command_count = u64::try_from(profile.post_commands.len()).unwrap_or(u64::MAX);
        let total_units = plan
            .buckets
            .total_operations()
            .saturating_add(1)
            .saturating_add(command_count);
        let mut ctx =
            ExecutionContext::new(self.deps.progress.as_ref(), total_units, VALIDATED_OFFSET);

        let failures = self.run_copies(plan, resolver, &mut ctx).await?;
        if !failures.is_empty() {
            let failed = u64::try_from(failures.len()).unwrap_or(u64::MAX);
            let message = format!(
                "{failed} copy operations failed. Continue with the remaining operations?"
            );
            let confirmed = self
                .deps
                .prompter
                .confirm(&message)
                .await
                .map_err(|source| EngineError::prompt("copy_failures", source))?;
            if !confirmed {
                return Ok(WorkflowOutcome::Cancelled {
                    reason: CancelReason::CopyFailures { failed },
                });
            }
            info!(failed, "continuing past copy failures");
        }

        self.run_links(plan, resolver, &mut ctx).await?;
        ctx.report("filesystem operations complete");

        self.apply_attributes(plan, &failures, resolver).await?;
        ctx.complete(1, "attributes adjusted");

        self.run_post_commands(profile, &plan.target_root, &mut ctx)
            .await;

        info!(target = %plan.target_root.display(), "workflow completed");
        Ok(WorkflowOutcome::Completed)
    }

    /// Files the plan will touch, expanding directory operations through the
    /// discovery collaborator's recursive count.
    async fn count_pending_files(&self, plan: &WorkflowPlan) -> EngineResult<u64> {
        let directories: Vec<PathBuf> = plan
            .buckets
            .copy_dirs
            .iter()
            .chain(&plan.buckets.link_dirs)
            .map(|operation| operation.source.clone())
            .collect();

        let file_count = plan.buckets.copy_files.len()
            + plan.buckets.hardlink_files.len()
            + plan.buckets.link_files.len();
        let mut total = u64::try_from(file_count).unwrap_or(u64::MAX);

        if !directories.is_empty() {
            let nested = self
                .deps
                .discovery
                .count_files(&directories)
                .await
                .map_err(|source| EngineError::discovery("count_files", source))?;
            total = total.saturating_add(nested);
        }
        Ok(total)
    }

    /// Copy directories, then files; collect per-item failures.
    async fn run_copies(
        &self,
        plan: &WorkflowPlan,
        resolver: &dyn ConflictResolver,
        ctx: &mut ExecutionContext<'_>,
    ) -> EngineResult<Vec<CopyOutcome>> {
        let mut failures = Vec::new();

        if !plan.buckets.copy_dirs.is_empty() {
            let outcomes = self
                .deps
                .copier
                .copy_directories(&plan.buckets.copy_dirs, resolver)
                .await
                .map_err(|source| EngineError::copy("copy_directories", source))?;
            collect_copy_failures(outcomes, &mut failures, ctx, "copying directories");
        }
        if !plan.buckets.copy_files.is_empty() {
            let outcomes = self
                .deps
                .copier
                .copy_files(&plan.buckets.copy_files, resolver)
                .await
                .map_err(|source| EngineError::copy("copy_files", source))?;
            collect_copy_failures(outcomes, &mut failures, ctx, "copying files");
        }
        Ok(failures)
    }

    /// Link operations in the fixed order: directory symlinks, hardlinks,
    /// file symlinks. Each failure is fatal.
    async fn run_links(
        &self,
        plan: &WorkflowPlan,
        resolver: &dyn ConflictResolver,
        ctx: &mut ExecutionContext<'_>,
    ) -> EngineResult<()> {
        for operation in &plan.buckets.link_dirs {
            self.deps
                .linker
                .link_directory(operation, resolver)
                .await
                .map_err(|source| {
                    EngineError::link("link_directory", &operation.source, source)
                })?;
            ctx.advance(1, "linking directories");
        }
        for operation in &plan.buckets.hardlink_files {
            self.deps
                .linker
                .link_file(operation, resolver)
                .await
                .map_err(|source| EngineError::link("hardlink_file", &operation.source, source))?;
            ctx.advance(1, "hardlinking files");
        }
        for operation in &plan.buckets.link_files {
            self.deps
                .linker
                .link_file(operation, resolver)
                .await
                .map_err(|source| EngineError::link("link_file", &operation.source, source))?;
            ctx.advance(1, "linking files");
        }
        Ok(())
    }

    /// Forward successfully materialized operations that declared an
    /// attribute adjustment. Failed copies are excluded for this run.
    async fn apply_attributes(
        &self,
        plan: &WorkflowPlan,
        failures: &[CopyOutcome],
        resolver: &dyn ConflictResolver,
    ) -> EngineResult<()> {
        let failed: HashSet<(&Path, &Path)> = failures
            .iter()
            .map(|outcome| (outcome.source.as_path(), outcome.destination.as_path()))
            .collect();

        let adjustments: Vec<AttributeAdjustment> = plan
            .buckets
            .iter()
            .filter_map(|operation| {
                let spec = operation.attributes?;
                let key = (operation.source.as_path(), operation.destination.as_path());
                if operation.action == ActionKind::Copy && failed.contains(&key) {
                    return None;
                }
                Some(AttributeAdjustment {
                    kind: operation.kind,
                    action: operation.action,
                    spec,
                    source: operation.source.clone(),
                    destination: operation.destination.clone(),
                    target_root: plan.target_root.clone(),
                })
            })
            .collect();

        if adjustments.is_empty() {
            debug!("no attribute adjustments to apply");
            return Ok(());
        }

        info!(count = adjustments.len(), "applying attribute adjustments");
        self.deps
            .attributes
            .apply(&adjustments, resolver)
            .await
            .map_err(EngineError::attributes)
    }

    /// Run post-commands sequentially; failures are logged, never fatal.
    async fn run_post_commands(
        &self,
        profile: &WorkspaceProfile,
        target_root: &Path,
        ctx: &mut ExecutionContext<'_>,
    ) {
        for command in &profile.post_commands {
            let cwd = resolve_command_cwd(target_root, command.cwd.as_deref());
            match self.deps.commands.run(&cwd, command).await {
                Ok(status) if status.success => {
                    debug!(command = %command.command, "post-command completed");
                }
                Ok(status) => {
                    warn!(
                        command = %command.command,
                        exit_code = ?status.exit_code,
                        "post-command reported failure; continuing"
                    );
                }
                Err(error) => {
                    warn!(
                        command = %command.command,
                        error = %error,
                        "post-command could not run; continuing"
                    );
                }
            }
            ctx.complete(1, "running post-commands");
        }
    }
}

fn collect_copy_failures(
    outcomes: Vec<CopyOutcome>,
    failures: &mut Vec<CopyOutcome>,
    ctx: &mut ExecutionContext<'_>,
    message: &str,
) {
    ctx.advance(u64::try_from(outcomes.len()).unwrap_or(u64::MAX), message);
    for outcome in outcomes {
        if let Some(error) = &outcome.error {
            warn!(
                source = %outcome.source.display(),
                destination = %outcome.destination.display(),
                error,
                "copy failed"
            );
            failures.push(outcome);
        }
    }
}

/// Absolute working directory for one post-command.
fn resolve_command_cwd(target_root: &Path, cwd: Option<&str>) -> PathBuf {
    cwd.map_or_else(
        || target_root.to_path_buf(),
        |value| {
            let path = Path::new(value);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                target_root.join(path)
            }
        },
    )
}
