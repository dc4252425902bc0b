//! Collaborator traits implemented by filesystem, shell, and UI adapters.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use trellis_config::{ConflictChoice, PostCommand, SearchPattern};

use crate::model::{
    AttributeAdjustment, CommandStatus, CopyOutcome, PlannedOperation, ProgressUpdate,
};

/// Pattern-based discovery of concrete source paths.
#[async_trait]
pub trait SourceDiscovery: Send + Sync {
    /// Find files under `base_dir` matching any of `patterns`.
    async fn discover_files(
        &self,
        base_dir: &Path,
        patterns: &[SearchPattern],
    ) -> anyhow::Result<Vec<PathBuf>>;

    /// Find directories under `base_dir` matching any of `patterns`.
    async fn discover_directories(
        &self,
        base_dir: &Path,
        patterns: &[SearchPattern],
    ) -> anyhow::Result<Vec<PathBuf>>;

    /// Count regular files underneath each of `directories`, recursively.
    async fn count_files(&self, directories: &[PathBuf]) -> anyhow::Result<u64>;
}

/// Batched copy execution.
///
/// Per-item failures are reported inside the returned outcomes, not as an
/// `Err`; an `Err` means the batch itself could not run.
#[async_trait]
pub trait CopyEngine: Send + Sync {
    /// Copy file operations.
    async fn copy_files(
        &self,
        operations: &[PlannedOperation],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<Vec<CopyOutcome>>;

    /// Copy directory operations, recursively.
    async fn copy_directories(
        &self,
        operations: &[PlannedOperation],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<Vec<CopyOutcome>>;
}

/// Link creation, one operation at a time.
#[async_trait]
pub trait LinkEngine: Send + Sync {
    /// Create a symlink or hardlink for a file operation.
    async fn link_file(
        &self,
        operation: &PlannedOperation,
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<()>;

    /// Create a symlink for a directory operation.
    async fn link_directory(
        &self,
        operation: &PlannedOperation,
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<()>;
}

/// Post-materialization attribute adjustment.
#[async_trait]
pub trait AttributeAdjuster: Send + Sync {
    /// Apply the adjustments in one batch.
    async fn apply(
        &self,
        adjustments: &[AttributeAdjustment],
        resolver: &dyn ConflictResolver,
    ) -> anyhow::Result<()>;
}

/// Shell command execution for post-commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `cwd` as its working directory.
    async fn run(&self, cwd: &Path, command: &PostCommand) -> anyhow::Result<CommandStatus>;
}

/// Per-conflict decisions, one method per conflict kind.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    /// Decide what to do about an existing entry at `destination`.
    ///
    /// `existing` describes what currently occupies the destination: the
    /// referent for a symlink, the destination path itself otherwise.
    async fn resolve_existing_target(
        &self,
        source: &Path,
        destination: &Path,
        existing: &Path,
    ) -> anyhow::Result<ConflictChoice>;

    /// Decide what to do about an existing attribute backup file.
    async fn resolve_existing_backup(&self, backup_path: &Path) -> anyhow::Result<ConflictChoice>;
}

/// Confirmation requests surfaced to the operator.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question; `true` means proceed.
    async fn confirm(&self, message: &str) -> anyhow::Result<bool>;
}

/// Sink for progress deltas.
pub trait ProgressSink: Send + Sync {
    /// Consume one progress delta.
    fn report(&self, update: ProgressUpdate);
}
