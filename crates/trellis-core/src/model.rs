//! Core workflow domain types shared across the workspace.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use trellis_config::{ActionKind, AttributeSpec, ItemKind};

/// One concrete, path-resolved filesystem operation.
///
/// Produced by planning, consumed by classification, deduplication,
/// execution, and attribute adjustment; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    /// Whether the operation materializes a file or a directory.
    pub kind: ItemKind,
    /// How the source is materialized at the destination.
    pub action: ActionKind,
    /// Attribute adjustment inherited from the declaring operation.
    pub attributes: Option<AttributeSpec>,
    /// Absolute source path.
    pub source: PathBuf,
    /// Absolute destination path.
    pub destination: PathBuf,
}

/// Result of one attempted copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOutcome {
    /// Absolute source path.
    pub source: PathBuf,
    /// Absolute destination path.
    pub destination: PathBuf,
    /// Failure detail; `None` means the copy succeeded.
    pub error: Option<String>,
}

impl CopyOutcome {
    /// Outcome for a copy that completed (or was skipped by choice).
    #[must_use]
    pub const fn succeeded(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            error: None,
        }
    }

    /// Outcome for a copy that failed.
    #[must_use]
    pub fn failed(source: PathBuf, destination: PathBuf, error: impl Into<String>) -> Self {
        Self {
            source,
            destination,
            error: Some(error.into()),
        }
    }

    /// Whether the copy succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Terminal state of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// Every stage ran to completion.
    Completed,
    /// The run stopped early at the operator's request.
    Cancelled {
        /// What was declined.
        reason: CancelReason,
    },
}

/// Why a run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CancelReason {
    /// The file-count confirmation was declined.
    ThresholdDeclined {
        /// Files that would have been touched.
        pending_files: u64,
    },
    /// Copy failures were reported and the operator chose not to continue.
    CopyFailures {
        /// Number of failed copy operations.
        failed: u64,
    },
}

/// Progress delta reported during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Percent points gained since the previous report.
    pub increment: u8,
    /// Human-readable stage description.
    pub message: Option<String>,
}

impl ProgressUpdate {
    /// Update with a stage description.
    #[must_use]
    pub fn with_message(increment: u8, message: impl Into<String>) -> Self {
        Self {
            increment,
            message: Some(message.into()),
        }
    }

    /// Update carrying only a percentage delta.
    #[must_use]
    pub const fn increment(increment: u8) -> Self {
        Self {
            increment,
            message: None,
        }
    }
}

/// One attribute adjustment forwarded to the attribute service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAdjustment {
    /// Whether the destination is a file or a directory.
    pub kind: ItemKind,
    /// How the destination was materialized.
    pub action: ActionKind,
    /// The adjustment to apply.
    pub spec: AttributeSpec,
    /// Absolute source path.
    pub source: PathBuf,
    /// Absolute destination path.
    pub destination: PathBuf,
    /// Resolved workspace target root; backup records live under it.
    pub target_root: PathBuf,
}

/// Exit information from one post-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit code when the process exited normally.
    pub exit_code: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_outcome_success_flag() {
        let ok = CopyOutcome::succeeded("/a".into(), "/b".into());
        assert!(ok.is_success());
        let failed = CopyOutcome::failed("/a".into(), "/b".into(), "permission denied");
        assert!(!failed.is_success());
    }

    #[test]
    fn workflow_outcome_serializes_with_status_tag() {
        let outcome = WorkflowOutcome::Cancelled {
            reason: CancelReason::ThresholdDeclined { pending_files: 512 },
        };
        let encoded = serde_json::to_value(&outcome).expect("outcome should serialize");
        assert_eq!(encoded["status"], "cancelled");
        assert_eq!(encoded["reason"]["kind"], "threshold_declined");
        assert_eq!(encoded["reason"]["pending_files"], 512);
    }
}
