//! Structured, constant-message errors for the filesystem collaborators.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem collaborator operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by the filesystem, shell, and attribute collaborators.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Glob pattern compilation failures.
    #[error("fsops glob failure")]
    Glob {
        /// Operation that triggered the glob failure.
        operation: &'static str,
        /// Glob pattern that failed to compile.
        pattern: String,
        /// Underlying globset error.
        source: globset::Error,
    },
    /// Regex pattern compilation failures.
    #[error("fsops regex failure")]
    Regex {
        /// Operation that triggered the regex failure.
        operation: &'static str,
        /// Regex pattern that failed to compile.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },
    /// Ignore-rules loading or compilation failures.
    #[error("fsops ignore rules failure")]
    Rules {
        /// Operation that triggered the rules failure.
        operation: &'static str,
        /// Path of the rules file involved.
        path: PathBuf,
        /// Underlying ignore error.
        source: ignore::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The conflict resolver chose to abort at an existing entry.
    #[error("fsops aborted at existing entry")]
    Aborted {
        /// Operation that was aborted.
        operation: &'static str,
        /// Path of the existing entry.
        path: PathBuf,
    },
    /// A post-command exceeded its configured wall-clock limit.
    #[error("fsops post-command timed out")]
    Timeout {
        /// The command line that timed out.
        command: String,
        /// Configured limit in seconds.
        seconds: u64,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn glob(
        operation: &'static str,
        pattern: String,
        source: globset::Error,
    ) -> Self {
        Self::Glob {
            operation,
            pattern,
            source,
        }
    }

    pub(crate) const fn regex(
        operation: &'static str,
        pattern: String,
        source: regex::Error,
    ) -> Self {
        Self::Regex {
            operation,
            pattern,
            source,
        }
    }

    pub(crate) fn rules(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: ignore::Error,
    ) -> Self {
        Self::Rules {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn aborted(operation: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::Aborted {
            operation,
            path: path.into(),
        }
    }
}
