//! Error types for profile loading and validation.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Profile document could not be read from disk.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Profile document was not valid JSON.
    #[error("profile document is not valid JSON")]
    Json {
        /// Path of the offending document.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid profile field")]
    InvalidField {
        /// Section that failed validation (for example `operations[2]`).
        section: String,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(
        section: impl Into<String>,
        field: &'static str,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section: section.into(),
            field,
            value,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
