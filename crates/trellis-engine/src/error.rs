//! Error types for workflow planning and execution.

use std::error::Error;
use std::path::{Path, PathBuf};

use thiserror::Error;
use trellis_config::ConfigError;

/// Primary error type for workflow operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A relative target directory was supplied without a workspace root.
    #[error("workspace root required for relative target directory")]
    WorkspaceRootMissing {
        /// The relative target directory from the profile.
        target_dir: PathBuf,
    },
    /// The profile failed structural validation.
    #[error("workspace profile is invalid")]
    InvalidProfile {
        /// Underlying validation failure.
        #[source]
        source: ConfigError,
    },
    /// Source discovery failed.
    #[error("source discovery failed")]
    Discovery {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Batched copy delegation failed.
    #[error("copy execution failed")]
    Copy {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Link creation failed.
    #[error("link creation failed")]
    Link {
        /// Operation identifier.
        operation: &'static str,
        /// Source path of the failing operation.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Attribute adjustment failed.
    #[error("attribute adjustment failed")]
    Attributes {
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A confirmation prompt could not be answered.
    #[error("confirmation prompt failed")]
    Prompt {
        /// What was being confirmed.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl EngineError {
    pub(crate) fn discovery(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Discovery {
            operation,
            source: source.into(),
        }
    }

    pub(crate) fn copy(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Copy {
            operation,
            source: source.into(),
        }
    }

    pub(crate) fn link(operation: &'static str, path: &Path, source: anyhow::Error) -> Self {
        Self::Link {
            operation,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn attributes(source: anyhow::Error) -> Self {
        Self::Attributes {
            source: source.into(),
        }
    }

    pub(crate) fn prompt(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Prompt {
            operation,
            source: source.into(),
        }
    }
}

/// Convenience alias for workflow results.
pub type EngineResult<T> = Result<T, EngineError>;
