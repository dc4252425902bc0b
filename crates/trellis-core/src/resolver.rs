//! Non-interactive collaborator implementations for silent runs.

use std::path::Path;

use async_trait::async_trait;
use trellis_config::ConflictChoice;

use crate::service::{ConflictResolver, Prompter};

/// Resolver that answers every conflict with a fixed configured choice.
#[derive(Debug, Clone, Copy)]
pub struct SilentResolver {
    choice: ConflictChoice,
}

impl SilentResolver {
    /// Build a resolver around the profile's configured default.
    #[must_use]
    pub const fn new(choice: ConflictChoice) -> Self {
        Self { choice }
    }
}

#[async_trait]
impl ConflictResolver for SilentResolver {
    async fn resolve_existing_target(
        &self,
        _source: &Path,
        _destination: &Path,
        _existing: &Path,
    ) -> anyhow::Result<ConflictChoice> {
        Ok(self.choice)
    }

    async fn resolve_existing_backup(&self, _backup_path: &Path) -> anyhow::Result<ConflictChoice> {
        Ok(self.choice)
    }
}

/// Prompter that answers every confirmation affirmatively.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Prompter for AutoConfirm {
    async fn confirm(&self, _message: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}
