//! Stdin-backed prompting and conflict resolution.
//!
//! Questions are written to stderr so stdout stays reserved for rendered
//! output; answers are read on a blocking thread because interactive stdin
//! reads should not tie up the runtime.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, bail};
use async_trait::async_trait;
use trellis_config::ConflictChoice;
use trellis_core::{ConflictResolver, Prompter};

/// Prompter asking yes/no confirmations on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StdinPrompter;

#[async_trait]
impl Prompter for StdinPrompter {
    async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        let answer = ask(&format!("{message} [y/N] ")).await?;
        Ok(is_affirmative(&answer))
    }
}

/// Resolver asking the operator what to do with an existing entry.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct InteractiveResolver;

#[async_trait]
impl ConflictResolver for InteractiveResolver {
    async fn resolve_existing_target(
        &self,
        source: &Path,
        destination: &Path,
        _existing: &Path,
    ) -> anyhow::Result<ConflictChoice> {
        let question = format!(
            "'{}' already exists (source '{}'). [o]verwrite, [s]kip, or [a]bort? ",
            destination.display(),
            source.display()
        );
        resolve(&question).await
    }

    async fn resolve_existing_backup(&self, backup_path: &Path) -> anyhow::Result<ConflictChoice> {
        let question = format!(
            "attribute backup '{}' already exists. [o]verwrite, [s]kip, or [a]bort? ",
            backup_path.display()
        );
        resolve(&question).await
    }
}

/// Re-asks until the answer names one of the three choices.
async fn resolve(question: &str) -> anyhow::Result<ConflictChoice> {
    loop {
        let answer = ask(question).await?;
        if let Some(choice) = parse_conflict_answer(&answer) {
            return Ok(choice);
        }
    }
}

async fn ask(question: &str) -> anyhow::Result<String> {
    write_prompt(question)?;
    tokio::task::spawn_blocking(read_answer_line)
        .await
        .context("prompt reader task failed")?
}

fn write_prompt(question: &str) -> anyhow::Result<()> {
    let mut stderr = io::stderr().lock();
    stderr
        .write_all(question.as_bytes())
        .context("failed to write prompt")?;
    stderr.flush().context("failed to flush prompt")
}

fn read_answer_line() -> anyhow::Result<String> {
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read prompt answer")?;
    if read == 0 {
        bail!("input closed while waiting for an answer");
    }
    Ok(line)
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_conflict_answer(answer: &str) -> Option<ConflictChoice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "o" | "overwrite" => Some(ConflictChoice::Overwrite),
        "s" | "skip" => Some(ConflictChoice::Skip),
        "a" | "abort" => Some(ConflictChoice::Abort),
        _ => None,
    }
}
