//! Output renderers and formatting helpers for CLI commands.

use anyhow::Context;
use trellis_config::{ActionKind, ItemKind};
use trellis_core::PlannedOperation;
use trellis_engine::WorkflowPlan;

use crate::cli::OutputFormat;
use crate::context::CliResult;

/// Render the deduplicated plan to stdout.
pub(crate) fn render_plan(plan: &WorkflowPlan, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text =
                serde_json::to_string_pretty(plan).context("failed to format the plan as JSON")?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("target root: {}", plan.target_root.display());
            if plan.deduped > 0 {
                println!("deduplicated: {} redundant operations", plan.deduped);
            }
            if plan.buckets.is_empty() {
                println!("no operations matched");
                return Ok(());
            }
            println!("{:<9} {:<10} {:<44} DESTINATION", "ACTION", "KIND", "SOURCE");
            for operation in plan.buckets.iter() {
                println!("{}", operation_row(operation));
            }
            println!("{} operations planned", plan.buckets.total_operations());
        }
    }
    Ok(())
}

fn operation_row(operation: &PlannedOperation) -> String {
    format!(
        "{:<9} {:<10} {:<44} {}",
        action_label(operation.action),
        kind_label(operation.kind),
        operation.source.display(),
        operation.destination.display()
    )
}

const fn action_label(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Symlink => "symlink",
        ActionKind::Copy => "copy",
        ActionKind::Hardlink => "hardlink",
    }
}

const fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::File => "file",
        ItemKind::Directory => "directory",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(action: ActionKind, kind: ItemKind) -> PlannedOperation {
        PlannedOperation {
            kind,
            action,
            attributes: None,
            source: "/src/assets".into(),
            destination: "/workspace/assets".into(),
        }
    }

    #[test]
    fn rows_carry_action_kind_and_paths() {
        let row = operation_row(&operation(ActionKind::Copy, ItemKind::Directory));
        assert!(row.starts_with("copy"));
        assert!(row.contains("directory"));
        assert!(row.contains("/src/assets"));
        assert!(row.ends_with("/workspace/assets"));
    }

    #[test]
    fn labels_match_the_profile_vocabulary() {
        assert_eq!(action_label(ActionKind::Symlink), "symlink");
        assert_eq!(action_label(ActionKind::Hardlink), "hardlink");
        assert_eq!(kind_label(ItemKind::File), "file");
    }

    #[test]
    fn columns_stay_aligned_for_short_values() {
        let symlink = operation_row(&operation(ActionKind::Symlink, ItemKind::File));
        let copy = operation_row(&operation(ActionKind::Copy, ItemKind::Directory));
        let position = |row: &str| row.find("/src/assets");
        assert_eq!(position(&symlink), position(&copy));
    }
}
