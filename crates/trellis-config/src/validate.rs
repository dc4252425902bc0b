//! Structural validation for workspace profiles.
//!
//! Validation is filesystem-free: it checks shapes and value rules only.
//! Pattern compilation errors (bad globs, bad regexes) surface later from
//! discovery, where the offending pattern is actually evaluated.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    ActionKind, ItemKind, OperationSpec, PathMapping, PatternKind, PostCommand, SearchPattern,
    WorkspaceProfile,
};

/// Validate a parsed profile against the structural rules.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first offending field.
pub fn validate_profile(profile: &WorkspaceProfile) -> ConfigResult<()> {
    if profile.target_dir.trim().is_empty() {
        return Err(ConfigError::invalid(
            "profile",
            "targetDir",
            None,
            "must not be empty",
        ));
    }
    if profile.prompt_threshold == 0 {
        return Err(ConfigError::invalid(
            "profile",
            "promptThreshold",
            Some(profile.prompt_threshold.to_string()),
            "must be positive",
        ));
    }
    for (index, operation) in profile.operations.iter().enumerate() {
        validate_operation(index, operation)?;
    }
    for (index, command) in profile.post_commands.iter().enumerate() {
        validate_post_command(index, command)?;
    }
    Ok(())
}

fn validate_operation(index: usize, operation: &OperationSpec) -> ConfigResult<()> {
    let section = format!("operations[{index}]");
    if operation.base_dir.trim().is_empty() {
        return Err(ConfigError::invalid(
            section,
            "baseDir",
            None,
            "must not be empty",
        ));
    }
    if !Path::new(&operation.base_dir).is_absolute() {
        return Err(ConfigError::invalid(
            section,
            "baseDir",
            Some(operation.base_dir.clone()),
            "must be an absolute path",
        ));
    }
    if operation.kind == ItemKind::Directory && operation.action == ActionKind::Hardlink {
        return Err(ConfigError::invalid(
            section,
            "action",
            Some(operation.action.to_string()),
            "hardlink is only valid for file operations",
        ));
    }
    if let Some(destination) = &operation.destination {
        if destination.trim().is_empty() {
            return Err(ConfigError::invalid(
                section,
                "destination",
                None,
                "must not be empty when present",
            ));
        }
        if Path::new(destination).is_absolute() {
            return Err(ConfigError::invalid(
                section,
                "destination",
                Some(destination.clone()),
                "must be relative to the target root",
            ));
        }
    }
    for (pattern_index, pattern) in operation.patterns.iter().enumerate() {
        validate_pattern(&section, pattern_index, pattern)?;
    }
    Ok(())
}

fn validate_pattern(section: &str, index: usize, pattern: &SearchPattern) -> ConfigResult<()> {
    let section = format!("{section}.patterns[{index}]");
    if pattern.kind != PatternKind::Path && pattern.pattern.has_mappings() {
        return Err(ConfigError::invalid(
            section,
            "pattern",
            None,
            "source/destination mappings require a path pattern",
        ));
    }
    for literal in pattern.pattern.literals() {
        if literal.trim().is_empty() {
            return Err(ConfigError::invalid(
                section.clone(),
                "pattern",
                None,
                "must not contain empty entries",
            ));
        }
    }
    for mapping in pattern.pattern.mappings() {
        validate_mapping(&section, mapping)?;
    }
    Ok(())
}

fn validate_mapping(section: &str, mapping: &PathMapping) -> ConfigResult<()> {
    for (field, value) in [
        ("pattern.source", &mapping.source),
        ("pattern.destination", &mapping.destination),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid(
                section.to_string(),
                field,
                None,
                "must not be empty",
            ));
        }
        if Path::new(value).is_absolute() {
            return Err(ConfigError::invalid(
                section.to_string(),
                field,
                Some(value.clone()),
                "must be a relative path",
            ));
        }
    }
    Ok(())
}

fn validate_post_command(index: usize, command: &PostCommand) -> ConfigResult<()> {
    let section = format!("postCommands[{index}]");
    if command.command.trim().is_empty() {
        return Err(ConfigError::invalid(
            section,
            "command",
            None,
            "must not be empty",
        ));
    }
    if let Some(cwd) = &command.cwd
        && cwd.trim().is_empty()
    {
        return Err(ConfigError::invalid(
            section,
            "cwd",
            None,
            "must not be empty when present",
        ));
    }
    if command.timeout_secs == Some(0) {
        return Err(ConfigError::invalid(
            section,
            "timeoutSecs",
            Some("0".to_string()),
            "must be positive when present",
        ));
    }
    Ok(())
}
