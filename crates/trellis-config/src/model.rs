//! Typed model for workspace profile documents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration document describing one workspace materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkspaceProfile {
    /// Directory the workspace is materialized into; may be relative.
    pub target_dir: String,
    /// Suppress interactive prompts and fall back to configured defaults.
    #[serde(default)]
    pub silent: bool,
    /// Default choice applied when a destination already exists.
    #[serde(default)]
    pub on_conflict: ConflictChoice,
    /// Ordered source declarations to materialize.
    pub operations: Vec<OperationSpec>,
    /// Commands executed after all filesystem operations complete.
    #[serde(default)]
    pub post_commands: Vec<PostCommand>,
    /// File-count ceiling above which execution asks for confirmation.
    #[serde(default = "default_prompt_threshold")]
    pub prompt_threshold: u64,
    /// Collapse redundant operations before executing.
    #[serde(default = "default_true")]
    pub dedupe_sources: bool,
}

/// Resolution for a destination or backup file that already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictChoice {
    /// Replace the existing entry.
    Overwrite,
    /// Leave the existing entry untouched and skip the item.
    #[default]
    Skip,
    /// Treat the conflict as a failure.
    Abort,
}

/// One configured source declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationSpec {
    /// Whether the patterns select files or directories.
    pub kind: ItemKind,
    /// How matched items are materialized.
    pub action: ActionKind,
    /// Absolute directory the patterns are evaluated against.
    pub base_dir: String,
    /// Ordered selection patterns.
    pub patterns: Vec<SearchPattern>,
    /// Destination subdirectory under the target root; defaults to the root
    /// itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Attribute adjustment applied after materialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeSpec>,
}

/// Kind of filesystem entry an operation selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Regular files.
    File,
    /// Directories.
    Directory,
}

/// How a matched item is materialized at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Create a symbolic link pointing at the source.
    Symlink,
    /// Copy the source contents.
    Copy,
    /// Create a hard link to the source (files only).
    Hardlink,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symlink => f.write_str("symlink"),
            Self::Copy => f.write_str("copy"),
            Self::Hardlink => f.write_str("hardlink"),
        }
    }
}

/// One selection pattern within an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchPattern {
    /// Interpretation of the pattern value.
    pub kind: PatternKind,
    /// The pattern payload.
    pub pattern: PatternValue,
}

/// Interpretation applied to a pattern value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    /// Glob matched against paths relative to the base directory.
    Glob,
    /// Regular expression matched against paths relative to the base
    /// directory.
    Regex,
    /// Relative path of a gitignore-syntax rules file; entries not ignored
    /// by the rules are selected.
    IgnoreFile,
    /// Literal relative path, or an explicit source/destination mapping.
    Path,
}

/// Pattern payload: a single value, a list, or explicit path mappings.
///
/// Mappings are only meaningful for [`PatternKind::Path`]; validation rejects
/// them elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternValue {
    /// A single pattern string.
    Literal(String),
    /// A list of pattern strings.
    Sequence(Vec<String>),
    /// A single explicit source/destination mapping.
    Mapping(PathMapping),
    /// A list mixing pattern strings and explicit mappings.
    Mixed(Vec<PathOrMapping>),
}

/// Element of a mixed pattern list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathOrMapping {
    /// A literal relative path.
    Path(String),
    /// An explicit source/destination mapping.
    Mapping(PathMapping),
}

/// Explicit override of the default destination computation for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PathMapping {
    /// Source path relative to the operation's base directory.
    pub source: String,
    /// Destination path relative to the operation's destination base.
    pub destination: String,
}

impl PatternValue {
    /// Plain pattern strings carried by this value, in declaration order.
    #[must_use]
    pub fn literals(&self) -> Vec<&str> {
        match self {
            Self::Literal(value) => vec![value.as_str()],
            Self::Sequence(values) => values.iter().map(String::as_str).collect(),
            Self::Mapping(_) => Vec::new(),
            Self::Mixed(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    PathOrMapping::Path(value) => Some(value.as_str()),
                    PathOrMapping::Mapping(_) => None,
                })
                .collect(),
        }
    }

    /// Explicit mappings carried by this value, in declaration order.
    #[must_use]
    pub fn mappings(&self) -> Vec<&PathMapping> {
        match self {
            Self::Literal(_) | Self::Sequence(_) => Vec::new(),
            Self::Mapping(mapping) => vec![mapping],
            Self::Mixed(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    PathOrMapping::Path(_) => None,
                    PathOrMapping::Mapping(mapping) => Some(mapping),
                })
                .collect(),
        }
    }

    /// Whether the value carries at least one explicit mapping.
    #[must_use]
    pub fn has_mappings(&self) -> bool {
        !self.mappings().is_empty()
    }
}

/// Attribute adjustment applied to a materialized destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttributeSpec {
    /// Readonly state applied to the destination.
    pub read_only: bool,
}

/// Command executed after all filesystem operations complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostCommand {
    /// Command line executed through the platform shell.
    pub command: String,
    /// Working directory; relative values resolve against the target root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Extra environment variables visible to the command.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Wall-clock limit in seconds; absent waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

const fn default_true() -> bool {
    true
}

const fn default_prompt_threshold() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult<T = ()> = anyhow::Result<T>;

    #[test]
    fn profile_defaults_apply() -> TestResult {
        let profile: WorkspaceProfile = serde_json::from_str(
            r#"{"targetDir": "/workspace", "operations": []}"#,
        )?;
        assert!(!profile.silent);
        assert_eq!(profile.on_conflict, ConflictChoice::Skip);
        assert_eq!(profile.prompt_threshold, 100);
        assert!(profile.dedupe_sources);
        assert!(profile.post_commands.is_empty());
        Ok(())
    }

    #[test]
    fn pattern_value_variants_parse() -> TestResult {
        let literal: PatternValue = serde_json::from_str(r#""*.rs""#)?;
        assert_eq!(literal, PatternValue::Literal("*.rs".to_string()));

        let sequence: PatternValue = serde_json::from_str(r#"["a", "b"]"#)?;
        assert_eq!(
            sequence,
            PatternValue::Sequence(vec!["a".to_string(), "b".to_string()])
        );

        let mapping: PatternValue =
            serde_json::from_str(r#"{"source": "docs", "destination": "manual"}"#)?;
        assert!(matches!(mapping, PatternValue::Mapping(_)));

        let mixed: PatternValue =
            serde_json::from_str(r#"["a", {"source": "docs", "destination": "manual"}]"#)?;
        let PatternValue::Mixed(entries) = mixed else {
            anyhow::bail!("expected mixed variant");
        };
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], PathOrMapping::Path(_)));
        assert!(matches!(entries[1], PathOrMapping::Mapping(_)));
        Ok(())
    }

    #[test]
    fn pattern_value_accessors_split_entries() -> TestResult {
        let value: PatternValue = serde_json::from_str(
            r#"["keep.txt", {"source": "docs", "destination": "manual"}, "other.txt"]"#,
        )?;
        assert_eq!(value.literals(), vec!["keep.txt", "other.txt"]);
        assert_eq!(value.mappings().len(), 1);
        assert!(value.has_mappings());
        Ok(())
    }

    #[test]
    fn unknown_profile_fields_are_rejected() {
        let parsed: Result<WorkspaceProfile, _> = serde_json::from_str(
            r#"{"targetDir": "/workspace", "operations": [], "bogus": 1}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn operation_spec_round_trips() -> TestResult {
        let spec = OperationSpec {
            kind: ItemKind::Directory,
            action: ActionKind::Symlink,
            base_dir: "/src".to_string(),
            patterns: vec![SearchPattern {
                kind: PatternKind::Glob,
                pattern: PatternValue::Literal("*".to_string()),
            }],
            destination: Some("views".to_string()),
            attributes: Some(AttributeSpec { read_only: true }),
        };
        let encoded = serde_json::to_string(&spec)?;
        let decoded: OperationSpec = serde_json::from_str(&encoded)?;
        assert_eq!(decoded, spec);
        assert!(encoded.contains("\"baseDir\""));
        assert!(encoded.contains("\"readOnly\""));
        Ok(())
    }
}
