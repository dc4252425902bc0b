//! Workspace profile builders.

use trellis_config::{
    ActionKind, ConflictChoice, ItemKind, OperationSpec, PatternKind, PatternValue, SearchPattern,
    WorkspaceProfile,
};

/// Profile materializing into `target_dir` with no operations and every
/// optional field at its parsed default.
#[must_use]
pub fn minimal_profile(target_dir: &str) -> WorkspaceProfile {
    WorkspaceProfile {
        target_dir: target_dir.to_string(),
        silent: false,
        on_conflict: ConflictChoice::Skip,
        operations: Vec::new(),
        post_commands: Vec::new(),
        prompt_threshold: 100,
        dedupe_sources: true,
    }
}

/// Operation selecting `pattern` as a glob under `base_dir`.
#[must_use]
pub fn glob_operation(
    kind: ItemKind,
    action: ActionKind,
    base_dir: &str,
    pattern: &str,
) -> OperationSpec {
    operation(kind, action, base_dir, PatternKind::Glob, pattern)
}

/// Operation selecting the literal relative `path` under `base_dir`.
#[must_use]
pub fn path_operation(
    kind: ItemKind,
    action: ActionKind,
    base_dir: &str,
    path: &str,
) -> OperationSpec {
    operation(kind, action, base_dir, PatternKind::Path, path)
}

fn operation(
    kind: ItemKind,
    action: ActionKind,
    base_dir: &str,
    pattern_kind: PatternKind,
    pattern: &str,
) -> OperationSpec {
    OperationSpec {
        kind,
        action,
        base_dir: base_dir.to_string(),
        patterns: vec![SearchPattern {
            kind: pattern_kind,
            pattern: PatternValue::Literal(pattern.to_string()),
        }],
        destination: None,
        attributes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_profile_matches_parsed_defaults() {
        let profile = minimal_profile("/workspace");
        assert_eq!(profile.target_dir, "/workspace");
        assert!(!profile.silent);
        assert_eq!(profile.on_conflict, ConflictChoice::Skip);
        assert_eq!(profile.prompt_threshold, 100);
        assert!(profile.dedupe_sources);
        assert!(profile.operations.is_empty());
    }

    #[test]
    fn builders_carry_the_requested_pattern() {
        let globbed = glob_operation(ItemKind::File, ActionKind::Copy, "/src", "**/*.rs");
        assert_eq!(globbed.patterns.len(), 1);
        assert_eq!(globbed.patterns[0].kind, PatternKind::Glob);
        assert_eq!(globbed.patterns[0].pattern.literals(), vec!["**/*.rs"]);

        let pathed = path_operation(ItemKind::Directory, ActionKind::Symlink, "/src", "assets");
        assert_eq!(pathed.patterns[0].kind, PatternKind::Path);
        assert_eq!(pathed.patterns[0].pattern.literals(), vec!["assets"]);
    }
}
