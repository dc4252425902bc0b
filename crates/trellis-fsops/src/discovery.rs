//! Pattern-driven discovery of source files and directories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::GitignoreBuilder;
use regex::Regex;
use tracing::{debug, warn};
use trellis_config::{ItemKind, PatternKind, SearchPattern};
use trellis_core::SourceDiscovery;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// [`SourceDiscovery`] backed by the real filesystem.
///
/// Patterns are evaluated in declaration order against paths relative to the
/// base directory; when several patterns select the same path, the first
/// selection wins and later duplicates are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDiscovery;

impl FsDiscovery {
    /// Create a discovery service.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn discover(
        base_dir: &Path,
        patterns: &[SearchPattern],
        kind: ItemKind,
    ) -> FsOpsResult<Vec<PathBuf>> {
        let needs_walk = patterns
            .iter()
            .any(|pattern| pattern.kind != PatternKind::Path);
        let entries = if needs_walk {
            collect_entries(base_dir, kind)?
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for pattern in patterns {
            for path in select(base_dir, pattern, &entries, kind)? {
                if seen.insert(path.clone()) {
                    selected.push(path);
                }
            }
        }
        debug!(
            base_dir = %base_dir.display(),
            kind = %kind,
            selected = selected.len(),
            "discovery complete"
        );
        Ok(selected)
    }
}

#[async_trait]
impl SourceDiscovery for FsDiscovery {
    async fn discover_files(
        &self,
        base_dir: &Path,
        patterns: &[SearchPattern],
    ) -> anyhow::Result<Vec<PathBuf>> {
        Ok(Self::discover(base_dir, patterns, ItemKind::File)?)
    }

    async fn discover_directories(
        &self,
        base_dir: &Path,
        patterns: &[SearchPattern],
    ) -> anyhow::Result<Vec<PathBuf>> {
        Ok(Self::discover(base_dir, patterns, ItemKind::Directory)?)
    }

    async fn count_files(&self, directories: &[PathBuf]) -> anyhow::Result<u64> {
        let mut total: u64 = 0;
        for directory in directories {
            total = total.saturating_add(count_files_in(directory)?);
        }
        Ok(total)
    }
}

struct Entry {
    absolute: PathBuf,
    relative: PathBuf,
}

fn collect_entries(base_dir: &Path, kind: ItemKind) -> FsOpsResult<Vec<Entry>> {
    let mut entries = Vec::new();
    for result in WalkDir::new(base_dir).follow_links(false).min_depth(1) {
        let entry =
            result.map_err(|source| FsOpsError::walkdir("discover.walk", base_dir, source))?;
        let wanted = match kind {
            ItemKind::File => entry.file_type().is_file(),
            ItemKind::Directory => entry.file_type().is_dir(),
        };
        if !wanted {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        entries.push(Entry {
            absolute: entry.path().to_path_buf(),
            relative: relative.to_path_buf(),
        });
    }
    Ok(entries)
}

fn select(
    base_dir: &Path,
    pattern: &SearchPattern,
    entries: &[Entry],
    kind: ItemKind,
) -> FsOpsResult<Vec<PathBuf>> {
    let literals = pattern.pattern.literals();
    match pattern.kind {
        PatternKind::Glob => match_glob(&literals, entries),
        PatternKind::Regex => match_regex(&literals, entries),
        PatternKind::IgnoreFile => match_rules_files(base_dir, &literals, entries, kind),
        PatternKind::Path => Ok(match_literal_paths(base_dir, &literals, kind)),
    }
}

fn match_glob(literals: &[&str], entries: &[Entry]) -> FsOpsResult<Vec<PathBuf>> {
    let set = compile_globs(literals)?;
    Ok(entries
        .iter()
        .filter(|entry| set.is_match(&entry.relative))
        .map(|entry| entry.absolute.clone())
        .collect())
}

fn compile_globs(literals: &[&str]) -> FsOpsResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for literal in literals {
        let glob = Glob::new(literal)
            .map_err(|source| FsOpsError::glob("discover.glob", (*literal).to_owned(), source))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| FsOpsError::glob("discover.glob", literals.join(", "), source))
}

fn match_regex(literals: &[&str], entries: &[Entry]) -> FsOpsResult<Vec<PathBuf>> {
    let mut expressions = Vec::with_capacity(literals.len());
    for literal in literals {
        let expression = Regex::new(literal)
            .map_err(|source| FsOpsError::regex("discover.regex", (*literal).to_owned(), source))?;
        expressions.push(expression);
    }
    Ok(entries
        .iter()
        .filter(|entry| {
            let relative = entry.relative.to_string_lossy();
            expressions
                .iter()
                .any(|expression| expression.is_match(&relative))
        })
        .map(|entry| entry.absolute.clone())
        .collect())
}

fn match_rules_files(
    base_dir: &Path,
    literals: &[&str],
    entries: &[Entry],
    kind: ItemKind,
) -> FsOpsResult<Vec<PathBuf>> {
    let mut builder = GitignoreBuilder::new(base_dir);
    for literal in literals {
        let rules_path = base_dir.join(literal);
        if let Some(source) = builder.add(&rules_path) {
            return Err(FsOpsError::rules("discover.rules", rules_path, source));
        }
    }
    let rules = builder
        .build()
        .map_err(|source| FsOpsError::rules("discover.rules", base_dir, source))?;
    let is_dir = kind == ItemKind::Directory;
    Ok(entries
        .iter()
        .filter(|entry| {
            !rules
                .matched_path_or_any_parents(&entry.relative, is_dir)
                .is_ignore()
        })
        .map(|entry| entry.absolute.clone())
        .collect())
}

fn match_literal_paths(base_dir: &Path, literals: &[&str], kind: ItemKind) -> Vec<PathBuf> {
    let mut selected = Vec::new();
    for literal in literals {
        let candidate = base_dir.join(literal);
        let found = match kind {
            ItemKind::File => candidate.is_file(),
            ItemKind::Directory => candidate.is_dir(),
        };
        if found {
            selected.push(candidate);
        } else {
            warn!(
                path = %candidate.display(),
                kind = %kind,
                "declared path missing or wrong kind, skipping"
            );
        }
    }
    selected
}

fn count_files_in(directory: &Path) -> FsOpsResult<u64> {
    let mut count: u64 = 0;
    for result in WalkDir::new(directory).follow_links(false) {
        let entry =
            result.map_err(|source| FsOpsError::walkdir("discover.count", directory, source))?;
        if entry.file_type().is_file() {
            count = count.saturating_add(1);
        }
    }
    Ok(count)
}
