//! Impact of a unified diff: touched symbols and importing files.

use crate::indexer::dependencies::DependencyResolver;
use crate::indexer::languages::LanguageRegistry;
use crate::indexer::symbols::{Symbol, SymbolKind};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Assumed span of a symbol below its definition line.
pub const SYMBOL_SPAN_LINES: usize = 20;

static FILE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^diff --git a/(.*?) b/(.*?)$").expect("valid regex"));

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^@@\s+-(\d+)(?:,(\d+))?\s+\+(\d+)(?:,(\d+))?\s+@@").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
}

impl Hunk {
    /// Whether the new-side range touches `[start, end]`.
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.new_start <= end && self.new_start + self.new_count >= start
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path on the new side, relative to the repository root.
    pub file: String,
    pub insertions: usize,
    pub deletions: usize,
    pub hunks: Vec<Hunk>,
}

/// Split `git diff` output into per-file statistics and hunks.
pub fn parse_unified_diff(text: &str) -> Vec<FileDiff> {
    let headers: Vec<_> = FILE_HEADER.captures_iter(text).collect();
    headers
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let start = caps.get(0).map_or(0, |m| m.end());
            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            let body = &text[start..end];

            let insertions = body
                .lines()
                .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
                .count();
            let deletions = body
                .lines()
                .filter(|l| l.starts_with('-') && !l.starts_with("---"))
                .count();
            let hunks = HUNK_HEADER
                .captures_iter(body)
                .map(|h| {
                    let num = |g: usize, default: usize| {
                        h.get(g)
                            .and_then(|m| m.as_str().parse().ok())
                            .unwrap_or(default)
                    };
                    Hunk {
                        old_start: num(1, 0),
                        old_count: num(2, 1),
                        new_start: num(3, 0),
                        new_count: num(4, 1),
                    }
                })
                .collect();

            FileDiff {
                file: caps[2].to_string(),
                insertions,
                deletions,
                hunks,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct AffectedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangedFile {
    pub file: String,
    pub insertions: usize,
    pub deletions: usize,
    pub affected_symbols: Vec<AffectedSymbol>,
}

#[derive(Debug, Serialize)]
pub struct DiffImpact {
    #[serde(rename = "ref")]
    pub reference: String,
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub changed_files: Vec<ChangedFile>,
    /// Files importing a changed file.
    pub impact: Vec<String>,
}

/// Symbols whose assumed span overlaps any hunk.
pub fn affected_symbols(symbols: &[Symbol], hunks: &[Hunk]) -> Vec<AffectedSymbol> {
    symbols
        .iter()
        .filter(|s| {
            hunks
                .iter()
                .any(|h| h.overlaps(s.line, s.line + SYMBOL_SPAN_LINES))
        })
        .map(|s| AffectedSymbol {
            name: s.name.clone(),
            kind: s.kind,
            line: s.line,
        })
        .collect()
}

/// Analyze `diff_text` produced against `reference` in the repository at
/// `root`.
pub fn analyze(
    root: &Path,
    diff_text: &str,
    reference: &str,
    resolver: &DependencyResolver,
) -> DiffImpact {
    let files = parse_unified_diff(diff_text);
    let changed_files: Vec<ChangedFile> = files
        .iter()
        .map(|fd| ChangedFile {
            file: fd.file.clone(),
            insertions: fd.insertions,
            deletions: fd.deletions,
            affected_symbols: current_symbols(root, &fd.file)
                .map(|symbols| affected_symbols(&symbols, &fd.hunks))
                .unwrap_or_default(),
        })
        .collect();

    let changed: Vec<PathBuf> = files.iter().map(|fd| root.join(&fd.file)).collect();
    let impact = resolver.impacted_by(&changed);

    DiffImpact {
        reference: reference.to_string(),
        files_changed: changed_files.len(),
        insertions: changed_files.iter().map(|f| f.insertions).sum(),
        deletions: changed_files.iter().map(|f| f.deletions).sum(),
        changed_files,
        impact,
    }
}

/// Symbols of the working-tree copy of `file`, if it still exists and has a
/// language.
fn current_symbols(root: &Path, file: &str) -> Option<Vec<Symbol>> {
    let path = root.join(file);
    let language = LanguageRegistry::global().detect(&path)?;
    match std::fs::read_to_string(&path) {
        Ok(content) => Some(language.extract_symbols(file, &content)),
        Err(e) => {
            debug!("no symbols for {}: {e}", path.display());
            None
        }
    }
}
