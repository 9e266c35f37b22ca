//! Name-based lookups: symbol search, definition bodies, call sites and
//! rename previews.

use super::{SourceFile, is_word_char};
use crate::indexer::chunker::Chunk;
use crate::indexer::symbols::{Symbol, SymbolKind};
use anyhow::{Result, ensure};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Upper bound on [`lookup_symbol`] results.
pub const LOOKUP_LIMIT: usize = 50;

const TEXT_PREVIEW_CHARS: usize = 120;

static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:import|from|use|require)\b").expect("valid regex"));

static CALL_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:<[^>]*>\s*)?\(").expect("valid regex"));

static TYPE_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:extends|implements|where)\b").expect("valid regex"));

/// Symbols whose name contains `query`, case-insensitively.
///
/// Exact matches sort first, then by kind and file.
pub fn lookup_symbol(
    sources: &[SourceFile],
    query: &str,
    kind: Option<SymbolKind>,
    language: Option<&str>,
) -> Vec<Symbol> {
    let needle = query.to_lowercase();
    let mut found: Vec<Symbol> = sources
        .iter()
        .filter(|s| language.is_none_or(|l| s.language.id() == l))
        .flat_map(SourceFile::symbols)
        .filter(|s| s.name.to_lowercase().contains(&needle))
        .filter(|s| kind.is_none_or(|k| s.kind == k))
        .collect();
    found.sort_by(|a, b| {
        let rank = |s: &Symbol| (s.name.to_lowercase() != needle, s.kind.as_str(), s.file.clone());
        rank(a).cmp(&rank(b))
    });
    found.truncate(LOOKUP_LIMIT);
    found
}

/// Full definition bodies of every symbol named exactly `name`.
pub fn symbol_definitions(sources: &[SourceFile], name: &str) -> Vec<Chunk> {
    sources
        .iter()
        .filter(|s| s.symbols().iter().any(|sym| sym.name == name))
        .filter_map(|s| s.language.find_definition(&s.key, &s.content, name))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CallSite {
    pub file: String,
    pub line: usize,
    pub text: String,
}

/// Lines that call `name`, excluding lines that define it.
pub fn find_callers(
    sources: &[SourceFile],
    name: &str,
    language: Option<&str>,
) -> Result<Vec<CallSite>> {
    ensure!(is_identifier(name), "not an identifier: {name:?}");
    let escaped = regex::escape(name);
    let calls = [
        Regex::new(&format!(r"\b{escaped}\s*\("))?,
        Regex::new(&format!(r"\b{escaped}\s*<[^>]*>\s*\("))?,
        Regex::new(&format!(r"::{escaped}\s*\("))?,
        Regex::new(&format!(r"\.{escaped}\s*\("))?,
    ];
    let definitions = [
        Regex::new(&format!(
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:fn|function|def|const|let|var|class|struct|enum|trait|interface|type)\s+{escaped}\b"
        ))?,
        Regex::new(&format!(
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?(?:function|class|interface|type|enum|const|let|var)\s+{escaped}\b"
        ))?,
    ];

    let mut callers = Vec::new();
    for source in sources
        .iter()
        .filter(|s| language.is_none_or(|l| s.language.id() == l))
    {
        for (line_no, line) in source.numbered_lines() {
            if definitions.iter().any(|d| d.is_match(line)) {
                continue;
            }
            if calls.iter().any(|c| c.is_match(line)) {
                callers.push(CallSite {
                    file: source.key.clone(),
                    line: line_no,
                    text: preview(line),
                });
            }
        }
    }
    Ok(callers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameCategory {
    Definition,
    Import,
    Call,
    TypeReference,
    Other,
    StringLiteral,
    Comment,
}

impl RenameCategory {
    pub fn would_rename(self) -> bool {
        !matches!(self, RenameCategory::StringLiteral | RenameCategory::Comment)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameOccurrence {
    pub file: String,
    pub line: usize,
    /// 0-based character column.
    pub column: usize,
    pub text: String,
    pub category: RenameCategory,
    pub would_rename: bool,
}

#[derive(Debug, Serialize)]
pub struct RenamePreview {
    pub old_name: String,
    pub new_name: String,
    pub total: usize,
    pub would_rename: usize,
    pub files: usize,
    pub occurrences: Vec<RenameOccurrence>,
}

/// Classify every whole-word occurrence of `old_name`. Nothing is written.
pub fn preview_rename(
    sources: &[SourceFile],
    old_name: &str,
    new_name: &str,
    language: Option<&str>,
) -> Result<RenamePreview> {
    ensure!(is_identifier(old_name), "not an identifier: {old_name:?}");
    ensure!(is_identifier(new_name), "not an identifier: {new_name:?}");
    let escaped = regex::escape(old_name);
    let word = Regex::new(&format!(r"\b{escaped}\b"))?;
    let definition = Regex::new(&format!(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?(?:const\s+)?(?:fn|function|def|class|struct|enum|trait|interface|type|macro_rules!)\s+{escaped}\b"
    ))?;

    let mut occurrences = Vec::new();
    for source in sources
        .iter()
        .filter(|s| language.is_none_or(|l| s.language.id() == l))
    {
        for (line_no, line) in source.numbered_lines() {
            for m in word.find_iter(line) {
                let category = match quoted_or_commented(line, m.start()) {
                    Some(c) => c,
                    None if definition.is_match(line) => RenameCategory::Definition,
                    None if IMPORT_LINE.is_match(line) => RenameCategory::Import,
                    None if CALL_TAIL.is_match(&line[m.end()..]) => RenameCategory::Call,
                    None if is_type_context(line, m.start()) => RenameCategory::TypeReference,
                    None => RenameCategory::Other,
                };
                occurrences.push(RenameOccurrence {
                    file: source.key.clone(),
                    line: line_no,
                    column: line[..m.start()].chars().count(),
                    text: preview(line),
                    category,
                    would_rename: category.would_rename(),
                });
            }
        }
    }

    let files: BTreeSet<&str> = occurrences.iter().map(|o| o.file.as_str()).collect();
    Ok(RenamePreview {
        old_name: old_name.to_string(),
        new_name: new_name.to_string(),
        total: occurrences.len(),
        would_rename: occurrences.iter().filter(|o| o.would_rename).count(),
        files: files.len(),
        occurrences,
    })
}

/// String or comment context of the byte offset `col` in `line`.
fn quoted_or_commented(line: &str, col: usize) -> Option<RenameCategory> {
    let stripped = line.trim_start();
    let line_comment = stripped.starts_with("//")
        || stripped.starts_with("/*")
        || stripped.starts_with('*')
        || (stripped.starts_with('#') && !stripped.starts_with("#[") && !stripped.starts_with("#!"));
    if line_comment {
        return Some(RenameCategory::Comment);
    }

    let mut quote: Option<char> = None;
    let mut chars = line[..col].chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(_) if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if matches!(c, '"' | '\'' | '`') => quote = Some(c),
            None if c == '/' && chars.peek() == Some(&'/') => {
                return Some(RenameCategory::Comment);
            }
            None => {}
        }
    }
    quote.map(|_| RenameCategory::StringLiteral)
}

fn is_type_context(line: &str, col: usize) -> bool {
    let before = line[..col].trim_end();
    before.ends_with(':')
        || before.ends_with("->")
        || before.ends_with('<')
        || TYPE_CONTEXT.is_match(line)
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_word_char)
}

fn preview(line: &str) -> String {
    line.trim().chars().take(TEXT_PREVIEW_CHARS).collect()
}
