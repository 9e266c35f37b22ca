//! Structural views over the source tree: type hierarchy, dead-code
//! candidates, symbol references and diff impact.
//!
//! Everything here is recomputed from the files on each call and is
//! independent of the vector index. Matching is textual, with no scope or
//! shadowing awareness.

pub mod dead_code;
pub mod diff;
pub mod hierarchy;
pub mod references;

use crate::indexer::languages::{Language, LanguageRegistry};
use crate::indexer::symbols::Symbol;
use crate::indexer::walker::{FileWalker, LibraryMode, absolute, relative_key};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A readable source file with its detected language.
pub struct SourceFile {
    pub path: PathBuf,
    /// Root-relative key with `/` separators.
    pub key: String,
    pub language: &'static Language,
    pub content: String,
}

impl SourceFile {
    /// Lines with 1-based numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content.split('\n').enumerate().map(|(i, l)| (i + 1, l))
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.language.extract_symbols(&self.key, &self.content)
    }
}

/// Read every project file under `root`, optionally for one language.
///
/// Unreadable files are skipped.
pub fn load_sources(walker: &FileWalker, root: &Path, language: Option<&str>) -> Vec<SourceFile> {
    let root = absolute(root);
    walker
        .walk(&root, LibraryMode::Exclude, language)
        .filter_map(|path| {
            let language = LanguageRegistry::global().detect(&path)?;
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    debug!("skipping {}: {e}", path.display());
                    return None;
                }
            };
            Some(SourceFile {
                key: relative_key(&root, &path),
                path,
                language,
                content,
            })
        })
        .collect()
}

/// Symbols of every file, in walk order.
pub fn collect_symbols(sources: &[SourceFile]) -> Vec<Symbol> {
    sources.iter().flat_map(SourceFile::symbols).collect()
}

/// Split `word` characters the way regex `\w` does.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::Config;
    use std::fs;

    pub fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn sources(root: &Path, language: Option<&str>) -> Vec<SourceFile> {
        let walker = FileWalker::from_config(&Config::default(), root);
        let mut out = load_sources(&walker, root, language);
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }
}
