//! Candidate file discovery.
//!
//! [`FileWalker`] wraps `ignore::WalkBuilder` with the project's pruning
//! rules. Each call to [`FileWalker::walk`] starts a fresh lazy walk.

use super::languages::LanguageRegistry;
use crate::config::Config;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lock files are generated noise and never indexed.
pub const LOCK_FILES: &[&str] = &[
    "pnpm-lock.yaml",
    "package-lock.json",
    "yarn.lock",
    "Cargo.lock",
    "poetry.lock",
    "composer.lock",
];

/// How library roots are treated during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryMode {
    /// Prune library roots (project scope).
    #[default]
    Exclude,
    /// Yield only files under library roots.
    Only,
    /// No library handling.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct FileWalker {
    ignore_dirs: Arc<HashSet<String>>,
    ignore_globs: Option<GlobSet>,
    library_roots: Arc<Vec<PathBuf>>,
    max_file_size: u64,
    /// Ignore patterns are relative to this root when the file lies below it.
    pattern_root: Option<Arc<PathBuf>>,
}

impl FileWalker {
    pub fn new(
        ignore_dirs: impl IntoIterator<Item = String>,
        ignore_patterns: &[String],
        library_roots: Vec<PathBuf>,
        max_file_size: u64,
    ) -> Self {
        Self {
            ignore_dirs: Arc::new(ignore_dirs.into_iter().collect()),
            ignore_globs: build_ignore_globs(ignore_patterns),
            library_roots: Arc::new(library_roots),
            max_file_size,
            pattern_root: None,
        }
    }

    pub fn from_config(config: &Config, project_root: &Path) -> Self {
        Self::new(
            config.walker.ignore_dirs.iter().cloned(),
            &config.walker.ignore_patterns,
            config.library_paths(project_root),
            config.max_file_size(),
        )
        .with_pattern_root(project_root)
    }

    /// Anchor ignore patterns at `root` instead of each walk's directory.
    pub fn with_pattern_root(mut self, root: &Path) -> Self {
        self.pattern_root = Some(Arc::new(absolute(root)));
        self
    }

    pub fn library_roots(&self) -> &[PathBuf] {
        &self.library_roots
    }

    /// Lazily walk `dir`, yielding files with a registered language.
    ///
    /// Paths are absolute and lexically normalized.
    pub fn walk(
        &self,
        dir: &Path,
        mode: LibraryMode,
        language: Option<&str>,
    ) -> impl Iterator<Item = PathBuf> + use<> {
        let root = absolute(dir);
        let ignore_dirs = Arc::clone(&self.ignore_dirs);
        let libs = Arc::clone(&self.library_roots);
        let prune_libs = mode == LibraryMode::Exclude && !libs.is_empty();

        let walker = WalkBuilder::new(&root)
            .hidden(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if ignore_dirs.contains(name.as_ref()) {
                    return false;
                }
                if prune_libs {
                    let path = normalize_path(entry.path());
                    if libs.iter().any(|lib| path.starts_with(lib)) {
                        debug!("pruning library dir {}", path.display());
                        return false;
                    }
                }
                true
            })
            .build();

        let globs = self.ignore_globs.clone();
        let pattern_root = self.pattern_root.clone();
        let libs = Arc::clone(&self.library_roots);
        let max_size = self.max_file_size;
        let language = language.map(str::to_string);

        walker.filter_map(Result::ok).filter_map(move |entry| {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                return None;
            }
            let name = entry.file_name().to_str()?;
            if LOCK_FILES.contains(&name) {
                return None;
            }

            let lang = LanguageRegistry::global().detect(entry.path())?;
            if language.as_deref().is_some_and(|l| l != lang.id()) {
                return None;
            }

            if max_size > 0 {
                match entry.metadata() {
                    Ok(meta) if meta.len() > max_size => return None,
                    Ok(_) => {}
                    Err(_) => return None,
                }
            }

            let path = normalize_path(entry.path());

            // Files outside the pattern root (external libraries) match
            // relative to the directory being walked.
            let rel = pattern_root
                .as_deref()
                .and_then(|r| path.strip_prefix(r).ok())
                .or_else(|| path.strip_prefix(&root).ok());
            if let Some(globs) = &globs
                && let Some(rel) = rel
                && globs.is_match(rel)
            {
                return None;
            }

            if mode == LibraryMode::Only && !libs.iter().any(|lib| path.starts_with(lib)) {
                return None;
            }

            Some(path)
        })
    }
}

/// Translate gitignore-style lines into one glob set.
///
/// Patterns without a slash match at any depth; a leading slash anchors to
/// the pattern root; every pattern also matches everything below a matching
/// directory.
fn build_ignore_globs(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GlobSetBuilder::new();
    let mut added = 0;
    for raw in patterns {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('!') {
            warn!("negated ignore pattern not supported: {line}");
            continue;
        }

        let body = line.trim_end_matches('/');
        let anchored = body.starts_with('/') || body.contains('/');
        let body = body.trim_start_matches('/');
        let base = if anchored || body.starts_with("**") {
            body.to_string()
        } else {
            format!("**/{body}")
        };

        for candidate in [base.clone(), format!("{base}/**")] {
            match Glob::new(&candidate) {
                Ok(glob) => {
                    builder.add(glob);
                    added += 1;
                }
                Err(e) => warn!("invalid ignore pattern {line}: {e}"),
            }
        }
    }

    if added == 0 {
        return None;
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(e) => {
            warn!("failed to build ignore patterns: {e}");
            None
        }
    }
}

/// Absolute form of `path`, relative to the current directory if needed.
pub fn absolute(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_path(&abs)
}

/// Lexically resolve `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(comp);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Path string with `/` separators, used as the file key everywhere.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Key of `path` relative to `root`, or the full key outside of it.
pub fn relative_key(root: &Path, path: &Path) -> String {
    path_key(path.strip_prefix(root).unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn walker(patterns: &[&str], libs: Vec<PathBuf>, max: u64) -> FileWalker {
        FileWalker::new(
            crate::config::DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()),
            &patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            libs,
            max,
        )
    }

    fn names(root: &Path, files: impl Iterator<Item = PathBuf>) -> Vec<String> {
        let root = absolute(root);
        let mut out: Vec<String> = files
            .map(|p| path_key(p.strip_prefix(&root).unwrap()))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_walk_prunes_and_filters() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("src/notes.txt"), "plain").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("Cargo.lock"), "lock").unwrap();
        fs::write(root.join("Makefile"), "all:").unwrap();

        let w = walker(&[], vec![], 256 * 1024);
        let found = names(root, w.walk(root, LibraryMode::Exclude, None));
        assert_eq!(found, vec!["Makefile", "src/main.rs"]);
    }

    #[test]
    fn test_walk_language_filter_and_size() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "x = 1").unwrap();
        fs::write(root.join("b.rs"), "fn b() {}").unwrap();
        fs::write(root.join("big.py"), "#".repeat(4096)).unwrap();

        let w = walker(&[], vec![], 1024);
        let found = names(root, w.walk(root, LibraryMode::Exclude, Some("python")));
        assert_eq!(found, vec!["a.py"]);
    }

    #[test]
    fn test_walk_ignore_patterns() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("gen/deep")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("gen/deep/out.ts"), "x").unwrap();
        fs::write(root.join("src/app.ts"), "x").unwrap();
        fs::write(root.join("src/app.test.ts"), "x").unwrap();

        let w = walker(&["gen/", "*.test.ts"], vec![], 0);
        let found = names(root, w.walk(root, LibraryMode::Exclude, None));
        assert_eq!(found, vec!["src/app.ts"]);
    }

    #[test]
    fn test_walk_anchored_pattern_uses_project_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/gen")).unwrap();
        fs::create_dir_all(root.join("lib/src/gen")).unwrap();
        fs::write(root.join("src/gen/out.rs"), "fn out() {}").unwrap();
        fs::write(root.join("src/lib.rs"), "fn lib() {}").unwrap();
        fs::write(root.join("lib/src/gen/keep.rs"), "fn keep() {}").unwrap();

        let w = walker(&["/src/gen"], vec![], 0).with_pattern_root(root);

        let from_root = names(root, w.walk(root, LibraryMode::Exclude, None));
        assert_eq!(from_root, vec!["lib/src/gen/keep.rs", "src/lib.rs"]);

        let from_src = names(root, w.walk(&root.join("src"), LibraryMode::Exclude, None));
        assert_eq!(from_src, vec!["src/lib.rs"]);

        let from_lib = names(root, w.walk(&root.join("lib"), LibraryMode::Exclude, None));
        assert_eq!(from_lib, vec!["lib/src/gen/keep.rs"]);
    }

    #[test]
    fn test_walk_library_modes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("vendor/lib")).unwrap();
        fs::write(root.join("vendor/lib/util.go"), "package lib").unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();

        let libs = vec![absolute(&root.join("vendor/lib"))];
        let w = walker(&[], libs, 0);

        let project = names(root, w.walk(root, LibraryMode::Exclude, None));
        assert_eq!(project, vec!["main.go"]);

        let only = names(root, w.walk(root, LibraryMode::Only, None));
        assert_eq!(only, vec!["vendor/lib/util.go"]);

        let all = names(root, w.walk(root, LibraryMode::Ignore, None));
        assert_eq!(all, vec!["main.go", "vendor/lib/util.go"]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        let w = walker(&[], vec![], 0);
        assert_eq!(w.walk(dir.path(), LibraryMode::Exclude, None).count(), 1);
        assert_eq!(w.walk(dir.path(), LibraryMode::Exclude, None).count(), 1);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d.rs")),
            PathBuf::from("/a/c/d.rs")
        );
        assert_eq!(normalize_path(Path::new("a/./b")), PathBuf::from("a/b"));
    }
}
