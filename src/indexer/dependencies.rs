//! Import graph over the project tree.
//!
//! Best-effort textual mapping from import literals to files. Reverse edges
//! are recomputed by scanning the whole tree on every call.

use super::languages::{Language, LanguageRegistry};
use super::patterns::ImportRule;
use super::walker::{FileWalker, LibraryMode, absolute, normalize_path, relative_key};
use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names treated as entry points by orphan detection.
pub const ENTRY_POINTS: &[&str] = &[
    "main.ts",
    "main.rs",
    "lib.rs",
    "mod.rs",
    "index.ts",
    "index.js",
    "App.vue",
    "main.py",
    "__init__.py",
    "server.py",
    "Main.java",
    "Application.java",
    "main.go",
    "Program.cs",
    "main.kt",
    "Main.kt",
    "main.rb",
    "main.lua",
    "main.jl",
    "Makefile",
    "Dockerfile",
];

const RELATIVE_SUFFIXES: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".vue", "/index.ts", "/index.js"];
const INDEX_FILES: &[&str] = &["index.ts", "index.js", "index.tsx"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub source: String,
    pub raw: String,
    pub resolved: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDependencies {
    pub file: String,
    pub imports: Vec<DependencyEdge>,
    pub imported_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrphanReport {
    pub total_files: usize,
    pub orphan_count: usize,
    pub orphans: Vec<String>,
}

impl Language {
    /// Raw import literals in source order.
    pub fn import_literals(&self, source: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();
        for re in &self.imports {
            for caps in re.captures_iter(source) {
                let Some(m) = caps.iter().skip(1).flatten().next() else {
                    continue;
                };
                let raw = m.as_str().trim().trim_end_matches(',');
                if !raw.is_empty() && !found.iter().any(|(at, _)| *at == m.start()) {
                    found.push((m.start(), raw.to_string()));
                }
            }
        }
        found.sort_by_key(|(at, _)| *at);
        found.into_iter().map(|(_, raw)| raw).collect()
    }

    /// Map an import literal to an existing file.
    pub fn resolve_import(&self, raw: &str, from: &Path, root: &Path) -> Option<PathBuf> {
        match self.import_rule() {
            ImportRule::Relative => resolve_relative(raw, from),
            ImportRule::ManifestAnchored => resolve_rust(raw, from),
            ImportRule::Dotted => resolve_dotted(raw, root),
            ImportRule::Unresolved => None,
        }
    }
}

fn resolve_relative(raw: &str, from: &Path) -> Option<PathBuf> {
    if !raw.starts_with('.') {
        return None;
    }
    let base = normalize_path(&from.parent()?.join(raw));
    if base.is_file() {
        return Some(base);
    }
    let base_str = base.to_string_lossy();
    for suffix in RELATIVE_SUFFIXES {
        let candidate = PathBuf::from(format!("{base_str}{suffix}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if base.is_dir() {
        return INDEX_FILES
            .iter()
            .map(|idx| base.join(idx))
            .find(|c| c.is_file());
    }
    None
}

fn resolve_rust(raw: &str, from: &Path) -> Option<PathBuf> {
    let segments: Vec<&str> = raw.split("::").collect();
    match segments.first() {
        Some(&"crate") => {
            let manifest_dir = from
                .ancestors()
                .skip(1)
                .find(|dir| dir.join("Cargo.toml").is_file())?;
            descend_modules(&manifest_dir.join("src"), &segments[1..])
        }
        Some(&"super") | Some(&"self") => None,
        // `mod foo;` declared in `from`
        _ => {
            let dir = module_dir(from)?;
            let file = dir.join(format!("{raw}.rs"));
            if file.is_file() {
                return Some(file);
            }
            let index = dir.join(raw).join("mod.rs");
            index.is_file().then_some(index)
        }
    }
}

/// Directory holding the children of the module defined by `file`.
fn module_dir(file: &Path) -> Option<PathBuf> {
    let parent = file.parent()?;
    let stem = file.file_stem()?.to_str()?;
    if matches!(stem, "mod" | "lib" | "main") {
        Some(parent.to_path_buf())
    } else {
        Some(parent.join(stem))
    }
}

/// Follow module segments down from `src/`, keeping the deepest file found.
fn descend_modules(src: &Path, segments: &[&str]) -> Option<PathBuf> {
    let mut dir = src.to_path_buf();
    let mut best = None;
    for seg in segments {
        let file = dir.join(format!("{seg}.rs"));
        let sub = dir.join(seg);
        if file.is_file() {
            best = Some(file);
        } else if sub.is_dir() {
            let index = sub.join("mod.rs");
            if index.is_file() {
                best = Some(index);
            }
        } else {
            break;
        }
        dir = sub;
    }
    best
}

fn resolve_dotted(raw: &str, root: &Path) -> Option<PathBuf> {
    if raw.is_empty() || raw.starts_with('.') {
        return None;
    }
    let base = raw.split('.').fold(root.to_path_buf(), |p, seg| p.join(seg));
    let module = PathBuf::from(format!("{}.py", base.to_string_lossy()));
    if module.is_file() {
        return Some(module);
    }
    let package = base.join("__init__.py");
    package.is_file().then_some(package)
}

/// Dependency views over one project root.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    root: PathBuf,
    walker: FileWalker,
}

impl DependencyResolver {
    pub fn new(root: &Path, walker: FileWalker) -> Self {
        Self {
            root: absolute(root),
            walker,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn files(&self) -> impl Iterator<Item = PathBuf> + use<> {
        self.walker.walk(&self.root, LibraryMode::Exclude, None)
    }

    fn key(&self, path: &Path) -> String {
        relative_key(&self.root, path)
    }

    /// Resolve a caller-supplied path against the project root.
    pub fn locate(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.root.join(path))
        }
    }

    /// Import edges of one file. Unreadable files have none.
    fn edges(&self, path: &Path, lang: &Language) -> Vec<(String, Option<PathBuf>)> {
        let Ok(source) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        lang.import_literals(&source)
            .into_iter()
            .map(|raw| {
                let resolved = lang.resolve_import(&raw, path, &self.root);
                (raw, resolved)
            })
            .collect()
    }

    fn resolved_targets(&self, path: &Path) -> Vec<PathBuf> {
        let Some(lang) = LanguageRegistry::global().detect(path) else {
            return Vec::new();
        };
        self.edges(path, lang)
            .into_iter()
            .filter_map(|(_, resolved)| resolved)
            .collect()
    }

    /// Imports of `path` plus every file importing it.
    pub fn file_dependencies(&self, path: &Path) -> Result<FileDependencies> {
        let target = self.locate(path);
        if !target.is_file() {
            bail!("file not found: {}", path.display());
        }
        let Some(lang) = LanguageRegistry::global().detect(&target) else {
            bail!("unsupported language: {}", path.display());
        };

        let source = self.key(&target);
        let imports = self
            .edges(&target, lang)
            .into_iter()
            .map(|(raw, resolved)| DependencyEdge {
                source: source.clone(),
                raw,
                resolved: resolved.map(|p| self.key(&p)),
            })
            .collect();

        let mut imported_by: Vec<String> = self
            .files()
            .filter(|f| *f != target)
            .filter(|f| self.resolved_targets(f).contains(&target))
            .map(|f| self.key(&f))
            .collect();
        imported_by.sort();

        Ok(FileDependencies {
            file: source,
            imports,
            imported_by,
        })
    }

    /// Files nobody imports that are not conventional entry points.
    pub fn find_orphans(&self) -> OrphanReport {
        let files: Vec<PathBuf> = self.files().collect();
        let imported: HashSet<PathBuf> = files
            .iter()
            .flat_map(|f| self.resolved_targets(f))
            .collect();

        let mut orphans: Vec<String> = files
            .iter()
            .filter(|f| !imported.contains(*f))
            .filter(|f| {
                !f.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| ENTRY_POINTS.contains(&n))
            })
            .map(|f| self.key(f))
            .collect();
        orphans.sort();

        debug!(total = files.len(), orphans = orphans.len(), "orphan scan done");
        OrphanReport {
            total_files: files.len(),
            orphan_count: orphans.len(),
            orphans,
        }
    }

    /// Files importing at least one of `changed`, excluding `changed` itself.
    pub fn impacted_by(&self, changed: &[PathBuf]) -> Vec<String> {
        let changed: HashSet<PathBuf> = changed.iter().map(|p| self.locate(p)).collect();
        let mut out: Vec<String> = self
            .files()
            .filter(|f| !changed.contains(f))
            .filter(|f| self.resolved_targets(f).iter().any(|t| changed.contains(t)))
            .map(|f| self.key(&f))
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn resolver(root: &Path) -> DependencyResolver {
        let walker = FileWalker::new(
            crate::config::DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()),
            &[],
            vec![],
            0,
        );
        DependencyResolver::new(root, walker)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_relative_imports_are_symmetric() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "src/app.ts", "import { util } from './lib/util';\nimport './styles';\nimport x from 'react';\n");
        write(root, "src/lib/util.ts", "export const util = 1;\n");
        write(root, "src/styles/index.ts", "export {};\n");

        let r = resolver(root);
        let deps = r.file_dependencies(Path::new("src/app.ts")).unwrap();
        let resolved: Vec<_> = deps.imports.iter().map(|e| e.resolved.clone()).collect();
        assert_eq!(
            resolved,
            vec![
                Some("src/lib/util.ts".to_string()),
                Some("src/styles/index.ts".to_string()),
                None
            ]
        );

        let back = r.file_dependencies(Path::new("src/lib/util.ts")).unwrap();
        assert_eq!(back.imported_by, vec!["src/app.ts"]);
    }

    #[test]
    fn test_relative_literal_with_extension() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "a.js", "const b = require('./b.js');\n");
        write(root, "b.js", "module.exports = 1;\n");
        let deps = resolver(root).file_dependencies(Path::new("a.js")).unwrap();
        assert_eq!(deps.imports[0].resolved.as_deref(), Some("b.js"));
    }

    #[test]
    fn test_rust_crate_paths_and_mods() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "Cargo.toml", "[package]\nname = \"x\"\n");
        write(root, "src/lib.rs", "mod db;\npub mod config;\n");
        write(root, "src/config.rs", "use crate::db::models::Row;\nuse super::x;\n");
        write(root, "src/db/mod.rs", "pub mod models;\n");
        write(root, "src/db/models.rs", "pub struct Row;\n");

        let r = resolver(root);
        let lib = r.file_dependencies(Path::new("src/lib.rs")).unwrap();
        let resolved: Vec<_> = lib.imports.iter().filter_map(|e| e.resolved.clone()).collect();
        assert_eq!(resolved, vec!["src/db/mod.rs", "src/config.rs"]);

        let cfg = r.file_dependencies(Path::new("src/config.rs")).unwrap();
        assert_eq!(cfg.imports.len(), 2);
        assert_eq!(cfg.imports[0].resolved.as_deref(), Some("src/db/models.rs"));
        assert_eq!(cfg.imports[1].resolved, None);

        let models = r.file_dependencies(Path::new("src/db/models.rs")).unwrap();
        assert_eq!(models.imported_by, vec!["src/config.rs", "src/db/mod.rs"]);
    }

    #[test]
    fn test_python_dotted_imports() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "main.py", "import pkg.util\nfrom pkg import thing\nfrom . import local\nimport os\n");
        write(root, "pkg/__init__.py", "");
        write(root, "pkg/util.py", "X = 1\n");

        let deps = resolver(root).file_dependencies(Path::new("main.py")).unwrap();
        let resolved: Vec<_> = deps.imports.iter().map(|e| e.resolved.as_deref()).collect();
        assert_eq!(
            resolved,
            vec![Some("pkg/util.py"), Some("pkg/__init__.py"), None, None]
        );
    }

    #[test]
    fn test_unresolved_languages_record_imports() {
        let dir = tempdir().unwrap();
        write(dir.path(), "m.c", "#include \"util.h\"\n");
        write(dir.path(), "util.h", "int x;\n");
        let deps = resolver(dir.path()).file_dependencies(Path::new("m.c")).unwrap();
        assert_eq!(deps.imports.len(), 1);
        assert_eq!(deps.imports[0].raw, "util.h");
        assert!(deps.imports[0].resolved.is_none());
    }

    #[test]
    fn test_input_errors() {
        let dir = tempdir().unwrap();
        write(dir.path(), "notes.txt", "hi");
        let r = resolver(dir.path());
        assert!(r.file_dependencies(Path::new("missing.ts")).is_err());
        assert!(r.file_dependencies(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn test_orphans_and_impact() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "index.ts", "import { a } from './a';\n");
        write(root, "a.ts", "import { b } from './b';\nexport const a = 1;\n");
        write(root, "b.ts", "export const b = 1;\n");
        write(root, "c.ts", "import { b } from './b';\n");
        write(root, "lonely.ts", "export const z = 0;\n");

        let r = resolver(root);
        let report = r.find_orphans();
        assert_eq!(report.total_files, 5);
        assert_eq!(report.orphans, vec!["c.ts", "lonely.ts"]);
        assert_eq!(report.orphan_count, 2);

        let impacted = r.impacted_by(&[PathBuf::from("b.ts")]);
        assert_eq!(impacted, vec!["a.ts", "c.ts"]);

        let impacted = r.impacted_by(&[PathBuf::from("b.ts"), PathBuf::from("a.ts")]);
        assert_eq!(impacted, vec!["c.ts", "index.ts"]);
    }
}
