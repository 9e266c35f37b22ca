//! Unreferenced function and method candidates.
//!
//! A callable is reported when its name, as a whole word, appears on no line
//! other than its own definition. Names that are called implicitly (trait
//! impls, constructors, entry points, test functions) are skipped.

use super::{SourceFile, is_word_char};
use crate::indexer::symbols::{Symbol, SymbolKind};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Names invoked by convention rather than by a visible call.
pub const SKIP_NAMES: &[&str] = &[
    "main",
    "new",
    "constructor",
    "init",
    "setup",
    "teardown",
    "default",
    "from",
    "into",
    "drop",
    "clone",
    "fmt",
    "eq",
    "ne",
    "partial_cmp",
    "cmp",
    "hash",
    "deref",
    "deref_mut",
    "index",
    "index_mut",
    "next",
    "size_hint",
    "len",
    "is_empty",
    "serialize",
    "deserialize",
];

#[derive(Debug, Clone, Serialize)]
pub struct DeadSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub line: usize,
    pub language: String,
}

/// Find dead-code candidates, optionally restricted to one language.
///
/// With a language filter only files of that language count as references.
pub fn find_dead_code(sources: &[SourceFile], language: Option<&str>) -> Vec<DeadSymbol> {
    let trait_methods = collect_trait_methods(sources);
    let searched: Vec<&SourceFile> = sources
        .iter()
        .filter(|s| language.is_none_or(|l| s.language.id() == l))
        .collect();
    let by_key: HashMap<&str, &SourceFile> =
        searched.iter().map(|&s| (s.key.as_str(), s)).collect();
    let index = WordIndex::build(&searched);

    let mut dead: Vec<DeadSymbol> = searched
        .iter()
        .flat_map(|s| s.symbols())
        .filter(|sym| sym.kind.is_callable())
        .filter(|sym| !is_exempt(sym, &trait_methods, &by_key))
        .filter(|sym| index.only_at(&sym.name, &sym.file, sym.line))
        .map(|sym| DeadSymbol {
            name: sym.name,
            kind: sym.kind,
            file: sym.file,
            line: sym.line,
            language: sym.language,
        })
        .collect();
    dead.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    dead
}

fn is_exempt(
    sym: &Symbol,
    trait_methods: &HashMap<&str, HashSet<String>>,
    by_key: &HashMap<&str, &SourceFile>,
) -> bool {
    let name = sym.name.as_str();
    if SKIP_NAMES.contains(&name) || name.starts_with('_') || name.starts_with("test_") {
        return true;
    }
    if trait_methods
        .get(sym.language.as_str())
        .is_some_and(|methods| methods.contains(name))
    {
        return true;
    }

    let Some(source) = by_key.get(sym.file.as_str()) else {
        return false;
    };
    let lines: Vec<&str> = source.content.split('\n').collect();
    if sym.line >= 2
        && let Some(prev) = lines.get(sym.line - 2)
    {
        let prev = prev.trim();
        if prev.contains("#[wasm_bindgen") || prev.contains("#[test") {
            return true;
        }
    }
    lines
        .get(sym.line.saturating_sub(1))
        .is_some_and(|def| def.contains("export"))
}

/// Method names declared inside trait-like blocks, per language.
fn collect_trait_methods(sources: &[SourceFile]) -> HashMap<&'static str, HashSet<String>> {
    let mut by_language: HashMap<&'static str, HashSet<String>> = HashMap::new();
    for source in sources {
        let Some(rules) = source.language.trait_blocks() else {
            continue;
        };
        let methods = by_language.entry(source.language.id()).or_default();
        let mut in_trait = false;
        let mut opened = false;
        let mut depth = 0i32;
        for line in source.content.lines() {
            if rules.start.is_match(line.trim()) {
                in_trait = true;
                opened = false;
                depth = 0;
            }
            if !in_trait {
                continue;
            }
            let opens = line.matches('{').count() as i32;
            depth += opens - line.matches('}').count() as i32;
            opened |= opens > 0;
            if let Some(caps) = rules.method.captures(line) {
                methods.insert(caps[1].to_string());
            }
            if opened && depth <= 0 {
                in_trait = false;
            }
        }
    }
    by_language
}

/// Up to two distinct `(file, line)` locations per word.
struct WordIndex<'a> {
    words: HashMap<&'a str, Vec<(&'a str, usize)>>,
}

impl<'a> WordIndex<'a> {
    fn build(sources: &[&'a SourceFile]) -> Self {
        let mut words: HashMap<&'a str, Vec<(&'a str, usize)>> = HashMap::new();
        for &source in sources {
            for (line_no, line) in source.numbered_lines() {
                for word in line.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty()) {
                    let seen = words.entry(word).or_default();
                    let here = (source.key.as_str(), line_no);
                    if seen.len() < 2 && !seen.contains(&here) {
                        seen.push(here);
                    }
                }
            }
        }
        Self { words }
    }

    /// Whether `word` occurs nowhere except `file:line`.
    fn only_at(&self, word: &str, file: &str, line: usize) -> bool {
        match self.words.get(word).map(Vec::as_slice) {
            None | Some([]) => true,
            Some([(f, l)]) => *f == file && *l == line,
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{sources, write};
    use tempfile::tempdir;

    fn names(dead: &[DeadSymbol]) -> Vec<&str> {
        dead.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_unreferenced_function_is_flagged() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/main.rs",
            "fn used() {\n}\n\nfn unused_helper() {\n}\n\nfn main() {\n    used();\n}\n",
        );
        let dead = find_dead_code(&sources(dir.path(), None), None);
        assert_eq!(names(&dead), vec!["unused_helper"]);
        assert_eq!(dead[0].file, "src/main.rs");
        assert_eq!(dead[0].line, 4);
        assert_eq!(dead[0].kind, SymbolKind::Function);
    }

    #[test]
    fn test_trait_methods_and_attributes_are_skipped() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/lib.rs",
            "pub trait Greeter\n{\n    fn greet(&self) {\n        println!(\"hi\");\n    }\n}\n\n#[test]\nfn checks_things() {\n}\n\n#[wasm_bindgen]\npub fn exported_to_js() {\n}\n\nfn lonely() {\n}\n",
        );
        let dead = find_dead_code(&sources(dir.path(), None), None);
        assert_eq!(names(&dead), vec!["lonely"]);
    }

    #[test]
    fn test_java_interface_methods_are_skipped() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "Greeter.java",
            "public interface Greeter {\n    default String greet() {\n        return \"hi\";\n    }\n}\n\nclass Util {\n    static int stray() {\n        return 1;\n    }\n}\n",
        );
        let dead = find_dead_code(&sources(dir.path(), None), None);
        assert_eq!(names(&dead), vec!["stray"]);
    }

    #[test]
    fn test_skip_names_and_prefixes() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "app.py",
            "def main():\n    pass\n\ndef _private():\n    pass\n\ndef test_something():\n    pass\n\ndef setup():\n    pass\n\ndef orphan():\n    pass\n",
        );
        let dead = find_dead_code(&sources(dir.path(), None), None);
        assert_eq!(names(&dead), vec!["orphan"]);
    }

    #[test]
    fn test_export_lines_are_skipped() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/api.ts",
            "export function publicApi() {\n}\n\nfunction internalOnly() {\n}\n",
        );
        let dead = find_dead_code(&sources(dir.path(), None), None);
        assert_eq!(names(&dead), vec!["internalOnly"]);
    }

    #[test]
    fn test_references_in_other_files_count() {
        let dir = tempdir().unwrap();
        write(dir.path(), "util.py", "def helper():\n    return 1\n");
        write(dir.path(), "src/lib.rs", "// calls helper through ffi\npub fn run() {\n}\n");

        let all = sources(dir.path(), None);
        assert!(!names(&find_dead_code(&all, None)).contains(&"helper"));

        // only python files count as references under a python filter
        let dead = find_dead_code(&all, Some("python"));
        assert_eq!(names(&dead), vec!["helper"]);
    }

    #[test]
    fn test_word_boundaries() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "m.py",
            "def load():\n    pass\n\ndef run():\n    return load_all() + reload()\n",
        );
        let dead = find_dead_code(&sources(dir.path(), None), None);
        assert!(names(&dead).contains(&"load"));
    }
}
