//! Source chunking.
//!
//! Three tiers, picked by what the language supports:
//!
//! 1. structural chunks from a tree-sitter syntax tree plus `gap` chunks for
//!    uncovered glue code,
//! 2. a single named definition located by regex, with its end found by
//!    brace, indentation or `end` keyword balance,
//! 3. overlapping fixed-size line windows for everything else.

use super::languages::Language;
use super::patterns::{BlockStyle, EndKeywordRules};
use crate::config::ChunkingConfig;
use serde::{Serialize, Serializer};
use tree_sitter::{Node, Parser};

/// Lines scanned past a definition start when its block never closes.
const UNCLOSED_BLOCK_LINES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    /// A syntax node kind such as `function_item`, or `function` for
    /// regex-located definitions.
    Definition(String),
    Gap,
    Block,
}

impl ChunkKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChunkKind::Definition(kind) => kind,
            ChunkKind::Gap => "gap",
            ChunkKind::Block => "block",
        }
    }
}

impl Serialize for ChunkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A line-addressed span of a source file. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub kind: ChunkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Chunk {
    pub fn id(&self) -> String {
        format!("{}:{}-{}", self.file, self.start_line, self.end_line)
    }
}

impl Language {
    /// Chunk a file, degrading to fixed windows when the language has no
    /// grammar or the tree yields nothing.
    pub fn chunk(&self, file: &str, source: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
        if let Some(chunks) = self.chunk_structural(file, source, cfg)
            && !chunks.is_empty()
        {
            return chunks;
        }
        chunk_fixed(file, source, cfg)
    }

    fn chunk_structural(&self, file: &str, source: &str, cfg: &ChunkingConfig) -> Option<Vec<Chunk>> {
        let grammar = self.grammar()?;
        let mut parser = Parser::new();
        parser.set_language(&grammar.language()).ok()?;
        let tree = parser.parse(source, None)?;

        let mut chunks = Vec::new();
        let lines: Vec<&str> = source.split('\n').collect();
        let mut covered = vec![false; lines.len() + 2];

        self.visit(tree.root_node(), file, source, &lines, cfg, &mut chunks, &mut covered);

        let mut gap_start: Option<usize> = None;
        for line in 1..=lines.len() + 1 {
            let is_covered = line > lines.len() || covered[line];
            match (is_covered, gap_start) {
                (false, None) => gap_start = Some(line),
                (true, Some(start)) => {
                    if line - start >= cfg.gap_threshold {
                        let text = lines[start - 1..line - 1].join("\n");
                        if !text.trim().is_empty() {
                            chunks.push(Chunk {
                                file: file.to_string(),
                                start_line: start,
                                end_line: line - 1,
                                content: text,
                                kind: ChunkKind::Gap,
                                name: None,
                            });
                        }
                    }
                    gap_start = None;
                }
                _ => {}
            }
        }

        chunks.sort_by_key(|c| c.start_line);
        Some(chunks)
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        node: Node,
        file: &str,
        source: &str,
        lines: &[&str],
        cfg: &ChunkingConfig,
        chunks: &mut Vec<Chunk>,
        covered: &mut [bool],
    ) {
        let kind = node.kind();
        if self.is_definition_kind(kind) {
            let start_line = node.start_position().row + 1;
            let end_line = node.end_position().row + 1;
            let span = end_line - start_line + 1;

            if !(span > cfg.max_definition_lines && self.is_container_kind(kind)) {
                // Definitions arrive in document order, so a definition that
                // starts on an already covered line shares it with the last
                // chunk. Widen that chunk instead of overlapping it.
                if covered[start_line]
                    && let Some(last) = chunks.last_mut()
                    && last.end_line >= start_line
                {
                    if end_line > last.end_line {
                        last.end_line = end_line;
                        last.content = lines[last.start_line - 1..end_line.min(lines.len())].join("\n");
                    }
                } else if let Some(text) = source.get(node.start_byte()..node.end_byte()) {
                    let name = node_name(node, source);
                    chunks.push(Chunk {
                        file: file.to_string(),
                        start_line,
                        end_line,
                        content: text.to_string(),
                        kind: ChunkKind::Definition(kind.to_string()),
                        name: (!name.is_empty()).then_some(name),
                    });
                } else {
                    return;
                }
                for line in start_line..=end_line.min(covered.len() - 1) {
                    covered[line] = true;
                }
                return;
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, file, source, lines, cfg, chunks, covered);
        }
    }

    /// Locate one named definition.
    ///
    /// Uses the syntax tree when a grammar exists, otherwise the language's
    /// locator regex and block-end heuristics.
    pub fn find_definition(&self, file: &str, source: &str, name: &str) -> Option<Chunk> {
        if let Some(grammar) = self.grammar() {
            let mut parser = Parser::new();
            parser.set_language(&grammar.language()).ok()?;
            let tree = parser.parse(source, None)?;
            return self.find_node(tree.root_node(), file, source, name);
        }

        let locator = self.definition_locator(name)?;
        let lines: Vec<&str> = source.split('\n').collect();
        let start = lines.iter().position(|l| locator.is_match(l))?;
        let end = match self.block_style() {
            Some(BlockStyle::Indent) => indent_block_end(&lines, start),
            Some(BlockStyle::EndKeyword) => match self.end_keywords() {
                Some(rules) => end_keyword_block_end(&lines, start, rules),
                None => brace_block_end(&lines, start),
            },
            Some(BlockStyle::Brace) | None => brace_block_end(&lines, start),
        };

        Some(Chunk {
            file: file.to_string(),
            start_line: start + 1,
            end_line: end + 1,
            content: lines[start..=end].join("\n"),
            kind: ChunkKind::Definition("function".to_string()),
            name: Some(name.to_string()),
        })
    }

    fn find_node(&self, node: Node, file: &str, source: &str, name: &str) -> Option<Chunk> {
        if self.is_definition_kind(node.kind()) && node_name(node, source) == name {
            let text = source.get(node.start_byte()..node.end_byte())?;
            return Some(Chunk {
                file: file.to_string(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                content: text.to_string(),
                kind: ChunkKind::Definition(node.kind().to_string()),
                name: Some(name.to_string()),
            });
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .find_map(|child| self.find_node(child, file, source, name))
    }
}

/// Split into overlapping windows. The last window always ends on the last
/// line.
pub fn chunk_fixed(file: &str, source: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
    let lines: Vec<&str> = source.split('\n').collect();
    let total = lines.len();
    if total <= cfg.window_lines {
        return vec![Chunk {
            file: file.to_string(),
            start_line: 1,
            end_line: total,
            content: source.to_string(),
            kind: ChunkKind::Block,
            name: None,
        }];
    }

    let step = cfg.window_lines.saturating_sub(cfg.overlap_lines).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + cfg.window_lines).min(total);
        chunks.push(Chunk {
            file: file.to_string(),
            start_line: start + 1,
            end_line: end,
            content: lines[start..end].join("\n"),
            kind: ChunkKind::Block,
            name: None,
        });
        if end >= total {
            break;
        }
        start += step;
    }
    chunks
}

fn node_name(node: Node, source: &str) -> String {
    let text = |n: Node| source.get(n.start_byte()..n.end_byte()).unwrap_or("").to_string();

    if let Some(n) = node
        .child_by_field_name("name")
        .or_else(|| declarator_name(node))
        .or_else(|| node.child_by_field_name("type"))
    {
        return text(n);
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    if let Some(n) = children.iter().find(|c| {
        matches!(
            c.kind(),
            "identifier" | "name" | "type_identifier" | "property_identifier" | "field_identifier"
        )
    }) {
        return text(*n);
    }

    // Go `type_declaration` keeps its name on the nested `type_spec`.
    children
        .iter()
        .find_map(|c| c.child_by_field_name("name"))
        .map(text)
        .unwrap_or_default()
}

/// C and C++ functions name themselves through a chain of declarators:
/// `static char *f(void)` is pointer → function → identifier, and
/// `Circle::area` resolves to its last path segment.
fn declarator_name(node: Node) -> Option<Node> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        let next = match current.kind() {
            "qualified_identifier" => current.child_by_field_name("name"),
            "reference_declarator" => current.named_child(0),
            _ => current.child_by_field_name("declarator"),
        };
        match next {
            Some(n) => current = n,
            None => return Some(current),
        }
    }
}

fn leading_indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn indent_block_end(lines: &[&str], start: usize) -> usize {
    let base = leading_indent(lines[start]);
    let mut end = lines.len() - 1;
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if leading_indent(line) <= base {
            end = i - 1;
            break;
        }
    }
    while end > start && lines[end].trim().is_empty() {
        end -= 1;
    }
    end
}

fn brace_block_end(lines: &[&str], start: usize) -> usize {
    let mut depth = 0i32;
    let mut opened = false;
    for (i, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if opened && depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
    }
    (start + UNCLOSED_BLOCK_LINES).min(lines.len() - 1)
}

/// Balance `end` against block openers, counting nested openers.
fn end_keyword_block_end(lines: &[&str], start: usize, rules: &EndKeywordRules) -> usize {
    let mut depth = 0i32;
    for (i, line) in lines.iter().enumerate().skip(start) {
        let code = strip_strings_and_comment(line, rules.comment);
        let words = words_with_suffix(&code);
        let mut loop_seen = false;

        for (idx, (word, next)) in words.iter().enumerate() {
            if *word == "end" {
                depth -= 1;
                if depth <= 0 {
                    return i;
                }
                continue;
            }
            if rules.loop_keywords.contains(word) && idx == 0 {
                loop_seen = true;
            }
            if *word == "do" {
                if *next == Some(':') || loop_seen {
                    continue;
                }
                if rules.openers.contains(&"do") {
                    depth += 1;
                }
                continue;
            }
            if rules.openers.contains(word) || (idx == 0 && rules.line_openers.contains(word)) {
                depth += 1;
            }
        }

        if i == start && depth <= 0 {
            return start;
        }
    }
    (start + UNCLOSED_BLOCK_LINES).min(lines.len() - 1)
}

/// Words of a line with the character right after each word.
fn words_with_suffix(code: &str) -> Vec<(&str, Option<char>)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, ch) in code.char_indices() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        match (is_word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if !is_member_access(code, s) {
                    out.push((&code[s..i], Some(ch)));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start
        && !is_member_access(code, s)
    {
        out.push((&code[s..], None));
    }
    out
}

/// `obj.end` or `:end` are not keywords.
fn is_member_access(code: &str, word_start: usize) -> bool {
    matches!(code[..word_start].chars().next_back(), Some('.') | Some(':'))
        && !code[..word_start].ends_with("::")
}

fn strip_strings_and_comment(line: &str, comment: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                    out.push(' ');
                }
            }
            None => {
                if line[i..].starts_with(comment) {
                    break;
                }
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    out.push(' ');
                } else {
                    out.push(ch);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::languages::LanguageRegistry;

    fn lang(id: &str) -> &'static Language {
        LanguageRegistry::global().get(id).unwrap()
    }

    fn cfg() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    fn assert_no_overlap(chunks: &[Chunk]) {
        for pair in chunks.windows(2) {
            assert!(
                pair[0].end_line < pair[1].start_line,
                "overlap: {:?} / {:?}",
                (pair[0].start_line, pair[0].end_line),
                (pair[1].start_line, pair[1].end_line)
            );
        }
    }

    #[test]
    fn test_rust_structural_with_gap() {
        let mut src = String::new();
        src.push_str("fn alpha() {\n    1;\n}\n");
        for i in 0..9 {
            src.push_str(&format!("const C{i}: u32 = {i};\n"));
        }
        src.push_str("fn beta() {\n    2;\n}\n");

        let chunks = lang("rust").chunk("lib.rs", &src, &cfg());
        let kinds: Vec<_> = chunks.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec!["function_item", "gap", "function_item"]);
        assert_eq!(chunks[0].name.as_deref(), Some("alpha"));
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (4, 12));
        assert_eq!(chunks[2].id(), "lib.rs:13-15");
        assert_no_overlap(&chunks);
    }

    #[test]
    fn test_short_glue_is_not_a_gap() {
        let src = "use std::fmt;\n\nfn alpha() {\n    1;\n}\n";
        let chunks = lang("rust").chunk("a.rs", src, &cfg());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind.as_str(), "function_item");
    }

    #[test]
    fn test_large_container_is_split() {
        let mut src = String::from("impl Big {\n");
        for i in 0..30 {
            src.push_str(&format!("    fn m{i}(&self) {{\n        let _ = {i};\n        ()\n    }}\n"));
        }
        src.push_str("}\n");

        let chunks = lang("rust").chunk("big.rs", &src, &cfg());
        assert_eq!(chunks.len(), 30);
        assert!(chunks.iter().all(|c| c.kind.as_str() == "function_item"));
        assert_no_overlap(&chunks);
    }

    #[test]
    fn test_small_container_is_one_chunk() {
        let src = "impl Small {\n    fn a(&self) {}\n    fn b(&self) {}\n}\n";
        let chunks = lang("rust").chunk("s.rs", src, &cfg());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind.as_str(), "impl_item");
        assert_eq!(chunks[0].name.as_deref(), Some("Small"));
    }

    #[test]
    fn test_structural_without_definitions_falls_back() {
        let src = "x = 1\ny = 2\n";
        let chunks = lang("python").chunk("v.py", src, &cfg());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Block);
    }

    #[test]
    fn test_go_names() {
        let src = "package main\n\ntype Server struct {\n}\n\nfunc (s *Server) Run() {\n}\n";
        let chunks = lang("go").chunk("main.go", src, &cfg());
        let names: Vec<_> = chunks.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Server", "Run"]);
    }

    #[test]
    fn test_shared_line_definitions_merge() {
        let src = "function alpha() {\n  return 1;\n}; function beta() {\n  return 2;\n}\n";
        let chunks = lang("javascript").chunk("a.js", src, &cfg());
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 5));
        assert_eq!(chunks[0].name.as_deref(), Some("alpha"));
        assert!(chunks[0].content.contains("beta"));

        let one_line = "function alpha() { return 1; } function beta() { return 2; }";
        let chunks = lang("javascript").chunk("b.js", one_line, &cfg());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id(), "b.js:1-1");
        assert!(chunks[0].content.contains("return 2"));
    }

    #[test]
    fn test_structural_lines_covered_at_most_once() {
        let mut long_glue = String::from("fn head() {}\n");
        for i in 0..12 {
            long_glue.push_str(&format!("static S{i}: u8 = {i};\n"));
        }
        long_glue.push_str("fn tail() {} fn tail2() {}\n");

        let fixtures: &[(&str, &str, String)] = &[
            ("rust", "a.rs", long_glue),
            (
                "rust",
                "b.rs",
                "struct A; impl A { fn x(&self) {} }\nenum E { One }\n\n\nfn f() {\n}\n".to_string(),
            ),
            (
                "python",
                "c.py",
                "import os\n\nclass K:\n    def a(self):\n        pass\n\ndef top():\n    return 1\n".to_string(),
            ),
            (
                "javascript",
                "d.js",
                "class A { m() {} }; function f() {}\nfunction g() {\n}\n".to_string(),
            ),
            (
                "typescript",
                "e.ts",
                "interface I { x: number } type T = I; enum E { A }\nfunction f(): void {\n}\n".to_string(),
            ),
            (
                "go",
                "f.go",
                "package p\n\ntype A struct{}; func (a A) M() {}\nfunc F() {\n}\n".to_string(),
            ),
            (
                "c",
                "g.c",
                "struct s { int x; }; int f(void) { return 0; }\nint g(void) {\n  return 1;\n}\n".to_string(),
            ),
            (
                "php",
                "h.php",
                "<?php\nfunction a() {} function b() {}\nclass C {\n  function m() {}\n}\n".to_string(),
            ),
        ];

        let cfg = cfg();
        for (id, file, src) in fixtures {
            let chunks = lang(id).chunk(file, src, &cfg);
            assert!(!chunks.is_empty(), "{file}: no chunks");
            assert_no_overlap(&chunks);

            let lines: Vec<&str> = src.split('\n').collect();
            let mut covered = vec![false; lines.len() + 1];
            for c in &chunks {
                for line in c.start_line..=c.end_line {
                    covered[line] = true;
                }
            }
            let mut run: Vec<&str> = Vec::new();
            for line in 1..=lines.len() + 1 {
                if line <= lines.len() && !covered[line] {
                    run.push(lines[line - 1]);
                    continue;
                }
                assert!(
                    run.len() < cfg.gap_threshold || run.iter().all(|l| l.trim().is_empty()),
                    "{file}: uncovered run of {} lines",
                    run.len()
                );
                run.clear();
            }
        }
    }

    #[test]
    fn test_c_structural_names() {
        let src = "#include <stdio.h>\n\nstruct point {\n    int x;\n    int y;\n};\n\nint add(int a, int b) {\n    return a + b;\n}\n\nstatic char *name(void) {\n    return \"c\";\n}\n";
        let chunks = lang("c").chunk("p.c", src, &cfg());
        let kinds: Vec<_> = chunks.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec!["struct_specifier", "function_definition", "function_definition"]);
        let names: Vec<_> = chunks.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["point", "add", "name"]);
        assert_eq!(chunks[1].id(), "p.c:8-10");
    }

    #[test]
    fn test_cpp_qualified_method_name() {
        let src = "namespace geo {\nclass Circle {\npublic:\n    double area() const;\n};\n}\n\ndouble Circle::area() const {\n    return 3.14;\n}\n";
        let chunks = lang("cpp").chunk("geo.cpp", src, &cfg());
        let names: Vec<_> = chunks.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["geo", "area"]);
        assert_eq!(chunks[1].kind.as_str(), "function_definition");
    }

    #[test]
    fn test_csharp_large_containers_split() {
        let src = "namespace Demo\n{\n    public class Greeter\n    {\n        public string Hello(string name)\n        {\n            return \"hi \" + name;\n        }\n    }\n}\n";
        let cfg = ChunkingConfig {
            max_definition_lines: 5,
            ..cfg()
        };
        let chunks = lang("csharp").chunk("Greeter.cs", src, &cfg);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind.as_str(), "method_declaration");
        assert_eq!(chunks[0].name.as_deref(), Some("Hello"));
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (5, 8));
    }

    #[test]
    fn test_php_structural_kinds() {
        let src = "<?php\n\ninterface Greets {\n    public function greet(): string;\n}\n\ntrait Loud {\n    public function shout() { return 1; }\n}\n\nfunction helper($x) {\n    return $x;\n}\n";
        let chunks = lang("php").chunk("g.php", src, &cfg());
        let kinds: Vec<_> = chunks.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["interface_declaration", "trait_declaration", "function_definition"]
        );
        let names: Vec<_> = chunks.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Greets", "Loud", "helper"]);
    }

    #[test]
    fn test_fixed_window_single_block() {
        let src = (1..=60).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let chunks = chunk_fixed("a.txt", &src, &cfg());
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 60));
        assert_eq!(chunks[0].content, src);
    }

    #[test]
    fn test_fixed_window_ends_at_last_line() {
        for total in [61usize, 100, 110, 111, 200, 257] {
            let src = (1..=total).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
            let chunks = chunk_fixed("a.sql", &src, &cfg());
            let last = chunks.last().unwrap();
            assert_eq!(last.end_line, total);
            assert_eq!(chunks.len(), (total - 10).div_ceil(50));
            for (i, c) in chunks.iter().enumerate() {
                assert_eq!(c.start_line, i * 50 + 1);
            }
        }
    }

    #[test]
    fn test_find_definition_with_grammar() {
        let src = "def foo():\n    return 1\n\ndef bar():\n    return 2\n";
        let chunk = lang("python").find_definition("m.py", src, "bar").unwrap();
        assert_eq!((chunk.start_line, chunk.end_line), (4, 5));
        assert!(lang("python").find_definition("m.py", src, "baz").is_none());
    }

    #[test]
    fn test_find_definition_brace() {
        let src = "#include <stdio.h>\n\nint add(int a, int b) {\n    if (a) {\n        return a + b;\n    }\n    return b;\n}\n";
        let chunk = lang("c").find_definition("m.c", src, "add").unwrap();
        assert_eq!((chunk.start_line, chunk.end_line), (3, 8));
        assert_eq!(chunk.kind.as_str(), "function_definition");
    }

    #[test]
    fn test_find_definition_locator_brace() {
        let src = "class Calc {\n    int add(int a, int b) {\n        if (a > 0) {\n            return a + b;\n        }\n        return b;\n    }\n}\n";
        let chunk = lang("java").find_definition("Calc.java", src, "add").unwrap();
        assert_eq!((chunk.start_line, chunk.end_line), (2, 7));
        assert_eq!(chunk.kind.as_str(), "function");
    }

    #[test]
    fn test_find_definition_unclosed_brace() {
        let mut src = String::from("void run() {\n");
        for _ in 0..80 {
            src.push_str("  x++;\n");
        }
        let chunk = lang("java").find_definition("Run.java", &src, "run").unwrap();
        assert_eq!(chunk.end_line, 51);
    }

    #[test]
    fn test_find_definition_indent() {
        let src = "proc greet(name: string) =\n  echo name\n  echo \"bye\"\n\nproc other() =\n  discard\n";
        let chunk = lang("nim").find_definition("m.nim", src, "greet").unwrap();
        assert_eq!((chunk.start_line, chunk.end_line), (1, 3));
    }

    #[test]
    fn test_find_definition_end_keyword_nested() {
        let src = "class A\n  def run(items)\n    items.each do |i|\n      if i > 1\n        puts \"end\"\n      end\n    end\n    while busy do\n      tick\n    end\n    return 1 if done\n  end\n\n  def other\n  end\nend\n";
        let chunk = lang("ruby").find_definition("a.rb", src, "run").unwrap();
        assert_eq!((chunk.start_line, chunk.end_line), (2, 12));
    }

    #[test]
    fn test_find_definition_elixir_one_liner() {
        let src = "defmodule M do\n  def short(x), do: x\n  def long(x) do\n    x\n  end\nend\n";
        let short = lang("elixir").find_definition("m.ex", src, "short").unwrap();
        assert_eq!((short.start_line, short.end_line), (2, 2));
        let long = lang("elixir").find_definition("m.ex", src, "long").unwrap();
        assert_eq!((long.start_line, long.end_line), (3, 5));
    }

    #[test]
    fn test_find_definition_lua() {
        let src = "local function step(n)\n  for i = 1, n do\n    if i then print(i) end\n  end\nend\nreturn step\n";
        let chunk = lang("lua").find_definition("s.lua", src, "step").unwrap();
        assert_eq!((chunk.start_line, chunk.end_line), (1, 5));
    }

    #[test]
    fn test_find_definition_without_locator() {
        assert!(lang("toml").find_definition("a.toml", "x = 1", "x").is_none());
    }
}
