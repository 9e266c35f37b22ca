//! Inheritance graph built from class, struct, trait and interface
//! declarations.

use super::SourceFile;
use crate::indexer::languages::CompiledHierarchy;
use crate::indexer::patterns::DeclKind;
use crate::indexer::symbols::{line_of, script_block};
use regex::Captures;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Extends,
    Implements,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeNode {
    pub name: String,
    /// `unknown` for types only seen as a parent.
    pub kind: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub extended_by: Vec<String>,
    pub implemented_by: Vec<String>,
}

impl TypeNode {
    fn placeholder(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            file: None,
            line: None,
            extends: Vec::new(),
            implements: Vec::new(),
            extended_by: Vec::new(),
            implemented_by: Vec::new(),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.file.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyEdge {
    pub from: String,
    pub to: String,
    pub relation: Relation,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct TypeHierarchy {
    pub types: BTreeMap<String, TypeNode>,
    pub edges: Vec<HierarchyEdge>,
}

impl TypeHierarchy {
    /// Build the hierarchy for every file whose language declares an
    /// inheritance syntax.
    pub fn build(sources: &[SourceFile]) -> Self {
        let mut graph = Self::default();
        for source in sources {
            let Some(rules) = source.language.hierarchy() else {
                continue;
            };
            let (content, offset) = if source.language.embedded_host().is_some() {
                match script_block(&source.content) {
                    Some(block) => block,
                    None => continue,
                }
            } else {
                (source.content.as_str(), 0)
            };
            let mut scan = FileScan {
                graph: &mut graph,
                file: &source.key,
                content,
                offset,
            };
            scan.run(rules);
        }
        graph.link_inverse();
        graph
    }

    /// The node for `name` plus every edge that touches it.
    pub fn focus(&self, name: &str) -> Option<TypeHierarchy> {
        let node = self.types.get(name)?;
        Some(TypeHierarchy {
            types: BTreeMap::from([(name.to_string(), node.clone())]),
            edges: self
                .edges
                .iter()
                .filter(|e| e.from == name || e.to == name)
                .cloned()
                .collect(),
        })
    }

    fn define(&mut self, name: &str, kind: &str, file: &str, line: usize) {
        let node = self
            .types
            .entry(name.to_string())
            .or_insert_with(|| TypeNode::placeholder(name, kind));
        if !node.is_defined() {
            node.kind = kind.to_string();
            node.file = Some(file.to_string());
            node.line = Some(line);
        }
    }

    fn reference(&mut self, name: &str, kind_hint: &str) {
        let node = self
            .types
            .entry(name.to_string())
            .or_insert_with(|| TypeNode::placeholder(name, kind_hint));
        if !node.is_defined() && node.kind == "unknown" {
            node.kind = kind_hint.to_string();
        }
    }

    fn relate(&mut self, from: &str, to: &str, relation: Relation, file: &str, line: usize) {
        let kind_hint = match relation {
            Relation::Implements => "interface",
            Relation::Extends => "unknown",
        };
        self.reference(to, kind_hint);
        if let Some(node) = self.types.get_mut(from) {
            let list = match relation {
                Relation::Extends => &mut node.extends,
                Relation::Implements => &mut node.implements,
            };
            if !list.iter().any(|p| p == to) {
                list.push(to.to_string());
            }
        }
        self.edges.push(HierarchyEdge {
            from: from.to_string(),
            to: to.to_string(),
            relation,
            file: file.to_string(),
            line,
        });
    }

    fn link_inverse(&mut self) {
        let mut links = Vec::new();
        for (name, node) in &self.types {
            for parent in &node.extends {
                links.push((parent.clone(), name.clone(), Relation::Extends));
            }
            for parent in &node.implements {
                links.push((parent.clone(), name.clone(), Relation::Implements));
            }
        }
        for (parent, child, relation) in links {
            if let Some(node) = self.types.get_mut(&parent) {
                let list = match relation {
                    Relation::Extends => &mut node.extended_by,
                    Relation::Implements => &mut node.implemented_by,
                };
                if !list.contains(&child) {
                    list.push(child);
                }
            }
        }
    }
}

struct FileScan<'a> {
    graph: &'a mut TypeHierarchy,
    file: &'a str,
    content: &'a str,
    offset: usize,
}

impl FileScan<'_> {
    fn line(&self, pos: usize) -> usize {
        line_of(self.content, pos) + self.offset
    }

    fn run(&mut self, rules: &CompiledHierarchy) {
        for (decl, regex) in &rules.declarations {
            for caps in regex.captures_iter(self.content) {
                let line = self.line(caps.get(0).map_or(0, |m| m.start()));
                let Some(name) = caps.get(decl.name).map(|m| m.as_str()) else {
                    continue;
                };
                let kind = match decl.kind {
                    DeclKind::Fixed(kind) => kind,
                    DeclKind::Group(group) => caps.get(group).map_or("unknown", |m| m.as_str()),
                };
                self.graph.define(name, kind, self.file, line);

                for parent in parent_list(&caps, decl.extends, rules.ignored_parents) {
                    if kind == "interface" {
                        self.graph.reference(parent, "interface");
                    }
                    self.graph
                        .relate(name, parent, Relation::Extends, self.file, line);
                }
                for parent in parent_list(&caps, decl.implements, rules.ignored_parents) {
                    self.graph
                        .relate(name, parent, Relation::Implements, self.file, line);
                }
            }
        }

        for (imp, regex) in &rules.impls {
            for caps in regex.captures_iter(self.content) {
                let line = self.line(caps.get(0).map_or(0, |m| m.start()));
                let (Some(implementor), Some(parent)) =
                    (caps.get(imp.implementor), caps.get(imp.parent))
                else {
                    continue;
                };
                let implementor = implementor.as_str();
                let parent = last_segment(parent.as_str());
                self.graph.reference(implementor, "unknown");
                self.graph.reference(parent, imp.parent_kind);
                self.graph
                    .relate(implementor, parent, Relation::Implements, self.file, line);
            }
        }
    }
}

/// Parents named by capture `group`, minus implicit roots and keyword
/// arguments such as `metaclass=ABCMeta`.
fn parent_list<'h>(caps: &Captures<'h>, group: Option<usize>, ignored: &[&str]) -> Vec<&'h str> {
    let Some(list) = group.and_then(|g| caps.get(g)) else {
        return Vec::new();
    };
    split_type_list(list.as_str())
        .into_iter()
        .filter(|p| !p.contains('=') && !ignored.contains(p))
        .collect()
}

/// Split a comma-separated list of type expressions at top-level commas,
/// keeping the bare name of each.
fn split_type_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts
        .into_iter()
        .map(|p| {
            let p = p.trim();
            let end = p.find(['<', '[', '(']).unwrap_or(p.len());
            last_segment(p[..end].trim())
        })
        .filter(|p| !p.is_empty())
        .collect()
}

fn last_segment(path: &str) -> &str {
    path.rsplit(['.', ':']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{sources, write};
    use tempfile::tempdir;

    #[test]
    fn test_split_type_list() {
        assert_eq!(
            split_type_list(" Map<K, V>, java.io.Serializable ,Comparable<T>"),
            vec!["Map", "Serializable", "Comparable"]
        );
        assert_eq!(split_type_list(""), Vec::<&str>::new());
    }

    #[test]
    fn test_rust_impl_for() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/lib.rs",
            "pub trait Store {}\n\npub struct Disk;\n\nimpl Store for Disk {}\n\nimpl std::fmt::Display for Disk {\n}\n",
        );
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        let disk = &graph.types["Disk"];
        assert_eq!(disk.kind, "struct");
        assert_eq!(disk.file.as_deref(), Some("src/lib.rs"));
        assert_eq!(disk.line, Some(3));
        assert_eq!(disk.implements, vec!["Store", "Display"]);

        let store = &graph.types["Store"];
        assert_eq!(store.kind, "trait");
        assert_eq!(store.implemented_by, vec!["Disk"]);

        let display = &graph.types["Display"];
        assert!(!display.is_defined());
        assert_eq!(display.kind, "trait");

        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].line, 5);
        assert_eq!(graph.edges[0].relation, Relation::Implements);
    }

    #[test]
    fn test_definition_after_reference_fills_node() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.rs", "impl Runner for Job {}\n");
        write(dir.path(), "b.rs", "pub trait Runner {}\npub struct Job;\n");
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        let runner = &graph.types["Runner"];
        assert_eq!(runner.file.as_deref(), Some("b.rs"));
        assert_eq!(runner.line, Some(1));
        assert_eq!(graph.types["Job"].kind, "struct");
    }

    #[test]
    fn test_typescript_classes_and_interfaces() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/shapes.ts",
            "export interface Shape {\n  area(): number;\n}\n\nexport interface Solid extends Shape, Named<string> {\n}\n\nexport class Circle extends Base implements Shape, Drawable<Canvas> {\n}\n\nexport enum Color { Red }\n",
        );
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        let circle = &graph.types["Circle"];
        assert_eq!(circle.extends, vec!["Base"]);
        assert_eq!(circle.implements, vec!["Shape", "Drawable"]);
        assert_eq!(circle.line, Some(8));

        let shape = &graph.types["Shape"];
        assert_eq!(shape.kind, "interface");
        assert_eq!(shape.implemented_by, vec!["Circle"]);
        assert_eq!(shape.extended_by, vec!["Solid"]);

        assert_eq!(graph.types["Named"].kind, "interface");
        assert_eq!(graph.types["Base"].kind, "unknown");
        assert_eq!(graph.types["Base"].extended_by, vec!["Circle"]);
        assert_eq!(graph.types["Color"].kind, "enum");
    }

    #[test]
    fn test_vue_script_block_lines_are_offset() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "App.vue",
            "<template>\n  <div/>\n</template>\n<script lang=\"ts\">\nclass Store extends Base {\n}\n</script>\n",
        );
        let graph = TypeHierarchy::build(&sources(dir.path(), None));
        let store = &graph.types["Store"];
        assert_eq!(store.file.as_deref(), Some("App.vue"));
        assert_eq!(store.line, Some(5));
    }

    #[test]
    fn test_python_bases_skip_object_and_kwargs() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "models.py",
            "class Base(object):\n    pass\n\nclass User(Base, mixins.Auditable, metaclass=Meta):\n    pass\n",
        );
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        assert!(graph.types["Base"].extends.is_empty());
        assert_eq!(graph.types["User"].extends, vec!["Base", "Auditable"]);
        assert_eq!(graph.types["Base"].extended_by, vec!["User"]);
        assert!(!graph.types.contains_key("object"));
    }

    #[test]
    fn test_java_extends_and_implements() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "Repo.java",
            "public interface Repo<T> extends Closeable, Iterable<T> {\n}\n\npublic final class SqlRepo extends AbstractRepo implements Repo<User>, Serializable {\n}\n",
        );
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        let repo = &graph.types["Repo"];
        assert_eq!(repo.kind, "interface");
        assert_eq!(repo.extends, vec!["Closeable", "Iterable"]);
        assert_eq!(repo.implemented_by, vec!["SqlRepo"]);

        let sql = &graph.types["SqlRepo"];
        assert_eq!(sql.kind, "class");
        assert_eq!(sql.extends, vec!["AbstractRepo"]);
        assert_eq!(sql.implements, vec!["Repo", "Serializable"]);
    }

    #[test]
    fn test_languages_without_rules_are_skipped() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "web/app.js",
            "class Widget extends Base {\n}\n\nclass Panel extends ui.Widget {\n}\n",
        );
        write(dir.path(), "main.go", "package main\n\ntype Server struct {\n\tBase\n}\n");
        write(dir.path(), "src/lib.rs", "unsafe impl<T> Send for Wrapper<T> {}\n");
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        assert_eq!(graph.types["Panel"].extends, vec!["Widget"]);
        assert_eq!(graph.types["Widget"].extended_by, vec!["Panel"]);
        assert_eq!(graph.types["Widget"].file.as_deref(), Some("web/app.js"));
        assert!(!graph.types.contains_key("Server"));

        let wrapper = &graph.types["Wrapper"];
        assert!(!wrapper.is_defined());
        assert_eq!(wrapper.implements, vec!["Send"]);
        assert_eq!(graph.types["Send"].kind, "trait");
    }

    #[test]
    fn test_focus() {
        let dir = tempdir().unwrap();
        write(dir.path(), "lib.rs", "trait A {}\nstruct B;\nstruct C;\nimpl A for B {}\n");
        let graph = TypeHierarchy::build(&sources(dir.path(), None));

        let focused = graph.focus("A").unwrap();
        assert_eq!(focused.types.len(), 1);
        assert_eq!(focused.edges.len(), 1);
        assert!(graph.focus("Missing").is_none());
    }
}
