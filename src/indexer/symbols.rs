//! Regex-based symbol extraction.
//!
//! Heuristic by nature: patterns target common definition syntax and the
//! per-language skip-lists filter control-flow keywords that look like
//! method names.

use super::languages::{CompiledPattern, Language};
use super::patterns::{KindRule, SignatureRule};
use regex::Captures;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Interface,
    Enum,
    Trait,
    Impl,
    Type,
    Const,
    Macro,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Trait => "trait",
            SymbolKind::Impl => "impl",
            SymbolKind::Type => "type",
            SymbolKind::Const => "const",
            SymbolKind::Macro => "macro",
        }
    }

    pub fn is_callable(self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }

    /// Kinds that take part in the type hierarchy.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Trait
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "struct" => SymbolKind::Struct,
            "interface" => SymbolKind::Interface,
            "enum" => SymbolKind::Enum,
            "trait" => SymbolKind::Trait,
            "impl" => SymbolKind::Impl,
            "type" => SymbolKind::Type,
            "const" => SymbolKind::Const,
            "macro" => SymbolKind::Macro,
            other => return Err(format!("unknown symbol kind: {other}")),
        })
    }
}

/// A named definition found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub file: String,
    /// 1-based line of the captured name.
    pub line: usize,
    pub language: String,
}

impl Language {
    /// Extract symbols from `source`.
    ///
    /// Markup languages dispatch their first `<script>` block to the host
    /// language; without one they yield nothing.
    pub fn extract_symbols(&self, file: &str, source: &str) -> Vec<Symbol> {
        if let Some(host) = self.embedded_host() {
            let Some((script, offset)) = script_block(source) else {
                return Vec::new();
            };
            return host
                .extract_symbols(file, script)
                .into_iter()
                .map(|mut s| {
                    s.line += offset;
                    s.language = self.id().to_string();
                    s
                })
                .collect();
        }

        let mut symbols: Vec<Symbol> = Vec::new();
        for pattern in &self.symbols {
            for caps in pattern.regex.captures_iter(source) {
                if let Some(symbol) = self.symbol_from(pattern, &caps, file, source)
                    && !symbols
                        .iter()
                        .any(|s| s.line == symbol.line && s.name == symbol.name)
                {
                    symbols.push(symbol);
                }
            }
        }
        symbols.sort_by_key(|s| s.line);
        symbols
    }

    fn symbol_from(
        &self,
        pattern: &CompiledPattern,
        caps: &Captures,
        file: &str,
        source: &str,
    ) -> Option<Symbol> {
        let spec = pattern.spec;
        let name_match = caps.get(spec.name)?;
        let name = name_match.as_str();
        if name.is_empty() || (spec.skippable && self.is_skipped_name(name)) {
            return None;
        }

        let group = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
        };

        let kind = match spec.kind {
            KindRule::Fixed(kind) => kind,
            KindRule::GoReceiver => {
                if group(1).is_some() {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                }
            }
            KindRule::Group(i) => group(i)
                .and_then(|k| k.parse().ok())
                .unwrap_or(SymbolKind::Type),
            KindRule::DeclKeyword => {
                let whole = caps.get(0)?;
                let head = source[whole.start()..name_match.start()].trim_end();
                if head.ends_with("interface") {
                    SymbolKind::Interface
                } else if head.ends_with("enum") {
                    SymbolKind::Enum
                } else {
                    SymbolKind::Class
                }
            }
            KindRule::Indented(i) => {
                if caps.get(i).is_some_and(|m| !m.as_str().is_empty()) {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                }
            }
        };

        let signature = match spec.signature {
            SignatureRule::Empty => String::new(),
            SignatureRule::Params { params, ret, arrow } => {
                let params = group(params).map(collapse_whitespace).unwrap_or_default();
                let mut sig = format!("({params})");
                if let Some(ret) = ret.and_then(group) {
                    sig.push_str(arrow);
                    sig.push_str(&collapse_whitespace(ret));
                }
                sig
            }
            SignatureRule::Prefixed { group: i, prefix } => group(i)
                .map(|v| format!("{prefix}{}", collapse_whitespace(v)))
                .unwrap_or_default(),
            SignatureRule::Truncated {
                group: i,
                prefix,
                max,
            } => group(i)
                .map(|v| format!("{prefix}{}", v.chars().take(max).collect::<String>()))
                .unwrap_or_default(),
            SignatureRule::Wrapped { group: i } => {
                group(i).map(|v| format!("({v})")).unwrap_or_default()
            }
            SignatureRule::ImplFor => match group(1) {
                Some(tr) => format!("{tr} for {name}"),
                None => name.to_string(),
            },
        };

        Some(Symbol {
            name: name.to_string(),
            kind,
            signature,
            file: file.to_string(),
            line: line_of(source, name_match.start()),
            language: self.id().to_string(),
        })
    }
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Isolate the first `<script ...>...</script>` block.
///
/// Returns the block body and the number of host lines before it.
pub fn script_block(source: &str) -> Option<(&str, usize)> {
    let open = source.find("<script")?;
    let body_start = open + source[open..].find('>')? + 1;
    let body_end = body_start + source[body_start..].find("</script>")?;
    let offset = line_of(source, body_start) - 1;
    Some((&source[body_start..body_end], offset))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::languages::LanguageRegistry;

    fn extract(lang: &str, src: &str) -> Vec<Symbol> {
        LanguageRegistry::global()
            .get(lang)
            .unwrap()
            .extract_symbols("f", src)
    }

    fn summary(symbols: &[Symbol]) -> Vec<(String, SymbolKind, usize)> {
        symbols
            .iter()
            .map(|s| (s.name.clone(), s.kind, s.line))
            .collect()
    }

    #[test]
    fn test_python_single_function() {
        let symbols = extract("python", "def foo():\n    return 1");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "foo");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].line, 1);
        assert_eq!(symbols[0].signature, "()");
    }

    #[test]
    fn test_python_methods_and_classes() {
        let src = "class Repo(Base, Mixin):\n    def load(self, key: str) -> bytes:\n        pass\n";
        let symbols = extract("python", src);
        assert_eq!(
            summary(&symbols),
            vec![
                ("Repo".into(), SymbolKind::Class, 1),
                ("load".into(), SymbolKind::Method, 2),
            ]
        );
        assert_eq!(symbols[0].signature, "(Base, Mixin)");
        assert_eq!(symbols[1].signature, "(self, key: str) -> bytes");
    }

    #[test]
    fn test_rust_symbols() {
        let src = "pub struct Cache;\n\nimpl Display for Cache {\n}\n\npub async fn fetch(url: &str) -> Result<String> {\n    todo!()\n}\n\npub const LIMIT: usize = 10;\nmacro_rules! hello {\n    () => {};\n}\n";
        let symbols = extract("rust", src);
        assert_eq!(
            summary(&symbols),
            vec![
                ("Cache".into(), SymbolKind::Struct, 1),
                ("Cache".into(), SymbolKind::Impl, 3),
                ("fetch".into(), SymbolKind::Function, 6),
                ("LIMIT".into(), SymbolKind::Const, 10),
                ("hello".into(), SymbolKind::Macro, 11),
            ]
        );
        assert_eq!(symbols[1].signature, "Display for Cache");
        assert_eq!(symbols[2].signature, "(url: &str) -> Result<String>");
        assert_eq!(symbols[3].signature, ": usize");
    }

    #[test]
    fn test_typescript_skips_keywords_keeps_constructor() {
        let src = "export class Store extends Base {\n  constructor(private db: Db) {\n    if (db) {\n      this.db = db;\n    }\n  }\n  async get(id: string): Promise<Item> {\n    return this.db.find(id);\n  }\n}\n";
        let symbols = extract("typescript", src);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Store", "constructor", "get"]);
        assert_eq!(symbols[0].signature, "extends Base");
        assert_eq!(symbols[2].kind, SymbolKind::Method);
        assert_eq!(symbols[2].signature, "(id: string): Promise<Item>");
    }

    #[test]
    fn test_typescript_interfaces_and_arrows() {
        let src = "export interface Shape extends Base {\n  area(): number;\n}\nexport const sum = (a: number, b: number): number => a + b;\nexport type Id = string;\n";
        let symbols = extract("typescript", src);
        let kinds: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert!(kinds.contains(&("Shape", SymbolKind::Interface)));
        assert!(kinds.contains(&("area", SymbolKind::Method)));
        assert!(kinds.contains(&("sum", SymbolKind::Function)));
        assert!(kinds.contains(&("Id", SymbolKind::Type)));
    }

    #[test]
    fn test_go_receiver_and_types() {
        let src = "package x\n\ntype Server struct {\n}\n\nfunc (s *Server) Start(port int) error {\n\treturn nil\n}\n\nfunc New() *Server {\n\treturn nil\n}\n";
        let symbols = extract("go", src);
        assert_eq!(
            summary(&symbols),
            vec![
                ("Server".into(), SymbolKind::Struct, 3),
                ("Start".into(), SymbolKind::Method, 6),
                ("New".into(), SymbolKind::Function, 10),
            ]
        );
    }

    #[test]
    fn test_java_declarations() {
        let src = "public interface Repo {\n}\n\npublic class UserRepo extends BaseRepo implements Repo {\n    public User find(long id) {\n        if (id > 0) {\n        }\n        return null;\n    }\n}\n";
        let symbols = extract("java", src);
        let found: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert!(found.contains(&("Repo", SymbolKind::Interface)));
        assert!(found.contains(&("UserRepo", SymbolKind::Class)));
        assert!(found.contains(&("find", SymbolKind::Method)));
        assert!(!found.iter().any(|(n, _)| *n == "if"));
    }

    #[test]
    fn test_vue_script_block() {
        let src = "<template>\n  <div/>\n</template>\n<script setup lang=\"ts\">\nexport function mount(el: string) {\n}\n</script>\n";
        let symbols = extract("vue", src);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "mount");
        assert_eq!(symbols[0].line, 5);
        assert_eq!(symbols[0].language, "vue");
    }

    #[test]
    fn test_vue_without_script_yields_nothing() {
        assert!(extract("vue", "<template><div/></template>").is_empty());
    }

    #[test]
    fn test_language_without_patterns() {
        assert!(extract("yaml", "a: 1").is_empty());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [SymbolKind::Function, SymbolKind::Trait, SymbolKind::Macro] {
            assert_eq!(kind.as_str().parse::<SymbolKind>().unwrap(), kind);
        }
        assert!("widget".parse::<SymbolKind>().is_err());
    }
}
