//! Per-language pattern data.
//!
//! Everything language specific that the chunker, the symbol extractor and the
//! dependency resolver need lives here as plain data. Supporting a new
//! language means adding a [`LanguageSpec`] to [`LANGUAGES`]; the registry
//! compiles the regexes once at startup.

use super::symbols::SymbolKind;

/// Tree-sitter grammars linked into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Go,
    C,
    Cpp,
    CSharp,
    Php,
}

impl Grammar {
    pub fn language(self) -> tree_sitter::Language {
        match self {
            Grammar::Rust => tree_sitter_rust::LANGUAGE.into(),
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::Go => tree_sitter_go::LANGUAGE.into(),
            Grammar::C => tree_sitter_c::LANGUAGE.into(),
            Grammar::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Grammar::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            Grammar::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }
}

/// How a block's extent is delimited in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Brace,
    Indent,
    EndKeyword,
}

/// How a symbol's kind is derived from a match.
#[derive(Debug, Clone, Copy)]
pub enum KindRule {
    Fixed(SymbolKind),
    /// Go: `method` when the receiver group (1) matched, else `function`.
    GoReceiver,
    /// Kind spelled out by a capture group (`struct` / `interface`).
    Group(usize),
    /// Java: `interface` / `enum` when the declaration keyword says so.
    DeclKeyword,
    /// Python: `method` when the indentation group is non-empty.
    Indented(usize),
}

/// How the signature fragment is assembled from capture groups.
#[derive(Debug, Clone, Copy)]
pub enum SignatureRule {
    Empty,
    /// `(params)` followed by `arrow ret` when the return group matched.
    Params {
        params: usize,
        ret: Option<usize>,
        arrow: &'static str,
    },
    /// `prefix value`, empty when the group did not match.
    Prefixed { group: usize, prefix: &'static str },
    /// `prefix value` with the value cut to `max` characters.
    Truncated {
        group: usize,
        prefix: &'static str,
        max: usize,
    },
    /// `(value)`, empty when the group did not match.
    Wrapped { group: usize },
    /// Rust `impl`: `Trait for Type` or `Type`.
    ImplFor,
}

#[derive(Debug)]
pub struct SymbolPattern {
    pub regex: &'static str,
    pub name: usize,
    pub kind: KindRule,
    pub signature: SignatureRule,
    /// Subject to the language skip-list.
    pub skippable: bool,
}

/// Import literal → file path mapping convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportRule {
    /// `./x` style paths with suffix and index candidates.
    Relative,
    /// `crate::a::b` anchored at the nearest `Cargo.toml`.
    ManifestAnchored,
    /// `a.b.c` joined onto the project root.
    Dotted,
    Unresolved,
}

/// Where a type declaration's kind comes from.
#[derive(Debug, Clone, Copy)]
pub enum DeclKind {
    Fixed(&'static str),
    /// Kind spelled out by a capture group (`struct`, `interface`, ...).
    Group(usize),
}

/// A type declaration and the parent lists written in its header.
#[derive(Debug)]
pub struct TypeDeclPattern {
    pub regex: &'static str,
    pub name: usize,
    pub kind: DeclKind,
    /// Comma-separated list of extended parents.
    pub extends: Option<usize>,
    pub implements: Option<usize>,
}

/// A declaration attaching a parent to a type outside its body, such as
/// `impl Trait for Type`.
#[derive(Debug)]
pub struct ImplPattern {
    pub regex: &'static str,
    pub implementor: usize,
    pub parent: usize,
    /// Kind recorded for a parent that is never defined.
    pub parent_kind: &'static str,
}

/// Inheritance syntax understood by the type-hierarchy view.
#[derive(Debug)]
pub struct HierarchyRules {
    pub declarations: &'static [TypeDeclPattern],
    pub impls: &'static [ImplPattern],
    /// Implicit roots that are never recorded as parents.
    pub ignored_parents: &'static [&'static str],
}

/// Blocks whose method declarations are called through dispatch, so a
/// lone definition is not dead code.
#[derive(Debug)]
pub struct TraitBlockRules {
    /// Matched against the trimmed line opening the block.
    pub start: &'static str,
    /// Method declaration inside the block; group 1 is the name.
    pub method: &'static str,
}

/// Keywords that open and close blocks in end-keyword languages.
#[derive(Debug)]
pub struct EndKeywordRules {
    /// Open a block wherever they appear.
    pub openers: &'static [&'static str],
    /// Open a block only as the first word of a line (guards `x if cond`).
    pub line_openers: &'static [&'static str],
    /// Loop keywords whose trailing `do` belongs to the same block.
    pub loop_keywords: &'static [&'static str],
    pub comment: &'static str,
}

#[derive(Debug)]
pub struct LanguageSpec {
    pub id: &'static str,
    /// Extensions without the leading dot. Matched case-sensitively.
    pub extensions: &'static [&'static str],
    pub filenames: &'static [&'static str],
    pub grammar: Option<Grammar>,
    pub definition_kinds: &'static [&'static str],
    pub container_kinds: &'static [&'static str],
    pub block_style: Option<BlockStyle>,
    pub symbols: &'static [SymbolPattern],
    pub skip_names: &'static [&'static str],
    /// Import regexes; the first participating capture group is the literal.
    pub imports: &'static [&'static str],
    pub import_rule: ImportRule,
    /// Line regex locating a named definition; `{name}` is replaced by the
    /// escaped symbol name.
    pub locator: Option<&'static str>,
    pub end_keywords: Option<&'static EndKeywordRules>,
    /// Host language of a `<script>` block embedded in this file type.
    pub embedded: Option<&'static str>,
    pub hierarchy: Option<&'static HierarchyRules>,
    pub trait_blocks: Option<&'static TraitBlockRules>,
}

/// Names exempt from every skip-list.
pub const RESERVED_NAMES: &[&str] = &["constructor"];

const PLAIN: LanguageSpec = LanguageSpec {
    id: "",
    extensions: &[],
    filenames: &[],
    grammar: None,
    definition_kinds: &[],
    container_kinds: &[],
    block_style: None,
    symbols: &[],
    skip_names: &[],
    imports: &[],
    import_rule: ImportRule::Unresolved,
    locator: None,
    end_keywords: None,
    embedded: None,
    hierarchy: None,
    trait_blocks: None,
};

const fn simple(regex: &'static str, kind: SymbolKind) -> SymbolPattern {
    SymbolPattern {
        regex,
        name: 1,
        kind: KindRule::Fixed(kind),
        signature: SignatureRule::Empty,
        skippable: false,
    }
}

// ── Symbol pattern sets ──────────────────────────────────────────────

const ECMA_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)(?:\s*:\s*([^\{]+?))?(?:\s*\{|$)",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Params {
            params: 2,
            ret: Some(3),
            arrow: ": ",
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^(?:export\s+)?(?:const|let|var)\s+(\w+)\s*(?::\s*[^=]+?)?\s*=\s*(?:async\s+)?(?:<[^>]*>)?\s*\(([^)]*)\)\s*(?::\s*([^=]+?))?\s*=>",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Params {
            params: 2,
            ret: Some(3),
            arrow: ": ",
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)(?:\s*<[^>]*>)?(?:\s+extends\s+([\w.]+)(?:<[^>]*>)?)?(?:\s+implements\s+([^\{]+?))?\s*\{",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Class),
        signature: SignatureRule::Prefixed {
            group: 2,
            prefix: "extends ",
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^(?:export\s+)?interface\s+(\w+)(?:\s*<[^>]*>)?(?:\s+extends\s+([^\{]+?))?\s*\{",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Interface),
        signature: SignatureRule::Prefixed {
            group: 2,
            prefix: "extends ",
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^(?:export\s+)?type\s+(\w+)(?:<[^>]*>)?\s*=\s*(.+?)(?:;|$)",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Type),
        signature: SignatureRule::Truncated {
            group: 2,
            prefix: "= ",
            max: 80,
        },
        skippable: false,
    },
    simple(
        r"(?m)^(?:export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+(\w+)",
        SymbolKind::Enum,
    ),
    SymbolPattern {
        regex: r"(?m)^[ \t]+(?:(?:public|private|protected|static|async|readonly|abstract|override|get|set)\s+)*(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)(?:\s*:\s*([^\{;]+?))?\s*[\{;]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Method),
        signature: SignatureRule::Params {
            params: 2,
            ret: Some(3),
            arrow: ": ",
        },
        skippable: true,
    },
];

const ECMA_SKIP: &[&str] = &[
    "if", "else", "for", "while", "switch", "return", "new", "delete", "typeof", "catch",
    "function",
];

const RUST_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?(?:async\s+)?(?:unsafe\s+)?(?:const\s+)?(?:extern\s+(?:\x22\w+\x22\s+)?)?fn\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)(?:\s*->\s*([^\{]+?))?\s*(?:where\s+[^\{]+)?\{",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Params {
            params: 2,
            ret: Some(3),
            arrow: " -> ",
        },
        skippable: false,
    },
    simple(
        r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?struct\s+(\w+)",
        SymbolKind::Struct,
    ),
    simple(
        r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?enum\s+(\w+)",
        SymbolKind::Enum,
    ),
    simple(
        r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?(?:unsafe\s+)?trait\s+(\w+)",
        SymbolKind::Trait,
    ),
    SymbolPattern {
        regex: r"(?m)^impl(?:<[^>]*>)?\s+(?:(\w+)\s+for\s+)?(\w+)",
        name: 2,
        kind: KindRule::Fixed(SymbolKind::Impl),
        signature: SignatureRule::ImplFor,
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?type\s+(\w+)(?:<[^>]*>)?\s*=\s*(.+?);",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Type),
        signature: SignatureRule::Truncated {
            group: 2,
            prefix: "= ",
            max: 80,
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?(?:const|static)\s+(?:mut\s+)?(\w+)\s*:\s*([^=]+?)\s*=",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Const),
        signature: SignatureRule::Prefixed {
            group: 2,
            prefix: ": ",
        },
        skippable: false,
    },
    simple(
        r"(?m)^[ \t]*(?:#\[macro_export\]\s*)?macro_rules!\s+(\w+)",
        SymbolKind::Macro,
    ),
];

const PYTHON_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^([ \t]*)(?:async[ \t]+)?def[ \t]+(\w+)\s*\(([^)]*)\)(?:\s*->\s*([^:]+))?:",
        name: 2,
        kind: KindRule::Indented(1),
        signature: SignatureRule::Params {
            params: 3,
            ret: Some(4),
            arrow: " -> ",
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^[ \t]*class[ \t]+(\w+)(?:\(([^)]*)\))?\s*:",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Class),
        signature: SignatureRule::Wrapped { group: 2 },
        skippable: false,
    },
];

const JAVA_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:(?:public|private|protected|static|abstract|final|synchronized|native|default)\s+)*(?:[\w<>\[\],.\s]+)\s+(\w+)\s*\(([^)]*)\)(?:\s*throws\s+[\w,.\s]+)?\s*[{;]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Method),
        signature: SignatureRule::Params {
            params: 2,
            ret: None,
            arrow: "",
        },
        skippable: true,
    },
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:(?:public|private|protected|static|abstract|final|sealed)\s+)*(?:class|interface|enum|record|@interface)\s+(\w+)(?:<[^>]*>)?(?:\s+extends\s+([\w.]+))?(?:\s+implements\s+([^\{]+?))?",
        name: 1,
        kind: KindRule::DeclKeyword,
        signature: SignatureRule::Prefixed {
            group: 2,
            prefix: "extends ",
        },
        skippable: false,
    },
];

const JAVA_SKIP: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else", "synchronized", "try",
];

const KOTLIN_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:(?:public|private|protected|internal|override|open|abstract|suspend|inline|infix|operator|tailrec)\s+)*fun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(\w+)\s*\(([^)]*)\)(?:\s*:\s*([^\{=]+?))?\s*[{=]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Params {
            params: 2,
            ret: Some(3),
            arrow: ": ",
        },
        skippable: false,
    },
    simple(
        r"(?m)^[ \t]*(?:(?:public|private|protected|internal|open|abstract|sealed|data|enum|inner|annotation|value)\s+)*(?:class|interface|object)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const GO_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*func\s+(?:\(\w+\s+\*?(\w+)(?:\[[^\]]*\])?\)\s+)?(\w+)\s*(?:\[[^\]]*\])?\s*\(([^)]*)\)(?:\s*(?:\([^)]*\)|[\w*\[\].]+))?\s*\{",
        name: 2,
        kind: KindRule::GoReceiver,
        signature: SignatureRule::Params {
            params: 3,
            ret: None,
            arrow: "",
        },
        skippable: false,
    },
    SymbolPattern {
        regex: r"(?m)^[ \t]*type\s+(\w+)\s+(struct|interface)",
        name: 1,
        kind: KindRule::Group(2),
        signature: SignatureRule::Empty,
        skippable: false,
    },
];

const C_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:static\s+|inline\s+|extern\s+)*[\w*&\s]+\b(\w+)\s*\([^)]*\)\s*(?:const\s*)?\{",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Empty,
        skippable: true,
    },
    simple(
        r"(?m)^[ \t]*(?:typedef\s+)?(?:struct|enum|union)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const CPP_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:virtual\s+|static\s+|inline\s+|explicit\s+|extern\s+|constexpr\s+)*[\w:*&<>\s]+?\b(\w+)\s*\([^)]*\)\s*(?:const\s*)?(?:override\s*)?(?:noexcept\s*)?(?:final\s*)?[{;]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Empty,
        skippable: true,
    },
    simple(
        r"(?m)^[ \t]*(?:template\s*<[^>]*>\s*)?(?:class|struct|enum\s+class|enum|namespace)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const C_SKIP: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "sizeof", "typeof", "else", "decltype",
    "alignof",
];

const CSHARP_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:(?:public|private|protected|internal|static|virtual|override|async|abstract|sealed|new|partial)\s+)*[\w<>\[\],\s]+\s+(\w+)\s*\([^)]*\)\s*[{;]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Method),
        signature: SignatureRule::Empty,
        skippable: true,
    },
    simple(
        r"(?m)^[ \t]*(?:(?:public|private|protected|internal|static|abstract|sealed|partial)\s+)*(?:class|struct|enum|interface|record|namespace)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const CSHARP_SKIP: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else", "foreach", "lock", "using",
    "fixed",
];

const PHP_SYMBOLS: &[SymbolPattern] = &[
    simple(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+(\w+)\s*\([^)]*\)",
        SymbolKind::Function,
    ),
    simple(
        r"(?m)^[ \t]*(?:(?:abstract|final|readonly)\s+)?(?:class|interface|trait|enum)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const RUBY_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*def\s+(self\.)?(\w+[?!=]?)",
        name: 2,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Empty,
        skippable: false,
    },
    simple(r"(?m)^[ \t]*(?:class|module)\s+(\w+(?:::\w+)*)", SymbolKind::Class),
];

const SCALA_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:override\s+)?(?:private|protected)?\s*def\s+(\w+)\s*(?:\[[^\]]*\])?\s*\(([^)]*)\)(?:\s*:\s*([^\{=]+?))?\s*[{=]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Params {
            params: 2,
            ret: Some(3),
            arrow: ": ",
        },
        skippable: false,
    },
    simple(
        r"(?m)^[ \t]*(?:abstract\s+|sealed\s+|case\s+|final\s+)*(?:class|object|trait)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const SWIFT_SYMBOLS: &[SymbolPattern] = &[
    simple(
        r"(?m)^[ \t]*(?:(?:public|private|internal|fileprivate|open|override|static|class|mutating)\s+)*func\s+(\w+)\s*(?:<[^>]*>)?\s*\([^)]*\)",
        SymbolKind::Function,
    ),
    simple(
        r"(?m)^[ \t]*(?:(?:public|private|internal|fileprivate|open|final)\s+)*(?:class|struct|enum|protocol|extension|actor)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const DART_SYMBOLS: &[SymbolPattern] = &[
    SymbolPattern {
        regex: r"(?m)^[ \t]*(?:(?:static|abstract|external|factory)\s+)*[\w<>\[\]?,\s]+\s+(\w+)\s*\([^)]*\)\s*(?:async\s*)?[{;]",
        name: 1,
        kind: KindRule::Fixed(SymbolKind::Function),
        signature: SignatureRule::Empty,
        skippable: true,
    },
    simple(
        r"(?m)^[ \t]*(?:abstract\s+)?(?:class|mixin|enum|extension|typedef)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const ELIXIR_SYMBOLS: &[SymbolPattern] = &[
    simple(
        r"(?m)^[ \t]*(?:def|defp|defmacro|defmacrop)\s+(\w+[?!]?)",
        SymbolKind::Function,
    ),
    simple(r"(?m)^[ \t]*defmodule\s+([\w.]+)", SymbolKind::Class),
];

const LUA_SYMBOLS: &[SymbolPattern] = &[simple(
    r"(?m)^[ \t]*(?:local\s+)?function\s+([\w.:]+)\s*\(",
    SymbolKind::Function,
)];

const BASH_SYMBOLS: &[SymbolPattern] = &[simple(
    r"(?m)^[ \t]*(?:function\s+)?(\w+)\s*\(\s*\)\s*\{",
    SymbolKind::Function,
)];

const PERL_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^[ \t]*sub\s+(\w+)", SymbolKind::Function),
    simple(r"(?m)^[ \t]*package\s+([\w:]+)", SymbolKind::Class),
];

const HASKELL_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^(\w+)\s*::\s*(.+)$", SymbolKind::Function),
    simple(
        r"(?m)^[ \t]*(?:data|newtype|type|class|instance)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const R_SYMBOLS: &[SymbolPattern] = &[simple(
    r"(?m)^([\w.]+)\s*(?:<-|=)\s*function\s*\(",
    SymbolKind::Function,
)];

const JULIA_SYMBOLS: &[SymbolPattern] = &[
    simple(
        r"(?m)^[ \t]*function\s+(\w+!?)\s*(?:\{[^}]*\})?\s*\(",
        SymbolKind::Function,
    ),
    simple(
        r"(?m)^[ \t]*(?:mutable\s+)?(?:struct|abstract\s+type|module)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const ZIG_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^[ \t]*(?:pub\s+)?(?:export\s+)?fn\s+(\w+)\s*\(", SymbolKind::Function),
    simple(
        r"(?m)^[ \t]*(?:pub\s+)?const\s+(\w+)\s*=\s*(?:packed\s+|extern\s+)?(?:struct|enum|union)\s*[{(]",
        SymbolKind::Class,
    ),
];

const NIM_SYMBOLS: &[SymbolPattern] = &[
    simple(
        r"(?m)^[ \t]*(?:proc|func|method|iterator|template|macro)\s+(\w+)\*?\s*(?:\[[^\]]*\])?\s*\(",
        SymbolKind::Function,
    ),
    simple(r"(?m)^[ \t]*type\s+(\w+)", SymbolKind::Class),
];

const OCAML_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^[ \t]*let\s+(?:rec\s+)?(\w+)", SymbolKind::Function),
    simple(r"(?m)^[ \t]*module\s+(\w+)", SymbolKind::Class),
    simple(r"(?m)^[ \t]*type\s+(\w+)", SymbolKind::Class),
];

const ERLANG_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^(\w+)\s*\([^)]*\)\s*(?:when\s+[^-]+)?->", SymbolKind::Function),
    simple(r"(?m)^-module\((\w+)\)", SymbolKind::Class),
];

const OBJC_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^[-+]\s*\([^)]*\)\s*(\w+)", SymbolKind::Function),
    simple(
        r"(?m)^@(?:interface|implementation|protocol)\s+(\w+)",
        SymbolKind::Class,
    ),
];

const PROTO_SYMBOLS: &[SymbolPattern] = &[
    simple(r"(?m)^[ \t]*(?:message|service|enum)\s+(\w+)", SymbolKind::Class),
    simple(r"(?m)^[ \t]*rpc\s+(\w+)\s*\(", SymbolKind::Function),
];

const SQL_SYMBOLS: &[SymbolPattern] = &[simple(
    r"(?mi)^[ \t]*CREATE\s+(?:OR\s+REPLACE\s+)?(?:TABLE|VIEW|FUNCTION|PROCEDURE|TRIGGER|INDEX|TYPE)\s+(?:IF\s+NOT\s+EXISTS\s+)?([\w.]+)",
    SymbolKind::Function,
)];

// ── Import pattern sets ──────────────────────────────────────────────

const ECMA_FROM: &str = r#"(?:import|export)\s+.*?\s+from\s+['"]([^'"]+)['"]"#;
const ECMA_SIDE_EFFECT: &str = r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#;
const ECMA_DYNAMIC: &str = r#"(?:import|export)\s*\(\s*['"]([^'"]+)['"]\s*\)"#;
const ECMA_REQUIRE: &str = r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#;

const C_INCLUDE: &str = r#"(?m)^\s*#\s*include\s*[<"]([^>"]+)[>"]"#;

// ── End-keyword rules ────────────────────────────────────────────────

const RUBY_END: EndKeywordRules = EndKeywordRules {
    openers: &["def", "class", "module", "case", "begin", "do"],
    line_openers: &["if", "unless", "while", "until", "for"],
    loop_keywords: &["while", "until", "for"],
    comment: "#",
};

const LUA_END: EndKeywordRules = EndKeywordRules {
    openers: &["function", "do", "if"],
    line_openers: &[],
    loop_keywords: &[],
    comment: "--",
};

const ELIXIR_END: EndKeywordRules = EndKeywordRules {
    openers: &["do", "fn"],
    line_openers: &[],
    loop_keywords: &[],
    comment: "#",
};

const JULIA_END: EndKeywordRules = EndKeywordRules {
    openers: &[
        "function", "begin", "let", "struct", "module", "macro", "try", "quote", "do",
    ],
    line_openers: &["if", "for", "while"],
    loop_keywords: &[],
    comment: "#",
};

// ── Type hierarchy rules ─────────────────────────────────────────────

const RUST_HIERARCHY: HierarchyRules = HierarchyRules {
    declarations: &[TypeDeclPattern {
        regex: r"(?m)^(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?(struct|enum|trait)\s+(\w+)",
        name: 2,
        kind: DeclKind::Group(1),
        extends: None,
        implements: None,
    }],
    impls: &[ImplPattern {
        regex: r"(?m)^(?:unsafe\s+)?impl(?:<[^>]*>)?\s+((?:\w+::)*\w+)(?:<[^>]*>)?\s+for\s+(\w+)",
        implementor: 2,
        parent: 1,
        parent_kind: "trait",
    }],
    ignored_parents: &[],
};

const ECMA_HIERARCHY: HierarchyRules = HierarchyRules {
    declarations: &[
        TypeDeclPattern {
            regex: r"(?m)^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)(?:<[^>]*>)?(?:\s+extends\s+([\w.]+)(?:<[^>]*>)?)?(?:\s+implements\s+([^{]+?))?\s*\{",
            name: 1,
            kind: DeclKind::Fixed("class"),
            extends: Some(2),
            implements: Some(3),
        },
        TypeDeclPattern {
            regex: r"(?m)^(?:export\s+)?interface\s+(\w+)(?:<[^>]*>)?(?:\s+extends\s+([^{]+?))?\s*\{",
            name: 1,
            kind: DeclKind::Fixed("interface"),
            extends: Some(2),
            implements: None,
        },
        TypeDeclPattern {
            regex: r"(?m)^(?:export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+(\w+)",
            name: 1,
            kind: DeclKind::Fixed("enum"),
            extends: None,
            implements: None,
        },
    ],
    impls: &[],
    ignored_parents: &[],
};

const PYTHON_HIERARCHY: HierarchyRules = HierarchyRules {
    declarations: &[TypeDeclPattern {
        regex: r"(?m)^[ \t]*class\s+(\w+)(?:\(([^)]*)\))?\s*:",
        name: 1,
        kind: DeclKind::Fixed("class"),
        extends: Some(2),
        implements: None,
    }],
    impls: &[],
    ignored_parents: &["object"],
};

const JAVA_HIERARCHY: HierarchyRules = HierarchyRules {
    declarations: &[TypeDeclPattern {
        regex: r"(?m)^[ \t]*(?:(?:public|protected|private|abstract|static|final|sealed|non-sealed|strictfp)\s+)*(class|interface|enum|record)\s+(\w+)(?:<[^>]*>)?(?:\s*\([^)]*\))?(?:\s+extends\s+([^{]+?))?(?:\s+implements\s+([^{]+?))?(?:\s+permits\s+[^{]+?)?\s*\{",
        name: 2,
        kind: DeclKind::Group(1),
        extends: Some(3),
        implements: Some(4),
    }],
    impls: &[],
    ignored_parents: &[],
};

// ── Trait block rules ────────────────────────────────────────────────

const RUST_TRAITS: TraitBlockRules = TraitBlockRules {
    start: r"^(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?trait\s+",
    method: r"^\s*(?:async\s+)?(?:unsafe\s+)?fn\s+(\w+)",
};

const JAVA_INTERFACES: TraitBlockRules = TraitBlockRules {
    start: r"^(?:(?:public|protected|private|sealed|non-sealed)\s+)*interface\s+",
    method: r"^\s*(?:(?:public|static|default|abstract)\s+)*[\w<>\[\].?]+\s+(\w+)\s*\(",
};

// ── Language table ───────────────────────────────────────────────────

pub static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        id: "rust",
        extensions: &["rs"],
        grammar: Some(Grammar::Rust),
        definition_kinds: &[
            "function_item",
            "impl_item",
            "trait_item",
            "struct_item",
            "enum_item",
        ],
        container_kinds: &["impl_item", "trait_item"],
        block_style: Some(BlockStyle::Brace),
        symbols: RUST_SYMBOLS,
        imports: &[
            r"\buse\s+((?:crate|super|self)(?:::\w+)+)",
            r"(?m)^[ \t]*(?:pub(?:\([\w:]+\))?\s+)?mod\s+(\w+)\s*;",
        ],
        import_rule: ImportRule::ManifestAnchored,
        locator: Some(
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?(?:const\s+)?fn\s+{name}\b",
        ),
        hierarchy: Some(&RUST_HIERARCHY),
        trait_blocks: Some(&RUST_TRAITS),
        ..PLAIN
    },
    LanguageSpec {
        id: "typescript",
        extensions: &["ts", "tsx", "mts", "cts"],
        grammar: Some(Grammar::TypeScript),
        definition_kinds: &[
            "function_declaration",
            "method_definition",
            "class_declaration",
            "abstract_class_declaration",
            "interface_declaration",
            "type_alias_declaration",
            "enum_declaration",
        ],
        container_kinds: &[
            "class_declaration",
            "abstract_class_declaration",
            "interface_declaration",
        ],
        block_style: Some(BlockStyle::Brace),
        symbols: ECMA_SYMBOLS,
        skip_names: ECMA_SKIP,
        imports: &[ECMA_FROM, ECMA_SIDE_EFFECT, ECMA_DYNAMIC, ECMA_REQUIRE],
        import_rule: ImportRule::Relative,
        locator: Some(r"(?:export\s+)?(?:async\s+)?function\s+{name}\s*[<(]"),
        hierarchy: Some(&ECMA_HIERARCHY),
        ..PLAIN
    },
    LanguageSpec {
        id: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        grammar: Some(Grammar::JavaScript),
        definition_kinds: &[
            "function_declaration",
            "method_definition",
            "class_declaration",
        ],
        container_kinds: &["class_declaration"],
        block_style: Some(BlockStyle::Brace),
        symbols: ECMA_SYMBOLS,
        skip_names: ECMA_SKIP,
        imports: &[ECMA_FROM, ECMA_SIDE_EFFECT, ECMA_REQUIRE],
        import_rule: ImportRule::Relative,
        locator: Some(r"(?:export\s+)?(?:async\s+)?function\s+{name}\s*\("),
        hierarchy: Some(&ECMA_HIERARCHY),
        ..PLAIN
    },
    LanguageSpec {
        id: "vue",
        extensions: &["vue"],
        block_style: Some(BlockStyle::Brace),
        imports: &[ECMA_FROM],
        import_rule: ImportRule::Relative,
        locator: Some(r"(?:export\s+)?(?:async\s+)?function\s+{name}\s*[<(]"),
        embedded: Some("typescript"),
        hierarchy: Some(&ECMA_HIERARCHY),
        ..PLAIN
    },
    LanguageSpec {
        id: "python",
        extensions: &["py", "pyi"],
        grammar: Some(Grammar::Python),
        definition_kinds: &["function_definition", "class_definition"],
        container_kinds: &["class_definition"],
        block_style: Some(BlockStyle::Indent),
        symbols: PYTHON_SYMBOLS,
        imports: &[r"(?m)^[ \t]*(?:from\s+(\S+)\s+)?import\s+(\S+)"],
        import_rule: ImportRule::Dotted,
        locator: Some(r"^\s*(?:async\s+)?def\s+{name}\s*\("),
        hierarchy: Some(&PYTHON_HIERARCHY),
        ..PLAIN
    },
    LanguageSpec {
        id: "c",
        extensions: &["c", "h"],
        grammar: Some(Grammar::C),
        definition_kinds: &["function_definition", "struct_specifier", "enum_specifier"],
        container_kinds: &["struct_specifier"],
        block_style: Some(BlockStyle::Brace),
        symbols: C_SYMBOLS,
        skip_names: C_SKIP,
        imports: &[C_INCLUDE],
        locator: Some(r"[\w*&\s]+\b{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "cpp",
        extensions: &["cpp", "hpp", "cc", "cxx", "hxx", "hh"],
        grammar: Some(Grammar::Cpp),
        definition_kinds: &[
            "function_definition",
            "class_specifier",
            "struct_specifier",
            "enum_specifier",
            "namespace_definition",
        ],
        container_kinds: &["class_specifier", "struct_specifier", "namespace_definition"],
        block_style: Some(BlockStyle::Brace),
        symbols: CPP_SYMBOLS,
        skip_names: C_SKIP,
        imports: &[C_INCLUDE],
        locator: Some(r"[\w*&:<>\s]+\b{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "csharp",
        extensions: &["cs"],
        grammar: Some(Grammar::CSharp),
        definition_kinds: &[
            "method_declaration",
            "class_declaration",
            "struct_declaration",
            "interface_declaration",
            "enum_declaration",
            "namespace_declaration",
        ],
        container_kinds: &[
            "class_declaration",
            "interface_declaration",
            "namespace_declaration",
        ],
        block_style: Some(BlockStyle::Brace),
        symbols: CSHARP_SYMBOLS,
        skip_names: CSHARP_SKIP,
        imports: &[r"(?m)^\s*using\s+(?:static\s+)?([\w.]+)\s*;"],
        locator: Some(r"[\w<>\[\],\s]+\s+{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "go",
        extensions: &["go"],
        grammar: Some(Grammar::Go),
        definition_kinds: &[
            "function_declaration",
            "method_declaration",
            "type_declaration",
        ],
        block_style: Some(BlockStyle::Brace),
        symbols: GO_SYMBOLS,
        imports: &[r#"(?m)^\s*import\s+(?:\w+\s+)?"([^"]+)""#, r#"(?m)^\s*(?:\w+\s+)?"([^"]+)"\s*$"#],
        locator: Some(r"func\s+(?:\(\w+\s+\*?\w+\)\s+)?{name}\s*[\[(]"),
        ..PLAIN
    },
    LanguageSpec {
        id: "php",
        extensions: &["php"],
        grammar: Some(Grammar::Php),
        definition_kinds: &[
            "function_definition",
            "method_declaration",
            "class_declaration",
            "interface_declaration",
            "trait_declaration",
        ],
        container_kinds: &["class_declaration", "interface_declaration", "trait_declaration"],
        block_style: Some(BlockStyle::Brace),
        symbols: PHP_SYMBOLS,
        imports: &[
            r"(?m)^\s*use\s+([\w\\]+)\s*;",
            r#"(?m)^\s*(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#,
        ],
        locator: Some(r"function\s+{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "java",
        extensions: &["java"],
        block_style: Some(BlockStyle::Brace),
        symbols: JAVA_SYMBOLS,
        skip_names: JAVA_SKIP,
        imports: &[r"(?m)^\s*import\s+(?:static\s+)?([\w.]+)\s*;"],
        locator: Some(r"[\w<>\[\],\s]+\s+{name}\s*\("),
        hierarchy: Some(&JAVA_HIERARCHY),
        trait_blocks: Some(&JAVA_INTERFACES),
        ..PLAIN
    },
    LanguageSpec {
        id: "kotlin",
        extensions: &["kt", "kts"],
        block_style: Some(BlockStyle::Brace),
        symbols: KOTLIN_SYMBOLS,
        imports: &[r"(?m)^\s*import\s+([\w.]+)"],
        locator: Some(r"\bfun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "scala",
        extensions: &["scala", "sc"],
        block_style: Some(BlockStyle::Brace),
        symbols: SCALA_SYMBOLS,
        imports: &[r"(?m)^\s*import\s+([\w.{},\s]+)"],
        locator: Some(r"\bdef\s+{name}\b"),
        ..PLAIN
    },
    LanguageSpec {
        id: "ruby",
        extensions: &["rb", "rake"],
        filenames: &["Rakefile", "Gemfile"],
        block_style: Some(BlockStyle::EndKeyword),
        symbols: RUBY_SYMBOLS,
        imports: &[
            r#"(?m)^\s*require\s+['"]([^'"]+)['"]"#,
            r#"(?m)^\s*require_relative\s+['"]([^'"]+)['"]"#,
        ],
        locator: Some(r"^\s*def\s+(?:self\.)?{name}(?:[\s(;]|$)"),
        end_keywords: Some(&RUBY_END),
        ..PLAIN
    },
    LanguageSpec {
        id: "lua",
        extensions: &["lua"],
        block_style: Some(BlockStyle::EndKeyword),
        symbols: LUA_SYMBOLS,
        imports: &[r#"(?m)^\s*(?:local\s+\w+\s*=\s*)?require\s*\(?\s*['"]([^'"]+)['"]"#],
        locator: Some(r"^\s*(?:local\s+)?function\s+(?:[\w.:]*[.:])?{name}\s*\("),
        end_keywords: Some(&LUA_END),
        ..PLAIN
    },
    LanguageSpec {
        id: "elixir",
        extensions: &["ex", "exs"],
        block_style: Some(BlockStyle::EndKeyword),
        symbols: ELIXIR_SYMBOLS,
        imports: &[r"(?m)^\s*(?:import|alias|use|require)\s+([\w.]+)"],
        locator: Some(r"^\s*(?:def|defp|defmacro|defmacrop)\s+{name}\b"),
        end_keywords: Some(&ELIXIR_END),
        ..PLAIN
    },
    LanguageSpec {
        id: "haskell",
        extensions: &["hs"],
        block_style: Some(BlockStyle::Indent),
        symbols: HASKELL_SYMBOLS,
        imports: &[r"(?m)^\s*import\s+(?:qualified\s+)?([\w.]+)"],
        ..PLAIN
    },
    LanguageSpec {
        id: "r",
        extensions: &["r", "R"],
        block_style: Some(BlockStyle::Brace),
        symbols: R_SYMBOLS,
        imports: &[r#"(?m)^\s*(?:library|require|source)\(\s*['"]?([^'")]+)['"]?\s*\)"#],
        locator: Some(r"^{name}\s*(?:<-|=)\s*function\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "julia",
        extensions: &["jl"],
        block_style: Some(BlockStyle::EndKeyword),
        symbols: JULIA_SYMBOLS,
        imports: &[r"(?m)^\s*(?:using|import)\s+([\w.]+)"],
        locator: Some(r"^\s*function\s+{name}\b"),
        end_keywords: Some(&JULIA_END),
        ..PLAIN
    },
    LanguageSpec {
        id: "perl",
        extensions: &["pl", "pm"],
        block_style: Some(BlockStyle::Brace),
        symbols: PERL_SYMBOLS,
        imports: &[
            r"(?m)^\s*use\s+([\w:]+)",
            r#"(?m)^\s*require\s+['"]?([^'"\s;]+)"#,
        ],
        locator: Some(r"^\s*sub\s+{name}\b"),
        ..PLAIN
    },
    LanguageSpec {
        id: "bash",
        extensions: &["sh", "bash", "zsh"],
        block_style: Some(BlockStyle::Brace),
        symbols: BASH_SYMBOLS,
        imports: &[r#"(?m)^\s*(?:source|\.)\s+['"]?([^'"\s;]+)"#],
        locator: Some(r"^\s*(?:function\s+)?{name}\s*(?:\(\s*\))?\s*\{"),
        ..PLAIN
    },
    LanguageSpec {
        id: "sql",
        extensions: &["sql"],
        symbols: SQL_SYMBOLS,
        ..PLAIN
    },
    LanguageSpec {
        id: "makefile",
        extensions: &["mk"],
        filenames: &["Makefile", "GNUmakefile", "makefile"],
        ..PLAIN
    },
    LanguageSpec {
        id: "dockerfile",
        filenames: &["Dockerfile"],
        ..PLAIN
    },
    LanguageSpec {
        id: "ocaml",
        extensions: &["ml", "mli"],
        symbols: OCAML_SYMBOLS,
        imports: &[r"(?m)^\s*open\s+(\w+)"],
        ..PLAIN
    },
    LanguageSpec {
        id: "erlang",
        extensions: &["erl", "hrl"],
        symbols: ERLANG_SYMBOLS,
        imports: &[r#"(?m)^\s*-include(?:_lib)?\(\s*"([^"]+)"\s*\)"#],
        ..PLAIN
    },
    LanguageSpec {
        id: "objective_c",
        extensions: &["m", "mm"],
        block_style: Some(BlockStyle::Brace),
        symbols: OBJC_SYMBOLS,
        imports: &[r#"(?m)^\s*#\s*(?:import|include)\s*[<"]([^>"]+)[>"]"#],
        ..PLAIN
    },
    LanguageSpec {
        id: "swift",
        extensions: &["swift"],
        block_style: Some(BlockStyle::Brace),
        symbols: SWIFT_SYMBOLS,
        imports: &[r"(?m)^\s*import\s+(\w+)"],
        locator: Some(r"\bfunc\s+{name}\s*[<(]"),
        ..PLAIN
    },
    LanguageSpec {
        id: "dart",
        extensions: &["dart"],
        block_style: Some(BlockStyle::Brace),
        symbols: DART_SYMBOLS,
        skip_names: JAVA_SKIP,
        imports: &[r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#],
        locator: Some(r"[\w<>\[\]?,\s]+\s+{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "zig",
        extensions: &["zig"],
        block_style: Some(BlockStyle::Brace),
        symbols: ZIG_SYMBOLS,
        imports: &[r#"@import\s*\(\s*"([^"]+)"\s*\)"#],
        locator: Some(r"\bfn\s+{name}\s*\("),
        ..PLAIN
    },
    LanguageSpec {
        id: "nim",
        extensions: &["nim"],
        block_style: Some(BlockStyle::Indent),
        symbols: NIM_SYMBOLS,
        imports: &[
            r"(?m)^\s*import\s+([\w/]+)",
            r"(?m)^\s*from\s+([\w/]+)\s+import",
        ],
        locator: Some(r"^\s*(?:proc|func|method|iterator|template|macro)\s+{name}\b"),
        ..PLAIN
    },
    LanguageSpec {
        id: "proto",
        extensions: &["proto"],
        block_style: Some(BlockStyle::Brace),
        symbols: PROTO_SYMBOLS,
        imports: &[r#"(?m)^\s*import\s+(?:public\s+|weak\s+)?"([^"]+)""#],
        ..PLAIN
    },
    LanguageSpec {
        id: "glsl",
        extensions: &["glsl", "vert", "frag", "comp", "geom", "tesc", "tese"],
        block_style: Some(BlockStyle::Brace),
        ..PLAIN
    },
    LanguageSpec {
        id: "wgsl",
        extensions: &["wgsl"],
        block_style: Some(BlockStyle::Brace),
        ..PLAIN
    },
    LanguageSpec {
        id: "hlsl",
        extensions: &["hlsl"],
        block_style: Some(BlockStyle::Brace),
        ..PLAIN
    },
    LanguageSpec {
        id: "asm",
        extensions: &["s", "S", "asm"],
        ..PLAIN
    },
    LanguageSpec {
        id: "toml",
        extensions: &["toml"],
        ..PLAIN
    },
    LanguageSpec {
        id: "json",
        extensions: &["json"],
        ..PLAIN
    },
    LanguageSpec {
        id: "yaml",
        extensions: &["yaml", "yml"],
        ..PLAIN
    },
    LanguageSpec {
        id: "markdown",
        extensions: &["md"],
        ..PLAIN
    },
    LanguageSpec {
        id: "html",
        extensions: &["html", "htm"],
        embedded: Some("javascript"),
        ..PLAIN
    },
    LanguageSpec {
        id: "css",
        extensions: &["css"],
        ..PLAIN
    },
    LanguageSpec {
        id: "scss",
        extensions: &["scss"],
        ..PLAIN
    },
];
