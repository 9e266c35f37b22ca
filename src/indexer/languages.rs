use super::patterns::{
    BlockStyle, EndKeywordRules, Grammar, ImplPattern, ImportRule, LANGUAGES, LanguageSpec,
    RESERVED_NAMES, SymbolPattern, TypeDeclPattern,
};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

/// A symbol pattern together with its compiled regex.
pub(crate) struct CompiledPattern {
    pub spec: &'static SymbolPattern,
    pub regex: Regex,
}

/// Compiled [`HierarchyRules`](super::patterns::HierarchyRules).
pub struct CompiledHierarchy {
    pub declarations: Vec<(&'static TypeDeclPattern, Regex)>,
    pub impls: Vec<(&'static ImplPattern, Regex)>,
    pub ignored_parents: &'static [&'static str],
}

pub struct CompiledTraitBlocks {
    pub start: Regex,
    pub method: Regex,
}

/// Capability object for one language.
///
/// Built from a [`LanguageSpec`]; every regex is compiled once when the
/// registry is first touched. A pattern that fails to compile is dropped with
/// a warning so the language degrades instead of failing.
pub struct Language {
    spec: &'static LanguageSpec,
    pub(crate) symbols: Vec<CompiledPattern>,
    pub(crate) imports: Vec<Regex>,
    hierarchy: Option<CompiledHierarchy>,
    trait_blocks: Option<CompiledTraitBlocks>,
}

impl Language {
    fn compile(spec: &'static LanguageSpec) -> Self {
        let symbols = spec
            .symbols
            .iter()
            .filter_map(|p| match Regex::new(p.regex) {
                Ok(regex) => Some(CompiledPattern { spec: p, regex }),
                Err(e) => {
                    warn!(language = spec.id, error = %e, "dropping symbol pattern");
                    None
                }
            })
            .collect();

        let imports = spec
            .imports
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(language = spec.id, error = %e, "dropping import pattern");
                    None
                }
            })
            .collect();

        let hierarchy = spec.hierarchy.map(|rules| CompiledHierarchy {
            declarations: rules
                .declarations
                .iter()
                .filter_map(|p| Some((p, compile_or_warn(spec.id, "declaration", p.regex)?)))
                .collect(),
            impls: rules
                .impls
                .iter()
                .filter_map(|p| Some((p, compile_or_warn(spec.id, "impl", p.regex)?)))
                .collect(),
            ignored_parents: rules.ignored_parents,
        });

        let trait_blocks = spec.trait_blocks.and_then(|rules| {
            Some(CompiledTraitBlocks {
                start: compile_or_warn(spec.id, "trait start", rules.start)?,
                method: compile_or_warn(spec.id, "trait method", rules.method)?,
            })
        });

        Self {
            spec,
            symbols,
            imports,
            hierarchy,
            trait_blocks,
        }
    }

    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    pub fn grammar(&self) -> Option<Grammar> {
        self.spec.grammar
    }

    pub fn block_style(&self) -> Option<BlockStyle> {
        self.spec.block_style
    }

    pub fn import_rule(&self) -> ImportRule {
        self.spec.import_rule
    }

    /// Inheritance rules, `None` for languages the hierarchy view skips.
    pub fn hierarchy(&self) -> Option<&CompiledHierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn trait_blocks(&self) -> Option<&CompiledTraitBlocks> {
        self.trait_blocks.as_ref()
    }

    pub fn end_keywords(&self) -> Option<&'static EndKeywordRules> {
        self.spec.end_keywords
    }

    /// Host language for the `<script>` block of markup files.
    pub fn embedded_host(&self) -> Option<&'static Language> {
        self.spec
            .embedded
            .and_then(|id| LanguageRegistry::global().get(id))
    }

    pub fn is_definition_kind(&self, kind: &str) -> bool {
        self.spec.definition_kinds.contains(&kind)
    }

    pub fn is_container_kind(&self, kind: &str) -> bool {
        self.spec.container_kinds.contains(&kind)
    }

    /// Whether a captured name collides with this language's control-flow
    /// keywords.
    pub fn is_skipped_name(&self, name: &str) -> bool {
        !RESERVED_NAMES.contains(&name) && self.spec.skip_names.contains(&name)
    }

    /// Line regex locating the definition of `name`.
    pub fn definition_locator(&self, name: &str) -> Option<Regex> {
        let template = self.spec.locator?;
        let pattern = template.replace("{name}", &regex::escape(name));
        match Regex::new(&pattern) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(language = self.spec.id, error = %e, "invalid definition locator");
                None
            }
        }
    }

    pub fn has_symbol_support(&self) -> bool {
        !self.symbols.is_empty() || self.spec.embedded.is_some()
    }
}

fn compile_or_warn(language: &str, what: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!(language, error = %e, "dropping {what} pattern");
            None
        }
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language").field("id", &self.spec.id).finish()
    }
}

/// Lookup from file name or extension to a [`Language`].
pub struct LanguageRegistry {
    languages: Vec<Language>,
    by_id: HashMap<&'static str, usize>,
    by_extension: HashMap<&'static str, usize>,
    by_filename: HashMap<&'static str, usize>,
}

static REGISTRY: LazyLock<LanguageRegistry> = LazyLock::new(LanguageRegistry::build);

impl LanguageRegistry {
    pub fn global() -> &'static LanguageRegistry {
        &REGISTRY
    }

    fn build() -> Self {
        let mut registry = Self {
            languages: Vec::with_capacity(LANGUAGES.len()),
            by_id: HashMap::new(),
            by_extension: HashMap::new(),
            by_filename: HashMap::new(),
        };

        for spec in LANGUAGES {
            let idx = registry.languages.len();
            registry.languages.push(Language::compile(spec));
            registry.by_id.insert(spec.id, idx);
            for ext in spec.extensions {
                registry.by_extension.insert(ext, idx);
            }
            for name in spec.filenames {
                registry.by_filename.insert(name, idx);
            }
        }

        registry
    }

    pub fn get(&self, id: &str) -> Option<&Language> {
        self.by_id.get(id).map(|&i| &self.languages[i])
    }

    /// Detect the language of a path. Exact file names win over extensions.
    pub fn detect(&self, path: &Path) -> Option<&Language> {
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && let Some(&i) = self.by_filename.get(name)
        {
            return Some(&self.languages[i]);
        }
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.by_extension.get(ext).map(|&i| &self.languages[i])
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter()
    }
}
