/// Configuration module for coderag.
///
/// Handles loading, validating, and providing default configuration values.
/// A `Config` is built once and passed explicitly to the walker, the index
/// scopes and the knowledge stores; changing it means re-initializing them.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// File name looked up in the project root by [`Config::discover`].
pub const CONFIG_FILE: &str = "coderag.json";

/// Directory names pruned at every level of a walk.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".cache",
    "pkg",
    "wasm-pack-out",
    ".claude",
    "venv",
    ".venv",
    "env",
    ".env",
    "runtime",
    ".idea",
    ".vscode",
    ".next",
    "coverage",
    ".nyc_output",
    ".turbo",
    ".coderag",
];

// ── Default value functions ──────────────────────────────────────────

fn default_ignore_dirs() -> Vec<String> {
    DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()).collect()
}

fn default_max_file_size_kb() -> u64 {
    256
}

fn default_window_lines() -> usize {
    60
}

fn default_overlap_lines() -> usize {
    10
}

fn default_max_definition_lines() -> usize {
    120
}

fn default_gap_threshold() -> usize {
    8
}

fn default_batch_size() -> usize {
    64
}

fn default_min_chunk_chars() -> usize {
    10
}

fn default_search_top_k() -> usize {
    10
}

fn default_relevance_floor() -> f32 {
    0.35
}

fn default_compaction_threshold() -> f32 {
    0.85
}

fn default_provider() -> String {
    "onnx".to_string()
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_data_dir() -> String {
    ".coderag".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Where scope databases, hash caches and the snapshot live.
    /// Relative paths are resolved against the project root.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Optional directory for the cross-project knowledge store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_dir: Option<String>,

    #[serde(default)]
    pub walker: WalkerSettings,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub index: IndexSettings,

    #[serde(default)]
    pub knowledge: KnowledgeSettings,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WalkerSettings {
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Gitignore-style patterns matched against the path relative to the walk root.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// External library roots, relative to the project root. Each one gets its
    /// own index scope and is excluded from the project scope.
    #[serde(default)]
    pub library_roots: Vec<String>,

    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    #[serde(default = "default_window_lines")]
    pub window_lines: usize,

    #[serde(default = "default_overlap_lines")]
    pub overlap_lines: usize,

    /// Containers longer than this are split into their members.
    #[serde(default = "default_max_definition_lines")]
    pub max_definition_lines: usize,

    /// Minimum run of uncovered lines emitted as a gap chunk.
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KnowledgeSettings {
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f32,

    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// `onnx` or `hash`.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model_name")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            global_dir: None,
            walker: WalkerSettings::default(),
            chunking: ChunkingConfig::default(),
            index: IndexSettings::default(),
            knowledge: KnowledgeSettings::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            ignore_dirs: default_ignore_dirs(),
            ignore_patterns: Vec::new(),
            library_roots: Vec::new(),
            max_file_size_kb: default_max_file_size_kb(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_lines: default_window_lines(),
            overlap_lines: default_overlap_lines(),
            max_definition_lines: default_max_definition_lines(),
            gap_threshold: default_gap_threshold(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            min_chunk_chars: default_min_chunk_chars(),
            search_top_k: default_search_top_k(),
        }
    }
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            relevance_floor: default_relevance_floor(),
            compaction_threshold: default_compaction_threshold(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model_name(),
            dimensions: default_dimensions(),
            model_dir: None,
        }
    }
}

// ── .mcp.json compatibility ──────────────────────────────────────────

/// The `mcpServers["code-RAG"]` block of a `.mcp.json` file.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct McpRagBlock {
    rag_ignore_dirs: Option<Vec<String>>,
    rag_ignore: Option<Vec<String>>,
    rag_libs: Option<Vec<String>>,
    rag_max_file_size: Option<f64>,
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults. Invalid JSON is logged and also
    /// falls back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Resolve the configuration for a project root.
    ///
    /// `coderag.json` wins when present. Otherwise the `code-RAG` block of
    /// `.mcp.json` overrides the walker defaults.
    pub fn discover(project_root: &Path) -> Result<Self> {
        let own = project_root.join(CONFIG_FILE);
        if own.exists() {
            return Self::load(&own);
        }

        let mut cfg = Self::default();
        let mcp_path = project_root.join(".mcp.json");
        if !mcp_path.is_file() {
            info!("No .mcp.json found, using defaults");
            return Ok(cfg);
        }

        let block = match read_mcp_block(&mcp_path) {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read .mcp.json: {e:#}");
                return Ok(cfg);
            }
        };

        if let Some(dirs) = block.rag_ignore_dirs.filter(|d| !d.is_empty()) {
            info!(entries = dirs.len(), "ragIgnoreDirs loaded");
            cfg.walker.ignore_dirs = dirs;
        }
        if let Some(patterns) = block.rag_ignore.filter(|p| !p.is_empty()) {
            info!(patterns = patterns.len(), "ragIgnore loaded");
            cfg.walker.ignore_patterns = patterns;
        }
        if let Some(libs) = block.rag_libs.filter(|l| !l.is_empty()) {
            info!(?libs, "ragLibs loaded");
            cfg.walker.library_roots = libs;
        }
        if let Some(kb) = block.rag_max_file_size.filter(|kb| *kb > 0.0) {
            info!("ragMaxFileSize: {kb} KB");
            cfg.walker.max_file_size_kb = kb as u64;
        }

        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.index.batch_size > 0, "index.batch_size must be positive");
        anyhow::ensure!(
            self.index.search_top_k > 0,
            "index.search_top_k must be positive"
        );
        anyhow::ensure!(
            self.chunking.window_lines > self.chunking.overlap_lines,
            "chunking.window_lines must exceed chunking.overlap_lines"
        );
        anyhow::ensure!(
            self.chunking.gap_threshold > 0,
            "chunking.gap_threshold must be positive"
        );
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be positive"
        );
        anyhow::ensure!(
            self.knowledge.compaction_threshold > 0.0 && self.knowledge.compaction_threshold <= 1.0,
            "knowledge.compaction_threshold must be in (0, 1]"
        );
        anyhow::ensure!(
            matches!(self.embedding.provider.as_str(), "onnx" | "hash"),
            "embedding.provider must be \"onnx\" or \"hash\", got {:?}",
            self.embedding.provider
        );
        Ok(())
    }

    /// Maximum file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.walker.max_file_size_kb * 1024
    }

    /// Absolute data directory for a project root.
    #[must_use]
    pub fn data_dir_for(&self, project_root: &Path) -> PathBuf {
        resolve_against(project_root, &self.data_dir)
    }

    /// Absolute directory of the global knowledge store, when configured.
    #[must_use]
    pub fn global_dir_for(&self, project_root: &Path) -> Option<PathBuf> {
        self.global_dir
            .as_deref()
            .map(|dir| resolve_against(project_root, dir))
    }

    /// Library roots resolved against the project root.
    #[must_use]
    pub fn library_paths(&self, project_root: &Path) -> Vec<PathBuf> {
        self.walker
            .library_roots
            .iter()
            .map(|lib| resolve_against(project_root, lib))
            .collect()
    }
}

fn read_mcp_block(path: &Path) -> Result<McpRagBlock> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data).context("invalid JSON")?;
    match value.pointer("/mcpServers/code-RAG") {
        Some(block) => serde_json::from_value(block.clone()).context("invalid code-RAG block"),
        None => Ok(McpRagBlock::default()),
    }
}

fn resolve_against(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        crate::indexer::walker::normalize_path(p)
    } else {
        crate::indexer::walker::normalize_path(&root.join(p))
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunking.window_lines, 60);
        assert_eq!(config.chunking.overlap_lines, 10);
        assert_eq!(config.chunking.max_definition_lines, 120);
        assert_eq!(config.chunking.gap_threshold, 8);
        assert_eq!(config.index.batch_size, 64);
        assert_eq!(config.index.min_chunk_chars, 10);
        assert_eq!(config.max_file_size(), 256 * 1024);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert!(config.walker.ignore_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"index": {"batch_size": 8}, "data_dir": "/tmp/idx"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.index.batch_size, 8);
        assert_eq!(config.data_dir, "/tmp/idx");
        // Other fields should have defaults
        assert_eq!(config.index.min_chunk_chars, 10);
        assert_eq!(config.embedding.dimensions, 384);
    }

    #[test]
    fn test_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_window() {
        let mut config = Config::default();
        config.chunking.overlap_lines = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = Config::default();
        config.embedding.provider = "cloud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_mcp_json() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(".mcp.json"),
            r#"{"mcpServers": {"code-RAG": {
                "ragIgnoreDirs": ["vendor"],
                "ragIgnore": ["*.gen.ts"],
                "ragLibs": ["libs/engine"],
                "ragMaxFileSize": 64
            }}}"#,
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.walker.ignore_dirs, vec!["vendor"]);
        assert_eq!(config.walker.ignore_patterns, vec!["*.gen.ts"]);
        assert_eq!(config.walker.library_roots, vec!["libs/engine"]);
        assert_eq!(config.max_file_size(), 64 * 1024);
        assert_eq!(
            config.library_paths(dir.path()),
            vec![dir.path().join("libs/engine")]
        );
    }

    #[test]
    fn test_discover_prefers_own_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".mcp.json"), r#"{"mcpServers": {"code-RAG": {"ragLibs": ["x"]}}}"#)
            .unwrap();
        let mut own = Config::default();
        own.index.search_top_k = 3;
        own.save(&dir.path().join(CONFIG_FILE)).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.index.search_top_k, 3);
        assert!(config.walker.library_roots.is_empty());
    }

    #[test]
    fn test_discover_without_files() {
        let dir = tempdir().unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.walker.max_file_size_kb, 256);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{not json").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.index.batch_size, 64);
    }
}
