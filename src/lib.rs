//! # coderag: local incremental code intelligence
//!
//! Indexes a source tree into searchable chunks and symbols, keeps a semantic
//! vector index and a free-text knowledge base in SQLite, and derives
//! structural views from per-language heuristics.
//!
//! ## Architecture
//!
//! - **[`config`]** - Configuration loading, discovery and validation
//! - **[`indexer`]** - Language registry, file walking, chunking, symbols, dependency resolution and the incremental index
//! - **[`db`]** - SQLite + sqlite-vec storage for chunks and knowledge entries
//! - **[`embedder`]** - Text embedding via ONNX Runtime, or an offline hashing provider
//! - **[`knowledge`]** - Knowledge-base lifecycle (add, search, export, compact)
//! - **[`analysis`]** - Type hierarchy, dead code, references, rename preview and diff impact
//! - **[`vcs`]** - Read-only git queries with timeouts
//! - **[`snapshot`]** - Context snapshot file
//! - **[`workspace`]** - Scope wiring for one project

pub mod analysis;
pub mod config;
pub mod db;
pub mod embedder;
pub mod indexer;
pub mod knowledge;
pub mod snapshot;
pub mod vcs;
pub mod workspace;
