//! Source indexing: language registry, file walking, chunking, symbols,
//! dependency resolution and the incremental vector index.

pub mod chunker;
pub mod core;
pub mod dependencies;
pub mod hash_cache;
pub mod languages;
pub mod patterns;
pub mod symbols;
pub mod walker;

use crate::embedder::EmbedderError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while indexing or searching a scope.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory not found: {}", .0.display())]
    MissingRoot(PathBuf),
}
