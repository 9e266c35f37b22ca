/// Embedder trait and shared types for text embedding.
///
/// One embedder is created per workspace and shared by every index scope and
/// knowledge store behind an `Arc<dyn Embedder>`.
pub mod download;
pub mod hash;
pub mod onnx;
pub mod tokenizer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EmbeddingConfig;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors, one per input, in order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// A sentence-transformer model the ONNX provider knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    /// Hugging Face repository.
    pub repo: &'static str,
    pub dimensions: usize,
    pub max_length: usize,
}

pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "all-MiniLM-L6-v2",
        repo: "sentence-transformers/all-MiniLM-L6-v2",
        dimensions: 384,
        max_length: 256,
    },
    ModelSpec {
        name: "multilingual-e5-small",
        repo: "intfloat/multilingual-e5-small",
        dimensions: 384,
        max_length: 512,
    },
];

impl ModelSpec {
    /// Look up a model by its short name or its repository.
    pub fn find(name: &str) -> Option<&'static ModelSpec> {
        MODELS.iter().find(|m| m.name == name || m.repo == name)
    }
}

/// Build the embedder described by `config`.
///
/// The ONNX provider downloads missing model files first, so this blocks;
/// async callers run it under `spawn_blocking`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "hash" => {
            info!(dimensions = config.dimensions, "Using hashing embedder");
            Ok(Arc::new(hash::HashEmbedder::new(config.dimensions)))
        }
        "onnx" => {
            let spec = ModelSpec::find(&config.model).ok_or_else(|| {
                let known: Vec<&str> = MODELS.iter().map(|m| m.name).collect();
                anyhow::anyhow!("unknown model {:?}, expected one of {known:?}", config.model)
            })?;
            if config.dimensions != spec.dimensions {
                warn!(
                    configured = config.dimensions,
                    model = spec.dimensions,
                    "embedding.dimensions ignored, using the model's"
                );
            }

            let model_dir = config
                .model_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| download::default_model_dir(spec));
            download::download_model_files(spec, &model_dir)?;

            let embedder = onnx::OnnxEmbedder::new(&model_dir, spec)?;
            Ok(Arc::new(embedder))
        }
        other => anyhow::bail!("unknown embedding provider: {other}"),
    }
}

/// L2-normalize a vector, returning the normalized copy.
pub(crate) fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return vec.to_vec();
    }

    let inv_norm = 1.0 / norm_sq.sqrt();
    vec.iter().map(|v| v * inv_norm).collect()
}

/// Cosine similarity of two vectors. Zero when either is a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
