/// Offline feature-hashing embedder.
///
/// Each lowercase word token is hashed with SHA-256 into a bucket and a sign.
/// Texts sharing vocabulary land close together, which is enough for tests
/// and for machines without the ONNX runtime.
use sha2::{Digest, Sha256};

use super::{Embedder, EmbedderError, l2_normalize};

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for token in tokens(&lower) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let idx = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[idx] += sign;
        }

        Ok(l2_normalize(&embedding))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::cosine_similarity;

    #[test]
    fn test_hash_embed_dimensions() {
        let embedder = HashEmbedder::new(64);
        assert_eq!(embedder.embed("hello world").unwrap().len(), 64);
        assert_eq!(HashEmbedder::default().dimensions(), 384);
    }

    #[test]
    fn test_hash_embed_deterministic() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("fn parse_config").unwrap();
        let b = embedder.embed("fn parse_config").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_embed_normalized() {
        let embedder = HashEmbedder::new(128);
        let vec = embedder.embed("test normalization of vectors").unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "got norm {norm}");
    }

    #[test]
    fn test_hash_embed_case_insensitive() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("Parse Config").unwrap();
        let b = embedder.embed("parse config").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_embed_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::new(256);
        let query = embedder.embed("database connection pool").unwrap();
        let near = embedder
            .embed("open a database connection from the pool")
            .unwrap();
        let far = embedder.embed("render the sidebar widget").unwrap();
        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_hash_embed_empty_text() {
        let embedder = HashEmbedder::new(16);
        assert_eq!(embedder.embed("").unwrap(), vec![0.0; 16]);
    }

    #[test]
    fn test_hash_embed_batch() {
        let embedder = HashEmbedder::new(32);
        let results = embedder.embed_batch(&["a", "b", "c"]).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], embedder.embed("a").unwrap());
    }
}
