/// BERT tokenizer wrapper around HuggingFace `tokenizers` crate.
///
/// Pads each batch to its longest member so one inference call covers the
/// whole batch.
use std::path::Path;

use anyhow::Result;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

pub struct BertTokenizer {
    inner: Tokenizer,
    max_length: usize,
}

/// Token ids and masks for a padded batch, flattened row-major.
#[derive(Debug, Clone)]
pub struct BatchEncoding {
    pub batch_size: usize,
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl BertTokenizer {
    /// Load `tokenizer.json` from the model directory.
    pub fn from_model_dir(model_dir: &Path, max_length: usize) -> Result<Self> {
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {}",
            model_dir.display()
        );

        let mut inner = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to configure truncation: {e}"))?;

        inner.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self { inner, max_length })
    }

    /// Tokenize a batch into one padded rectangle.
    pub fn encode_batch(&self, texts: &[&str]) -> Result<BatchEncoding> {
        let encodings = self
            .inner
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("failed to encode batch: {e}"))?;

        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let mut input_ids = Vec::with_capacity(texts.len() * seq_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * seq_len);

        for enc in &encodings {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            input_ids.extend(ids.iter().map(|&id| id as i64));
            attention_mask.extend(mask.iter().map(|&m| m as i64));
            // BatchLongest already pads; this only guards a ragged result
            for _ in ids.len()..seq_len {
                input_ids.push(0);
                attention_mask.push(0);
            }
        }

        Ok(BatchEncoding {
            batch_size: encodings.len(),
            seq_len,
            input_ids,
            attention_mask,
        })
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }

    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore]
    fn test_encode_batch_with_real_model() {
        let model_dir = Path::new("models/all-MiniLM-L6-v2");
        if !model_dir.join("tokenizer.json").exists() {
            eprintln!("Skipping: model files not downloaded");
            return;
        }

        let tokenizer = BertTokenizer::from_model_dir(model_dir, 256).unwrap();
        let batch = tokenizer
            .encode_batch(&["Hello", "a much longer second sentence"])
            .unwrap();

        assert_eq!(batch.batch_size, 2);
        assert_eq!(batch.input_ids.len(), 2 * batch.seq_len);
        assert_eq!(batch.attention_mask.len(), batch.input_ids.len());
        // first row is padded
        assert_eq!(batch.attention_mask[batch.seq_len - 1], 0);
    }

    #[test]
    fn test_tokenizer_missing_file() {
        let result = BertTokenizer::from_model_dir(Path::new("/nonexistent/path"), 128);
        assert!(result.is_err());
    }
}
