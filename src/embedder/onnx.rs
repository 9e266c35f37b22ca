/// ONNX Runtime embedder using the `ort` crate.
///
/// Runs a sentence-transformer model over a padded batch, mean-pools the
/// last hidden state under the attention mask, and L2-normalizes each row.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use super::tokenizer::BertTokenizer;
use super::{Embedder, EmbedderError, ModelSpec, l2_normalize};

pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: BertTokenizer,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn new(model_dir: &Path, spec: &ModelSpec) -> Result<Self, EmbedderError> {
        let model_path = model_dir.join("model.onnx");

        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!(model = spec.name, "Initializing ONNX Runtime...");

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .with_inter_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        let tokenizer = BertTokenizer::from_model_dir(model_dir, spec.max_length)
            .map_err(|e| EmbedderError::TokenizerError(format!("{e:#}")))?;

        info!(
            vocab = tokenizer.vocab_size(),
            max_length = tokenizer.max_length(),
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions: spec.dimensions,
        })
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("empty model output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch = self
            .tokenizer
            .encode_batch(texts)
            .map_err(|e| EmbedderError::TokenizerError(format!("{e:#}")))?;
        let shape = [batch.batch_size, batch.seq_len];
        debug!(batch = batch.batch_size, seq_len = batch.seq_len, "running inference");

        let input_ids = Tensor::from_array((shape, batch.input_ids.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("input_ids error: {e}")))?;
        let attention_mask = Tensor::from_array((shape, batch.attention_mask.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("attention_mask error: {e}")))?;
        let token_type_ids =
            Tensor::from_array((shape, vec![0i64; batch.batch_size * batch.seq_len])).map_err(
                |e| EmbedderError::InferenceFailed(format!("token_type_ids error: {e}")),
            )?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| EmbedderError::InferenceFailed(format!("inference failed: {e}")))?;

        // [batch, seq_len, hidden]
        let (_shape, hidden) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        let expected = batch.batch_size * batch.seq_len * self.dimensions;
        if hidden.len() != expected {
            return Err(EmbedderError::InferenceFailed(format!(
                "unexpected output size {} (expected {expected})",
                hidden.len()
            )));
        }

        Ok(mean_pooling(
            hidden,
            &batch.attention_mask,
            batch.batch_size,
            batch.seq_len,
            self.dimensions,
        )
        .iter()
        .map(|row| l2_normalize(row))
        .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Mean pooling over hidden states weighted by attention mask.
///
/// `hidden` is flat with shape `[batch, seq_len, hidden_size]`, `mask` is
/// `[batch, seq_len]`.
fn mean_pooling(
    hidden: &[f32],
    mask: &[i64],
    batch: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let mut row = vec![0.0f32; hidden_size];
            let mut mask_sum = 0.0f32;
            for t in 0..seq_len {
                let m = mask[b * seq_len + t] as f32;
                if m == 0.0 {
                    continue;
                }
                mask_sum += m;
                let base = (b * seq_len + t) * hidden_size;
                for (h, v) in row.iter_mut().enumerate() {
                    *v += hidden[base + h] * m;
                }
            }
            if mask_sum > 0.0 {
                for v in &mut row {
                    *v /= mask_sum;
                }
            }
            row
        })
        .collect()
}
