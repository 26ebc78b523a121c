//! Sentence embeddings for résumé / job-description similarity.

use std::collections::HashMap;

use ndarray::{Array1, Array2, Axis};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

mod error;
mod onnx;
mod utils;

pub use error::EmbeddingError;
pub use onnx::OnnxEncoder;
pub use utils::cosine_similarity;
pub(crate) use utils::normalize_vector;

/// Maps free text to a fixed-length vector.
///
/// Implementations must be deterministic for identical input and return a
/// zero vector for blank text.
pub trait SentenceEncoder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError>;

    /// Length of every vector returned by [`SentenceEncoder::embed`].
    fn dimension(&self) -> usize;
}

/// Tokenise-and-run mechanics shared by ONNX-backed encoders.
///
/// The model is expected to:
/// - accept `input_ids` and `attention_mask` (and optionally `token_type_ids`),
///   each shaped `[1, sequence_length]`
/// - output token states shaped `[1, sequence_length, embedding_size]`
///
/// The sentence vector is the attention-masked mean of the token states,
/// L2-normalised.
pub(crate) trait TextEmbedding {
    fn tokenizer(&self) -> Option<&Tokenizer>;

    fn session(&self) -> Option<&Session>;

    fn max_sequence_length(&self) -> usize;

    fn uses_token_type_ids(&self) -> bool {
        false
    }

    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| EmbeddingError::Tokenizer("Tokenizer not initialized".into()))?;

        tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))
            .map(|encoding| encoding.get_ids().len())
    }

    /// Token ids with special tokens, truncated to the model's window with
    /// the closing `[SEP]` kept.
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, EmbeddingError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| EmbeddingError::Tokenizer("Tokenizer not initialized".into()))?;

        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        let mut ids = encoding.get_ids().to_vec();

        let max_length = self.max_sequence_length();
        if ids.len() > max_length {
            log::debug!("Truncating {} tokens to {}", ids.len(), max_length);
            truncate_ids(&mut ids, encoding.get_special_tokens_mask(), max_length);
        }
        Ok(ids)
    }

    fn embed_text(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
        let tokens = self.tokenize(text)?;
        self.get_embedding(&tokens)
    }

    fn get_embedding(&self, tokens: &[u32]) -> Result<Array1<f32>, EmbeddingError> {
        let session = self
            .session()
            .ok_or_else(|| EmbeddingError::Model("Session not initialized".into()))?;
        if tokens.is_empty() {
            return Err(EmbeddingError::Tokenizer("No tokens to embed".into()));
        }

        let len = tokens.len();
        let mask: Vec<i64> = tokens.iter().map(|&x| if x == 0 { 0 } else { 1 }).collect();

        let input_array = Array2::from_shape_vec((1, len), tokens.iter().map(|&x| x as i64).collect())
            .map_err(|e| EmbeddingError::Model(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_array = Array2::from_shape_vec((1, len), mask.clone())
            .map_err(|e| EmbeddingError::Model(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let type_array = Array2::<i64>::zeros((1, len));
        let type_dyn = type_array.into_dyn();
        let token_type_ids = type_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(&input_ids)
                .map_err(|e| EmbeddingError::Model(format!("Failed to create input tensor: {}", e)))?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(&attention_mask)
                .map_err(|e| EmbeddingError::Model(format!("Failed to create mask tensor: {}", e)))?,
        );
        if self.uses_token_type_ids() {
            input_tensors.insert(
                "token_type_ids",
                Tensor::from_array(&token_type_ids)
                    .map_err(|e| EmbeddingError::Model(format!("Failed to create type tensor: {}", e)))?,
            );
        }

        let outputs = session
            .run(input_tensors)
            .map_err(|e| EmbeddingError::Runtime(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbeddingError::Model(format!("Failed to extract output tensor: {}", e)))?;

        let embedding = match output_tensor.ndim() {
            // [1, seq, dim]: mean over unmasked tokens
            3 => {
                let states = output_tensor.index_axis(Axis(0), 0);
                let mut pooled = Array1::<f32>::zeros(states.shape()[1]);
                let mut count = 0.0f32;
                for (token_state, &m) in states.outer_iter().zip(&mask) {
                    if m == 1 {
                        pooled += &token_state;
                        count += 1.0;
                    }
                }
                if count > 0.0 {
                    pooled /= count;
                }
                pooled
            }
            // [1, dim]: already pooled by the graph
            2 => output_tensor.index_axis(Axis(0), 0).iter().cloned().collect(),
            other => {
                return Err(EmbeddingError::Model(format!(
                    "Unexpected output rank {} (expected 2 or 3)",
                    other
                )))
            }
        };

        Ok(normalize_vector(&embedding))
    }
}

/// Cuts `ids` to `max_length`, keeping a trailing special token in the last slot.
fn truncate_ids(ids: &mut Vec<u32>, special_tokens_mask: &[u32], max_length: usize) {
    if ids.len() <= max_length {
        return;
    }
    let closing = match special_tokens_mask.last() {
        Some(&1) => ids.last().copied(),
        _ => None,
    };
    match closing {
        Some(id) if max_length > 0 => {
            ids.truncate(max_length - 1);
            ids.push(id);
        }
        _ => ids.truncate(max_length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLS: u32 = 101;
    const SEP: u32 = 102;

    #[test]
    fn test_truncation_keeps_closing_separator() {
        let mut ids = vec![CLS, 7, 8, 9, 10, SEP];
        let mask = [1, 0, 0, 0, 0, 1];
        truncate_ids(&mut ids, &mask, 4);
        assert_eq!(ids, vec![CLS, 7, 8, SEP]);
    }

    #[test]
    fn test_truncation_without_special_tail() {
        let mut ids = vec![7, 8, 9, 10];
        truncate_ids(&mut ids, &[0, 0, 0, 0], 2);
        assert_eq!(ids, vec![7, 8]);

        let mut short = vec![CLS, 7, SEP];
        truncate_ids(&mut short, &[1, 0, 1], 8);
        assert_eq!(short, vec![CLS, 7, SEP]);
    }
}
