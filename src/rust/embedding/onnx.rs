use std::path::Path;
use std::sync::Arc;

use ndarray::Array1;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::{EmbeddingError, SentenceEncoder, TextEmbedding};
use crate::model_manager::ModelManager;
use crate::models::{BuiltinModel, ModelCharacteristics};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Sentence encoder running a transformer exported to ONNX.
#[derive(Debug, Clone)]
pub struct OnnxEncoder {
    tokenizer: Arc<Tokenizer>,
    session: Arc<Session>,
    characteristics: ModelCharacteristics,
    token_type_ids: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxEncoder>();
    }
};

impl TextEmbedding for OnnxEncoder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> usize {
        self.characteristics.max_sequence_length
    }

    fn uses_token_type_ids(&self) -> bool {
        self.token_type_ids
    }
}

impl SentenceEncoder for OnnxEncoder {
    fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(Array1::zeros(self.characteristics.embedding_size));
        }
        self.embed_text(text)
    }

    fn dimension(&self) -> usize {
        self.characteristics.embedding_size
    }
}

impl OnnxEncoder {
    /// Loads a built-in model from the manager's cache.
    ///
    /// The model must already be downloaded; see
    /// [`ModelManager::ensure_model_downloaded`].
    pub fn from_builtin(
        manager: &ModelManager,
        model: BuiltinModel,
        runtime: &RuntimeConfig,
    ) -> Result<Self, EmbeddingError> {
        if !manager.is_model_downloaded(model) {
            return Err(EmbeddingError::Model(format!(
                "Model '{}' is not downloaded. Run `resumatch download-model` first",
                model.identifier()
            )));
        }

        let model_path = manager.get_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);
        Self::load(&model_path, &tokenizer_path, model.characteristics(), runtime)
    }

    /// Loads a custom model, inferring the embedding size with a probe input.
    pub fn from_files(
        model_path: &Path,
        tokenizer_path: &Path,
        max_sequence_length: Option<usize>,
        runtime: &RuntimeConfig,
    ) -> Result<Self, EmbeddingError> {
        for path in [model_path, tokenizer_path] {
            if !path.exists() {
                return Err(EmbeddingError::Model(format!("File not found: {:?}", path)));
            }
        }

        let provisional = ModelCharacteristics {
            embedding_size: 0,
            max_sequence_length: max_sequence_length.unwrap_or(256),
            model_size_mb: 0,
        };
        let mut encoder = Self::load(model_path, tokenizer_path, provisional, runtime)?;
        let probe = encoder.embed_text("Test input to infer embedding size")?;
        encoder.characteristics.embedding_size = probe.len();
        log::info!("Inferred embedding size from model: {}", probe.len());
        Ok(encoder)
    }

    fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        characteristics: ModelCharacteristics,
        runtime: &RuntimeConfig,
    ) -> Result<Self, EmbeddingError> {
        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            log::error!("Failed to load tokenizer: {}", e);
            EmbeddingError::Tokenizer(format!("Failed to load tokenizer: {}", e))
        })?;
        log::info!("Tokenizer loaded from {:?}", tokenizer_path);

        let session = create_session_builder(runtime)?.commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        let token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");
        log::info!("Encoder model loaded from {:?}", model_path);

        Ok(Self {
            tokenizer: Arc::new(tokenizer),
            session: Arc::new(session),
            characteristics,
            token_type_ids,
        })
    }

    fn validate_model(session: &Session) -> Result<(), EmbeddingError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(EmbeddingError::Model(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(EmbeddingError::Model(
                "Model must have at least 1 output for embeddings".to_string(),
            ));
        }
        Ok(())
    }

    pub fn characteristics(&self) -> &ModelCharacteristics {
        &self.characteristics
    }

    pub fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        TextEmbedding::count_tokens(self, text)
    }
}
