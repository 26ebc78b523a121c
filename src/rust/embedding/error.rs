use ort::Error as OrtError;

/// Errors raised while loading or running the sentence encoder.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Error occurred while loading or using the tokenizer
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    /// The model files are missing or have an unexpected structure
    #[error("Model error: {0}")]
    Model(String),
    /// ONNX Runtime failed to initialise or run
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<OrtError> for EmbeddingError {
    fn from(err: OrtError) -> Self {
        EmbeddingError::Runtime(err.to_string())
    }
}
