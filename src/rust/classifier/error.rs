use std::io;

/// Errors raised while training, persisting or querying the category classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// No persisted bundle and no corpus to train one from
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// Fitting failed, e.g. the corpus is too small to build a vocabulary
    #[error("Training error: {0}")]
    Training(String),
    /// Invalid input parameters
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The bundle on disk does not match its recorded checksum
    #[error("Bundle checksum mismatch: expected {expected}, got {actual}")]
    Corrupted { expected: String, actual: String },
}
