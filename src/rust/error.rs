use crate::classifier::ClassifierError;
use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::jobs::SourceError;
use crate::model_manager::ModelError;

/// Errors surfaced by [`crate::MatchService`] and the CLI.
///
/// Per-category job source failures never appear here; the ranking engine
/// absorbs them.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No trained classifier could be loaded or built
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// The uploaded document yielded no text
    #[error("Parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Classifier(ClassifierError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The job source could not be constructed
    #[error(transparent)]
    JobSource(#[from] SourceError),
    /// Background model initialisation panicked or was cancelled
    #[error("Model initialisation task failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

impl From<ClassifierError> for MatchError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelUnavailable(msg) => MatchError::ModelUnavailable(msg),
            other => MatchError::Classifier(other),
        }
    }
}
