mod bundle;
pub mod corpus;
mod ensemble;
mod error;
pub mod evaluation;
pub mod estimators;
mod labels;
mod model;
pub mod vectorizer;

pub use bundle::ClassifierBundle;
pub use corpus::{load_corpus, LabeledResume};
pub use ensemble::{soft_vote, PipelineConfig, SoftVotingEnsemble, TextPipeline};
pub use error::ClassifierError;
pub use evaluation::{Evaluation, ValidationConfig};
pub use labels::LabelEncoder;
pub use model::{top_k, CategoryClassifier, Prediction};

/// Information about a trained classifier
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassifierInfo {
    /// Number of categories in the label vocabulary
    pub num_classes: usize,
    /// Category labels in vocabulary order
    pub class_labels: Vec<String>,
    /// Number of TF-IDF features
    pub num_features: usize,
    /// Ensemble members, in voting order
    pub estimators: Vec<String>,
    /// Unique résumés the bundle was fitted on
    pub training_documents: usize,
    /// Hold-out scores from training, absent if nothing could be held out
    pub validation: Option<Evaluation>,
}
