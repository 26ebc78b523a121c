//! Résumé category classification and job ranking.
//!
//! A TF-IDF soft-voting ensemble predicts the most likely job categories for
//! a résumé. Jobs are then fetched for each category, scored by sentence
//! embedding similarity to the résumé, weighted by the category probability
//! and merged into one ranked list.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use resumatch::{CategoryClassifier, PipelineConfig, LabeledResume};
//!
//! let corpus = vec![
//!     LabeledResume::new("python pandas machine learning models", "Data Science"),
//!     LabeledResume::new("deep learning python statistics", "Data Science"),
//!     LabeledResume::new("recruitment payroll onboarding employees", "HR"),
//!     LabeledResume::new("employee relations recruitment policies", "HR"),
//! ];
//! let classifier = CategoryClassifier::train(corpus, &PipelineConfig::default())?;
//!
//! for prediction in classifier.predict_top_k("Python developer building ML models", 2) {
//!     println!("{}: {:.3}", prediction.label, prediction.probability);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`CategoryClassifier`] and [`OnnxEncoder`] are immutable after loading and
//! can be shared across threads with `Arc`. [`MatchService`] holds both and
//! initialises each once, on first use.

pub mod classifier;
pub mod config;
pub mod document;
pub mod embedding;
mod error;
pub mod jobs;
pub mod lazy;
pub mod model_manager;
pub mod models;
pub mod ranking;
mod runtime;
pub mod service;
pub mod text;

pub use classifier::{
    CategoryClassifier, ClassifierError, ClassifierInfo, LabeledResume, PipelineConfig, Prediction,
};
pub use config::{ConfigError, Settings};
pub use document::{extract_text, extract_text_from_path};
pub use embedding::{cosine_similarity, EmbeddingError, OnnxEncoder, SentenceEncoder};
pub use error::MatchError;
pub use jobs::{AdzunaConfig, AdzunaSource, JobPosting, JobSource, SourceError, StaticJobSource};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use ranking::{rank_jobs, ScoredJob};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use service::{MatchService, MatchServiceBuilder};
pub use text::{normalize, normalize_for_similarity};

pub fn init_logger() {
    env_logger::init();
}
