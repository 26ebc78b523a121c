use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bundle::ClassifierBundle;
use super::corpus::{dedup_by_text, load_corpus, LabeledResume};
use super::ensemble::{PipelineConfig, TextPipeline};
use super::error::ClassifierError;
use super::evaluation::holdout_evaluation;
use super::labels::LabelEncoder;
use crate::text::normalize;

/// A category label with its classification probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Résumé category classifier backed by a trained bundle.
///
/// Immutable once built and `Send + Sync`, so a single instance can be
/// shared behind an `Arc` by every request.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use resumatch::CategoryClassifier;
///
/// let classifier = CategoryClassifier::load("models/pipeline.json")?;
/// for prediction in classifier.predict_top_k("Senior data scientist, Python, SQL", 3) {
///     println!("{}: {:.2}", prediction.label, prediction.probability);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    bundle: ClassifierBundle,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<CategoryClassifier>();
    }
};

impl CategoryClassifier {
    pub fn from_bundle(bundle: ClassifierBundle) -> Self {
        Self { bundle }
    }

    /// Fits a new classifier on labelled résumés.
    ///
    /// Records are deduplicated by raw text and normalised before fitting.
    /// The label vocabulary is fixed here, in sorted order. A stratified
    /// hold-out split is scored first; the returned model is then fitted on
    /// every record.
    pub fn train(records: Vec<LabeledResume>, config: &PipelineConfig) -> Result<Self, ClassifierError> {
        let total = records.len();
        let records = dedup_by_text(records);
        log::info!("Training on {} unique résumés ({} duplicates dropped)", records.len(), total - records.len());

        let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let labels = LabelEncoder::fit(&categories)?;
        let targets = labels.transform(&categories)?;
        let documents: Vec<String> = records.iter().map(|r| normalize(&r.text)).collect();

        let validation = holdout_evaluation(&documents, &targets, labels.len(), config);
        let pipeline = TextPipeline::fit(&documents, &targets, labels.len(), config)?;

        let bundle = ClassifierBundle::new(labels, pipeline, documents.len())?.with_validation(validation);
        Ok(Self { bundle })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        Ok(Self::from_bundle(ClassifierBundle::load(path)?))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClassifierError> {
        self.bundle.save(path)
    }

    /// Loads the persisted bundle, or trains and persists one from the corpus.
    ///
    /// Fails with [`ClassifierError::ModelUnavailable`] when neither exists.
    pub fn load_or_train(
        bundle_path: &Path,
        dataset_path: Option<&Path>,
        config: &PipelineConfig,
    ) -> Result<Self, ClassifierError> {
        if bundle_path.exists() {
            log::info!("Loading classifier bundle from {:?}", bundle_path);
            return Self::load(bundle_path);
        }

        match dataset_path {
            Some(dataset) if dataset.exists() => {
                log::info!("No bundle at {:?}, training from {:?}", bundle_path, dataset);
                let classifier = Self::train(load_corpus(dataset)?, config)?;
                classifier.save(bundle_path)?;
                Ok(classifier)
            }
            _ => Err(ClassifierError::ModelUnavailable(format!(
                "no bundle at {:?} and no training corpus{}",
                bundle_path,
                dataset_path
                    .map(|p| format!(" at {:?}", p))
                    .unwrap_or_default()
            ))),
        }
    }

    /// Probability for every label in vocabulary order.
    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        self.bundle.pipeline().predict_proba(&normalize(text))
    }

    /// The `k` most likely categories, most likely first.
    ///
    /// `k` is clamped to the vocabulary size. Equal probabilities keep
    /// vocabulary order.
    pub fn predict_top_k(&self, text: &str, k: usize) -> Vec<Prediction> {
        top_k(&self.predict_proba(text), self.bundle.labels().classes(), k)
    }

    pub fn labels(&self) -> &[String] {
        self.bundle.labels().classes()
    }

    pub fn info(&self) -> super::ClassifierInfo {
        let pipeline = self.bundle.pipeline();
        super::ClassifierInfo {
            num_classes: self.bundle.labels().len(),
            class_labels: self.labels().to_vec(),
            num_features: pipeline.n_features(),
            estimators: pipeline.estimator_names().into_iter().map(str::to_string).collect(),
            training_documents: self.bundle.training_documents(),
            validation: self.bundle.validation().copied(),
        }
    }
}

/// Selects the `k` highest entries of `proba`, paired with their labels.
pub fn top_k(proba: &[f64], labels: &[String], k: usize) -> Vec<Prediction> {
    let k = k.min(proba.len()).min(labels.len());
    let mut order: Vec<usize> = (0..proba.len()).collect();
    // `sort_by` is stable, so ties stay in vocabulary order. NaN sorts last.
    order.sort_by(|&a, &b| match (proba[a].is_nan(), proba[b].is_nan()) {
        (false, false) => proba[b].total_cmp(&proba[a]),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    order
        .into_iter()
        .take(k)
        .map(|i| Prediction::new(labels[i].clone(), proba[i]))
        .collect()
}
