//! Probabilistic estimators combined by the soft-voting ensemble.
//!
//! Every estimator is trained on the same L2-normalised TF-IDF rows with
//! class-balanced sample weights (`n_samples / (n_classes * class_count)`)
//! and exposes a per-class probability vector that sums to one.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::vectorizer::SparseRow;

mod logistic;
mod naive_bayes;
mod sgd;

pub use logistic::{LogisticConfig, LogisticRegression};
pub use naive_bayes::{ComplementNaiveBayes, NaiveBayesConfig};
pub use sgd::{SgdClassifier, SgdConfig};

/// Labelled, weighted training rows shared by all estimators.
#[derive(Debug)]
pub struct TrainingSet<'a> {
    pub rows: &'a [SparseRow],
    pub targets: &'a [usize],
    pub n_features: usize,
    pub n_classes: usize,
    pub sample_weights: Vec<f64>,
}

impl<'a> TrainingSet<'a> {
    pub fn new(
        rows: &'a [SparseRow],
        targets: &'a [usize],
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, ClassifierError> {
        if rows.len() != targets.len() {
            return Err(ClassifierError::Validation(format!(
                "Row count ({}) does not match target count ({})",
                rows.len(),
                targets.len()
            )));
        }
        if rows.is_empty() {
            return Err(ClassifierError::Training("No training rows".into()));
        }
        if let Some(&bad) = targets.iter().find(|&&t| t >= n_classes) {
            return Err(ClassifierError::Validation(format!(
                "Target {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let sample_weights = balanced_sample_weights(targets, n_classes);
        Ok(Self {
            rows,
            targets,
            n_features,
            n_classes,
            sample_weights,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per-sample weights that give every class the same total weight.
pub fn balanced_sample_weights(targets: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &t in targets {
        counts[t] += 1;
    }
    let n = targets.len() as f64;
    targets
        .iter()
        .map(|&t| n / (n_classes as f64 * counts[t] as f64))
        .collect()
}

/// One ensemble member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Sgd(SgdClassifier),
    ComplementNb(ComplementNaiveBayes),
    Logistic(LogisticRegression),
}

impl Estimator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sgd(_) => "sgd_log_loss",
            Self::ComplementNb(_) => "complement_nb",
            Self::Logistic(_) => "logistic_regression",
        }
    }

    pub fn n_classes(&self) -> usize {
        match self {
            Self::Sgd(m) => m.n_classes(),
            Self::ComplementNb(m) => m.n_classes(),
            Self::Logistic(m) => m.n_classes(),
        }
    }

    /// Width of the feature space the estimator was fitted on.
    pub fn n_features(&self) -> usize {
        match self {
            Self::Sgd(m) => m.n_features(),
            Self::ComplementNb(m) => m.n_features(),
            Self::Logistic(m) => m.n_features(),
        }
    }

    pub fn predict_proba(&self, row: &SparseRow) -> Vec<f64> {
        match self {
            Self::Sgd(m) => m.predict_proba(row),
            Self::ComplementNb(m) => m.predict_proba(row),
            Self::Logistic(m) => m.predict_proba(row),
        }
    }
}

pub(crate) fn sparse_dot(weights: ArrayView1<f64>, row: &SparseRow) -> f64 {
    row.iter().map(|&(j, v)| weights[j] * v).sum()
}

/// In-place numerically stable softmax.
pub(crate) fn softmax(scores: &mut [f64]) {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    for s in scores.iter_mut() {
        *s /= sum;
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
