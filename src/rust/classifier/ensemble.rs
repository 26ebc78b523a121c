use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::evaluation::ValidationConfig;
use super::estimators::{
    ComplementNaiveBayes, Estimator, LogisticConfig, LogisticRegression, NaiveBayesConfig,
    SgdClassifier, SgdConfig, TrainingSet,
};
use super::vectorizer::{SparseRow, TfidfVectorizer, VectorizerConfig};

/// Hyper-parameters for the whole text pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub vectorizer: VectorizerConfig,
    pub sgd: SgdConfig,
    pub naive_bayes: NaiveBayesConfig,
    pub logistic: LogisticConfig,
    /// Hold-out split used to report validation scores during training
    pub validation: ValidationConfig,
}

/// Fixed, ordered set of estimators whose probability vectors are averaged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftVotingEnsemble {
    members: Vec<Estimator>,
}

impl SoftVotingEnsemble {
    pub fn new(members: Vec<Estimator>) -> Result<Self, ClassifierError> {
        let Some(first) = members.first() else {
            return Err(ClassifierError::Validation("Ensemble needs at least one estimator".into()));
        };
        let n_classes = first.n_classes();
        if let Some(bad) = members.iter().find(|m| m.n_classes() != n_classes) {
            return Err(ClassifierError::Validation(format!(
                "Estimator '{}' predicts {} classes, expected {}",
                bad.name(),
                bad.n_classes(),
                n_classes
            )));
        }
        Ok(Self { members })
    }

    /// Trains SGD log-loss, Complement NB and logistic regression, in that order.
    pub fn fit(data: &TrainingSet<'_>, config: &PipelineConfig) -> Result<Self, ClassifierError> {
        log::info!("Training SGD log-loss classifier...");
        let sgd = SgdClassifier::fit(data, &config.sgd);
        log::info!("Training Complement Naive Bayes...");
        let nb = ComplementNaiveBayes::fit(data, &config.naive_bayes);
        log::info!("Training logistic regression...");
        let lr = LogisticRegression::fit(data, &config.logistic);

        Self::new(vec![
            Estimator::Sgd(sgd),
            Estimator::ComplementNb(nb),
            Estimator::Logistic(lr),
        ])
    }

    pub fn predict_proba(&self, row: &SparseRow) -> Vec<f64> {
        soft_vote(self.members.iter().map(|m| m.predict_proba(row)))
    }

    pub fn n_classes(&self) -> usize {
        self.members.first().map(Estimator::n_classes).unwrap_or(0)
    }

    pub fn member_names(&self) -> Vec<&'static str> {
        self.members.iter().map(Estimator::name).collect()
    }

    pub fn members(&self) -> &[Estimator] {
        &self.members
    }
}

/// Element-wise mean of equally sized probability vectors.
pub fn soft_vote<I>(distributions: I) -> Vec<f64>
where
    I: IntoIterator<Item = Vec<f64>>,
{
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;
    for dist in distributions {
        if sum.is_empty() {
            sum = vec![0.0; dist.len()];
        }
        for (acc, p) in sum.iter_mut().zip(dist) {
            *acc += p;
        }
        count += 1;
    }
    if count > 0 {
        sum.iter_mut().for_each(|acc| *acc /= count as f64);
    }
    sum
}

/// Vectorizer followed by the voting ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPipeline {
    vectorizer: TfidfVectorizer,
    ensemble: SoftVotingEnsemble,
}

impl TextPipeline {
    /// Fits on already-normalised documents and encoded targets.
    pub fn fit(
        documents: &[String],
        targets: &[usize],
        n_classes: usize,
        config: &PipelineConfig,
    ) -> Result<Self, ClassifierError> {
        let vectorizer = TfidfVectorizer::fit(documents, config.vectorizer)?;
        let rows: Vec<SparseRow> = documents.iter().map(|d| vectorizer.transform(d)).collect();
        let data = TrainingSet::new(&rows, targets, vectorizer.n_features(), n_classes)?;
        let ensemble = SoftVotingEnsemble::fit(&data, config)?;
        Ok(Self { vectorizer, ensemble })
    }

    /// Probability for every class index, given normalised text.
    pub fn predict_proba(&self, document: &str) -> Vec<f64> {
        let row = self.vectorizer.transform(document);
        self.ensemble.predict_proba(&row)
    }

    pub fn n_classes(&self) -> usize {
        self.ensemble.n_classes()
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }

    pub fn estimator_names(&self) -> Vec<&'static str> {
        self.ensemble.member_names()
    }

    /// Checks that every estimator was fitted on this vectorizer's feature space.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let n_features = self.vectorizer.n_features();
        for member in self.ensemble.members() {
            if member.n_features() != n_features {
                return Err(ClassifierError::Validation(format!(
                    "Estimator '{}' expects {} features but the vectorizer produces {}",
                    member.name(),
                    member.n_features(),
                    n_features
                )));
            }
        }
        Ok(())
    }
}
