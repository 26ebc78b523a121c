//! Merges per-category job searches into one globally ranked list.
//!
//! Each posting is scored as `cosine(resume, description) * probability`,
//! so a close match in a weakly predicted category can rank below a looser
//! match in a strongly predicted one.

use futures::future::join_all;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::classifier::Prediction;
use crate::embedding::{cosine_similarity, EmbeddingError, SentenceEncoder};
use crate::jobs::{JobPosting, JobSource};
use crate::text::{normalize_for_similarity, preview};

/// Characters of description kept in [`ScoredJob::preview`].
pub const PREVIEW_CHARS: usize = 300;

/// A posting scored against the résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredJob {
    /// Category label the posting was fetched for
    pub field: String,
    pub title: String,
    pub location: String,
    pub preview: String,
    pub similarity: f64,
    pub probability: f64,
    pub weighted_score: f64,
    pub link: String,
}

/// Outcome of one category's job search.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryFetch {
    Postings(Vec<JobPosting>),
    Empty,
    /// The source failed; the category contributes nothing
    Failed(String),
}

impl CategoryFetch {
    pub fn into_postings(self) -> Vec<JobPosting> {
        match self {
            CategoryFetch::Postings(postings) => postings,
            CategoryFetch::Empty | CategoryFetch::Failed(_) => Vec::new(),
        }
    }
}

/// Searches one category, absorbing source failures.
pub async fn fetch_category(
    source: &dyn JobSource,
    label: &str,
    location: &str,
    limit: usize,
) -> CategoryFetch {
    if limit == 0 {
        return CategoryFetch::Empty;
    }
    match source.search_jobs(label, location, limit).await {
        Ok(mut postings) if !postings.is_empty() => {
            postings.truncate(limit);
            log::info!("Fetched {} postings for {:?}", postings.len(), label);
            CategoryFetch::Postings(postings)
        }
        Ok(_) => {
            log::info!("No postings found for {:?}", label);
            CategoryFetch::Empty
        }
        Err(e) => {
            log::warn!("Job search for {:?} failed: {}", label, e);
            CategoryFetch::Failed(e.to_string())
        }
    }
}

/// Scores every posting for every predicted category and returns the best
/// `total_jobs` by weighted score.
///
/// Categories are searched concurrently but merged in prediction order, and
/// the final sort is stable, so equal scores keep fetch order. Only a failure
/// to embed the résumé itself is an error.
pub async fn rank_jobs(
    encoder: &dyn SentenceEncoder,
    source: &dyn JobSource,
    resume_text: &str,
    predictions: &[Prediction],
    location: &str,
    jobs_per_field: usize,
    total_jobs: usize,
) -> Result<Vec<ScoredJob>, EmbeddingError> {
    let resume_vec = encoder.embed(&normalize_for_similarity(resume_text))?;

    let fetches = join_all(
        predictions
            .iter()
            .map(|p| fetch_category(source, &p.label, location, jobs_per_field)),
    )
    .await;

    let mut scored = Vec::new();
    for (prediction, fetch) in predictions.iter().zip(fetches) {
        for posting in fetch.into_postings() {
            match score_posting(encoder, &resume_vec, prediction, posting) {
                Ok(job) => scored.push(job),
                Err(e) => log::warn!("Skipping posting for {:?}: {}", prediction.label, e),
            }
        }
    }

    sort_by_weighted_score(&mut scored);
    scored.truncate(total_jobs);
    log::info!("Ranked {} jobs across {} categories", scored.len(), predictions.len());
    Ok(scored)
}

fn score_posting(
    encoder: &dyn SentenceEncoder,
    resume_vec: &Array1<f32>,
    prediction: &Prediction,
    posting: JobPosting,
) -> Result<ScoredJob, EmbeddingError> {
    let job_vec = encoder.embed(&posting.description)?;
    let similarity = f64::from(cosine_similarity(resume_vec, &job_vec));
    Ok(ScoredJob {
        field: prediction.label.clone(),
        preview: preview(&posting.description, PREVIEW_CHARS),
        title: posting.title,
        location: posting.location,
        similarity,
        probability: prediction.probability,
        weighted_score: similarity * prediction.probability,
        link: posting.link,
    })
}

/// Descending, stable; NaN scores sort last.
pub fn sort_by_weighted_score(jobs: &mut [ScoredJob]) {
    jobs.sort_by(|a, b| match (a.weighted_score.is_nan(), b.weighted_score.is_nan()) {
        (false, false) => b.weighted_score.total_cmp(&a.weighted_score),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;

    use ndarray::Array1;

    use crate::embedding::{EmbeddingError, SentenceEncoder};

    /// Encoder returning fixed vectors per exact text; anything else maps
    /// to `fallback`.
    pub struct FixedEncoder {
        pub vectors: HashMap<String, Vec<f32>>,
        pub fallback: Vec<f32>,
        pub fail_on: Vec<String>,
    }

    impl FixedEncoder {
        pub fn new(fallback: Vec<f32>) -> Self {
            Self {
                vectors: HashMap::new(),
                fallback,
                fail_on: Vec::new(),
            }
        }

        pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.to_string(), vector);
            self
        }

        pub fn failing_on(mut self, text: &str) -> Self {
            self.fail_on.push(text.to_string());
            self
        }
    }

    impl SentenceEncoder for FixedEncoder {
        fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
            if self.fail_on.iter().any(|t| t == text) {
                return Err(EmbeddingError::Runtime("inference failed".into()));
            }
            let v = self.vectors.get(text).unwrap_or(&self.fallback);
            Ok(Array1::from_vec(v.clone()))
        }

        fn dimension(&self) -> usize {
            self.fallback.len()
        }
    }
}
