//! Job search collaborators.
//!
//! The ranking engine only sees the [`JobSource`] trait. [`AdzunaSource`]
//! queries the Adzuna search API; [`StaticJobSource`] serves fixed postings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod adzuna;
mod fixed;

pub use adzuna::{AdzunaConfig, AdzunaSource};
pub use fixed::StaticJobSource;

/// A job advert as returned by a source. Fetched per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub location: String,
    pub description: String,
    pub link: String,
}

impl JobPosting {
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            description: description.into(),
            link: link.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Job source credentials missing: {0}")]
    MissingCredentials(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Job source returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Keyword job search.
///
/// Implementations may return fewer than `limit` postings. Retries and
/// timeouts are the implementation's concern.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search_jobs(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<JobPosting>, SourceError>;
}
