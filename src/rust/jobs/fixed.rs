use std::collections::HashMap;

use async_trait::async_trait;

use super::{JobPosting, JobSource, SourceError};

/// In-memory source keyed by query string, ignoring location.
///
/// Queries listed with [`StaticJobSource::failing`] return an error.
#[derive(Debug, Clone, Default)]
pub struct StaticJobSource {
    postings: HashMap<String, Vec<JobPosting>>,
    failing: Vec<String>,
}

impl StaticJobSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_postings(mut self, query: impl Into<String>, postings: Vec<JobPosting>) -> Self {
        self.postings.insert(query.into(), postings);
        self
    }

    pub fn failing(mut self, query: impl Into<String>) -> Self {
        self.failing.push(query.into());
        self
    }
}

#[async_trait]
impl JobSource for StaticJobSource {
    async fn search_jobs(
        &self,
        query: &str,
        _location: &str,
        limit: usize,
    ) -> Result<Vec<JobPosting>, SourceError> {
        if self.failing.iter().any(|q| q == query) {
            return Err(SourceError::Status {
                status: 503,
                body: format!("search for {query:?} unavailable"),
            });
        }
        Ok(self
            .postings
            .get(query)
            .map(|postings| postings.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
