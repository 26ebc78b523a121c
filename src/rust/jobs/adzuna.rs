use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{JobPosting, JobSource, SourceError};
use crate::config::Settings;

const ADZUNA_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const MISSING: &str = "N/A";

#[derive(Debug, Clone)]
pub struct AdzunaConfig {
    pub app_id: String,
    pub app_key: String,
    /// Two-letter market code, e.g. `in` or `gb`
    pub country: String,
    pub timeout: Duration,
}

impl From<&Settings> for AdzunaConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            app_id: settings.adzuna_app_id.clone(),
            app_key: settings.adzuna_app_key.clone(),
            country: settings.adzuna_country.clone(),
            timeout: settings.request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    title: Option<String>,
    location: Option<AdzunaLocation>,
    description: Option<String>,
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdzunaLocation {
    display_name: Option<String>,
}

impl From<AdzunaJob> for JobPosting {
    fn from(job: AdzunaJob) -> Self {
        JobPosting {
            title: job.title.unwrap_or_else(|| MISSING.to_string()),
            location: job
                .location
                .and_then(|l| l.display_name)
                .unwrap_or_else(|| MISSING.to_string()),
            description: job.description.unwrap_or_default(),
            link: job.redirect_url.unwrap_or_else(|| MISSING.to_string()),
        }
    }
}

/// Job search backed by the Adzuna REST API.
#[derive(Debug, Clone)]
pub struct AdzunaSource {
    client: Client,
    config: AdzunaConfig,
}

impl AdzunaSource {
    pub fn new(config: AdzunaConfig) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/{}/search/1", ADZUNA_BASE_URL, self.config.country)
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    async fn search_jobs(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<JobPosting>, SourceError> {
        if self.config.app_id.is_empty() || self.config.app_key.is_empty() {
            return Err(SourceError::MissingCredentials(
                "set RESUMATCH_ADZUNA_APP_ID and RESUMATCH_ADZUNA_APP_KEY".to_string(),
            ));
        }

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
                ("results_per_page", limit_param.as_str()),
                ("what", query),
                ("where", location),
                ("content-type", "application/json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: SearchResponse = response.json().await?;
        let postings: Vec<JobPosting> = payload
            .results
            .into_iter()
            .take(limit)
            .map(JobPosting::from)
            .collect();
        log::debug!("Adzuna returned {} postings for {:?} in {:?}", postings.len(), query, location);
        Ok(postings)
    }
}
