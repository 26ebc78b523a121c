use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "RESUMATCH_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub bundle_path: PathBuf,
    pub dataset_path: PathBuf,
    pub embedding_model: String,
    pub default_location: String,
    pub jobs_per_field: usize,
    pub total_jobs: usize,
    pub top_k: usize,
    pub adzuna_app_id: String,
    pub adzuna_app_key: String,
    pub adzuna_country: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_cache_dir(default_cache_dir())
    }
}

impl Settings {
    /// Default settings with every cached artefact under `cache_dir`.
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            bundle_path: cache_dir.join("classifier").join("pipeline.json"),
            cache_dir,
            dataset_path: PathBuf::from("data").join("resumes.jsonl"),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            default_location: "india".to_string(),
            jobs_per_field: 5,
            total_jobs: 10,
            top_k: 3,
            adzuna_app_id: String::new(),
            adzuna_app_key: String::new(),
            adzuna_country: "in".to_string(),
            request_timeout_secs: 20,
        }
    }

    /// Loads `.env` if present, then applies `RESUMATCH_*` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let cache_dir = var("CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);
        let mut settings = Self::with_cache_dir(cache_dir);

        if let Some(path) = var("BUNDLE_PATH") {
            settings.bundle_path = PathBuf::from(path);
        }
        if let Some(path) = var("DATASET_PATH") {
            settings.dataset_path = PathBuf::from(path);
        }
        if let Some(model) = var("EMBEDDING_MODEL") {
            settings.embedding_model = model;
        }
        if let Some(location) = var("DEFAULT_LOCATION") {
            settings.default_location = location;
        }
        if let Some(id) = var("ADZUNA_APP_ID") {
            settings.adzuna_app_id = id;
        }
        if let Some(key) = var("ADZUNA_APP_KEY") {
            settings.adzuna_app_key = key;
        }
        if let Some(country) = var("ADZUNA_COUNTRY") {
            settings.adzuna_country = country;
        }

        settings.jobs_per_field = parse_number(&var, "JOBS_PER_FIELD", settings.jobs_per_field)?;
        settings.total_jobs = parse_number(&var, "TOTAL_JOBS", settings.total_jobs)?;
        settings.top_k = parse_number(&var, "TOP_K", settings.top_k)?;
        settings.request_timeout_secs =
            parse_number(&var, "REQUEST_TIMEOUT_SECS", settings.request_timeout_secs)?;

        log::debug!("Resolved settings: {:?}", settings.redacted());
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.cache_dir.join("models")
    }

    /// Copy with credentials blanked, for logging.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.adzuna_app_key.is_empty() {
            copy.adzuna_app_key = "***".to_string();
        }
        copy
    }
}

fn parse_number<T, V>(var: &V, name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: format!("{ENV_PREFIX}{name}"),
            value: raw,
        }),
    }
}

/// Root directory for downloaded models and the trained bundle.
pub fn default_cache_dir() -> PathBuf {
    // 1. Explicit override
    if let Ok(path) = env::var("RESUMATCH_CACHE") {
        return PathBuf::from(path);
    }

    // 2. Platform cache directory
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("resumatch");
    }

    // 3. Home directory
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".cache").join("resumatch");
    }

    env::temp_dir().join("resumatch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("RESUMATCH_CACHE", "/tmp/rm-cache")])).unwrap();
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/rm-cache"));
        assert_eq!(
            settings.bundle_path,
            PathBuf::from("/tmp/rm-cache/classifier/pipeline.json")
        );
        assert_eq!(settings.models_dir(), PathBuf::from("/tmp/rm-cache/models"));
        assert_eq!(settings.embedding_model, "all-MiniLM-L6-v2");
        assert_eq!(settings.default_location, "india");
        assert_eq!((settings.jobs_per_field, settings.total_jobs, settings.top_k), (5, 10, 3));
        assert_eq!(settings.adzuna_country, "in");
        assert_eq!(settings.request_timeout(), Duration::from_secs(20));
        assert!(settings.adzuna_app_id.is_empty());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("RESUMATCH_CACHE", "/tmp/rm-cache"),
            ("RESUMATCH_BUNDLE_PATH", "/srv/pipeline.json"),
            ("RESUMATCH_TOP_K", "5"),
            ("RESUMATCH_TOTAL_JOBS", " 25 "),
            ("RESUMATCH_ADZUNA_APP_KEY", "secret"),
            ("RESUMATCH_DEFAULT_LOCATION", "london"),
        ]))
        .unwrap();

        assert_eq!(settings.bundle_path, PathBuf::from("/srv/pipeline.json"));
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.total_jobs, 25);
        assert_eq!(settings.default_location, "london");
        assert_eq!(settings.adzuna_app_key, "secret");
        assert_eq!(settings.redacted().adzuna_app_key, "***");
    }

    #[test]
    fn test_invalid_number() {
        let err = Settings::from_lookup(lookup(&[("RESUMATCH_JOBS_PER_FIELD", "many")])).unwrap_err();
        match err {
            ConfigError::Invalid { name, value } => {
                assert_eq!(name, "RESUMATCH_JOBS_PER_FIELD");
                assert_eq!(value, "many");
            }
        }
    }
}
