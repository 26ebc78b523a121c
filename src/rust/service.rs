use std::sync::Arc;

use crate::classifier::{CategoryClassifier, PipelineConfig, Prediction};
use crate::config::{ConfigError, Settings};
use crate::embedding::{OnnxEncoder, SentenceEncoder};
use crate::error::MatchError;
use crate::jobs::{AdzunaConfig, AdzunaSource, JobSource};
use crate::lazy::ModelCell;
use crate::model_manager::ModelManager;
use crate::models::BuiltinModel;
use crate::ranking::{rank_jobs, ScoredJob};
use crate::runtime::RuntimeConfig;

/// Résumé classification and job matching behind one shared handle.
///
/// The classifier and the sentence encoder are loaded on first use and then
/// shared by every request. Concurrent first requests load each model once.
///
/// ```no_run
/// # async fn run() -> Result<(), resumatch::MatchError> {
/// use resumatch::{MatchService, Settings};
///
/// let service = MatchService::builder()
///     .with_settings(Settings::from_env()?)
///     .build()?;
/// let resume = "Data analyst with Python, SQL and Tableau experience";
/// for job in service.match_jobs(resume, 3, "india", 5, 10).await? {
///     println!("{:.3} {} ({})", job.weighted_score, job.title, job.field);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MatchService {
    settings: Settings,
    pipeline_config: PipelineConfig,
    runtime: RuntimeConfig,
    classifier: Arc<ModelCell<CategoryClassifier>>,
    encoder: ModelCell<dyn SentenceEncoder>,
    source: Arc<dyn JobSource>,
}

/// A builder for [`MatchService`]; anything not supplied is derived from the settings.
#[derive(Default)]
pub struct MatchServiceBuilder {
    settings: Option<Settings>,
    pipeline_config: PipelineConfig,
    runtime: Option<RuntimeConfig>,
    classifier: Option<Arc<CategoryClassifier>>,
    encoder: Option<Arc<dyn SentenceEncoder>>,
    source: Option<Arc<dyn JobSource>>,
}

impl MatchServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Hyper-parameters used if the classifier has to be trained on first use.
    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    pub fn with_runtime_config(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<CategoryClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn SentenceEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_job_source(mut self, source: Arc<dyn JobSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<MatchService, MatchError> {
        let settings = self.settings.unwrap_or_default();

        let source: Arc<dyn JobSource> = match self.source {
            Some(source) => source,
            None => Arc::new(AdzunaSource::new(AdzunaConfig::from(&settings))?),
        };

        Ok(MatchService {
            classifier: Arc::new(self.classifier.map(ModelCell::with_value).unwrap_or_default()),
            encoder: self.encoder.map(ModelCell::with_value).unwrap_or_default(),
            runtime: self.runtime.unwrap_or_default(),
            pipeline_config: self.pipeline_config,
            settings,
            source,
        })
    }
}

impl MatchService {
    pub fn builder() -> MatchServiceBuilder {
        MatchServiceBuilder::new()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared classifier, loading or training it on first call.
    ///
    /// Blocks the calling thread while the bundle is loaded or trained; async
    /// callers go through [`MatchService::match_jobs`], which does that work
    /// on tokio's blocking pool.
    pub fn classifier(&self) -> Result<Arc<CategoryClassifier>, MatchError> {
        init_classifier(&self.classifier, &self.settings, &self.pipeline_config)
    }

    /// Whether the classifier has been loaded yet.
    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_initialized()
    }

    async fn shared_classifier(&self) -> Result<Arc<CategoryClassifier>, MatchError> {
        if let Some(classifier) = self.classifier.get() {
            return Ok(classifier);
        }

        let cell = Arc::clone(&self.classifier);
        let settings = self.settings.clone();
        let config = self.pipeline_config;
        tokio::task::spawn_blocking(move || init_classifier(&cell, &settings, &config)).await?
    }

    /// The shared sentence encoder, loading it on first call.
    ///
    /// The model files must already be in the cache; see
    /// [`ModelManager::ensure_model_downloaded`].
    pub fn encoder(&self) -> Result<Arc<dyn SentenceEncoder>, MatchError> {
        self.encoder.get_or_try_init(|| {
            let model = BuiltinModel::from_identifier(&self.settings.embedding_model).ok_or_else(|| {
                ConfigError::Invalid {
                    name: "RESUMATCH_EMBEDDING_MODEL".to_string(),
                    value: self.settings.embedding_model.clone(),
                }
            })?;
            let manager = ModelManager::new(self.settings.models_dir())
                .map_err(crate::model_manager::ModelError::from)?;
            let encoder = OnnxEncoder::from_builtin(&manager, model, &self.runtime)?;
            log::info!("Sentence encoder '{}' loaded", model.identifier());
            Ok(Arc::new(encoder) as Arc<dyn SentenceEncoder>)
        })
    }

    /// The `k` most likely categories for a résumé.
    pub fn classify(&self, text: &str, k: usize) -> Result<Vec<Prediction>, MatchError> {
        Ok(self.classifier()?.predict_top_k(text, k))
    }

    /// Ranks jobs for already computed predictions.
    pub async fn rank(
        &self,
        text: &str,
        predictions: &[Prediction],
        location: &str,
        jobs_per_field: usize,
        total_jobs: usize,
    ) -> Result<Vec<ScoredJob>, MatchError> {
        let encoder = self.encoder()?;
        let ranked = rank_jobs(
            encoder.as_ref(),
            self.source.as_ref(),
            text,
            predictions,
            location,
            jobs_per_field,
            total_jobs,
        )
        .await?;
        Ok(ranked)
    }

    /// Classifies the résumé, then ranks jobs across its top `k` categories.
    ///
    /// A classifier that still has to be loaded or trained is prepared on the
    /// blocking pool, so concurrent requests keep the runtime responsive.
    pub async fn match_jobs(
        &self,
        text: &str,
        k: usize,
        location: &str,
        jobs_per_field: usize,
        total_jobs: usize,
    ) -> Result<Vec<ScoredJob>, MatchError> {
        let predictions = self.shared_classifier().await?.predict_top_k(text, k);
        self.rank(text, &predictions, location, jobs_per_field, total_jobs)
            .await
    }
}

fn init_classifier(
    cell: &ModelCell<CategoryClassifier>,
    settings: &Settings,
    config: &PipelineConfig,
) -> Result<Arc<CategoryClassifier>, MatchError> {
    cell.get_or_try_init(|| {
        let classifier = CategoryClassifier::load_or_train(
            &settings.bundle_path,
            Some(&settings.dataset_path),
            config,
        )?;
        Ok(Arc::new(classifier))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::StaticJobSource;
    use crate::ranking::fakes::FixedEncoder;

    fn offline_settings(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::with_cache_dir(dir.to_path_buf());
        settings.dataset_path = dir.join("missing.jsonl");
        settings
    }

    #[test]
    fn test_missing_bundle_and_corpus_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = MatchService::builder()
            .with_settings(offline_settings(dir.path()))
            .with_job_source(Arc::new(StaticJobSource::new()))
            .build()
            .unwrap();

        assert!(matches!(
            service.classify("python developer", 3),
            Err(MatchError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_unknown_embedding_model_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = offline_settings(dir.path());
        settings.embedding_model = "word2vec".to_string();
        let service = MatchService::builder()
            .with_settings(settings)
            .with_job_source(Arc::new(StaticJobSource::new()))
            .build()
            .unwrap();

        assert!(matches!(service.encoder(), Err(MatchError::Config(_))));
    }

    #[test]
    fn test_injected_encoder_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let encoder: Arc<dyn SentenceEncoder> = Arc::new(FixedEncoder::new(vec![1.0, 0.0]));
        let service = MatchService::builder()
            .with_settings(offline_settings(dir.path()))
            .with_encoder(Arc::clone(&encoder))
            .with_job_source(Arc::new(StaticJobSource::new()))
            .build()
            .unwrap();

        let first = service.encoder().unwrap();
        assert!(Arc::ptr_eq(&first, &encoder));
        assert!(Arc::ptr_eq(&first, &service.encoder().unwrap()));
    }
}
