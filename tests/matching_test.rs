use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use ndarray::Array1;
use resumatch::{
    CategoryClassifier, EmbeddingError, JobPosting, LabeledResume, MatchError, MatchService,
    PipelineConfig, SentenceEncoder, Settings, StaticJobSource,
};

/// Projects text onto three keyword axes.
struct KeywordEncoder;

impl SentenceEncoder for KeywordEncoder {
    fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
        let text = text.to_lowercase();
        let axes = ["python", "payroll", "concrete"];
        Ok(axes
            .iter()
            .map(|axis| text.matches(axis).count() as f32)
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }
}

fn corpus() -> Vec<LabeledResume> {
    [
        ("Data Science", "python machine learning pandas statistics"),
        ("Data Science", "python deep learning statistics models"),
        ("Data Science", "machine learning pandas models python"),
        ("HR", "payroll recruitment onboarding employee relations"),
        ("HR", "recruitment payroll policies employee"),
        ("HR", "onboarding employee relations payroll hiring"),
        ("Civil Engineer", "concrete structural autocad site"),
        ("Civil Engineer", "site survey concrete construction"),
        ("Civil Engineer", "structural construction autocad concrete"),
    ]
    .iter()
    .map(|(label, text)| LabeledResume::new(*text, *label))
    .collect()
}

fn job_source() -> StaticJobSource {
    StaticJobSource::new()
        .with_postings(
            "Data Science",
            vec![
                JobPosting::new("ML Engineer", "Bengaluru", "Python models in production", "https://jobs.example/ml"),
                JobPosting::new("BI Analyst", "Pune", "Dashboards and reporting", "https://jobs.example/bi"),
            ],
        )
        .with_postings(
            "HR",
            vec![JobPosting::new("Payroll Officer", "Delhi", "Payroll runs", "https://jobs.example/hr")],
        )
        .failing("Civil Engineer")
}

fn service(dir: &std::path::Path) -> MatchService {
    let classifier = CategoryClassifier::train(corpus(), &PipelineConfig::default()).unwrap();
    MatchService::builder()
        .with_settings(Settings::with_cache_dir(dir.to_path_buf()))
        .with_classifier(Arc::new(classifier))
        .with_encoder(Arc::new(KeywordEncoder))
        .with_job_source(Arc::new(job_source()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_match_jobs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());
    let resume = "Python engineer: machine learning, pandas, statistics.";

    let predictions = service.classify(resume, 3).unwrap();
    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0].label, "Data Science");

    let results = service.match_jobs(resume, 3, "india", 5, 10).await.unwrap();

    // Civil Engineer failed, BI Analyst has zero similarity but is still listed
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].title, "ML Engineer");
    assert_eq!(results[0].field, "Data Science");
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    assert!((results[0].weighted_score - results[0].probability).abs() < 1e-6);
    assert!(results
        .windows(2)
        .all(|w| w[0].weighted_score >= w[1].weighted_score));
    assert!(results.iter().all(|job| job.field != "Civil Engineer"));
}

#[tokio::test]
async fn test_total_jobs_bounds_results() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    let results = service
        .match_jobs("python and payroll", 3, "india", 5, 1)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);

    let results = service
        .match_jobs("python and payroll", 3, "india", 5, 0)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_missing_classifier_fails_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::with_cache_dir(dir.path().to_path_buf());
    settings.dataset_path = dir.path().join("absent.jsonl");
    let service = MatchService::builder()
        .with_settings(settings)
        .with_encoder(Arc::new(KeywordEncoder))
        .with_job_source(Arc::new(job_source()))
        .build()
        .unwrap();

    let result = service.match_jobs("python", 3, "india", 5, 10).await;
    assert!(matches!(result, Err(MatchError::ModelUnavailable(_))));
}

fn write_corpus(dir: &std::path::Path) -> std::path::PathBuf {
    let dataset = dir.join("resumes.jsonl");
    let mut file = fs::File::create(&dataset).unwrap();
    for record in corpus() {
        writeln!(file, "{}", serde_json::to_string(&record).unwrap()).unwrap();
    }
    dataset
}

fn untrained_service(dir: &std::path::Path) -> MatchService {
    let mut settings = Settings::with_cache_dir(dir.to_path_buf());
    settings.dataset_path = write_corpus(dir);
    MatchService::builder()
        .with_settings(settings)
        .with_encoder(Arc::new(KeywordEncoder))
        .with_job_source(Arc::new(job_source()))
        .build()
        .unwrap()
}

#[test]
fn test_concurrent_first_use_trains_once() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(untrained_service(dir.path()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.classifier().unwrap())
        })
        .collect();
    let classifiers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(classifiers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert!(service.settings().bundle_path.exists());
}

#[tokio::test]
async fn test_first_match_trains_on_blocking_pool() {
    let dir = tempfile::tempdir().unwrap();
    let service = untrained_service(dir.path());
    assert!(!service.classifier_loaded());

    let mut first = Box::pin(service.match_jobs("python statistics", 3, "india", 5, 10));
    // Training happens off the runtime thread, so the first poll yields
    assert!(futures::poll!(&mut first).is_pending());

    let (first, second) = tokio::join!(first, service.match_jobs("payroll", 3, "india", 5, 10));
    assert_eq!(first.unwrap()[0].field, "Data Science");
    assert!(!second.unwrap().is_empty());
    assert!(service.classifier_loaded());
    assert!(service.settings().bundle_path.exists());
}
