use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array1;
use resumatch::{
    normalize, rank_jobs, CategoryClassifier, EmbeddingError, JobPosting, LabeledResume,
    PipelineConfig, Prediction, SentenceEncoder, StaticJobSource,
};

const CATEGORIES: [(&str, &str); 4] = [
    ("Data Science", "python pandas machine learning statistics regression models sql"),
    ("HR", "recruitment payroll onboarding employee relations policies hiring"),
    ("Civil Engineer", "autocad structural concrete site survey construction drawings"),
    ("Sales", "targets crm negotiation clients revenue pipeline closing deals"),
];

const RESUME: &str = "Senior analyst (5 yrs) - Python, pandas & SQL; built regression \
    models for churn. See https://github.com/someone #datascience @mentor\n\n\
    Previously: reporting dashboards, stakeholder presentations, A/B testing.";

fn synthetic_corpus() -> Vec<LabeledResume> {
    let mut corpus = Vec::new();
    for (label, vocabulary) in CATEGORIES {
        let words: Vec<&str> = vocabulary.split(' ').collect();
        for i in 0..20 {
            let text: Vec<&str> = (0..12).map(|j| words[(i * 3 + j) % words.len()]).collect();
            corpus.push(LabeledResume::new(format!("{} profile {}", text.join(" "), i), label));
        }
    }
    corpus
}

/// Bag-of-bytes encoder standing in for the ONNX model.
struct ByteHistogramEncoder;

impl SentenceEncoder for ByteHistogramEncoder {
    fn embed(&self, text: &str) -> Result<Array1<f32>, EmbeddingError> {
        let mut v = Array1::<f32>::zeros(64);
        for b in text.bytes() {
            v[(b % 64) as usize] += 1.0;
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        64
    }
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalize");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("resume", |b| b.iter(|| normalize(black_box(RESUME))));

    let long = RESUME.repeat(40);
    group.bench_function("long_resume", |b| b.iter(|| normalize(black_box(&long))));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let classifier = CategoryClassifier::train(synthetic_corpus(), &PipelineConfig::default())
        .expect("synthetic corpus trains");

    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for k in [1, 3] {
        group.bench_function(format!("top_{k}"), |b| {
            b.iter(|| classifier.predict_top_k(black_box(RESUME), k))
        });
    }

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let encoder = ByteHistogramEncoder;
    let mut source = StaticJobSource::new();
    for (label, vocabulary) in CATEGORIES {
        let postings = (0..5)
            .map(|i| {
                JobPosting::new(
                    format!("{label} role {i}"),
                    "Bengaluru",
                    format!("{vocabulary} {}", "team ".repeat(i * 10)),
                    format!("https://jobs.example/{i}"),
                )
            })
            .collect();
        source = source.with_postings(label, postings);
    }
    let predictions: Vec<Prediction> = CATEGORIES
        .iter()
        .zip([0.55, 0.25, 0.15])
        .map(|((label, _), p)| Prediction::new(*label, p))
        .collect();

    c.bench_function("rank_jobs_3x5", |b| {
        b.iter(|| {
            runtime
                .block_on(rank_jobs(
                    &encoder,
                    &source,
                    black_box(RESUME),
                    &predictions,
                    "india",
                    5,
                    10,
                ))
                .expect("ranking succeeds")
        })
    });
}

criterion_group!(benches, bench_normalize, bench_prediction, bench_ranking);
criterion_main!(benches);
