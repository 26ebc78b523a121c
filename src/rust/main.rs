use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use resumatch::classifier::load_corpus;
use resumatch::{
    extract_text_from_path, BuiltinModel, CategoryClassifier, ClassifierInfo, MatchService,
    ModelManager, PipelineConfig, Prediction, ScoredJob, Settings,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the category classifier and save the bundle
    Train {
        /// JSON Lines corpus of {"text", "category"} records
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Where to write the bundle
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Predict the most likely categories for a résumé
    Classify {
        file: PathBuf,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Rank jobs for a résumé across its predicted categories
    Match {
        file: PathBuf,
        #[arg(short)]
        k: Option<usize>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        jobs_per_field: Option<usize>,
        #[arg(long)]
        total_jobs: Option<usize>,
    },
    /// Download the sentence encoder model files
    DownloadModel {
        /// Force a fresh download of the model files
        #[arg(short, long)]
        fresh: bool,
    },
}

#[derive(Serialize)]
struct TrainReport {
    bundle: PathBuf,
    #[serde(flatten)]
    info: ClassifierInfo,
}

#[derive(Serialize)]
struct ClassifyReport {
    predictions: Vec<Prediction>,
}

#[derive(Serialize)]
struct MatchReport {
    predictions: Vec<Prediction>,
    results: Vec<ScoredJob>,
}

async fn ensure_model_downloaded(settings: &Settings, fresh: bool) -> Result<()> {
    let model = BuiltinModel::from_identifier(&settings.embedding_model)
        .with_context(|| format!("unknown embedding model '{}'", settings.embedding_model))?;
    let manager = ModelManager::new(settings.models_dir())?;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }
    manager.ensure_model_downloaded(model).await?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = Settings::from_env()?;

    match args.command {
        Command::Train { data, output } => {
            let data = data.unwrap_or_else(|| settings.dataset_path.clone());
            let output = output.unwrap_or_else(|| settings.bundle_path.clone());
            if !data.exists() {
                bail!("training corpus not found at {}", data.display());
            }

            let start = Instant::now();
            let records = load_corpus(&data)?;
            info!("Loaded {} records from {:?}", records.len(), data);
            let classifier = CategoryClassifier::train(records, &PipelineConfig::default())?;
            classifier.save(&output)?;
            info!("Training finished in {:.2?}", start.elapsed());

            print_json(&TrainReport {
                bundle: output,
                info: classifier.info(),
            })?;
        }
        Command::Classify { file, k } => {
            let text = extract_text_from_path(&file)?;
            let k = k.unwrap_or(settings.top_k);
            let service = MatchService::builder().with_settings(settings).build()?;
            print_json(&ClassifyReport {
                predictions: service.classify(&text, k)?,
            })?;
        }
        Command::Match {
            file,
            k,
            location,
            jobs_per_field,
            total_jobs,
        } => {
            let text = extract_text_from_path(&file)?;
            ensure_model_downloaded(&settings, false).await?;

            let k = k.unwrap_or(settings.top_k);
            let location = location.unwrap_or_else(|| settings.default_location.clone());
            let jobs_per_field = jobs_per_field.unwrap_or(settings.jobs_per_field);
            let total_jobs = total_jobs.unwrap_or(settings.total_jobs);

            let service = MatchService::builder().with_settings(settings).build()?;
            let start = Instant::now();
            let predictions = service.classify(&text, k)?;
            let results = service
                .rank(&text, &predictions, &location, jobs_per_field, total_jobs)
                .await?;
            info!("Matched {} jobs in {:.2?}", results.len(), start.elapsed());

            print_json(&MatchReport { predictions, results })?;
        }
        Command::DownloadModel { fresh } => {
            ensure_model_downloaded(&settings, fresh).await?;
            info!("Model files ready in {:?}", settings.models_dir());
        }
    }

    Ok(())
}
