use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ensemble::TextPipeline;
use super::error::ClassifierError;
use super::evaluation::Evaluation;
use super::labels::LabelEncoder;

const FORMAT_VERSION: u32 = 1;

/// The fitted pipeline together with the label vocabulary it was fitted on.
///
/// Persisted as JSON with a SHA-256 digest in a `<file>.sha256` sidecar,
/// checked on load when the sidecar is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierBundle {
    format_version: u32,
    labels: LabelEncoder,
    pipeline: TextPipeline,
    training_documents: usize,
    /// Hold-out scores measured when the bundle was trained
    #[serde(default)]
    validation: Option<Evaluation>,
}

impl ClassifierBundle {
    pub fn new(
        labels: LabelEncoder,
        pipeline: TextPipeline,
        training_documents: usize,
    ) -> Result<Self, ClassifierError> {
        let bundle = Self {
            format_version: FORMAT_VERSION,
            labels,
            pipeline,
            training_documents,
            validation: None,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn with_validation(mut self, validation: Option<Evaluation>) -> Self {
        self.validation = validation;
        self
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn pipeline(&self) -> &TextPipeline {
        &self.pipeline
    }

    pub fn training_documents(&self) -> usize {
        self.training_documents
    }

    pub fn validation(&self) -> Option<&Evaluation> {
        self.validation.as_ref()
    }

    pub fn checksum_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".sha256");
        PathBuf::from(name)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClassifierError> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec(self)?;
        let digest = sha256_hex(&bytes);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        fs::write(Self::checksum_path(path), &digest)?;

        log::info!("Saved classifier bundle ({} bytes) to {:?}", bytes.len(), path);
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        let checksum_path = Self::checksum_path(path);
        if checksum_path.exists() {
            let expected = fs::read_to_string(&checksum_path)?.trim().to_string();
            let actual = sha256_hex(&bytes);
            if expected != actual {
                log::error!("Bundle checksum mismatch for {:?}", path);
                return Err(ClassifierError::Corrupted { expected, actual });
            }
        } else {
            log::warn!("No checksum found for {:?}, loading unverified", path);
        }

        let bundle: Self = serde_json::from_slice(&bytes)?;
        bundle.validate()?;
        log::info!(
            "Loaded classifier bundle from {:?}: {} categories, {} features",
            path,
            bundle.labels.len(),
            bundle.pipeline.n_features()
        );
        Ok(bundle)
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ClassifierError::Validation(format!(
                "Unsupported bundle format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.labels.len() != self.pipeline.n_classes() {
            return Err(ClassifierError::Validation(format!(
                "Label vocabulary has {} entries but the pipeline predicts {} classes",
                self.labels.len(),
                self.pipeline.n_classes()
            )));
        }
        self.pipeline.validate()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
