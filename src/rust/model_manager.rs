use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::config::default_cache_dir;
use crate::models::{BuiltinModel, ModelInfo};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// The two files every encoder model consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFile {
    Model,
    Tokenizer,
}

impl ModelFile {
    const ALL: [ModelFile; 2] = [ModelFile::Model, ModelFile::Tokenizer];

    fn file_name(self) -> &'static str {
        match self {
            Self::Model => "model.onnx",
            Self::Tokenizer => "tokenizer.json",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Tokenizer => "tokenizer",
        }
    }

    fn url(self, info: &ModelInfo) -> &str {
        match self {
            Self::Model => &info.model_url,
            Self::Tokenizer => &info.tokenizer_url,
        }
    }

    fn hash(self, info: &ModelInfo) -> &str {
        match self {
            Self::Model => &info.model_hash,
            Self::Tokenizer => &info.tokenizer_hash,
        }
    }
}

/// Fetches and verifies sentence-encoder files in a local cache directory.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a manager rooted at `<cache>/models`
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    pub fn get_default_models_dir() -> PathBuf {
        default_cache_dir().join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.file_path(model, ModelFile::Model)
    }

    pub fn get_tokenizer_path(&self, model: BuiltinModel) -> PathBuf {
        self.file_path(model, ModelFile::Tokenizer)
    }

    fn file_path(&self, model: BuiltinModel, file: ModelFile) -> PathBuf {
        self.models_dir.join(model.get_model_info().name).join(file.file_name())
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        ModelFile::ALL.iter().all(|&file| {
            let path = self.file_path(model, file);
            let exists = path.exists();
            log::debug!("{} path: {:?} (exists: {})", file.kind(), path, exists);
            exists
        })
    }

    /// Downloads any missing or corrupt file; removes both on failure.
    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Preparing model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in ModelFile::ALL {
            let path = self.file_path(model, file);
            let result = if path.exists() && self.verify_file(&path, file.hash(&info))? {
                log::info!("Existing {} file verified", file.kind());
                Ok(())
            } else {
                if path.exists() {
                    log::warn!("{} file failed verification, downloading again", file.kind());
                }
                self.download_and_verify_file(file.url(&info), &path, file.hash(&info), file.kind())
                    .await
            };

            if let Err(e) = result {
                log::error!("Failed to set up {} file: {}", file.kind(), e);
                let _ = self.remove_download(model);
                return Err(e);
            }
        }

        log::info!("Model '{}' ready to use", model.identifier());
        Ok(())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: expected {}, got {}", path, expected_hash, hash);
        Ok(hash == expected_hash)
    }

    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();
        for file in ModelFile::ALL {
            let path = self.file_path(model, file);
            if !path.exists() {
                log::info!("{} file missing at {:?}", file.kind(), path);
                return Ok(false);
            }
            if !self.verify_file(&path, file.hash(&info))? {
                log::info!("{} file hash mismatch at {:?}", file.kind(), path);
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {}", file_type, url);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        if hash != expected_hash {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected_hash, hash);
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }
        log::info!("{} file downloaded and verified", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        for file in ModelFile::ALL {
            let path = self.file_path(model, file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Downloads the model if missing and re-downloads it if verification fails.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if !self.is_model_downloaded(model) {
            log::info!("Model '{}' not found, downloading...", model.identifier());
            return self.download_model(model).await;
        }
        if !self.verify_model(model)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(model)?;
            self.download_model(model).await?;
        }
        Ok(())
    }

    /// Fails with [`ModelError::NotDownloaded`] unless both files are present.
    pub fn require_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if self.is_model_downloaded(model) {
            Ok(())
        } else {
            Err(ModelError::NotDownloaded(model.identifier().to_string()))
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
