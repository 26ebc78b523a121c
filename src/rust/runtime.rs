use std::sync::OnceLock;

use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;

use crate::embedding::EmbeddingError;

static ENVIRONMENT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime session settings for the sentence encoder
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl RuntimeConfig {
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

// GraphOptimizationLevel is neither Clone nor Copy.
fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

/// Commits the process-wide ONNX Runtime environment once.
///
/// The outcome is cached, so a failed commit is reported to every caller
/// instead of being retried.
pub fn ensure_initialized() -> Result<(), EmbeddingError> {
    ENVIRONMENT
        .get_or_init(|| {
            ort::init()
                .with_name("resumatch")
                .commit()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(EmbeddingError::Runtime)
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, EmbeddingError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_clone_keeps_threads() {
        let config = RuntimeConfig::default().with_intra_threads(2);
        let cloned = config.clone();
        assert_eq!(cloned.intra_threads, 2);
        assert_eq!(cloned.inter_threads, 0);
        assert!(matches!(cloned.optimization_level, GraphOptimizationLevel::Level3));
    }
}
