/// Sentence-embedding models the encoder knows how to fetch and run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// Small and efficient model based on MiniLM architecture
    ///
    /// Characteristics:
    /// - Embedding size: 384
    /// - Max sequence length: 256
    /// - Size: ~85MB
    MiniLM,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Size of the embedding vectors produced by the model
    pub embedding_size: usize,
    /// Maximum sequence length the model can handle; longer input is truncated
    pub max_sequence_length: usize,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

/// Download locations and expected SHA-256 digests of a model's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub model_hash: String,
    pub tokenizer_hash: String,
}

impl BuiltinModel {
    /// Resolves a configured model identifier
    ///
    /// Accepts the short name (`minilm`) and the upstream sentence-transformers
    /// name (`all-MiniLM-L6-v2`), case-insensitively.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "minilm" | "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => Some(Self::MiniLM),
            _ => None,
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::MiniLM => "all-MiniLM-L6-v2",
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::MiniLM => ModelCharacteristics {
                embedding_size: 384,
                max_sequence_length: 256,
                model_size_mb: 85,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::MiniLM => ModelInfo {
                name: "minilm".to_string(),
                model_url: "https://huggingface.co/axar-ai/minilm/resolve/main/model.onnx".to_string(),
                tokenizer_url: "https://huggingface.co/axar-ai/minilm/resolve/main/tokenizer.json".to_string(),
                model_hash: "37f1ea074b7166e87295fce31299287d5fb79f76b8b7227fccc8a9f2f1ba4e16".to_string(),
                tokenizer_hash: "da0e79933b9ed51798a3ae27893d3c5fa4a201126cef75586296df9b4d2c62a0".to_string(),
            },
        }
    }
}
