//! Classifier configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for building a [`Classifier`](super::Classifier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// ONNX model exported from the classification network
    pub model_path: PathBuf,

    /// Optional labels file (one per line); overrides the model's `names` metadata
    pub labels_path: Option<PathBuf>,

    /// Run one throwaway inference + preprocessing call at construction
    pub warmup: bool,

    /// Whether to attempt GPU acceleration
    pub use_gpu: bool,

    /// Intra-op threads for ONNX Runtime (0 = runtime default)
    pub intra_threads: usize,

    /// Where the warm-up clip is written (system temp dir when unset)
    pub warmup_dir: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/yolo11n-cls.onnx"),
            labels_path: None,
            warmup: true,
            use_gpu: true, // Try GPU, fall back to CPU
            intra_threads: 0,
            warmup_dir: None,
        }
    }
}

impl ClassifierConfig {
    /// Config for a model path with everything else at defaults
    pub fn for_model(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Clamp values to reasonable ranges
    pub fn validate(&mut self) {
        let max_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.intra_threads = self.intra_threads.min(max_threads);
    }
}
