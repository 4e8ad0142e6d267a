//! Classifier error types

use std::path::PathBuf;
use thiserror::Error;

use crate::spectrogram::SpectrogramError;

/// Errors that can occur while building or running the classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Missing or unloadable model weights
    #[error("Failed to load model {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// Label set and model output disagree
    #[error("Model schema mismatch: {0}")]
    ModelSchema(String),

    /// Inference failure, passed through from ONNX Runtime
    #[error(transparent)]
    Ort(#[from] ort::Error),

    #[error("Model produced no output tensor")]
    EmptyOutput,

    #[error(transparent)]
    Spectrogram(#[from] SpectrogramError),

    #[error("Failed to read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClassifierError {
    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
