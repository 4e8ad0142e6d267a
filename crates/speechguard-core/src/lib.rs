//! SpeechGuard Core - spectrogram-based synthetic speech detection
//!
//! Audio is rendered as a mel spectrogram image and classified by a pretrained
//! image-classification network running on ONNX Runtime. The resulting
//! `{label: probability}` mapping is graded into a risk assessment.

pub mod audio;
pub mod classifier;
pub mod config;
pub mod records;
pub mod risk;
pub mod spectrogram;
pub mod tensor;

pub use classifier::{Classifier, ClassifierConfig, ClassifierError, Device, Prediction};
pub use records::{PredictionRecord, RecordLog};
pub use risk::{assess_risk, RiskAssessment, RiskConfig, RiskType};
pub use spectrogram::{MelSpectrogramGenerator, Spectrogram, SpectrogramConfig, SpectrogramGenerator};

/// Re-exported so callers can build input tensors without a direct dependency
pub use ndarray;
