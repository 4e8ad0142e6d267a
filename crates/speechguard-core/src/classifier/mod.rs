//! Spectrogram image classifier
//!
//! Wraps a pretrained image-classification network (YOLO classification,
//! exported to ONNX) and maps its output onto the model's label set.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Classifier                         │
//! │  • Resolves the device once                             │
//! │  • Validates labels against the model output            │
//! │  • Warm-up (inference + audio preprocessing)            │
//! │  • predict → Prediction {label: probability}            │
//! └─────────────────────────────────────────────────────────┘
//!                │                             │
//!                ▼                             ▼
//!   ┌──────────────────────────┐  ┌───────────────────────────┐
//!   │ InferenceBackend (trait) │  │ SpectrogramGenerator      │
//!   │   OrtBackend             │  │   MelSpectrogramGenerator │
//!   └──────────────────────────┘  └───────────────────────────┘
//! ```

mod backend;
mod config;
mod device;
mod error;
mod labels;
mod prediction;
mod service;
mod warmup;

pub use backend::{InferenceBackend, OrtBackend};
pub use config::ClassifierConfig;
pub use device::Device;
pub use error::{ClassifierError, Result};
pub use labels::{load_labels_file, parse_names};
pub use prediction::Prediction;
pub use service::Classifier;
pub use warmup::{WARMUP_SAMPLES, WARMUP_SAMPLE_RATE};
