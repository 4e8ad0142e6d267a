//! Classifier - owns the model and turns its output into a label mapping
//!
//! The `Classifier` is the main entry point. It handles:
//! - Device selection (once, at construction)
//! - Model loading and label/output validation
//! - Optional warm-up
//! - Prediction from tensors, image files and audio files

use std::path::Path;
use std::time::Instant;

use ndarray::Array4;

use super::backend::{InferenceBackend, OrtBackend};
use super::config::ClassifierConfig;
use super::device::Device;
use super::error::Result;
use super::labels::validate_labels;
use super::prediction::Prediction;
use super::warmup;
use crate::spectrogram::{
    MelSpectrogramGenerator, Spectrogram, SpectrogramConfig, SpectrogramGenerator,
};
use crate::tensor::load_image_tensor;

/// Spectrogram classifier
///
/// Not meant for concurrent use: `predict` needs `&mut self` because the
/// underlying session does. Move it into a worker thread instead of sharing it.
///
/// Example usage:
/// ```ignore
/// let mut classifier = Classifier::new("model/yolo11n-cls.onnx", true)?;
/// let scores = classifier.predict_audio("call.wav")?;
/// println!("{:?}", scores.get("nonhuman"));
/// ```
pub struct Classifier {
    backend: Box<dyn InferenceBackend>,
    preprocessor: Box<dyn SpectrogramGenerator>,
    labels: Vec<String>,
    device: Device,
}

impl Classifier {
    /// Load the model at `model_path`, warming up when `warmup` is true
    pub fn new(model_path: impl AsRef<Path>, warmup: bool) -> Result<Self> {
        let config = ClassifierConfig {
            warmup,
            ..ClassifierConfig::for_model(model_path.as_ref())
        };
        Self::with_config(config, SpectrogramConfig::default())
    }

    /// Build from configuration, using ONNX Runtime and the mel generator
    pub fn with_config(mut config: ClassifierConfig, spectrogram: SpectrogramConfig) -> Result<Self> {
        config.validate();

        let device = Device::resolve(config.use_gpu);
        let backend = OrtBackend::load(&config, device)?;
        let preprocessor = MelSpectrogramGenerator::new(spectrogram);

        Self::from_parts(
            Box::new(backend),
            Box::new(preprocessor),
            config.warmup,
            config.warmup_dir.as_deref(),
        )
    }

    /// Build from an already-loaded backend and preprocessor
    ///
    /// Validates that the label set matches the model's output width before
    /// anything else runs.
    pub fn from_parts(
        mut backend: Box<dyn InferenceBackend>,
        preprocessor: Box<dyn SpectrogramGenerator>,
        warmup: bool,
        warmup_dir: Option<&Path>,
    ) -> Result<Self> {
        let labels = backend.labels().to_vec();
        validate_labels(&labels, backend.output_width())?;

        let device = backend.device();

        if warmup {
            warmup::run(backend.as_mut(), preprocessor.as_ref(), warmup_dir);
        }

        log::info!(
            "Classifier ready: {} on {}, labels {:?}",
            backend.name(),
            device.display_name(),
            labels
        );

        Ok(Self {
            backend,
            preprocessor,
            labels,
            device,
        })
    }

    /// Classify an input tensor shaped like [`input_shape`](Self::input_shape)
    ///
    /// Runtime errors are returned as-is.
    pub fn predict(&mut self, input: &Array4<f32>) -> Result<Prediction> {
        let start = Instant::now();
        let probabilities = self.backend.infer(input)?;
        log::debug!("predict: inference took {:?}", start.elapsed());

        Prediction::from_parts(&self.labels, &probabilities)
    }

    /// Classify an image file (resized to the model input)
    pub fn predict_image(&mut self, path: impl AsRef<Path>) -> Result<Prediction> {
        let (width, height) = self.input_size();
        let input = load_image_tensor(path.as_ref(), width, height)?;
        self.predict(&input)
    }

    /// Classify an audio file through the spectrogram generator
    pub fn predict_audio(&mut self, path: impl AsRef<Path>) -> Result<Prediction> {
        let spectrogram = self.preprocessor.generate(path.as_ref())?;
        self.predict_spectrogram(&spectrogram)
    }

    /// Classify a spectrogram computed ahead of time
    pub fn predict_spectrogram(&mut self, spectrogram: &Spectrogram) -> Result<Prediction> {
        let (width, height) = self.input_size();
        self.predict(&spectrogram.to_tensor(width, height))
    }

    /// Generator used by [`predict_audio`](Self::predict_audio)
    ///
    /// Shareable across threads, so batches can be preprocessed in parallel
    /// and then fed to [`predict_spectrogram`](Self::predict_spectrogram).
    pub fn preprocessor(&self) -> &dyn SpectrogramGenerator {
        self.preprocessor.as_ref()
    }

    /// Ordered class names
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Device chosen at construction
    pub fn device(&self) -> Device {
        self.device
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Expected `[batch, channels, height, width]`
    pub fn input_shape(&self) -> [usize; 4] {
        self.backend.input_shape()
    }

    /// Expected input `(width, height)` in pixels
    pub fn input_size(&self) -> (u32, u32) {
        let [_, _, height, width] = self.input_shape();
        (width as u32, height as u32)
    }
}
