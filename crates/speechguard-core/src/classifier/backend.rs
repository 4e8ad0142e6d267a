//! Inference backend trait and the ONNX Runtime implementation
//!
//! The classifier talks to the model only through [`InferenceBackend`], so the
//! runtime can be swapped (or faked in tests) without touching the
//! label/probability handling.

use std::path::Path;
use std::time::Instant;

use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::config::ClassifierConfig;
use super::device::Device;
use super::error::{ClassifierError, Result};
use super::labels::{load_labels_file, parse_names, NAMES_METADATA_KEY};
use crate::tensor::DEFAULT_INPUT_SHAPE;

/// Input tensor name used by YOLO exports
const DEFAULT_INPUT_NAME: &str = "images";

/// A loaded, device-bound model
pub trait InferenceBackend: Send {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Device the model was placed on
    fn device(&self) -> Device;

    /// Ordered class names
    fn labels(&self) -> &[String];

    /// Expected `[batch, channels, height, width]` input
    fn input_shape(&self) -> [usize; 4] {
        DEFAULT_INPUT_SHAPE
    }

    /// Number of probabilities the model emits, when it declares a static width
    fn output_width(&self) -> Option<usize> {
        None
    }

    /// Run one forward pass and return the first output, flattened
    fn infer(&mut self, input: &Array4<f32>) -> Result<Vec<f32>>;
}

/// Backend using ONNX Runtime via the `ort` crate
pub struct OrtBackend {
    session: Session,
    input_name: String,
    input_shape: [usize; 4],
    output_width: Option<usize>,
    labels: Vec<String>,
    device: Device,
}

impl OrtBackend {
    /// Load the model at `config.model_path` onto `device`
    ///
    /// Graph optimization is set to the highest level, which folds and fuses
    /// layers for inference.
    pub fn load(config: &ClassifierConfig, device: Device) -> Result<Self> {
        let model_path = config.model_path.as_path();
        if !model_path.is_file() {
            return Err(ClassifierError::model_load(model_path, "file not found"));
        }

        log::info!("OrtBackend: loading {:?} on {}", model_path, device.display_name());
        let start = Instant::now();

        let mut builder = Session::builder()
            .map_err(|e| ClassifierError::model_load(model_path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::model_load(model_path, e))?;

        if config.intra_threads > 0 {
            builder = builder
                .with_intra_threads(config.intra_threads)
                .map_err(|e| ClassifierError::model_load(model_path, e))?;
        }

        let session = device
            .configure(builder)
            .map_err(|e| ClassifierError::model_load(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::model_load(model_path, e))?;

        let labels = match &config.labels_path {
            Some(path) => load_labels_file(path)?,
            None => labels_from_metadata(&session, model_path)?,
        };

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .unwrap_or_else(|| DEFAULT_INPUT_NAME.to_string());

        let input_shape = session
            .inputs()
            .first()
            .and_then(|input| tensor_dims(input.dtype()))
            .map(|dims| resolve_input_shape(&dims))
            .unwrap_or(DEFAULT_INPUT_SHAPE);

        let output_width = session
            .outputs()
            .first()
            .and_then(|output| tensor_dims(output.dtype()))
            .and_then(|dims| dims.last().copied())
            .filter(|&width| width > 0)
            .map(|width| width as usize);

        log::info!(
            "OrtBackend: loaded in {:?} (input {:?} {:?}, {} labels, output width {:?})",
            start.elapsed(),
            input_name,
            input_shape,
            labels.len(),
            output_width
        );

        Ok(Self {
            session,
            input_name,
            input_shape,
            output_width,
            labels,
            device,
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn name(&self) -> &'static str {
        "ONNX Runtime"
    }

    fn device(&self) -> Device {
        self.device
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn output_width(&self) -> Option<usize> {
        self.output_width
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input.clone())?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let (_, output) = outputs.iter().next().ok_or(ClassifierError::EmptyOutput)?;
        let (_shape, data) = output.try_extract_tensor::<f32>()?;
        Ok(data.to_vec())
    }
}

/// Class names from the `names` metadata entry written by YOLO exports
fn labels_from_metadata(session: &Session, model_path: &Path) -> Result<Vec<String>> {
    let metadata = session
        .metadata()
        .map_err(|e| ClassifierError::model_load(model_path, e))?;

    let raw = metadata
        .custom(NAMES_METADATA_KEY)
        .ok_or_else(|| {
            ClassifierError::model_load(
                model_path,
                "model metadata has no 'names' entry; provide a labels file",
            )
        })?;

    parse_names(&raw).map_err(|e| ClassifierError::model_load(model_path, e))
}

fn tensor_dims(value_type: &ValueType) -> Option<Vec<i64>> {
    match value_type {
        ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
        _ => None,
    }
}

/// Replace dynamic (non-positive) dimensions with the defaults
fn resolve_input_shape(dims: &[i64]) -> [usize; 4] {
    if dims.len() != 4 {
        return DEFAULT_INPUT_SHAPE;
    }
    let mut shape = DEFAULT_INPUT_SHAPE;
    for (slot, &dim) in shape.iter_mut().zip(dims) {
        if dim > 0 {
            *slot = dim as usize;
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_load_error() {
        let config = ClassifierConfig::for_model("/nonexistent/model.onnx");
        let err = OrtBackend::load(&config, Device::Fallback).err().unwrap();
        assert!(matches!(err, ClassifierError::ModelLoad { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_directory_is_not_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig::for_model(dir.path());
        assert!(OrtBackend::load(&config, Device::Fallback).is_err());
    }

    #[test]
    fn test_load_reads_schema_from_session() {
        let model = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/tiny_cls.onnx");
        let mut backend = OrtBackend::load(&ClassifierConfig::for_model(&model), Device::Fallback).unwrap();

        assert_eq!(backend.input_name, "images");
        assert_eq!(backend.input_shape(), [1, 3, 224, 224]);
        assert_eq!(backend.output_width(), Some(2));
        assert_eq!(backend.labels(), &["human".to_string(), "nonhuman".to_string()]);

        let input = crate::tensor::zeros([1, 3, 224, 224]);
        let probs = backend.infer(&input).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_resolve_input_shape() {
        assert_eq!(resolve_input_shape(&[1, 3, 224, 224]), [1, 3, 224, 224]);
        assert_eq!(resolve_input_shape(&[-1, 3, 256, 256]), [1, 3, 256, 256]);
        assert_eq!(resolve_input_shape(&[1, 3]), DEFAULT_INPUT_SHAPE);
    }
}
