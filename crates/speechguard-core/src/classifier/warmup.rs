//! Construction-time warm-up
//!
//! One throwaway inference on an all-zero input, then one throwaway
//! spectrogram of a 0.1 s silent clip. Both push lazy initialization (session
//! allocation, FFT planning, codec registry) to startup. Failures are logged
//! and never abort construction.

use std::path::Path;
use std::time::Instant;

use tempfile::NamedTempFile;

use super::backend::InferenceBackend;
use super::error::Result;
use crate::audio::write_wav_f32;
use crate::spectrogram::SpectrogramGenerator;
use crate::tensor;

/// Sample rate of the synthetic warm-up clip
pub const WARMUP_SAMPLE_RATE: u32 = 16000;

/// Warm-up clip length: 0.1 s of silence
pub const WARMUP_SAMPLES: usize = WARMUP_SAMPLE_RATE as usize / 10;

/// Run both warm-up steps, swallowing (and logging) failures
pub(crate) fn run(
    backend: &mut dyn InferenceBackend,
    preprocessor: &dyn SpectrogramGenerator,
    scratch_dir: Option<&Path>,
) {
    log::info!("warmup: starting");
    let start = Instant::now();

    match warm_model(backend) {
        Ok(()) => log::info!("warmup: {} inference ready", backend.name()),
        Err(e) => log::warn!("warmup: model inference skipped: {}", e),
    }

    match warm_preprocessor(preprocessor, scratch_dir) {
        Ok(()) => log::info!("warmup: {} preprocessing ready", preprocessor.name()),
        Err(e) => log::warn!("warmup: audio preprocessing skipped: {}", e),
    }

    log::info!("warmup: finished in {:?}", start.elapsed());
}

fn warm_model(backend: &mut dyn InferenceBackend) -> Result<()> {
    let input = tensor::zeros(backend.input_shape());
    backend.infer(&input).map(|_| ())
}

fn warm_preprocessor(preprocessor: &dyn SpectrogramGenerator, scratch_dir: Option<&Path>) -> Result<()> {
    let clip = write_silent_clip(scratch_dir)?;
    let result = preprocessor.generate(clip.path());

    // Removed here on both paths; a failed removal is reported but not fatal
    let clip_path = clip.path().to_path_buf();
    if let Err(e) = clip.close() {
        log::warn!("warmup: failed to remove {:?}: {}", clip_path, e);
    }

    result.map(|_| ()).map_err(Into::into)
}

fn write_silent_clip(scratch_dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("speechguard_warmup_").suffix(".wav");

    let clip = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    // The temp file is deleted on drop if writing fails part-way
    write_wav_f32(clip.path(), &[0.0; WARMUP_SAMPLES], WARMUP_SAMPLE_RATE)
        .map_err(crate::spectrogram::SpectrogramError::from)?;

    Ok(clip)
}
