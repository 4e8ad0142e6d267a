//! Audio-to-spectrogram preprocessing
//!
//! The classifier never looks inside this module: it only needs something
//! implementing [`SpectrogramGenerator`]. The default generator decodes the
//! file, downmixes and resamples it, and computes a normalized mel
//! spectrogram that can be rendered as the model's input image.
//!
//! ```text
//! audio file ──decode──► mono @ sample_rate ──STFT + mel──► Spectrogram
//!                                                             │
//!                                             to_image / to_tensor / save_png
//! ```

mod config;
mod error;
mod mel;
mod render;

use std::path::Path;

pub use config::SpectrogramConfig;
pub use error::{Result, SpectrogramError};
pub use mel::Spectrogram;

use crate::audio::{decode_audio, resample_linear};

/// Turns an audio file into a spectrogram
///
/// Implementations must accept a short silent clip without error; the
/// classifier's warm-up relies on it.
pub trait SpectrogramGenerator: Send + Sync {
    fn generate(&self, audio_path: &Path) -> Result<Spectrogram>;

    /// Name for logging
    fn name(&self) -> &'static str {
        "spectrogram"
    }
}

/// Default generator: Symphonia decode → linear resample → mel spectrogram
#[derive(Debug, Clone, Default)]
pub struct MelSpectrogramGenerator {
    config: SpectrogramConfig,
}

impl MelSpectrogramGenerator {
    pub fn new(mut config: SpectrogramConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }
}

impl SpectrogramGenerator for MelSpectrogramGenerator {
    fn generate(&self, audio_path: &Path) -> Result<Spectrogram> {
        let audio = decode_audio(audio_path)?;
        let mono = audio.to_mono();
        if mono.is_empty() {
            return Err(SpectrogramError::EmptyAudio(audio_path.display().to_string()));
        }

        let samples = resample_linear(&mono, audio.sample_rate, self.config.sample_rate);
        let spectrogram = Spectrogram::from_samples(&samples, &self.config)?;

        log::debug!(
            "spectrogram: {:?} ({:.2}s) -> {} bands x {} frames",
            audio_path.file_name().unwrap_or_default(),
            audio.duration_secs(),
            spectrogram.n_mels(),
            spectrogram.n_frames()
        );

        Ok(spectrogram)
    }

    fn name(&self) -> &'static str {
        "mel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::write_wav_f32;

    #[test]
    fn test_generate_from_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin() * 0.3)
            .collect();
        write_wav_f32(&path, &samples, 44100).unwrap();

        let generator = MelSpectrogramGenerator::default();
        let spec = generator.generate(&path).unwrap();

        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.n_mels(), 128);
        assert!((spec.duration_secs() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_silent_clip_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write_wav_f32(&path, &vec![0.0; 1600], 16000).unwrap();

        let spec = MelSpectrogramGenerator::default().generate(&path).unwrap();
        assert!(spec.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_wav_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav_f32(&path, &[], 16000).unwrap();

        let result = MelSpectrogramGenerator::default().generate(&path);
        assert!(matches!(result, Err(SpectrogramError::EmptyAudio(_))));
    }

    #[test]
    fn test_missing_file_fails() {
        let result = MelSpectrogramGenerator::default().generate(Path::new("/nonexistent/a.wav"));
        assert!(matches!(result, Err(SpectrogramError::Audio(_))));
    }
}
