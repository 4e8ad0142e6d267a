//! Spectrogram configuration

use serde::{Deserialize, Serialize};

use super::error::{Result, SpectrogramError};

/// Parameters for the mel spectrogram and its rendered image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Audio is resampled to this rate before the STFT
    pub sample_rate: u32,
    /// FFT window length in samples
    pub n_fft: usize,
    /// Hop between successive frames in samples
    pub hop_length: usize,
    /// Number of mel bands (image height before resizing)
    pub n_mels: usize,
    /// Dynamic range kept below the loudest bin, in dB
    pub top_db: f32,
    /// Side length of the square image fed to the model
    pub image_size: u32,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_fft: 512,
            hop_length: 160, // 10ms at 16kHz
            n_mels: 128,
            top_db: 80.0,
            image_size: 224,
        }
    }
}

impl SpectrogramConfig {
    /// Clamp values to workable ranges
    pub fn validate(&mut self) {
        self.sample_rate = self.sample_rate.clamp(8000, 48000);
        self.n_fft = self.n_fft.clamp(64, 8192);
        self.hop_length = self.hop_length.clamp(1, self.n_fft);
        self.n_mels = self.n_mels.clamp(8, self.n_fft / 2 + 1);
        self.top_db = self.top_db.clamp(10.0, 120.0);
        self.image_size = self.image_size.clamp(32, 1024);
    }

    /// Reject values the STFT cannot run with, without clamping them
    pub fn check(&self) -> Result<()> {
        let problem = if self.sample_rate == 0 {
            "sample_rate must be positive"
        } else if self.n_fft < 2 {
            "n_fft must be at least 2"
        } else if self.hop_length == 0 {
            "hop_length must be positive"
        } else if self.n_mels == 0 {
            "n_mels must be positive"
        } else {
            return Ok(());
        };
        Err(SpectrogramError::InvalidConfig(problem.to_string()))
    }

    /// Number of FFT bins per frame
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }
}
