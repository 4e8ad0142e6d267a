//! Spectrogram error types

use thiserror::Error;

use crate::audio::AudioError;

/// Errors that can occur while turning audio into a spectrogram
#[derive(Error, Debug)]
pub enum SpectrogramError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Holds the file path, or a description of the in-memory buffer
    #[error("No audio samples in {0}")]
    EmptyAudio(String),

    #[error("FFT failed: {0}")]
    Fft(String),

    #[error("Failed to write spectrogram image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SpectrogramError>;
