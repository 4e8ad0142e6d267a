//! Mel spectrogram computation
//!
//! Hann-windowed STFT (realfft) → power spectrum → triangular mel filterbank →
//! decibels, normalized to [0, 1] over a `top_db` dynamic range.

use ndarray::Array2;
use realfft::RealFftPlanner;

use super::config::SpectrogramConfig;
use super::error::{Result, SpectrogramError};

/// Floor applied to power values before taking the log
const AMIN: f32 = 1e-10;

/// Normalized mel spectrogram
///
/// `data` has shape `[n_mels, n_frames]`, row 0 being the lowest band.
/// Values are in [0, 1]; an all-silent clip is all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub data: Array2<f32>,
    pub sample_rate: u32,
    pub hop_length: usize,
}

impl Spectrogram {
    /// Compute a spectrogram from mono samples already at `config.sample_rate`
    pub fn from_samples(samples: &[f32], config: &SpectrogramConfig) -> Result<Self> {
        config.check()?;
        if samples.is_empty() {
            return Err(SpectrogramError::EmptyAudio("sample buffer".to_string()));
        }

        let power = power_spectrogram(samples, config.n_fft, config.hop_length)?;
        let filterbank = mel_filterbank(config.n_mels, config.n_fft, config.sample_rate as f32);
        let mel = filterbank.dot(&power);
        let data = normalize_db(&mel, config.top_db);

        Ok(Self {
            data,
            sample_rate: config.sample_rate,
            hop_length: config.hop_length,
        })
    }

    pub fn n_mels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_frames(&self) -> usize {
        self.data.ncols()
    }

    /// Time covered by the frames, in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.n_frames() * self.hop_length) as f64 / self.sample_rate as f64
    }
}

/// Power spectrogram of shape `[n_fft / 2 + 1, n_frames]`
///
/// The signal is zero-padded by `n_fft / 2` on both sides so every sample is
/// centred in some frame and clips shorter than one window still yield a frame.
fn power_spectrogram(signal: &[f32], n_fft: usize, hop: usize) -> Result<Array2<f32>> {
    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; signal.len() + 2 * pad];
    padded[pad..pad + signal.len()].copy_from_slice(signal);
    if padded.len() < n_fft {
        padded.resize(n_fft, 0.0);
    }

    let num_frames = (padded.len() - n_fft) / hop + 1;
    let num_bins = n_fft / 2 + 1;

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window = hann_window(n_fft);

    let mut power = Array2::<f32>::zeros((num_bins, num_frames));
    let mut scratch = fft.make_scratch_vec();
    let mut frame_buf = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop;
        for (i, value) in frame_buf.iter_mut().enumerate() {
            *value = padded[start + i] * window[i];
        }

        fft.process_with_scratch(&mut frame_buf, &mut spectrum, &mut scratch)
            .map_err(|e| SpectrogramError::Fft(format!("{:?}", e)))?;

        for (bin, c) in spectrum.iter().enumerate() {
            power[[bin, frame_idx]] = c.norm_sqr();
        }
    }

    Ok(power)
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Triangular mel filterbank of shape `[n_mels, n_fft / 2 + 1]`
fn mel_filterbank(n_mels: usize, n_fft: usize, sample_rate: f32) -> Array2<f32> {
    let n_bins = n_fft / 2 + 1;
    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(sample_rate / 2.0);

    let n_points = n_mels + 2;
    let bin_points: Vec<f32> = (0..n_points)
        .map(|i| mel_min + (mel_max - mel_min) * i as f32 / (n_points - 1) as f32)
        .map(mel_to_hz)
        .map(|hz| hz * n_fft as f32 / sample_rate)
        .collect();

    let mut filterbank = Array2::<f32>::zeros((n_mels, n_bins));
    for band in 0..n_mels {
        let left = bin_points[band];
        let center = bin_points[band + 1];
        let right = bin_points[band + 2];

        for bin in 0..n_bins {
            let bin_f = bin as f32;
            if bin_f >= left && bin_f <= center && center > left {
                filterbank[[band, bin]] = (bin_f - left) / (center - left);
            } else if bin_f > center && bin_f <= right && right > center {
                filterbank[[band, bin]] = (right - bin_f) / (right - center);
            }
        }
    }

    filterbank
}

/// Convert power to dB and map the top `top_db` decibels onto [0, 1]
fn normalize_db(mel: &Array2<f32>, top_db: f32) -> Array2<f32> {
    let db = mel.mapv(|p| 10.0 * p.max(AMIN).log10());

    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let lowest = db.iter().copied().fold(f32::INFINITY, f32::min);
    let floor = lowest.max(peak - top_db);
    let range = peak - floor;

    if !range.is_finite() || range <= f32::EPSILON {
        return Array2::zeros(db.raw_dim());
    }

    db.mapv(|v| (v.max(floor) - floor) / range)
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: u32, secs: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_mel_hz_roundtrip() {
        let hz = 1000.0;
        let back = mel_to_hz(hz_to_mel(hz));
        assert!((back - hz).abs() < 0.1, "Roundtrip: {} -> {}", hz, back);
    }

    #[test]
    fn test_shape_and_range() {
        let config = SpectrogramConfig::default();
        let spec = Spectrogram::from_samples(&sine(440.0, 16000, 1.0), &config).unwrap();

        assert_eq!(spec.n_mels(), 128);
        // 16000 samples centre-padded by 256 each side, hop 160
        assert_eq!(spec.n_frames(), 101);
        assert!(spec.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(spec.data.iter().any(|&v| v > 0.99));
    }

    #[test]
    fn test_tone_energy_lands_in_low_bands() {
        let config = SpectrogramConfig::default();
        let spec = Spectrogram::from_samples(&sine(300.0, 16000, 0.5), &config).unwrap();

        let band_energy: Vec<f32> = spec.data.rows().into_iter().map(|r| r.sum()).collect();
        let loudest = band_energy
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(loudest < 32, "300 Hz should peak in a low band, got {}", loudest);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let config = SpectrogramConfig::default();
        let spec = Spectrogram::from_samples(&vec![0.0; 1600], &config).unwrap();
        assert!(spec.n_frames() >= 1);
        assert!(spec.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_clip_shorter_than_window_yields_a_frame() {
        let config = SpectrogramConfig::default();
        let spec = Spectrogram::from_samples(&[0.3; 10], &config).unwrap();
        assert_eq!(spec.n_frames(), 1);
    }

    #[test]
    fn test_empty_input_fails() {
        let result = Spectrogram::from_samples(&[], &SpectrogramConfig::default());
        assert!(matches!(result, Err(SpectrogramError::EmptyAudio(_))));
    }

    #[test]
    fn test_unvalidated_config_is_rejected() {
        let samples = [0.1; 1600];
        let broken = [
            SpectrogramConfig { hop_length: 0, ..Default::default() },
            SpectrogramConfig { n_fft: 1, ..Default::default() },
            SpectrogramConfig { n_mels: 0, ..Default::default() },
            SpectrogramConfig { sample_rate: 0, ..Default::default() },
        ];
        for config in &broken {
            let result = Spectrogram::from_samples(&samples, config);
            assert!(
                matches!(result, Err(SpectrogramError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_filterbank_rows_are_nonempty() {
        let fb = mel_filterbank(40, 512, 16000.0);
        assert_eq!(fb.dim(), (40, 257));
        for row in fb.rows() {
            assert!(row.sum() > 0.0);
        }
    }
}
