//! Audio file helpers
//!
//! Decoding goes through Symphonia so MP3, FLAC, OGG and WAV all land in the
//! same interleaved `f32` buffer. WAV writing (hound) is only needed for the
//! synthetic warm-up clip.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Extensions accepted for classification uploads
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3"];

/// Errors raised while reading or writing audio
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to read audio file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to write WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Check whether a file name has an accepted audio extension (case-insensitive)
pub fn is_supported_audio_file(name: impl AsRef<Path>) -> bool {
    name.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Decoded audio, interleaved when `channels > 1`
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Average all channels into a single mono signal
    pub fn to_mono(&self) -> Vec<f32> {
        let channels = self.channels.max(1) as usize;
        if channels == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }
}

/// Decode an audio file to interleaved f32 samples using Symphonia
///
/// Corrupt packets are skipped with a warning; a read error mid-stream ends
/// decoding and keeps what was decoded so far.
pub fn decode_audio(path: &Path) -> Result<DecodedAudio> {
    let (mut format, track) = open_audio_track(path)?;

    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| AudioError::UnsupportedFormat(format!("{:?}: unknown sample rate", path)))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let mut audio = DecodedAudio {
        samples: Vec::new(),
        sample_rate,
        channels: params.channels.map(|c| c.count() as u16).unwrap_or(1),
    };
    let mut interleaved: Option<SampleBuffer<f32>> = None;

    while let Some(packet) = next_packet(format.as_mut(), path) {
        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("decode_audio: skipping corrupt packet in {:?}: {}", path, e);
                continue;
            }
            Err(e) => {
                log::warn!("decode_audio: stopping early in {:?}: {}", path, e);
                break;
            }
        };

        // Capacity is the codec's max frame size, so one buffer fits every packet
        let buf = interleaved.get_or_insert_with(|| {
            audio.channels = decoded.spec().channels.count() as u16;
            SampleBuffer::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);
        audio.samples.extend_from_slice(buf.samples());
    }

    log::debug!(
        "decode_audio: {:?} -> {} frames, {}Hz, {} channels",
        path.file_name().unwrap_or_default(),
        audio.frames(),
        audio.sample_rate,
        audio.channels
    );

    Ok(audio)
}

/// Probe the container and pick its first decodable track
fn open_audio_track(path: &Path) -> Result<(Box<dyn FormatReader>, Track)> {
    let file = File::open(path).map_err(|e| AudioError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let stream = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe()
        .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .cloned()
        .ok_or_else(|| AudioError::UnsupportedFormat(format!("{:?}: no audio track", path)))?;

    Ok((probed.format, track))
}

/// Next packet, or `None` at end of stream or on a read error
fn next_packet(format: &mut dyn FormatReader, path: &Path) -> Option<Packet> {
    match format.next_packet() {
        Ok(packet) => Some(packet),
        Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => None,
        Err(e) => {
            log::warn!("decode_audio: cannot read packet from {:?}: {}", path, e);
            None
        }
    }
}

/// Simple linear interpolation resampling
pub fn resample_linear(samples: &[f32], from_sr: u32, to_sr: u32) -> Vec<f32> {
    if from_sr == to_sr || samples.is_empty() || from_sr == 0 || to_sr == 0 {
        return samples.to_vec();
    }

    let ratio = from_sr as f64 / to_sr as f64;
    let output_len = ((samples.len() as f64 / ratio) as usize).max(1);
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }

    output
}

/// Write mono samples as a 32-bit float WAV file
pub fn write_wav_f32(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::new(BufWriter::new(File::create(path)?), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
