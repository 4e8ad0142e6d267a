//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

/// Classify speech recordings (.wav, .mp3) as human or synthetic
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "speechguard", version, about)]
pub struct Args {
    /// Config file [default: <config dir>/speechguard/config.yaml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// ONNX model (overrides config)
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Labels file, one per line (overrides model metadata)
    #[arg(long, value_name = "PATH")]
    pub labels: Option<PathBuf>,

    /// Skip the startup warm-up
    #[arg(long)]
    pub no_warmup: bool,

    /// Never use the GPU
    #[arg(long)]
    pub cpu: bool,

    /// Print one JSON object per file
    #[arg(long)]
    pub json: bool,

    /// Also write each spectrogram as PNG into DIR
    #[arg(long, value_name = "DIR")]
    pub save_spectrogram: Option<PathBuf>,

    /// Append one CSV row per prediction to this file
    #[arg(long, value_name = "CSV")]
    pub record: Option<PathBuf>,

    /// Set the ground-truth label of a recorded file, then exit
    #[arg(
        long,
        value_name = "FILE=LABEL",
        requires = "record",
        value_parser = parse_label_update
    )]
    pub set_label: Vec<(String, String)>,

    /// Write the effective configuration to the config path, then exit
    #[arg(long)]
    pub write_config: bool,

    /// Audio files to classify
    #[arg(value_name = "FILE", required_unless_present_any = ["set_label", "write_config"])]
    pub files: Vec<PathBuf>,
}

fn parse_label_update(raw: &str) -> Result<(String, String), String> {
    match raw.rsplit_once('=') {
        Some((file, label)) if !file.is_empty() && !label.is_empty() => {
            Ok((file.to_string(), label.to_string()))
        }
        _ => Err(format!("expected FILE=LABEL, got {:?}", raw)),
    }
}
