//! SpeechGuard CLI - classify speech recordings as human or synthetic
//!
//! 1. Loads the YAML config and applies command line overrides
//! 2. Builds the classifier (model load, device probe, warm-up)
//! 3. Computes spectrograms for all inputs in parallel
//! 4. Classifies each file in turn and prints probabilities + risk
//! 5. Optionally appends each prediction to a CSV record log
//!
//! Set RUST_LOG=debug for per-file timings.

mod args;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;

use speechguard_core::audio::is_supported_audio_file;
use speechguard_core::config::{default_config_path, load_config, save_config, Config};
use speechguard_core::{Classifier, PredictionRecord, RecordLog, RiskAssessment, Spectrogram};

use args::Args;
use report::FileReport;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::warn!("{} file(s) failed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns the number of files that failed
fn run(args: Args) -> Result<usize> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = resolve_config(&args, &config_path);

    if args.write_config {
        save_config(&config, &config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(0);
    }

    let records = args.record.as_ref().map(RecordLog::new);
    if let Some(record_log) = &records {
        if !args.set_label.is_empty() {
            return apply_labels(record_log, &args.set_label);
        }
    }

    classify_files(&args, &config, records.as_ref())
}

fn classify_files(args: &Args, config: &Config, records: Option<&RecordLog>) -> Result<usize> {
    let mut failed = 0;

    let (accepted, rejected): (Vec<PathBuf>, Vec<PathBuf>) =
        args.files.iter().cloned().partition(|f| is_supported_audio_file(f));
    for file in &rejected {
        eprintln!("{}: unsupported file type (expected .wav or .mp3)", file.display());
        failed += 1;
    }
    if accepted.is_empty() {
        return Ok(failed);
    }

    if let Some(dir) = &args.save_spectrogram {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create spectrogram directory: {:?}", dir))?;
    }

    let mut classifier = Classifier::with_config(config.classifier.clone(), config.spectrogram.clone())
        .context("Failed to build classifier")?;
    log::info!(
        "Using {} on {}",
        classifier.backend_name(),
        classifier.device().display_name()
    );
    if config.classifier.use_gpu && !classifier.device().is_accelerated() {
        log::info!("No GPU execution provider available, running on CPU");
    }

    let preprocessor = classifier.preprocessor();
    let spectrograms: Vec<(PathBuf, Result<Spectrogram>)> = accepted
        .into_par_iter()
        .map(|path| {
            let spectrogram = preprocessor
                .generate(&path)
                .with_context(|| format!("Failed to compute spectrogram for {:?}", path));
            (path, spectrogram)
        })
        .collect();

    for (path, spectrogram) in spectrograms {
        let result = spectrogram.and_then(|spectrogram| {
            if let Some(dir) = &args.save_spectrogram {
                save_spectrogram(&spectrogram, &path, dir, config.spectrogram.image_size)?;
            }
            let y_prob = classifier
                .predict_spectrogram(&spectrogram)
                .with_context(|| format!("Prediction failed for {:?}", path))?;
            Ok(FileReport {
                filename: display_name(&path),
                risk: RiskAssessment::from_prediction(&y_prob, &config.risk),
                y_prob,
            })
        });

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{}: {:#}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        if let Some(record_log) = records {
            record_prediction(record_log, &report, config);
        }

        if args.json {
            println!("{}", report.to_json()?);
        } else {
            print!("{}", report.to_text());
        }
    }

    Ok(failed)
}

/// Config file plus command line overrides
fn resolve_config(args: &Args, path: &Path) -> Config {
    let mut config = load_config(path);

    if let Some(model) = &args.model {
        config.classifier.model_path = model.clone();
    }
    if let Some(labels) = &args.labels {
        config.classifier.labels_path = Some(labels.clone());
    }
    if args.no_warmup {
        config.classifier.warmup = false;
    }
    if args.cpu {
        config.classifier.use_gpu = false;
    }

    config
}

/// Failures are logged; they never fail the file
fn record_prediction(record_log: &RecordLog, report: &FileReport, config: &Config) {
    match PredictionRecord::from_prediction(report.filename.clone(), &report.y_prob, &config.risk) {
        Some(record) => {
            if let Err(e) = record_log.append(&record) {
                log::warn!("Failed to record prediction for {}: {:#}", report.filename, e);
            }
        }
        None => log::warn!(
            "Not recording {}: model labels do not include {:?} and {:?}",
            report.filename,
            config.risk.human_label,
            config.risk.nonhuman_label
        ),
    }
}

/// Returns the number of files with no recorded prediction
fn apply_labels(record_log: &RecordLog, updates: &[(String, String)]) -> Result<usize> {
    let mut missing = 0;
    for (filename, label) in updates {
        let updated = record_log
            .update_actual_label(filename, label)
            .with_context(|| format!("Failed to update {:?}", record_log.path()))?;
        if updated == 0 {
            eprintln!("{}: no recorded prediction in {}", filename, record_log.path().display());
            missing += 1;
        } else {
            println!("{}: {} ({} record(s))", filename, label, updated);
        }
    }
    Ok(missing)
}

fn save_spectrogram(spectrogram: &Spectrogram, audio_path: &Path, dir: &Path, size: u32) -> Result<()> {
    let stem = audio_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spectrogram".to_string());
    let target = dir.join(format!("{}.png", stem));
    spectrogram
        .save_png(&target, size)
        .with_context(|| format!("Failed to save spectrogram {:?}", target))?;
    log::debug!("Saved spectrogram to {:?}", target);
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_in(dir: &Path) -> Args {
        Args {
            config: Some(dir.join("missing.yaml")),
            model: Some(dir.join("missing.onnx")),
            ..Args::default()
        }
    }

    #[test]
    fn test_overrides_apply() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            model: Some(PathBuf::from("custom.onnx")),
            no_warmup: true,
            cpu: true,
            files: vec![PathBuf::from("a.wav")],
            ..args_in(dir.path())
        };

        let config = resolve_config(&args, &dir.path().join("missing.yaml"));
        assert_eq!(config.classifier.model_path, PathBuf::from("custom.onnx"));
        assert!(!config.classifier.warmup);
        assert!(!config.classifier.use_gpu);
        assert_eq!(config.classifier.labels_path, None);
    }

    #[test]
    fn test_unsupported_files_counted_without_loading_model() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            files: vec![PathBuf::from("notes.txt"), PathBuf::from("song.flac")],
            ..args_in(dir.path())
        };

        assert_eq!(run(args).unwrap(), 2);
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            files: vec![PathBuf::from("call.wav")],
            ..args_in(dir.path())
        };

        assert!(run(args).is_err());
    }

    #[test]
    fn test_write_config_saves_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("conf").join("config.yaml");
        let args = Args {
            config: Some(config_path.clone()),
            model: Some(PathBuf::from("custom.onnx")),
            cpu: true,
            write_config: true,
            ..Args::default()
        };

        assert_eq!(run(args).unwrap(), 0);
        let saved = load_config(&config_path);
        assert_eq!(saved.classifier.model_path, PathBuf::from("custom.onnx"));
        assert!(!saved.classifier.use_gpu);
    }

    #[test]
    fn test_set_label_updates_record_log() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("predictions.csv");
        let record_log = RecordLog::new(&csv);
        record_log.append(&PredictionRecord {
            timestamp: "2026-10-16T09:00:00.000Z".to_string(),
            filename: "call.wav".to_string(),
            human_score: 0.3,
            nonhuman_score: 0.7,
            risk_level: "Medium Risk (Suspicious)".to_string(),
            actual_label: None,
        })
        .unwrap();

        let args = Args {
            record: Some(csv),
            set_label: vec![
                ("call.wav".to_string(), "nonhuman".to_string()),
                ("other.wav".to_string(), "human".to_string()),
            ],
            ..args_in(dir.path())
        };

        assert_eq!(run(args).unwrap(), 1);
        let records = record_log.read_all().unwrap();
        assert_eq!(records[0].actual_label.as_deref(), Some("nonhuman"));
    }

    #[test]
    fn test_rejected_files_are_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("predictions.csv");
        let args = Args {
            record: Some(csv.clone()),
            files: vec![PathBuf::from("notes.txt")],
            ..args_in(dir.path())
        };

        assert_eq!(run(args).unwrap(), 1);
        assert!(!csv.exists());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/x/call.wav")), "call.wav");
    }
}
