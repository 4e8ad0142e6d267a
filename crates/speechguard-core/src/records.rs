//! Prediction record log
//!
//! One CSV row per classified file, so predictions can later be compared
//! with a manually entered ground-truth label:
//!
//! ```text
//! Timestamp,Filename,Human Score,Nonhuman Score,Risk Level,Actual Label
//! 2026-10-16T09:12:03.418Z,call.wav,0.912345,0.087655,Low Risk (Human),PENDING
//! ```
//!
//! Fields containing commas, quotes or newlines are quoted (RFC 4180).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::classifier::Prediction;
use crate::risk::{RiskAssessment, RiskConfig};

pub const CSV_HEADER: &str =
    "Timestamp,Filename,Human Score,Nonhuman Score,Risk Level,Actual Label";

/// Placeholder written until a ground-truth label is entered
pub const PENDING_LABEL: &str = "PENDING";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record log I/O failed for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at {path}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// One logged prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    /// UTC, RFC 3339 with milliseconds
    pub timestamp: String,
    pub filename: String,
    pub human_score: f32,
    pub nonhuman_score: f32,
    pub risk_level: String,
    /// `None` while pending
    pub actual_label: Option<String>,
}

impl PredictionRecord {
    /// Record for `prediction`, stamped with the current time
    ///
    /// `None` when the prediction lacks the configured human / non-human labels.
    pub fn from_prediction(
        filename: impl Into<String>,
        prediction: &Prediction,
        config: &RiskConfig,
    ) -> Option<Self> {
        let human_score = prediction.get(&config.human_label)?;
        let nonhuman_score = prediction.get(&config.nonhuman_label)?;
        let risk = RiskAssessment::from_prediction(prediction, config)?;

        Some(Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            filename: filename.into(),
            human_score,
            nonhuman_score,
            risk_level: risk.level,
            actual_label: None,
        })
    }

    pub fn to_csv_row(&self) -> String {
        [
            escape_field(&self.timestamp),
            escape_field(&self.filename),
            format!("{:.6}", self.human_score),
            format!("{:.6}", self.nonhuman_score),
            escape_field(&self.risk_level),
            escape_field(self.actual_label.as_deref().unwrap_or(PENDING_LABEL)),
        ]
        .join(",")
    }

    /// Parse a row written by [`to_csv_row`](Self::to_csv_row)
    pub fn from_csv_row(row: &str) -> std::result::Result<Self, String> {
        let fields = split_row(row)?;
        let [timestamp, filename, human, nonhuman, risk_level, actual]: [String; 6] = fields
            .try_into()
            .map_err(|fields: Vec<String>| format!("expected 6 fields, found {}", fields.len()))?;

        let parse_score = |name: &str, raw: &str| {
            raw.trim()
                .parse::<f32>()
                .map_err(|e| format!("{} {:?}: {}", name, raw, e))
        };

        Ok(Self {
            timestamp,
            filename,
            human_score: parse_score("human score", &human)?,
            nonhuman_score: parse_score("nonhuman score", &nonhuman)?,
            risk_level,
            actual_label: (!actual.is_empty() && actual != PENDING_LABEL).then_some(actual),
        })
    }
}

/// CSV file of prediction records
#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    /// The file is created on the first [`append`](Self::append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first when the file is new
    pub fn append(&self, record: &PredictionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let mut contents = String::new();
        if is_new {
            contents.push_str(CSV_HEADER);
            contents.push('\n');
            log::info!("records: created {:?}", self.path);
        }
        contents.push_str(&record.to_csv_row());
        contents.push('\n');

        file.write_all(contents.as_bytes()).map_err(|e| self.io_error(e))?;
        log::debug!("records: logged {}", record.filename);
        Ok(())
    }

    /// Every record in file order; empty when the file does not exist
    pub fn read_all(&self) -> Result<Vec<PredictionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate().skip(1) {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = PredictionRecord::from_csv_row(&line).map_err(|reason| {
                RecordError::Malformed {
                    path: self.path.clone(),
                    line: index + 1,
                    reason,
                }
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Set the ground-truth label on every record for `filename`
    ///
    /// Returns the number of records changed; 0 when none match or the file
    /// does not exist.
    pub fn update_actual_label(&self, filename: &str, label: &str) -> Result<usize> {
        let mut records = self.read_all()?;
        let mut updated = 0;
        for record in records.iter_mut().filter(|r| r.filename == filename) {
            record.actual_label = Some(label.to_string());
            updated += 1;
        }
        if updated == 0 {
            return Ok(0);
        }

        let mut contents = String::from(CSV_HEADER);
        contents.push('\n');
        for record in &records {
            contents.push_str(&record.to_csv_row());
            contents.push('\n');
        }
        std::fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;

        log::info!("records: {} labelled {:?} ({} rows)", filename, label, updated);
        Ok(updated)
    }

    fn io_error(&self, source: std::io::Error) -> RecordError {
        RecordError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV row, honouring quoted fields
fn split_row(row: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = row.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, human: f32) -> PredictionRecord {
        PredictionRecord {
            timestamp: "2026-10-16T09:12:03.418Z".to_string(),
            filename: filename.to_string(),
            human_score: human,
            nonhuman_score: 1.0 - human,
            risk_level: "Low Risk (Human)".to_string(),
            actual_label: None,
        }
    }

    #[test]
    fn test_first_append_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::new(dir.path().join("records").join("predictions.csv"));

        log.append(&record("call.wav", 0.75)).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "2026-10-16T09:12:03.418Z,call.wav,0.750000,0.250000,Low Risk (Human),PENDING"
        );
    }

    #[test]
    fn test_append_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::new(dir.path().join("predictions.csv"));

        log.append(&record("a.wav", 0.9)).unwrap();
        log.append(&record("b.mp3", 0.1)).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.matches(CSV_HEADER).count(), 1);

        let records = log.read_all().unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.wav", "b.mp3"]);
        assert!(records.iter().all(|r| r.actual_label.is_none()));
    }

    #[test]
    fn test_update_actual_label() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::new(dir.path().join("predictions.csv"));
        log.append(&record("a.wav", 0.9)).unwrap();
        log.append(&record("b.wav", 0.2)).unwrap();

        assert_eq!(log.update_actual_label("b.wav", "nonhuman").unwrap(), 1);
        assert_eq!(log.update_actual_label("missing.wav", "human").unwrap(), 0);

        let records = log.read_all().unwrap();
        assert_eq!(records[0].actual_label, None);
        assert_eq!(records[1].actual_label.as_deref(), Some("nonhuman"));
        assert!(std::fs::read_to_string(log.path()).unwrap().starts_with(CSV_HEADER));
    }

    #[test]
    fn test_missing_file_reads_empty_and_updates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::new(dir.path().join("none.csv"));
        assert!(log.read_all().unwrap().is_empty());
        assert_eq!(log.update_actual_label("a.wav", "human").unwrap(), 0);
        assert!(!log.path().exists());
    }

    #[test]
    fn test_filename_with_comma_and_quote() {
        let original = record("call, \"final\".wav", 0.5);
        let row = original.to_csv_row();
        assert!(row.contains("\"call, \"\"final\"\".wav\""));
        assert_eq!(PredictionRecord::from_csv_row(&row).unwrap(), original);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        std::fs::write(&path, format!("{}\nonly,three,fields\n", CSV_HEADER)).unwrap();

        let err = RecordLog::new(&path).read_all().unwrap_err();
        assert!(matches!(err, RecordError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_from_prediction_uses_risk_labels() {
        let labels = vec!["human".to_string(), "nonhuman".to_string()];
        let prediction = Prediction::from_parts(&labels, &[0.1, 0.9]).unwrap();

        let rec = PredictionRecord::from_prediction("x.wav", &prediction, &RiskConfig::default())
            .unwrap();
        assert_eq!(rec.nonhuman_score, 0.9);
        assert_eq!(rec.risk_level, "High Risk (AI voice)");
        assert!(rec.timestamp.ends_with('Z'));

        let other = RiskConfig {
            human_label: "real".to_string(),
            ..RiskConfig::default()
        };
        assert!(PredictionRecord::from_prediction("x.wav", &prediction, &other).is_none());
    }
}
