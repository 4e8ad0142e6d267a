//! Global configuration for speechguard
//!
//! Configuration is stored as YAML.
//! Default location: ~/.config/speechguard/config.yaml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::ClassifierConfig;
use crate::risk::RiskConfig;
use crate::spectrogram::SpectrogramConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model location, warm-up and device settings
    pub classifier: ClassifierConfig,
    /// Audio → spectrogram settings
    pub spectrogram: SpectrogramConfig,
    /// Risk thresholds and label names
    pub risk: RiskConfig,
}

impl Config {
    /// Clamp every section to valid ranges
    pub fn validate(&mut self) {
        self.classifier.validate();
        self.spectrogram.validate();
        self.risk.validate();
    }
}

/// Get the default config file path
///
/// Returns: <config_dir>/speechguard/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("speechguard")
        .join("config.yaml")
}

/// Load and validate the speechguard configuration
///
/// A missing file yields the defaults. An unreadable or malformed file is
/// logged at `warn` and also yields the defaults.
pub fn load_config(path: &Path) -> Config {
    let mut config = read_config(path).unwrap_or_else(|e| {
        log::warn!("config: {:#}, using defaults", e);
        Config::default()
    });
    config.validate();
    log::info!(
        "config: model {:?}, warmup {}, gpu {}",
        config.classifier.model_path,
        config.classifier.warmup,
        config.classifier.use_gpu
    );
    config
}

fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::info!("config: {:?} not found, using defaults", path);
        return Ok(Config::default());
    }

    let contents =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {:?}", path))?;
    serde_yaml::from_str(&contents).with_context(|| format!("cannot parse {:?}", path))
}

/// Write `config` as YAML, creating missing parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("cannot serialize config")?;
    std::fs::write(path, yaml).with_context(|| format!("cannot write {:?}", path))?;

    log::info!("config: saved to {:?}", path);
    Ok(())
}
