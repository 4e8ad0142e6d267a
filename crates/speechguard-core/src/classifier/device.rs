//! Compute device selection
//!
//! The device is probed once when a classifier is built and stored on it.
//! Which accelerator is probed is a compile-time choice (`cuda` or `directml`
//! feature); without either feature the CPU is always used.

use ort::session::builder::SessionBuilder;
use serde::Serialize;

/// Where inference runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// GPU execution provider
    Accelerated,
    /// CPU
    Fallback,
}

impl Device {
    /// Probe hardware and pick a device
    pub fn resolve(use_gpu: bool) -> Self {
        if !use_gpu {
            log::info!("device: GPU disabled by configuration, using CPU");
            return Self::Fallback;
        }

        if accelerator_available() {
            log::info!("device: {} execution provider available", ACCELERATOR_NAME);
            Self::Accelerated
        } else {
            log::info!("device: no accelerator available, using CPU");
            Self::Fallback
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self, Self::Accelerated)
    }

    /// Display name for logging/CLI output
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Accelerated => ACCELERATOR_NAME,
            Self::Fallback => "CPU",
        }
    }

    /// Register this device's execution provider on a session builder
    pub(crate) fn configure(self, builder: SessionBuilder) -> Result<SessionBuilder, String> {
        match self {
            Self::Fallback => Ok(builder),
            Self::Accelerated => register_accelerator(builder),
        }
    }
}

#[cfg(feature = "cuda")]
const ACCELERATOR_NAME: &str = "CUDA";
#[cfg(all(feature = "directml", not(feature = "cuda")))]
const ACCELERATOR_NAME: &str = "DirectML";
#[cfg(not(any(feature = "cuda", feature = "directml")))]
const ACCELERATOR_NAME: &str = "none";

#[cfg(feature = "cuda")]
fn accelerator_available() -> bool {
    use ort::ep::ExecutionProvider;
    match ort::ep::CUDA::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            log::warn!("device: CUDA probe failed: {}", e);
            false
        }
    }
}

#[cfg(all(feature = "directml", not(feature = "cuda")))]
fn accelerator_available() -> bool {
    use ort::ep::ExecutionProvider;
    match ort::ep::DirectML::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            log::warn!("device: DirectML probe failed: {}", e);
            false
        }
    }
}

#[cfg(not(any(feature = "cuda", feature = "directml")))]
fn accelerator_available() -> bool {
    false
}

#[cfg(feature = "cuda")]
fn register_accelerator(builder: SessionBuilder) -> Result<SessionBuilder, String> {
    builder
        .with_execution_providers([ort::ep::CUDA::default().build()])
        .map_err(|e| e.to_string())
}

#[cfg(all(feature = "directml", not(feature = "cuda")))]
fn register_accelerator(builder: SessionBuilder) -> Result<SessionBuilder, String> {
    builder
        .with_execution_providers([ort::ep::DirectML::default().build()])
        .map_err(|e| e.to_string())
}

#[cfg(not(any(feature = "cuda", feature = "directml")))]
fn register_accelerator(builder: SessionBuilder) -> Result<SessionBuilder, String> {
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_disabled_falls_back() {
        let device = Device::resolve(false);
        assert_eq!(device, Device::Fallback);
        assert!(!device.is_accelerated());
        assert_eq!(device.display_name(), "CPU");
    }

    #[cfg(not(any(feature = "cuda", feature = "directml")))]
    #[test]
    fn test_no_accelerator_without_features() {
        assert_eq!(Device::resolve(true), Device::Fallback);
    }
}
