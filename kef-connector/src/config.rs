//! Configuration types for kef-connector
//!
//! [`SpeakerConfig`] holds the per-entity settings a host passes in when it
//! sets up a speaker. [`PollerConfig`] holds the host-level poll cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_MODEL;
use crate::error::{ConnectorError, Result};

pub const DEFAULT_MAX_VOLUME: f64 = 1.0;
pub const DEFAULT_VOLUME_STEP: f64 = 0.03;
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(10);

/// Settings for one speaker entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerConfig {
    /// IP address or hostname of the speaker. Required.
    #[serde(default)]
    pub host: String,

    /// Display name; resolved from the device when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Ceiling for volume set commands, 0..1
    /// Default: 1.0
    #[serde(default = "default_max_volume")]
    pub maximum_volume: f64,

    /// Step used by volume up/down, as a fraction of full scale
    /// Default: 0.03
    #[serde(default = "default_volume_step")]
    pub volume_step: f64,

    /// Speaker model selecting the source catalog
    /// Default: "default"
    #[serde(default = "default_speaker_model")]
    pub speaker_model: String,
}

fn default_max_volume() -> f64 {
    DEFAULT_MAX_VOLUME
}

fn default_volume_step() -> f64 {
    DEFAULT_VOLUME_STEP
}

fn default_speaker_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl SpeakerConfig {
    /// Create a config for `host` with default values
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: None,
            maximum_volume: DEFAULT_MAX_VOLUME,
            volume_step: DEFAULT_VOLUME_STEP,
            speaker_model: default_speaker_model(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.speaker_model = model.into();
        self
    }

    pub fn with_maximum_volume(mut self, maximum_volume: f64) -> Self {
        self.maximum_volume = maximum_volume;
        self
    }

    pub fn with_volume_step(mut self, volume_step: f64) -> Self {
        self.volume_step = volume_step;
        self
    }

    /// Parse a JSON config block
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConnectorError::Configuration(format!("Invalid speaker config: {}", e)))
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConnectorError::Configuration(
                "Speaker host is required".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.maximum_volume) {
            return Err(ConnectorError::Configuration(format!(
                "maximum_volume must be within 0..1, got {}",
                self.maximum_volume
            )));
        }

        if !(self.volume_step > 0.0 && self.volume_step <= 1.0) {
            return Err(ConnectorError::Configuration(format!(
                "volume_step must be within (0, 1], got {}",
                self.volume_step
            )));
        }

        Ok(())
    }
}

/// Host-level polling settings
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between poll ticks
    /// Default: 10 seconds
    pub scan_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_interval(scan_interval: Duration) -> Self {
        Self { scan_interval }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_interval == Duration::ZERO {
            return Err(ConnectorError::Configuration(
                "Scan interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
