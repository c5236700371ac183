//! Editor settings
//!
//! Tunables for placement and resolution. Every field has a default, so a
//! settings file only needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum distance between a wire endpoint and its matched candidate
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 400.0;

/// Default retraction step, as a fraction of the wire length
pub const DEFAULT_RETRACT_STEP_FRACTION: f64 = 0.01;

/// Default distance from an arrowhead tip back to its barbs
pub const DEFAULT_ARROW_LENGTH: f64 = 10.0;

/// Settings for a [`Document`](crate::core::Document)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Endpoint matches further away than this fail resolution
    pub proximity_threshold: f64,
    /// Step used when pulling a wire endpoint out of a block
    pub retract_step_fraction: f64,
    /// Arrowhead barb length
    pub arrow_length: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            retract_step_fraction: DEFAULT_RETRACT_STEP_FRACTION,
            arrow_length: DEFAULT_ARROW_LENGTH,
        }
    }
}

impl EditorConfig {
    /// Parse settings from JSON and validate them
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.proximity_threshold > 0.0) || !self.proximity_threshold.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "proximity_threshold must be positive, got {}",
                self.proximity_threshold
            )));
        }
        if !(self.retract_step_fraction > 0.0 && self.retract_step_fraction <= 1.0) {
            return Err(SettingsError::Invalid(format!(
                "retract_step_fraction must be in (0, 1], got {}",
                self.retract_step_fraction
            )));
        }
        if !(self.arrow_length >= 0.0) || !self.arrow_length.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "arrow_length must be non-negative, got {}",
                self.arrow_length
            )));
        }
        Ok(())
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range
    #[error("Invalid settings: {0}")]
    Invalid(String),
}
