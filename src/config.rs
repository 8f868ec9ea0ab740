//! Configuration management for audiometry step parameters
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling clinical parameter tuning without recompilation. Staircase
//! rates, level bounds, frequency lists, and fit-test thresholds can all
//! be adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::result::EarPreference;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub tone_test: ToneTestConfig,
    pub adjustment: AdjustmentConfig,
    pub fit_test: FitTestConfig,
}

/// Order in which (frequency, channel) pairs are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationOrder {
    /// Frequencies in configured list order
    InOrder,
    /// Frequencies shuffled independently within each channel block
    Shuffled,
}

/// Adaptive screening step configuration.
///
/// Mirrors the full recognized option set of the screening step. A few
/// fields (`octave_rate`, `use_picker`, `use_slider`, `is_multi_step`) are
/// consumed by the presentation layer driving this engine; they are carried
/// here so one config file describes the whole step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneTestConfig {
    /// Tone playback duration per stimulus, in seconds
    pub tone_duration: f64,
    /// Response window length after tone offset, in seconds
    pub post_stimulus_delay: f64,
    /// Starting stimulus level in dBHL
    pub initial_dbhl: f64,
    /// Level increase applied after a missed stimulus, in dB
    pub dbhl_rate_up: f64,
    /// Level decrease applied after a heard stimulus, in dB
    pub dbhl_rate_down: f64,
    /// Frequency progression rate in octaves per step (presentation layer)
    pub octave_rate: f64,
    /// Stepper increment for adjustment-based measurement, in dB
    pub step_size: f64,
    /// Lower staircase bound in dBHL
    pub minimum_threshold_dbhl: f64,
    /// Direction reversals required before a threshold is computed
    pub number_of_inversions: u32,
    /// Identifier of the headphone model, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headphone_type: Option<String>,
    /// Which ear(s) to test
    pub ear_preference: EarPreference,
    /// Frequencies to test, in Hz
    pub frequency_list: Vec<f64>,
    /// Lower slider/picker bound in dBHL (adjustment-based measurement)
    pub minimum_dbhl: f64,
    /// Upper stimulus level bound in dBHL
    pub maximum_dbhl: f64,
    /// Present a frequency picker in the adjustment UI
    pub use_picker: bool,
    /// Present a level slider in the adjustment UI
    pub use_slider: bool,
    /// Split each (frequency, channel) pair into its own step
    pub is_multi_step: bool,
    /// Presentation order policy
    pub presentation_order: PresentationOrder,
}

impl Default for ToneTestConfig {
    fn default() -> Self {
        Self {
            tone_duration: 1.0,
            post_stimulus_delay: 1.0,
            initial_dbhl: 45.0,
            // Classic clinical staircase rates: ascend 5 dB on a miss,
            // descend 10 dB on a hit
            dbhl_rate_up: 5.0,
            dbhl_rate_down: 10.0,
            octave_rate: 1.0,
            step_size: 5.0,
            minimum_threshold_dbhl: -10.0,
            number_of_inversions: 4,
            headphone_type: None,
            ear_preference: EarPreference::Both,
            frequency_list: vec![1000.0, 2000.0, 4000.0, 8000.0, 500.0, 250.0],
            minimum_dbhl: -10.0,
            maximum_dbhl: 75.0,
            use_picker: false,
            use_slider: false,
            is_multi_step: false,
            presentation_order: PresentationOrder::InOrder,
        }
    }
}

/// Method-of-adjustment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    /// Starting level in dBHL
    pub initial_dbhl: f64,
    /// Stepper increment in dB
    pub step_size: f64,
    /// Lower slider bound in dBHL
    pub minimum_dbhl: f64,
    /// Upper slider bound in dBHL
    pub maximum_dbhl: f64,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            initial_dbhl: 45.0,
            step_size: 5.0,
            minimum_dbhl: -10.0,
            maximum_dbhl: 75.0,
        }
    }
}

/// Fit-test evaluation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitTestConfig {
    /// Minimum acoustic seal considered a pass
    pub seal_threshold: f64,
    /// Minimum per-ear confidence for a trustworthy reading
    pub confidence_threshold: f64,
}

impl Default for FitTestConfig {
    fn default() -> Self {
        Self {
            seal_threshold: 0.75,
            confidence_threshold: 0.6,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            tone_test: ToneTestConfig::default(),
            adjustment: AdjustmentConfig::default(),
            fit_test: FitTestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the default configuration if the file
    /// is missing or malformed (with a logged warning).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tone_test.initial_dbhl, 45.0);
        assert_eq!(config.tone_test.dbhl_rate_up, 5.0);
        assert_eq!(config.tone_test.dbhl_rate_down, 10.0);
        assert_eq!(config.tone_test.number_of_inversions, 4);
        assert_eq!(config.tone_test.frequency_list.len(), 6);
        assert_eq!(config.fit_test.seal_threshold, 0.75);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.tone_test.initial_dbhl, config.tone_test.initial_dbhl);
        assert_eq!(
            parsed.tone_test.frequency_list,
            config.tone_test.frequency_list
        );
        assert_eq!(
            parsed.adjustment.step_size,
            config.adjustment.step_size
        );
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/audiometry.json");
        assert_eq!(config.tone_test.maximum_dbhl, 75.0);
    }
}
