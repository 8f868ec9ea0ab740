//! Session-level result aggregates.
//!
//! The legacy object model expressed result kinds as an inheritance chain;
//! here each kind is a flat struct sharing [`ResultHeader`], and
//! [`AudiometryTestResult`] is the tagged sum over them. The aggregate owns
//! the full audit trail of the session and is immutable once built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::records::{FitTestSample, FrequencySample, ToneTap};

/// Identity of the earphone hardware a session ran against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub case_serial: String,
    pub left_serial: String,
    pub right_serial: String,
    pub firmware_version: String,
}

/// Fields shared by every result kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultHeader {
    /// System output volume during the test, 0.0-1.0
    pub output_volume: f64,
    /// Tone playback duration per stimulus, in seconds
    pub tone_playback_duration: f64,
    /// Response window length after tone offset, in seconds
    pub post_stimulus_delay: f64,
    /// Identifier of the headphone model used, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headphone_type: Option<String>,
    /// Version of the estimation algorithm that produced the result
    pub algorithm_version: i32,
    /// Hardware identity, when the headphone reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
}

/// How a non-staircase threshold was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMethod {
    /// Method of limits (staircase-driven)
    Limits,
    /// Method of adjustment (user-driven level control)
    Adjustment,
}

/// Result of an adaptive screening session.
///
/// `samples` is the per-frequency outcome list; the remaining collections
/// are the session audit trail: every tap regardless of which frequency it
/// landed on, samples discarded by outlier rejection, raw discrete units,
/// and the estimated fit curve keyed by frequency, for algorithm variants
/// that produce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerResult {
    pub header: ResultHeader,
    pub samples: Vec<FrequencySample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted_samples: Vec<FrequencySample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discrete_units: Vec<FrequencySample>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fit_matrix: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_taps: Vec<ToneTap>,
    /// Times the user restarted the dBHL portion of the test
    #[serde(default)]
    pub number_of_retries: u32,
}

/// Result of a method-of-adjustment session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub header: ResultHeader,
    pub samples: Vec<FrequencySample>,
    pub measurement_method: MeasurementMethod,
}

/// Result of a headphone fit-test session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitTestResult {
    pub samples: Vec<FitTestSample>,
}

/// Every result kind a session can produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum AudiometryTestResult {
    Screener(ScreenerResult),
    Adjustment(AdjustmentResult),
    FitTest(FitTestResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::records::{AudioChannel, ThresholdStatus};

    fn sample_header() -> ResultHeader {
        ResultHeader {
            output_volume: 0.8,
            tone_playback_duration: 1.0,
            post_stimulus_delay: 1.0,
            headphone_type: Some("AIRPODSPRO".to_string()),
            algorithm_version: 1,
            device: None,
        }
    }

    #[test]
    fn test_screener_result_tagged_serialization() {
        let result = AudiometryTestResult::Screener(ScreenerResult {
            header: sample_header(),
            samples: vec![FrequencySample {
                frequency: 1000.0,
                channel: AudioChannel::Left,
                calculated_threshold: 22.5,
                status: ThresholdStatus::Converged,
                units: Vec::new(),
                taps: Vec::new(),
                interactions: Vec::new(),
            }],
            deleted_samples: Vec::new(),
            discrete_units: Vec::new(),
            fit_matrix: BTreeMap::new(),
            all_taps: Vec::new(),
            number_of_retries: 0,
        });

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"type\":\"screener\""));

        let parsed: AudiometryTestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_empty_audit_fields_skipped() {
        let result = ScreenerResult {
            header: sample_header(),
            samples: Vec::new(),
            deleted_samples: Vec::new(),
            discrete_units: Vec::new(),
            fit_matrix: BTreeMap::new(),
            all_taps: Vec::new(),
            number_of_retries: 0,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("deleted_samples"));
        assert!(!json.contains("fit_matrix"));
    }
}
