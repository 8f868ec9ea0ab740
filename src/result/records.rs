//! Per-trial record types for audiometry sessions.
//!
//! A screening run produces one `ToneUnit` per presented stimulus and one
//! `ToneTap` per user interaction; a method-of-adjustment run produces an
//! `AdjustmentInteraction` log instead. Both roll up into per-frequency
//! `FrequencySample`s. Records are immutable once their trial completes.

use serde::{Deserialize, Serialize};

/// Sentinel threshold for frequencies that could not be tested.
///
/// Stored in place of a dBHL level when a staircase terminated out of range
/// or the session was aborted mid-run. Finite so results stay
/// JSON-representable; use [`FrequencySample::has_valid_threshold`] rather
/// than comparing against this directly.
pub const INVALID_DBHL_VALUE: f64 = f64::MAX;

/// Output channel a stimulus is presented on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannel {
    Left,
    Right,
}

/// Which ear(s) a screening session covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarPreference {
    Left,
    Right,
    Both,
}

impl EarPreference {
    /// Channels tested for this preference, in test order
    pub fn channels(&self) -> &'static [AudioChannel] {
        match self {
            EarPreference::Left => &[AudioChannel::Left],
            EarPreference::Right => &[AudioChannel::Right],
            EarPreference::Both => &[AudioChannel::Left, AudioChannel::Right],
        }
    }
}

/// How the user responded to one presented stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialResponse {
    /// Tap registered before the response window opened
    TapBeforeWindow,
    /// Response window expired with no tap
    NoTap,
    /// Tap registered inside the response window
    TapInWindow,
}

/// One presented stimulus and the timestamps bracketing its response window.
///
/// Exactly one of `user_tap_timestamp` / `timeout_timestamp` is set once the
/// trial resolves; both stay `None` only if the session aborted mid-window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneUnit {
    /// Stimulus level in dBHL
    pub dbhl_value: f64,
    /// Session-relative timestamp at which the unit began, in seconds
    pub start_of_unit_timestamp: f64,
    /// Random delay inserted before tone onset, in seconds
    pub pre_stimulus_delay: f64,
    /// Timestamp of the in-window tap, if the user responded
    pub user_tap_timestamp: Option<f64>,
    /// Timestamp of response-window expiry, if the user did not respond
    pub timeout_timestamp: Option<f64>,
}

impl ToneUnit {
    pub fn new(dbhl_value: f64, start_of_unit_timestamp: f64, pre_stimulus_delay: f64) -> Self {
        Self {
            dbhl_value,
            start_of_unit_timestamp,
            pre_stimulus_delay,
            user_tap_timestamp: None,
            timeout_timestamp: None,
        }
    }

    /// Whether the unit's response window has resolved
    pub fn is_resolved(&self) -> bool {
        self.user_tap_timestamp.is_some() || self.timeout_timestamp.is_some()
    }
}

/// One user interaction during a screening run, attributed to the stimulus
/// that was active when it arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneTap {
    /// Stimulus level active at the time of the interaction, in dBHL
    pub dbhl_value: f64,
    /// Stimulus frequency in Hz
    pub frequency: f64,
    /// Channel the stimulus was presented on
    pub channel: AudioChannel,
    /// Session-relative timestamp in seconds
    pub timestamp: f64,
    /// How the interaction was classified against the response window
    pub response: TrialResponse,
}

/// Input surface that produced a method-of-adjustment change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentSource {
    Slider,
    Stepper,
    /// Control flag restoring the initial level; logged live but excluded
    /// from sealed results
    Reset,
}

/// One entry in the method-of-adjustment interaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentInteraction {
    /// Level after the change, in dBHL
    pub dbhl_value: f64,
    /// Session-relative timestamp in seconds
    pub timestamp: f64,
    /// Input surface that produced the change
    pub source: AdjustmentSource,
}

/// How a frequency's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    /// Staircase met its inversion quota; threshold is valid
    Converged,
    /// Staircase hit a level bound before converging; untestable at this
    /// frequency, threshold is the invalid sentinel
    OutOfRange,
    /// Session was cancelled mid-run; partial history retained
    Aborted,
}

/// Completed (or abandoned) run for one (frequency, channel) pair.
///
/// `calculated_threshold` is write-once: the estimator seals it when the
/// run terminates and nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySample {
    /// Tested frequency in Hz
    pub frequency: f64,
    /// Tested channel
    pub channel: AudioChannel,
    /// Estimated hearing threshold in dBHL, or [`INVALID_DBHL_VALUE`]
    pub calculated_threshold: f64,
    /// How the run ended
    pub status: ThresholdStatus,
    /// Every stimulus presented during the run, in presentation order
    pub units: Vec<ToneUnit>,
    /// Every user interaction during the run, in delivery order
    pub taps: Vec<ToneTap>,
    /// Method-of-adjustment interaction log; empty for staircase runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<AdjustmentInteraction>,
}

impl FrequencySample {
    /// Whether the sample carries a usable threshold
    pub fn has_valid_threshold(&self) -> bool {
        self.status == ThresholdStatus::Converged && self.calculated_threshold != INVALID_DBHL_VALUE
    }

    /// Premature taps recorded during this run
    ///
    /// Taps before the response window never move the staircase; they only
    /// feed this statistic.
    pub fn false_positive_count(&self) -> usize {
        self.taps
            .iter()
            .filter(|tap| tap.response == TrialResponse::TapBeforeWindow)
            .count()
    }
}

/// Outcome of one headphone fit-test evaluation.
///
/// Derived, never measured directly: the evaluator computes the success and
/// confidence flags from raw seal/confidence readings exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitTestSample {
    /// Acoustic seal measurement for the left ear
    pub seal_left_ear: f64,
    /// Acoustic seal measurement for the right ear
    pub seal_right_ear: f64,
    /// Measurement confidence for the left ear
    pub confidence_left_ear: f64,
    /// Measurement confidence for the right ear
    pub confidence_right_ear: f64,
    /// Seal threshold the readings were judged against
    pub seal_threshold: f64,
    /// Confidence threshold the readings were judged against
    pub confidence_threshold: f64,
    /// True iff the left seal met the seal threshold
    pub left_seal_success: bool,
    /// True iff the right seal met the seal threshold
    pub right_seal_success: bool,
    /// True iff either ear's confidence fell below the confidence threshold
    pub low_confidence: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ear_preference_channels() {
        assert_eq!(EarPreference::Left.channels(), &[AudioChannel::Left]);
        assert_eq!(EarPreference::Right.channels(), &[AudioChannel::Right]);
        assert_eq!(
            EarPreference::Both.channels(),
            &[AudioChannel::Left, AudioChannel::Right]
        );
    }

    #[test]
    fn test_unit_resolution() {
        let mut unit = ToneUnit::new(30.0, 1.5, 0.4);
        assert!(!unit.is_resolved());

        unit.user_tap_timestamp = Some(2.3);
        assert!(unit.is_resolved());
    }

    #[test]
    fn test_invalid_threshold_detection() {
        let sample = FrequencySample {
            frequency: 1000.0,
            channel: AudioChannel::Left,
            calculated_threshold: INVALID_DBHL_VALUE,
            status: ThresholdStatus::OutOfRange,
            units: Vec::new(),
            taps: Vec::new(),
            interactions: Vec::new(),
        };
        assert!(!sample.has_valid_threshold());

        let sample = FrequencySample {
            calculated_threshold: 25.0,
            status: ThresholdStatus::Converged,
            ..sample
        };
        assert!(sample.has_valid_threshold());
    }

    #[test]
    fn test_records_json_roundtrip() {
        let tap = ToneTap {
            dbhl_value: 40.0,
            frequency: 2000.0,
            channel: AudioChannel::Right,
            timestamp: 12.25,
            response: TrialResponse::TapInWindow,
        };
        let json = serde_json::to_string(&tap).unwrap();
        assert!(json.contains("tap_in_window"));

        let parsed: ToneTap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tap);
    }
}
