//! Method-of-adjustment measurement
//!
//! The alternate measurement method: instead of an automated staircase,
//! the user drives the level directly with a slider or stepper until the
//! tone is just audible. Every change is logged append-only with its input
//! source; reset entries are control flags that restore the initial level
//! and are excluded from the sealed sample.

use crate::config::AdjustmentConfig;
use crate::result::{
    AdjustmentInteraction, AdjustmentResult, AdjustmentSource, AudioChannel, FrequencySample,
    MeasurementMethod, ResultHeader, ThresholdStatus,
};

/// User-driven level adjustment for one (frequency, channel) pair
#[derive(Debug, Clone)]
pub struct AdjustmentProcedure {
    frequency: f64,
    channel: AudioChannel,
    level: f64,
    initial_level: f64,
    step_size: f64,
    min_level: f64,
    max_level: f64,
    interactions: Vec<AdjustmentInteraction>,
}

impl AdjustmentProcedure {
    pub fn new(config: &AdjustmentConfig, frequency: f64, channel: AudioChannel) -> Self {
        Self {
            frequency,
            channel,
            level: config.initial_dbhl,
            initial_level: config.initial_dbhl,
            step_size: config.step_size,
            min_level: config.minimum_dbhl,
            max_level: config.maximum_dbhl,
            interactions: Vec::new(),
        }
    }

    /// Set the level from the slider, clamped to the configured bounds
    pub fn set_level(&mut self, dbhl_value: f64, timestamp: f64) {
        self.apply(
            dbhl_value.clamp(self.min_level, self.max_level),
            timestamp,
            AdjustmentSource::Slider,
        );
    }

    /// Raise the level by one stepper increment
    pub fn step_up(&mut self, timestamp: f64) {
        self.apply(
            (self.level + self.step_size).min(self.max_level),
            timestamp,
            AdjustmentSource::Stepper,
        );
    }

    /// Lower the level by one stepper increment
    pub fn step_down(&mut self, timestamp: f64) {
        self.apply(
            (self.level - self.step_size).max(self.min_level),
            timestamp,
            AdjustmentSource::Stepper,
        );
    }

    /// Restore the initial level
    ///
    /// Logged live so the interaction stream is complete, but reset
    /// entries do not reach the sealed sample.
    pub fn reset(&mut self, timestamp: f64) {
        self.apply(self.initial_level, timestamp, AdjustmentSource::Reset);
    }

    fn apply(&mut self, dbhl_value: f64, timestamp: f64, source: AdjustmentSource) {
        self.level = dbhl_value;
        self.interactions.push(AdjustmentInteraction {
            dbhl_value,
            timestamp,
            source,
        });
    }

    /// Current level in dBHL
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Full interaction log, reset entries included
    pub fn interactions(&self) -> &[AdjustmentInteraction] {
        &self.interactions
    }

    /// Seal the run: the threshold is the last adjusted level
    pub fn into_sample(self) -> FrequencySample {
        let interactions: Vec<AdjustmentInteraction> = self
            .interactions
            .into_iter()
            .filter(|interaction| interaction.source != AdjustmentSource::Reset)
            .collect();

        FrequencySample {
            frequency: self.frequency,
            channel: self.channel,
            calculated_threshold: self.level,
            status: ThresholdStatus::Converged,
            units: Vec::new(),
            taps: Vec::new(),
            interactions,
        }
    }
}

/// Wrap sealed adjustment samples into a result aggregate
pub fn build_adjustment_result(
    header: ResultHeader,
    samples: Vec<FrequencySample>,
) -> AdjustmentResult {
    AdjustmentResult {
        header,
        samples,
        measurement_method: MeasurementMethod::Adjustment,
    }
}
