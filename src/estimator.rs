//! ThresholdEstimator - session-level staircase orchestration
//!
//! The estimator owns one staircase at a time and walks a presentation
//! schedule of (frequency, channel) pairs built from the step
//! configuration. The driving layer alternates `present_next` /
//! `register_response` calls; when a staircase terminates its frequency
//! sample is sealed and the next pair begins transparently. A staircase
//! that hits a level bound seals with the invalid sentinel and the session
//! continues; only configuration problems fail, and they fail before the
//! first trial.
//!
//! The estimator is synchronous and single-threaded: timers, playback, and
//! response capture all live in the driving layer, which delivers
//! timestamps with each event.

use log::{debug, info};
use rand::seq::SliceRandom;

use crate::config::{PresentationOrder, ToneTestConfig};
use crate::error::ConfigError;
use crate::result::{
    AudioChannel, FrequencySample, ResultHeader, ScreenerResult, ToneTap, TrialResponse,
};
use crate::staircase::Staircase;

/// Version tag stamped on results produced by this estimator
pub const STAIRCASE_ALGORITHM_VERSION: i32 = 1;

/// One stimulus the driving layer should present
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stimulus {
    pub frequency: f64,
    pub channel: AudioChannel,
    pub dbhl_value: f64,
}

/// Adaptive threshold estimator for a screening session.
///
/// # Example
/// ```ignore
/// let mut estimator = ThresholdEstimator::new(config)?;
/// while let Some(stimulus) = estimator.present_next(now(), delay) {
///     play(stimulus);
///     estimator.register_response(wait_for_response(), now());
/// }
/// let result = estimator.finalize();
/// ```
pub struct ThresholdEstimator {
    config: ToneTestConfig,
    schedule: Vec<(f64, AudioChannel)>,
    next_pair: usize,
    active: Option<Staircase>,
    active_taps: Vec<ToneTap>,
    samples: Vec<FrequencySample>,
    all_taps: Vec<ToneTap>,
    aborted: bool,
    output_volume: f64,
    number_of_retries: u32,
}

impl ThresholdEstimator {
    /// Validate the step configuration and build the presentation schedule
    ///
    /// The schedule is channel-major: every frequency on one ear, then the
    /// other. With `PresentationOrder::Shuffled` the frequencies are
    /// shuffled independently within each channel block.
    ///
    /// # Errors
    /// Rejects an empty frequency list, non-positive or non-finite rates,
    /// a zero inversion quota, and inverted level bounds, before any trial
    /// is run.
    pub fn new(config: ToneTestConfig) -> Result<Self, ConfigError> {
        if config.frequency_list.is_empty() {
            return Err(ConfigError::EmptyFrequencyList);
        }
        if !(config.dbhl_rate_up > 0.0 && config.dbhl_rate_up.is_finite())
            || !(config.dbhl_rate_down > 0.0 && config.dbhl_rate_down.is_finite())
        {
            return Err(ConfigError::InvalidRates {
                rate_up: config.dbhl_rate_up,
                rate_down: config.dbhl_rate_down,
            });
        }
        if config.number_of_inversions == 0 {
            return Err(ConfigError::InvalidInversionCount);
        }
        if !(config.minimum_threshold_dbhl < config.maximum_dbhl)
            || !config.minimum_threshold_dbhl.is_finite()
            || !config.maximum_dbhl.is_finite()
        {
            return Err(ConfigError::InvalidLevelRange {
                minimum: config.minimum_threshold_dbhl,
                maximum: config.maximum_dbhl,
            });
        }

        let mut schedule = Vec::new();
        for &channel in config.ear_preference.channels() {
            let mut block: Vec<(f64, AudioChannel)> = config
                .frequency_list
                .iter()
                .map(|&frequency| (frequency, channel))
                .collect();
            if config.presentation_order == PresentationOrder::Shuffled {
                block.shuffle(&mut rand::thread_rng());
            }
            schedule.extend(block);
        }

        info!(
            "[Estimator] Session scheduled: {} pairs, {:?} order",
            schedule.len(),
            config.presentation_order
        );

        Ok(Self {
            config,
            schedule,
            next_pair: 0,
            active: None,
            active_taps: Vec::new(),
            samples: Vec::new(),
            all_taps: Vec::new(),
            aborted: false,
            output_volume: 1.0,
            number_of_retries: 0,
        })
    }

    /// Record the system output volume for the result header
    pub fn set_output_volume(&mut self, volume: f64) {
        self.output_volume = volume;
    }

    /// Count a user-initiated restart of the dBHL portion of the test
    pub fn record_retry(&mut self) {
        self.number_of_retries += 1;
    }

    /// Open the next stimulus unit
    ///
    /// Starts the next scheduled staircase when the previous frequency has
    /// finished.
    ///
    /// # Returns
    /// * `Some(Stimulus)` - Tone the driving layer should present
    /// * `None` - Schedule exhausted, session aborted, or the previous
    ///   stimulus is still awaiting its response
    pub fn present_next(&mut self, timestamp: f64, pre_stimulus_delay: f64) -> Option<Stimulus> {
        if self.aborted {
            return None;
        }

        if self.active.is_none() {
            let &(frequency, channel) = self.schedule.get(self.next_pair)?;
            self.next_pair += 1;
            debug!(
                "[Estimator] Starting staircase: {} Hz on {:?}",
                frequency, channel
            );
            self.active = Some(Staircase::new(&self.config, frequency, channel));
        }

        let staircase = self.active.as_mut()?;
        let dbhl_value = staircase.present_next(timestamp, pre_stimulus_delay)?;
        Some(Stimulus {
            frequency: staircase.frequency(),
            channel: staircase.channel(),
            dbhl_value,
        })
    }

    /// Route a user event (or timeout) to the active staircase
    ///
    /// Every event is recorded in the tap audit trail before it moves the
    /// staircase. When the staircase terminates, its frequency sample is
    /// sealed; the next `present_next` call starts the next pair.
    pub fn register_response(&mut self, response: TrialResponse, timestamp: f64) {
        let Some(staircase) = self.active.as_mut() else {
            return;
        };

        self.active_taps.push(ToneTap {
            dbhl_value: staircase.level(),
            frequency: staircase.frequency(),
            channel: staircase.channel(),
            timestamp,
            response,
        });

        match response {
            TrialResponse::TapBeforeWindow => staircase.record_premature_tap(),
            TrialResponse::TapInWindow => staircase.record_response(true, timestamp),
            TrialResponse::NoTap => staircase.record_response(false, timestamp),
        }

        if staircase.is_terminated() {
            self.seal_active();
        }
    }

    /// Cancel the session, retaining all partial data
    ///
    /// The open staircase is sealed with the invalid sentinel and its unit
    /// history intact; pairs never started produce no samples.
    pub fn abort(&mut self) {
        if let Some(mut staircase) = self.active.take() {
            staircase.abort();
            let taps = std::mem::take(&mut self.active_taps);
            self.all_taps.extend(taps.iter().cloned());
            self.samples.push(staircase.into_sample(taps));
        }
        self.aborted = true;
        info!(
            "[Estimator] Session aborted with {}/{} pairs sealed",
            self.samples.len(),
            self.schedule.len()
        );
    }

    fn seal_active(&mut self) {
        let Some(staircase) = self.active.take() else {
            return;
        };
        let taps = std::mem::take(&mut self.active_taps);
        self.all_taps.extend(taps.iter().cloned());
        let sample = staircase.into_sample(taps);
        debug!(
            "[Estimator] Sealed {} Hz on {:?}: threshold {:?} ({:?})",
            sample.frequency, sample.channel, sample.calculated_threshold, sample.status
        );
        self.samples.push(sample);
    }

    /// (frequency, channel) pair currently under test
    pub fn active_pair(&self) -> Option<(f64, AudioChannel)> {
        self.active
            .as_ref()
            .map(|staircase| (staircase.frequency(), staircase.channel()))
    }

    /// Current stimulus level of the active staircase
    pub fn active_level(&self) -> Option<f64> {
        self.active.as_ref().map(|staircase| staircase.level())
    }

    /// Inversions committed so far on the active staircase
    pub fn active_inversions(&self) -> Option<u32> {
        self.active.as_ref().map(|staircase| staircase.inversions())
    }

    /// Pairs in the presentation schedule
    pub fn pairs_total(&self) -> usize {
        self.schedule.len()
    }

    /// Whether the session was cancelled
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Whether the session has no further stimuli to present
    pub fn is_complete(&self) -> bool {
        self.active.is_none() && (self.aborted || self.next_pair >= self.schedule.len())
    }

    /// Fraction of the presentation schedule sealed so far
    pub fn progress(&self) -> f32 {
        if self.schedule.is_empty() {
            return 1.0;
        }
        self.samples.len() as f32 / self.schedule.len() as f32
    }

    /// Frequency samples sealed so far
    pub fn samples(&self) -> &[FrequencySample] {
        &self.samples
    }

    /// The step configuration this session runs under
    pub fn config(&self) -> &ToneTestConfig {
        &self.config
    }

    /// Aggregate the session into a screener result
    ///
    /// A pure read of sealed state: calling this twice without intervening
    /// events yields identical aggregates. Partial sessions aggregate
    /// whatever was sealed before the abort.
    pub fn finalize(&self) -> ScreenerResult {
        ScreenerResult {
            header: ResultHeader {
                output_volume: self.output_volume,
                tone_playback_duration: self.config.tone_duration,
                post_stimulus_delay: self.config.post_stimulus_delay,
                headphone_type: self.config.headphone_type.clone(),
                algorithm_version: STAIRCASE_ALGORITHM_VERSION,
                device: None,
            },
            samples: self.samples.clone(),
            deleted_samples: Vec::new(),
            discrete_units: Vec::new(),
            fit_matrix: Default::default(),
            all_taps: self.all_taps.clone(),
            number_of_retries: self.number_of_retries,
        }
    }
}
