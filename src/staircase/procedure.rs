// Staircase - per-frequency adaptive threshold search
//
// This module implements the up/down staircase over stimulus level for a
// single (frequency, channel) pair:
// 1. Present a tone at the current level
// 2. Step the level down after a hit, up after a miss
// 3. Count an inversion whenever the direction of travel between
//    successively presented stimuli reverses
// 4. Terminate once the inversion quota is met, or flag the frequency
//    untestable when the level gets pinned at a bound
//
// Premature taps never move the level; they are tallied separately as
// false positives and the response window stays open.

use crate::config::ToneTestConfig;
use crate::result::{
    AudioChannel, FrequencySample, ThresholdStatus, ToneTap, ToneUnit, INVALID_DBHL_VALUE,
};

/// Direction of travel of the stimulus level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    None,
    Up,
    Down,
}

/// Lifecycle state of a staircase run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaircaseStatus {
    /// Accepting stimuli and responses
    Running,
    /// Inversion quota met; threshold is computable
    Converged,
    /// Level pinned at a bound and pushed further; untestable
    OutOfRange,
    /// Session cancelled mid-run
    Aborted,
}

/// Adaptive staircase for one (frequency, channel) pair.
///
/// The staircase is driven strictly by alternating `present_next` /
/// `record_response` calls; a premature tap is the one response kind that
/// leaves the current stimulus open.
#[derive(Debug, Clone)]
pub struct Staircase {
    frequency: f64,
    channel: AudioChannel,
    level: f64,
    rate_up: f64,
    rate_down: f64,
    min_level: f64,
    max_level: f64,
    inversions_needed: u32,
    inversions: u32,
    /// Direction of travel committed at the stimulus being answered
    direction: Direction,
    /// Direction implied by the most recent response
    next_direction: Direction,
    status: StaircaseStatus,
    units: Vec<ToneUnit>,
    reversal_levels: Vec<f64>,
    false_positives: u32,
}

impl Staircase {
    /// Create a staircase for one (frequency, channel) pair
    ///
    /// # Arguments
    /// * `config` - Step configuration supplying initial level, rates,
    ///   bounds, and the inversion quota
    /// * `frequency` - Tested frequency in Hz
    /// * `channel` - Tested channel
    pub fn new(config: &ToneTestConfig, frequency: f64, channel: AudioChannel) -> Self {
        Self {
            frequency,
            channel,
            level: config.initial_dbhl,
            rate_up: config.dbhl_rate_up,
            rate_down: config.dbhl_rate_down,
            min_level: config.minimum_threshold_dbhl,
            max_level: config.maximum_dbhl,
            inversions_needed: config.number_of_inversions,
            inversions: 0,
            direction: Direction::None,
            next_direction: Direction::None,
            status: StaircaseStatus::Running,
            units: Vec::new(),
            reversal_levels: Vec::new(),
            false_positives: 0,
        }
    }

    /// Open the next stimulus unit at the current level
    ///
    /// # Arguments
    /// * `timestamp` - Session-relative start of the unit, in seconds
    /// * `pre_stimulus_delay` - Random delay before tone onset, in seconds
    ///
    /// # Returns
    /// * `Some(level)` - dBHL level of the stimulus to present
    /// * `None` - Staircase terminated, or the previous unit is still open
    pub fn present_next(&mut self, timestamp: f64, pre_stimulus_delay: f64) -> Option<f64> {
        if self.status != StaircaseStatus::Running {
            return None;
        }
        if self.units.last().is_some_and(|unit| !unit.is_resolved()) {
            return None;
        }

        self.units
            .push(ToneUnit::new(self.level, timestamp, pre_stimulus_delay));
        Some(self.level)
    }

    /// Record the user's response (or timeout) for the open unit
    ///
    /// A tap inside the response window steps the level down by the
    /// configured descent rate; a timeout steps it up by the ascent rate.
    /// A tap before the window opens is tallied as a false positive and
    /// leaves the staircase untouched.
    ///
    /// An inversion is committed once the stimulus following a direction
    /// change has itself been answered, so the count always reflects
    /// reversals between stimuli that were actually presented.
    ///
    /// # Arguments
    /// * `heard` - true for an in-window tap, false for a timeout
    /// * `timestamp` - Session-relative time of the event, in seconds;
    ///   closes the open unit
    pub fn record_response(&mut self, heard: bool, timestamp: f64) {
        if self.status != StaircaseStatus::Running {
            return;
        }
        let Some(unit) = self.units.last_mut() else {
            return;
        };
        if unit.is_resolved() {
            return;
        }

        if heard {
            unit.user_tap_timestamp = Some(timestamp);
        } else {
            unit.timeout_timestamp = Some(timestamp);
        }

        if self.direction != Direction::None
            && self.next_direction != Direction::None
            && self.direction != self.next_direction
        {
            self.inversions += 1;
            // The run turned at the previous stimulus; that extremum level
            // is what the threshold is averaged from.
            let turn_index = self.units.len() - 2;
            self.reversal_levels.push(self.units[turn_index].dbhl_value);
        }
        if self.next_direction != Direction::None {
            self.direction = self.next_direction;
        }

        let mut pinned = false;
        let target = if heard {
            self.next_direction = Direction::Down;
            self.level - self.rate_down
        } else {
            self.next_direction = Direction::Up;
            self.level + self.rate_up
        };

        if target < self.min_level {
            pinned = self.level <= self.min_level;
            self.level = self.min_level;
        } else if target > self.max_level {
            pinned = self.level >= self.max_level;
            self.level = self.max_level;
        } else {
            self.level = target;
        }

        if self.inversions >= self.inversions_needed {
            self.status = StaircaseStatus::Converged;
        } else if pinned {
            self.status = StaircaseStatus::OutOfRange;
        }
    }

    /// Record a tap that arrived before the response window opened
    pub fn record_premature_tap(&mut self) {
        if self.status == StaircaseStatus::Running {
            self.false_positives += 1;
        }
    }

    /// Cancel the run, keeping partial unit history
    pub fn abort(&mut self) {
        if self.status == StaircaseStatus::Running {
            self.status = StaircaseStatus::Aborted;
        }
    }

    /// Whether the staircase has stopped accepting stimuli
    pub fn is_terminated(&self) -> bool {
        self.status != StaircaseStatus::Running
    }

    /// Compute the threshold estimate for this run
    ///
    /// # Returns
    /// The mean of the stimulus levels at the last `number_of_inversions`
    /// reversal points for a converged run, [`INVALID_DBHL_VALUE`] otherwise.
    pub fn compute_threshold(&self) -> f64 {
        if self.status != StaircaseStatus::Converged {
            return INVALID_DBHL_VALUE;
        }

        let window = self.inversions_needed as usize;
        let tail: Vec<f64> = self
            .reversal_levels
            .iter()
            .rev()
            .take(window)
            .copied()
            .collect();
        if tail.is_empty() {
            return INVALID_DBHL_VALUE;
        }
        tail.iter().sum::<f64>() / tail.len() as f64
    }

    /// Seal the run into a frequency sample
    ///
    /// # Arguments
    /// * `taps` - The interaction records the orchestrator attributed to
    ///   this run, in delivery order
    pub fn into_sample(self, taps: Vec<ToneTap>) -> FrequencySample {
        let status = match self.status {
            StaircaseStatus::Converged => ThresholdStatus::Converged,
            StaircaseStatus::OutOfRange => ThresholdStatus::OutOfRange,
            // A still-running staircase can only be sealed by cancellation
            StaircaseStatus::Running | StaircaseStatus::Aborted => ThresholdStatus::Aborted,
        };
        let calculated_threshold = self.compute_threshold();

        FrequencySample {
            frequency: self.frequency,
            channel: self.channel,
            calculated_threshold,
            status,
            units: self.units,
            taps,
            interactions: Vec::new(),
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn channel(&self) -> AudioChannel {
        self.channel
    }

    /// Current stimulus level in dBHL
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Direction reversals committed so far
    pub fn inversions(&self) -> u32 {
        self.inversions
    }

    /// Premature taps tallied so far
    pub fn false_positives(&self) -> u32 {
        self.false_positives
    }

    pub fn status(&self) -> StaircaseStatus {
        self.status
    }

    /// Stimuli presented so far, in order
    pub fn units(&self) -> &[ToneUnit] {
        &self.units
    }
}
