//! SimulatedListener - deterministic listener model
//!
//! Models a subject with a known hearing threshold per frequency: any
//! stimulus at or above the threshold is heard, anything below is missed.
//! An optional seeded lapse rate makes the listener occasionally miss
//! audible tones, which is the dominant noise source in real sessions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::estimator::{Stimulus, ThresholdEstimator};
use crate::result::{ScreenerResult, TrialResponse};

/// Deterministic listener with per-frequency true thresholds
pub struct SimulatedListener {
    thresholds: Vec<(f64, f64)>,
    lapse_rate: f64,
    rng: StdRng,
}

impl SimulatedListener {
    /// Listener with one flat threshold across all frequencies
    pub fn flat(threshold_dbhl: f64) -> Self {
        Self::new(vec![(0.0, threshold_dbhl)])
    }

    /// Listener with per-frequency thresholds as (frequency, dBHL) pairs
    ///
    /// A stimulus is matched to the nearest configured frequency.
    pub fn new(thresholds: Vec<(f64, f64)>) -> Self {
        Self {
            thresholds,
            lapse_rate: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Add a seeded lapse model: audible tones are missed with this
    /// probability
    pub fn with_lapses(mut self, lapse_rate: f64, seed: u64) -> Self {
        self.lapse_rate = lapse_rate.clamp(0.0, 1.0);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The listener's true threshold at a frequency
    pub fn threshold_for(&self, frequency: f64) -> f64 {
        self.thresholds
            .iter()
            .min_by(|a, b| {
                let da = (a.0 - frequency).abs();
                let db = (b.0 - frequency).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|&(_, threshold)| threshold)
            .unwrap_or(f64::INFINITY)
    }

    /// Respond to one stimulus
    pub fn respond(&mut self, stimulus: &Stimulus) -> TrialResponse {
        let audible = stimulus.dbhl_value >= self.threshold_for(stimulus.frequency);
        if audible && self.lapse_rate > 0.0 && self.rng.gen::<f64>() < self.lapse_rate {
            return TrialResponse::NoTap;
        }
        if audible {
            TrialResponse::TapInWindow
        } else {
            TrialResponse::NoTap
        }
    }
}

/// Drive an estimator to completion against a listener
///
/// Presents stimuli on a synthetic clock (one second per trial phase)
/// until the schedule is exhausted, then finalizes.
pub fn run_to_completion(
    estimator: &mut ThresholdEstimator,
    listener: &mut SimulatedListener,
) -> ScreenerResult {
    let mut clock = 0.0;
    while let Some(stimulus) = estimator.present_next(clock, 0.3) {
        clock += 1.0;
        let response = listener.respond(&stimulus);
        estimator.register_response(response, clock);
        clock += 1.0;
    }
    estimator.finalize()
}
