//! Headphone fit-quality evaluation
//!
//! Before the staircase runs, the fit test checks that the in-ear seal is
//! good enough for calibrated stimulus levels to be trusted. Raw seal and
//! confidence readings come from the headphone's own sensor pipeline; this
//! module only judges them against the configured thresholds.
//!
//! Evaluation is a pure function: no state, no error cases. A poor fit is
//! result data the caller can re-prompt on, never a failure.

use crate::config::FitTestConfig;
use crate::result::{FitTestResult, FitTestSample};

/// One raw per-ear seal/confidence reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReading {
    pub seal_left_ear: f64,
    pub seal_right_ear: f64,
    pub confidence_left_ear: f64,
    pub confidence_right_ear: f64,
}

/// Judges fit readings against seal/confidence thresholds
#[derive(Debug, Clone)]
pub struct FitTestEvaluator {
    seal_threshold: f64,
    confidence_threshold: f64,
}

impl FitTestEvaluator {
    pub fn new(config: &FitTestConfig) -> Self {
        Self {
            seal_threshold: config.seal_threshold,
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Evaluate one reading
    ///
    /// An ear's seal passes when it meets the seal threshold. The reading
    /// as a whole is low-confidence when either ear's confidence falls
    /// below the confidence threshold.
    pub fn evaluate(&self, reading: FitReading) -> FitTestSample {
        FitTestSample {
            seal_left_ear: reading.seal_left_ear,
            seal_right_ear: reading.seal_right_ear,
            confidence_left_ear: reading.confidence_left_ear,
            confidence_right_ear: reading.confidence_right_ear,
            seal_threshold: self.seal_threshold,
            confidence_threshold: self.confidence_threshold,
            left_seal_success: reading.seal_left_ear >= self.seal_threshold,
            right_seal_success: reading.seal_right_ear >= self.seal_threshold,
            low_confidence: reading.confidence_left_ear < self.confidence_threshold
                || reading.confidence_right_ear < self.confidence_threshold,
        }
    }

    /// Evaluate a whole fit-test session
    pub fn evaluate_session(&self, readings: &[FitReading]) -> FitTestResult {
        FitTestResult {
            samples: readings
                .iter()
                .map(|&reading| self.evaluate(reading))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> FitTestEvaluator {
        FitTestEvaluator::new(&FitTestConfig {
            seal_threshold: 0.75,
            confidence_threshold: 0.6,
        })
    }

    #[test]
    fn test_seal_success_per_ear() {
        let sample = evaluator().evaluate(FitReading {
            seal_left_ear: 0.9,
            seal_right_ear: 0.5,
            confidence_left_ear: 0.8,
            confidence_right_ear: 0.8,
        });

        assert!(sample.left_seal_success);
        assert!(!sample.right_seal_success);
        assert!(!sample.low_confidence);
    }

    #[test]
    fn test_seal_threshold_boundary_is_inclusive() {
        let sample = evaluator().evaluate(FitReading {
            seal_left_ear: 0.75,
            seal_right_ear: 0.75,
            confidence_left_ear: 0.6,
            confidence_right_ear: 0.6,
        });

        assert!(sample.left_seal_success);
        assert!(sample.right_seal_success);
        assert!(!sample.low_confidence);
    }

    #[test]
    fn test_one_ear_below_confidence_threshold_is_sufficient() {
        // Left just under the threshold, right comfortably above
        let sample = evaluator().evaluate(FitReading {
            seal_left_ear: 0.9,
            seal_right_ear: 0.9,
            confidence_left_ear: 0.6 - 1e-9,
            confidence_right_ear: 1.6,
        });

        assert!(sample.low_confidence);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let reading = FitReading {
            seal_left_ear: 0.8,
            seal_right_ear: 0.7,
            confidence_left_ear: 0.65,
            confidence_right_ear: 0.55,
        };
        assert_eq!(evaluator().evaluate(reading), evaluator().evaluate(reading));
    }

    #[test]
    fn test_session_aggregation() {
        let readings = [
            FitReading {
                seal_left_ear: 0.9,
                seal_right_ear: 0.9,
                confidence_left_ear: 0.9,
                confidence_right_ear: 0.9,
            },
            FitReading {
                seal_left_ear: 0.2,
                seal_right_ear: 0.9,
                confidence_left_ear: 0.5,
                confidence_right_ear: 0.9,
            },
        ];

        let result = evaluator().evaluate_session(&readings);
        assert_eq!(result.samples.len(), 2);
        assert!(!result.samples[0].low_confidence);
        assert!(result.samples[1].low_confidence);
        assert!(!result.samples[1].left_seal_success);
    }
}
