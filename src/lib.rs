// Audiometry Engine Core - adaptive hearing-test estimation
// Staircase threshold search, fit-quality evaluation, and result assembly

// Module declarations
pub mod adjustment;
pub mod config;
pub mod error;
pub mod estimator;
pub mod fit_test;
pub mod managers;
pub mod result;
pub mod staircase;
pub mod telemetry;
pub mod testing;

// Re-exports for convenience
pub use config::{AppConfig, ToneTestConfig};
pub use estimator::{Stimulus, ThresholdEstimator};
pub use fit_test::{FitReading, FitTestEvaluator};
pub use managers::SessionManager;
pub use result::{AudiometryTestResult, FrequencySample, ScreenerResult, TrialResponse};

/// Initialize logging for binaries and tests
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
