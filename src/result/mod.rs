// Result module - the audiometry result object graph
//
// This module provides two layers:
// 1. records: per-trial record types (units, taps, adjustment interactions)
//    and the per-frequency sample that owns them
// 2. aggregate: session-level result types, flattened into a tagged sum
//    type over screener / adjustment / fit-test results
//
// Everything here is plain data with serde derives; the host application's
// serialization layer consumes it as-is.

pub mod aggregate;
pub mod records;

pub use aggregate::{
    AdjustmentResult, AudiometryTestResult, DeviceInfo, FitTestResult, MeasurementMethod,
    ResultHeader, ScreenerResult,
};
pub use records::{
    AdjustmentInteraction, AdjustmentSource, AudioChannel, EarPreference, FitTestSample,
    FrequencySample, ThresholdStatus, ToneTap, ToneUnit, TrialResponse, INVALID_DBHL_VALUE,
};
