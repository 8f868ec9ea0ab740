//! Telemetry event types describing session diagnostics exposed to
//! CLI/log surfaces and host-app streams.

use serde::{Deserialize, Serialize};

use crate::result::{AudioChannel, ThresholdStatus, TrialResponse};

/// Diagnostic error codes surfaced via telemetry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticError {
    ConfigRejected,
    LockPoisoned,
    Unknown,
}

/// Session events covering stimulus flow, staircase progress, and errors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    StimulusPresented {
        frequency: f64,
        channel: AudioChannel,
        dbhl_value: f64,
    },
    ResponseRecorded {
        response: TrialResponse,
        dbhl_value: f64,
    },
    Inversion {
        frequency: f64,
        channel: AudioChannel,
        count: u32,
    },
    FrequencySealed {
        frequency: f64,
        channel: AudioChannel,
        status: ThresholdStatus,
        threshold: f64,
    },
    SessionSealed {
        samples: usize,
        aborted: bool,
    },
    Error {
        code: DiagnosticError,
        context: String,
    },
}
