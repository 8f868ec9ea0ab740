// Session lifecycle error types and constants

use crate::error::{ConfigError, ErrorCode};
use log::error;
use std::fmt;

/// Session error code constants
///
/// Error code range: 2001-2005
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// No session is running
    pub const NOT_RUNNING: i32 = 2001;

    /// A session is already in progress
    pub const ALREADY_RUNNING: i32 = 2002;

    /// The session has already presented its full schedule
    pub const SESSION_COMPLETE: i32 = 2003;

    /// Session state lock was poisoned
    pub const STATE_POISONED: i32 = 2004;

    /// Step configuration rejected at session start
    pub const INVALID_CONFIG: i32 = 2005;
}

/// Log a session error with structured context
///
/// Logs the error code, the component, and a human-readable message so
/// host-side diagnostics can correlate failures without parsing strings.
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=SessionManager, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Session lifecycle errors
///
/// These cover misuse of the session manager and estimator surface.
/// A running test never raises these; mid-run anomalies become result data.
///
/// Error code range: 2001-2005
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// No session is running
    NotRunning,

    /// A session is already in progress
    AlreadyRunning,

    /// The presentation schedule is exhausted
    SessionComplete,

    /// Session state lock was poisoned
    StatePoisoned,

    /// Step configuration rejected before the first trial
    InvalidConfig(ConfigError),
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::NotRunning => SessionErrorCodes::NOT_RUNNING,
            SessionError::AlreadyRunning => SessionErrorCodes::ALREADY_RUNNING,
            SessionError::SessionComplete => SessionErrorCodes::SESSION_COMPLETE,
            SessionError::StatePoisoned => SessionErrorCodes::STATE_POISONED,
            SessionError::InvalidConfig(_) => SessionErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::NotRunning => "No audiometry session is running".to_string(),
            SessionError::AlreadyRunning => "Audiometry session already in progress".to_string(),
            SessionError::SessionComplete => "Audiometry session already complete".to_string(),
            SessionError::StatePoisoned => "Session state lock poisoned".to_string(),
            SessionError::InvalidConfig(inner) => {
                format!("Invalid step configuration: {}", inner.message())
            }
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::InvalidConfig(err)
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_codes() {
        assert_eq!(
            SessionError::NotRunning.code(),
            SessionErrorCodes::NOT_RUNNING
        );
        assert_eq!(
            SessionError::AlreadyRunning.code(),
            SessionErrorCodes::ALREADY_RUNNING
        );
        assert_eq!(
            SessionError::SessionComplete.code(),
            SessionErrorCodes::SESSION_COMPLETE
        );
        assert_eq!(
            SessionError::StatePoisoned.code(),
            SessionErrorCodes::STATE_POISONED
        );
        assert_eq!(
            SessionError::InvalidConfig(ConfigError::EmptyFrequencyList).code(),
            SessionErrorCodes::INVALID_CONFIG
        );
    }

    #[test]
    fn test_config_error_wraps_into_session_error() {
        let err: SessionError = ConfigError::EmptyFrequencyList.into();
        assert_eq!(err.code(), SessionErrorCodes::INVALID_CONFIG);
        assert!(err.message().contains("Frequency list is empty"));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::NotRunning;
        let display = format!("{}", err);
        assert!(display.contains("SessionError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
