// SessionManager: Focused manager for screening session workflow
//
// Single Responsibility: session lifecycle and state management
//
// The manager wraps a ThresholdEstimator behind locks so a UI thread and a
// timer thread can both deliver events, serializing them into the
// single-threaded core. It also fans out progress updates and telemetry.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::broadcast;

use crate::config::ToneTestConfig;
use crate::error::{log_session_error, ErrorCode, SessionError};
use crate::estimator::{Stimulus, ThresholdEstimator};
use crate::result::{AudioChannel, ScreenerResult, TrialResponse};
use crate::telemetry::{self, DiagnosticError, SessionEvent};

/// Progress update broadcast after every recorded response
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    /// Pair currently under test, if any
    pub current: Option<(f64, AudioChannel)>,
    /// Pairs sealed so far
    pub pairs_completed: usize,
    /// Pairs in the presentation schedule
    pub pairs_total: usize,
}

/// Manages screening session workflow and result retention
///
/// # Example
/// ```ignore
/// let manager = SessionManager::new();
/// manager.start(config)?;
/// while let Some(stimulus) = manager.present_next(now(), delay)? {
///     manager.register_response(capture_response(), now())?;
/// }
/// let result = manager.finish()?;
/// ```
pub struct SessionManager {
    estimator: Arc<Mutex<Option<ThresholdEstimator>>>,
    result: Arc<RwLock<Option<ScreenerResult>>>,
    progress_tx: broadcast::Sender<SessionProgress>,
}

impl SessionManager {
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(32);
        Self {
            estimator: Arc::new(Mutex::new(None)),
            result: Arc::new(RwLock::new(None)),
            progress_tx,
        }
    }

    /// Subscribe to progress updates for the lifetime of this manager
    pub fn subscribe_progress(&self) -> broadcast::Receiver<SessionProgress> {
        self.progress_tx.subscribe()
    }

    /// Start a screening session
    ///
    /// # Errors
    /// - A session is already in progress
    /// - The step configuration is rejected (fails before any trial)
    /// - Lock poisoning on session state
    pub fn start(&self, config: ToneTestConfig) -> Result<(), SessionError> {
        let mut guard = self.lock_estimator()?;
        if guard.is_some() {
            let err = SessionError::AlreadyRunning;
            log_session_error(&err, "start_session");
            return Err(err);
        }

        let estimator = ThresholdEstimator::new(config).map_err(|config_err| {
            let err = SessionError::from(config_err);
            log_session_error(&err, "start_session");
            telemetry::collector().publish(SessionEvent::Error {
                code: DiagnosticError::ConfigRejected,
                context: err.message(),
            });
            err
        })?;

        *guard = Some(estimator);
        *self.result.write().map_err(|_| SessionError::StatePoisoned)? = None;
        Ok(())
    }

    /// Request the next stimulus to present
    ///
    /// # Returns
    /// * `Ok(Some(stimulus))` - Tone to play next
    /// * `Ok(None)` - Schedule exhausted; call `finish`
    pub fn present_next(
        &self,
        timestamp: f64,
        pre_stimulus_delay: f64,
    ) -> Result<Option<Stimulus>, SessionError> {
        let mut guard = self.lock_estimator()?;
        let estimator = guard.as_mut().ok_or(SessionError::NotRunning)?;

        let stimulus = estimator.present_next(timestamp, pre_stimulus_delay);
        if let Some(stimulus) = stimulus {
            telemetry::collector().publish(SessionEvent::StimulusPresented {
                frequency: stimulus.frequency,
                channel: stimulus.channel,
                dbhl_value: stimulus.dbhl_value,
            });
        }
        Ok(stimulus)
    }

    /// Deliver a user response or timeout to the active staircase
    pub fn register_response(
        &self,
        response: TrialResponse,
        timestamp: f64,
    ) -> Result<(), SessionError> {
        let mut guard = self.lock_estimator()?;
        let estimator = guard.as_mut().ok_or(SessionError::NotRunning)?;

        let inversions_before = estimator.active_inversions();
        let sealed_before = estimator.samples().len();
        let dbhl_value = estimator.active_level().unwrap_or_default();

        estimator.register_response(response, timestamp);

        telemetry::collector().publish(SessionEvent::ResponseRecorded {
            response,
            dbhl_value,
        });
        if let (Some(before), Some(after)) = (inversions_before, estimator.active_inversions()) {
            if after > before {
                if let Some((frequency, channel)) = estimator.active_pair() {
                    telemetry::collector().publish(SessionEvent::Inversion {
                        frequency,
                        channel,
                        count: after,
                    });
                }
            }
        }
        if estimator.samples().len() > sealed_before {
            let sample = &estimator.samples()[sealed_before];
            telemetry::collector().publish(SessionEvent::FrequencySealed {
                frequency: sample.frequency,
                channel: sample.channel,
                status: sample.status,
                threshold: sample.calculated_threshold,
            });
        }

        let _ = self.progress_tx.send(SessionProgress {
            current: estimator.active_pair(),
            pairs_completed: estimator.samples().len(),
            pairs_total: estimator.pairs_total(),
        });
        Ok(())
    }

    /// Cancel the running session, retaining partial data
    pub fn abort(&self) -> Result<(), SessionError> {
        let mut guard = self.lock_estimator()?;
        let estimator = guard.as_mut().ok_or_else(|| {
            let err = SessionError::NotRunning;
            log_session_error(&err, "abort_session");
            err
        })?;
        estimator.abort();
        Ok(())
    }

    /// Finish the session and retain its result
    ///
    /// A session finished mid-staircase is aborted first so partial unit
    /// history survives into the aggregate.
    pub fn finish(&self) -> Result<ScreenerResult, SessionError> {
        let mut guard = self.lock_estimator()?;
        let Some(mut estimator) = guard.take() else {
            let err = SessionError::NotRunning;
            log_session_error(&err, "finish_session");
            return Err(err);
        };

        if !estimator.is_complete() {
            log::warn!("[Session] Finishing an incomplete session; aborting active staircase");
            estimator.abort();
        }

        let result = estimator.finalize();
        telemetry::collector().publish(SessionEvent::SessionSealed {
            samples: result.samples.len(),
            aborted: estimator.is_aborted(),
        });

        *self.result.write().map_err(|_| SessionError::StatePoisoned)? = Some(result.clone());
        Ok(result)
    }

    /// Result of the most recently finished session, if any
    pub fn last_result(&self) -> Result<Option<ScreenerResult>, SessionError> {
        Ok(self
            .result
            .read()
            .map_err(|_| SessionError::StatePoisoned)?
            .clone())
    }

    fn lock_estimator(&self) -> Result<MutexGuard<'_, Option<ThresholdEstimator>>, SessionError> {
        self.estimator.lock().map_err(|_| {
            let err = SessionError::StatePoisoned;
            log_session_error(&err, "lock_estimator");
            telemetry::collector().publish(SessionEvent::Error {
                code: DiagnosticError::LockPoisoned,
                context: "estimator lock".to_string(),
            });
            err
        })
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
