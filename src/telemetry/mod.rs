//! Session telemetry collector and helpers.
//!
//! The collector multiplexes stimulus, response, and lifecycle events into
//! a bounded history plus an async broadcast stream, so diagnostic
//! surfaces can either poll a snapshot or subscribe live.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub mod events;

pub use events::{DiagnosticError, SessionEvent};

/// Global telemetry collector shared across the crate.
static COLLECTOR: Lazy<TelemetryCollector> = Lazy::new(TelemetryCollector::default);

/// Access the global telemetry collector.
pub fn collector() -> &'static TelemetryCollector {
    &COLLECTOR
}

/// Snapshot of collector state for CLI/log reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<SessionEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<SessionEvent>,
    history: Mutex<VecDeque<SessionEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: SessionEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock().expect("history poisoned");
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history.lock().expect("history poisoned");
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AudioChannel;

    fn stimulus_event(dbhl_value: f64) -> SessionEvent {
        SessionEvent::StimulusPresented {
            frequency: 1000.0,
            channel: AudioChannel::Left,
            dbhl_value,
        }
    }

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(stimulus_event(30.0));
        collector.publish(stimulus_event(35.0));
        collector.publish(SessionEvent::SessionSealed {
            samples: 1,
            aborted: false,
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(
            matches!(snapshot.recent[0], SessionEvent::StimulusPresented { dbhl_value, .. } if dbhl_value == 30.0)
        );
        assert!(matches!(
            snapshot.recent[2],
            SessionEvent::SessionSealed { .. }
        ));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        collector.publish(stimulus_event(30.0));
        collector.publish(stimulus_event(35.0));
        collector.publish(stimulus_event(40.0));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(
            matches!(snapshot.recent[0], SessionEvent::StimulusPresented { dbhl_value, .. } if dbhl_value == 35.0)
        );
    }

    #[test]
    fn subscriber_receives_published_events() {
        let collector = TelemetryCollector::new(8, 8);
        let mut rx = collector.subscribe();
        collector.publish(stimulus_event(45.0));

        let received = rx.try_recv().expect("event should be buffered");
        assert_eq!(received, stimulus_event(45.0));
    }

    #[test]
    fn events_serialize_with_tag_and_payload() {
        let json = serde_json::to_string(&stimulus_event(30.0)).unwrap();
        assert!(json.contains("\"type\":\"stimulus_presented\""));
        assert!(json.contains("\"payload\""));
    }
}
