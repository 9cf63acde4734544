//! Engine event stream for observability.
//!
//! State changes are emitted as [`EngineEvent`]s over a
//! [`tokio::sync::broadcast`] channel so UIs and loggers can follow node
//! execution without reaching into the store.

use serde::{Deserialize, Serialize};

use wireflow_types::ExecutionStatus;

use crate::node::Phase;

/// Events emitted while nodes execute and simulations run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    ExecutionStatusChanged {
        node_id: String,
        status: ExecutionStatus,
    },
    CurrentlyExecutingChanged {
        node_id: Option<String>,
    },
    ConsoleAppended {
        node_id: String,
        message: String,
    },
    CascadeStarted {
        origin: String,
    },
    CascadeCompleted {
        origin: String,
        executed: Vec<String>,
        truncated: bool,
    },
    TickStarted {
        tick: u64,
    },
    TickCompleted {
        tick: u64,
        executed: usize,
        phase_counts: Vec<(Phase, usize)>,
    },
    SimulationStateChanged {
        running: bool,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<EngineEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitter_sends_and_receives() {
        let emitter = EventEmitter::new(16);
        let mut rx = emitter.subscribe();

        emitter.emit(EngineEvent::CascadeStarted {
            origin: "n1".into(),
        });

        let event = rx.recv().await.unwrap();
        match event {
            EngineEvent::CascadeStarted { origin } => assert_eq!(origin, "n1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let emitter = EventEmitter::new(16);
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();

        emitter.emit(EngineEvent::SimulationStateChanged { running: true });

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();

        let json1 = serde_json::to_string(&e1).unwrap();
        let json2 = serde_json::to_string(&e2).unwrap();
        assert_eq!(json1, json2);
    }

    #[test]
    fn emit_with_no_subscribers_does_not_panic() {
        let emitter = EventEmitter::new(16);
        emitter.emit(EngineEvent::ConsoleAppended {
            node_id: "n1".into(),
            message: "hello".into(),
        });
    }

    #[test]
    fn event_serialization_round_trip() {
        let event = EngineEvent::CascadeCompleted {
            origin: "n1".into(),
            executed: vec!["n1".into(), "n2".into()],
            truncated: false,
        };

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: EngineEvent = serde_json::from_str(&json).unwrap();

        match deserialized {
            EngineEvent::CascadeCompleted {
                origin,
                executed,
                truncated,
            } => {
                assert_eq!(origin, "n1");
                assert_eq!(executed.len(), 2);
                assert!(!truncated);
            }
            other => panic!("unexpected variant after round-trip: {:?}", other),
        }
    }
}
