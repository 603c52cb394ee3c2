//! Event types and broadcast bus for workflow notifications
//!
//! Every session state change is published on the [`EventBus`] so that the
//! presentation layer can follow a session over SSE instead of polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

mod workflow_types;

pub use workflow_types::{Phase, RequestKind};

/// Workflow event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// A fresh session was created with empty workflow state
    SessionCreated {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Session phase changed
    ///
    /// Triggers:
    /// - SSE: Re-render affordances (buttons, spinners, result panes)
    PhaseChanged {
        session_id: Uuid,
        /// Phase before change
        old_phase: Phase,
        /// Phase after change
        new_phase: Phase,
        timestamp: DateTime<Utc>,
    },

    /// Extraction response applied to the session
    ExtractionCompleted {
        session_id: Uuid,
        /// Request cycle the response belonged to
        token: u64,
        /// True when the service returned no usable text and the placeholder was stored
        degraded: bool,
        timestamp: DateTime<Utc>,
    },

    /// Generated artifact set applied to the session
    GenerationCompleted {
        session_id: Uuid,
        token: u64,
        timestamp: DateTime<Utc>,
    },

    /// A remote call failed; `message` is the user-facing error string
    WorkflowFailed {
        session_id: Uuid,
        kind: RequestKind,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A late response from a superseded request cycle was dropped
    StaleResponseDiscarded {
        session_id: Uuid,
        kind: RequestKind,
        /// Cycle the response was issued under
        token: u64,
        /// Cycle active when it arrived
        current_token: u64,
        timestamp: DateTime<Utc>,
    },

    /// Session discarded by the client
    SessionClosed {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::SessionCreated { .. } => "SessionCreated",
            WorkflowEvent::PhaseChanged { .. } => "PhaseChanged",
            WorkflowEvent::ExtractionCompleted { .. } => "ExtractionCompleted",
            WorkflowEvent::GenerationCompleted { .. } => "GenerationCompleted",
            WorkflowEvent::WorkflowFailed { .. } => "WorkflowFailed",
            WorkflowEvent::StaleResponseDiscarded { .. } => "StaleResponseDiscarded",
            WorkflowEvent::SessionClosed { .. } => "SessionClosed",
        }
    }

    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            WorkflowEvent::SessionCreated { session_id, .. }
            | WorkflowEvent::PhaseChanged { session_id, .. }
            | WorkflowEvent::ExtractionCompleted { session_id, .. }
            | WorkflowEvent::GenerationCompleted { session_id, .. }
            | WorkflowEvent::WorkflowFailed { session_id, .. }
            | WorkflowEvent::StaleResponseDiscarded { session_id, .. }
            | WorkflowEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast bus for workflow events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    ///
    /// # Examples
    ///
    /// ```
    /// use sahayak_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// let _rx = event_bus.subscribe();
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }
}
