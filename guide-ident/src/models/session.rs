//! Identification workflow state machine
//!
//! A capture progresses CAPTURING → CLASSIFYING_REMOTE → RESOLVED on the
//! happy path, detouring through CLASSIFYING_LOCAL when the remote
//! classifier is unreachable or fails. AWAITING_CONNECTIVITY is a derived
//! condition (queued uploads waiting for the network), never a state the
//! workflow blocks in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identification workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    /// No capture in flight
    Idle,
    /// Capture accepted, image bytes being read
    Capturing,
    /// Remote classification request in flight
    ClassifyingRemote,
    /// On-device model running
    ClassifyingLocal,
    /// Queued uploads waiting for connectivity (derived, non-blocking)
    AwaitingConnectivity,
    /// Capture finished, with or without a landmark
    Resolved,
    /// Capture cancelled by the user or superseded
    Cancelled,
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub capture_id: Uuid,
    pub old_state: WorkflowState,
    pub new_state: WorkflowState,
    pub transitioned_at: DateTime<Utc>,
}

/// Identification session (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentSession {
    /// Capture being identified, None while idle
    pub capture_id: Option<Uuid>,

    /// Current workflow state
    pub state: WorkflowState,

    /// Session start time
    pub started_at: DateTime<Utc>,

    /// Session end time (if resolved/cancelled)
    pub ended_at: Option<DateTime<Utc>>,
}

impl IdentSession {
    /// Session with no capture in flight
    pub fn idle() -> Self {
        Self {
            capture_id: None,
            state: WorkflowState::Idle,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Create a new session for a capture
    pub fn new(capture_id: Uuid) -> Self {
        Self {
            capture_id: Some(capture_id),
            state: WorkflowState::Capturing,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: WorkflowState) -> StateTransition {
        let transition = StateTransition {
            capture_id: self.capture_id.unwrap_or_default(),
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        // Set end time for terminal states
        if matches!(
            new_state,
            WorkflowState::Resolved | WorkflowState::Cancelled
        ) {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    /// Check if session is terminal (finished)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Idle | WorkflowState::Resolved | WorkflowState::Cancelled
        )
    }

    /// State as reported to clients: queued uploads surface as
    /// AWAITING_CONNECTIVITY once the workflow itself is done.
    pub fn effective_state(&self, pending_uploads: usize) -> WorkflowState {
        if pending_uploads > 0 && self.is_terminal() {
            WorkflowState::AwaitingConnectivity
        } else {
            self.state
        }
    }
}
