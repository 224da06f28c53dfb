//! Event types for the guide event system

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Guide event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GuideEvent {
    /// A capture entered the identification workflow
    CaptureStarted {
        capture_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote classifier returned a label
    RemoteClassified {
        capture_id: Uuid,
        label: String,
        confidence: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote classification failed, falling back to the on-device model
    RemoteFallback {
        capture_id: Uuid,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Local classifier returned a label
    LocalClassified {
        capture_id: Uuid,
        label: String,
        confidence: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Capture resolved to a landmark
    LandmarkResolved {
        capture_id: Uuid,
        landmark_id: i64,
        landmark_name: String,
        confidence: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Best guess was below the confidence threshold
    LowConfidence {
        capture_id: Uuid,
        label: String,
        confidence_percent: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Label had no match in the landmark directory
    LandmarkNotFound {
        capture_id: Uuid,
        label: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Identification failed terminally for this capture
    IdentificationFailed {
        capture_id: Uuid,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Capture cancelled by the user
    CaptureCancelled {
        capture_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Capture queued for later remote submission
    UploadQueued {
        capture_id: Uuid,
        queue_length: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queued capture delivered to the remote classifier
    UploadDelivered {
        capture_id: Uuid,
        remaining: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue drain halted at a failing entry; will retry on next trigger
    UploadDrainStalled {
        remaining: usize,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Network reachability changed
    ConnectivityChanged {
        reachable: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl GuideEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            GuideEvent::CaptureStarted { .. } => "CaptureStarted",
            GuideEvent::RemoteClassified { .. } => "RemoteClassified",
            GuideEvent::RemoteFallback { .. } => "RemoteFallback",
            GuideEvent::LocalClassified { .. } => "LocalClassified",
            GuideEvent::LandmarkResolved { .. } => "LandmarkResolved",
            GuideEvent::LowConfidence { .. } => "LowConfidence",
            GuideEvent::LandmarkNotFound { .. } => "LandmarkNotFound",
            GuideEvent::IdentificationFailed { .. } => "IdentificationFailed",
            GuideEvent::CaptureCancelled { .. } => "CaptureCancelled",
            GuideEvent::UploadQueued { .. } => "UploadQueued",
            GuideEvent::UploadDelivered { .. } => "UploadDelivered",
            GuideEvent::UploadDrainStalled { .. } => "UploadDrainStalled",
            GuideEvent::ConnectivityChanged { .. } => "ConnectivityChanged",
        }
    }
}

/// Broadcast event bus shared by the workflow, the drain task, and SSE clients.
///
/// Uses tokio::broadcast internally: non-blocking publish, multiple concurrent
/// subscribers, automatic cleanup when subscribers drop.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GuideEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<GuideEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GuideEvent,
    ) -> Result<usize, broadcast::error::SendError<GuideEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GuideEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
