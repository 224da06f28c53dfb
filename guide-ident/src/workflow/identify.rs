//! Identification workflow orchestrator

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use guide_common::events::{EventBus, GuideEvent};

use crate::error::IdentError;
use crate::models::{
    CaptureRequest, ClassificationResult, IdentOutcome, IdentSession, WorkflowState,
};
use crate::services::labels;
use crate::services::{
    ConnectivityMonitor, DrainOutcome, LandmarkDirectory, LocalClassifier, PendingUpload,
    RemoteClassifier, UploadQueue,
};

/// Minimum confidence for a label to be looked up in the directory.
/// Applied identically to remote and on-device results.
pub const CONFIDENCE_THRESHOLD: f64 = 0.80;

/// The capture currently being identified
struct ActiveCapture {
    capture_id: Uuid,
    cancel: CancellationToken,
}

/// Workflow status snapshot for clients
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatus {
    pub state: WorkflowState,
    pub capture_id: Option<Uuid>,
    pub pending_uploads: usize,
    pub reachable: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Photo identification workflow
pub struct IdentWorkflow {
    remote: Arc<dyn RemoteClassifier>,
    local: Arc<LocalClassifier>,
    directory: Arc<dyn LandmarkDirectory>,
    connectivity: Arc<ConnectivityMonitor>,
    queue: Arc<UploadQueue>,
    event_bus: EventBus,

    /// Slot for the single in-flight capture
    active: Mutex<Option<ActiveCapture>>,

    /// Latest session, for status reporting
    current: RwLock<IdentSession>,
}

impl IdentWorkflow {
    pub fn new(
        remote: Arc<dyn RemoteClassifier>,
        local: Arc<LocalClassifier>,
        directory: Arc<dyn LandmarkDirectory>,
        connectivity: Arc<ConnectivityMonitor>,
        queue: Arc<UploadQueue>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            remote,
            local,
            directory,
            connectivity,
            queue,
            event_bus,
            active: Mutex::new(None),
            current: RwLock::new(IdentSession::idle()),
        }
    }

    pub fn queue(&self) -> &Arc<UploadQueue> {
        &self.queue
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    /// Identify a capture. Rejects with [`IdentError::WorkflowBusy`] if
    /// another capture is already in flight.
    pub async fn start(&self, capture: CaptureRequest) -> Result<IdentOutcome, IdentError> {
        let capture_id = capture.capture_id;
        let cancel = {
            let mut active = self.active.lock().await;
            if let Some(in_flight) = active.as_ref() {
                return Err(IdentError::WorkflowBusy(in_flight.capture_id));
            }
            let cancel = CancellationToken::new();
            *active = Some(ActiveCapture {
                capture_id,
                cancel: cancel.clone(),
            });
            cancel
        };

        let result = self.run(capture, &cancel).await;
        self.release_slot(capture_id).await;
        result
    }

    /// Identify a capture, cancelling any capture already in flight.
    pub async fn supersede(&self, capture: CaptureRequest) -> Result<IdentOutcome, IdentError> {
        let capture_id = capture.capture_id;
        let cancel = {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                tracing::info!(
                    superseded = %previous.capture_id,
                    capture_id = %capture_id,
                    "Cancelling in-flight capture for a new one"
                );
                previous.cancel.cancel();
            }
            let cancel = CancellationToken::new();
            *active = Some(ActiveCapture {
                capture_id,
                cancel: cancel.clone(),
            });
            cancel
        };

        let result = self.run(capture, &cancel).await;
        self.release_slot(capture_id).await;
        result
    }

    /// Cancel the in-flight capture, if any. Idempotent.
    pub async fn cancel(&self) {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(in_flight) => {
                tracing::info!(capture_id = %in_flight.capture_id, "Cancelling capture");
                in_flight.cancel.cancel();
            }
            None => tracing::debug!("Cancel requested with no capture in flight"),
        }
    }

    /// Status snapshot for the API
    pub async fn status(&self) -> WorkflowStatus {
        let session = self.current.read().await.clone();
        let pending = self.queue.len().await;
        WorkflowStatus {
            state: session.effective_state(pending),
            capture_id: session.capture_id,
            pending_uploads: pending,
            reachable: self.connectivity.is_reachable(),
            started_at: session.started_at,
            ended_at: session.ended_at,
        }
    }

    /// Drain the pending upload queue now (manual retry)
    pub async fn retry_pending(&self) -> DrainOutcome {
        self.queue.drain(self.remote.as_ref(), &self.event_bus).await
    }

    /// Spawn the background task that drains the queue whenever
    /// connectivity comes back.
    pub fn spawn_connectivity_drain(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let workflow = Arc::clone(self);
        tokio::spawn(async move {
            let mut rx = workflow.connectivity.subscribe();
            let mut was_reachable = *rx.borrow();
            while rx.changed().await.is_ok() {
                let reachable = *rx.borrow_and_update();
                if reachable && !was_reachable {
                    let outcome = workflow.retry_pending().await;
                    tracing::info!(
                        delivered = outcome.delivered,
                        remaining = outcome.remaining,
                        "Drained pending uploads after connectivity returned"
                    );
                }
                was_reachable = reachable;
            }
        })
    }

    async fn release_slot(&self, capture_id: Uuid) {
        let mut active = self.active.lock().await;
        // A superseding capture may already own the slot
        if active.as_ref().map(|a| a.capture_id) == Some(capture_id) {
            *active = None;
        }
    }

    async fn run(
        &self,
        capture: CaptureRequest,
        cancel: &CancellationToken,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = capture.capture_id;
        let mut session = IdentSession::new(capture_id);
        {
            let mut current = self.current.write().await;
            *current = session.clone();
        }
        tracing::info!(capture_id = %capture_id, "Capture accepted for identification");
        self.event_bus.emit_lossy(GuideEvent::CaptureStarted {
            capture_id,
            timestamp: Utc::now(),
        });

        let image = capture.image.read().await?;
        if cancel.is_cancelled() {
            return self.finish_cancelled(&mut session).await;
        }

        // Remote first, when the network looks up
        if self.connectivity.is_reachable() {
            self.transition(&mut session, WorkflowState::ClassifyingRemote)
                .await;

            let upload_file_name = capture.upload_file_name();
            let remote_result = tokio::select! {
                _ = cancel.cancelled() => {
                    return self.finish_cancelled(&mut session).await;
                }
                result = self.remote.classify(
                    image.clone(),
                    &upload_file_name,
                    None,
                ) => result,
            };

            match remote_result {
                Ok(result) => {
                    if cancel.is_cancelled() {
                        return self.finish_cancelled(&mut session).await;
                    }
                    self.event_bus.emit_lossy(GuideEvent::RemoteClassified {
                        capture_id,
                        label: result.label.clone(),
                        confidence: result.confidence,
                        timestamp: Utc::now(),
                    });
                    return self.resolve_remote(&mut session, result).await;
                }
                Err(e) => {
                    tracing::warn!(
                        capture_id = %capture_id,
                        error = %e,
                        "Remote classification failed, falling back to on-device model"
                    );
                    self.event_bus.emit_lossy(GuideEvent::RemoteFallback {
                        capture_id,
                        reason: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        } else {
            tracing::info!(capture_id = %capture_id, "Offline, using on-device model");
        }

        // On-device fallback
        self.transition(&mut session, WorkflowState::ClassifyingLocal)
            .await;

        let local_result = tokio::select! {
            _ = cancel.cancelled() => {
                return self.finish_cancelled(&mut session).await;
            }
            result = self.local.classify(image) => result,
        };

        match local_result {
            Ok(result) => {
                if cancel.is_cancelled() {
                    return self.finish_cancelled(&mut session).await;
                }
                self.event_bus.emit_lossy(GuideEvent::LocalClassified {
                    capture_id,
                    label: result.label.clone(),
                    confidence: result.confidence,
                    timestamp: Utc::now(),
                });
                self.resolve_local(&mut session, &capture, result).await
            }
            Err(e) => {
                tracing::error!(
                    capture_id = %capture_id,
                    error = %e,
                    "On-device classification failed"
                );
                self.event_bus.emit_lossy(GuideEvent::IdentificationFailed {
                    capture_id,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.transition(&mut session, WorkflowState::Resolved).await;
                Err(IdentError::Local(e))
            }
        }
    }

    /// Remote labels match on display name or class tag
    async fn resolve_remote(
        &self,
        session: &mut IdentSession,
        result: ClassificationResult,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = session.capture_id.unwrap_or_default();

        if result.confidence < CONFIDENCE_THRESHOLD {
            return self.finish_low_confidence(session, result).await;
        }

        let text = labels::display_name(&result.label);
        match self.directory.find_by_name_or_tag(text).await {
            Some(landmark) => {
                self.finish_resolved(session, landmark, result).await
            }
            None => {
                tracing::info!(
                    capture_id = %capture_id,
                    label = %result.label,
                    "No landmark entry for remote label"
                );
                self.finish_not_found(session, result).await
            }
        }
    }

    /// On-device labels match on display name only; a resolved result is
    /// queued for remote submission.
    async fn resolve_local(
        &self,
        session: &mut IdentSession,
        capture: &CaptureRequest,
        result: ClassificationResult,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = session.capture_id.unwrap_or_default();

        if result.confidence < CONFIDENCE_THRESHOLD {
            return self.finish_low_confidence(session, result).await;
        }

        let text = labels::display_name(&result.label);
        match self.directory.find_by_name(text).await {
            Some(landmark) => {
                let queue_length = self
                    .queue
                    .push(PendingUpload::new(capture.clone(), result.label.clone()))
                    .await;
                tracing::info!(
                    capture_id = %capture_id,
                    queue_length,
                    "Capture queued for remote submission"
                );
                self.event_bus.emit_lossy(GuideEvent::UploadQueued {
                    capture_id,
                    queue_length,
                    timestamp: Utc::now(),
                });
                self.finish_resolved(session, landmark, result).await
            }
            None => {
                tracing::info!(
                    capture_id = %capture_id,
                    label = %result.label,
                    "No landmark entry for on-device label"
                );
                self.finish_not_found(session, result).await
            }
        }
    }

    async fn finish_resolved(
        &self,
        session: &mut IdentSession,
        landmark: guide_common::Landmark,
        result: ClassificationResult,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = session.capture_id.unwrap_or_default();
        self.transition(session, WorkflowState::Resolved).await;
        tracing::info!(
            capture_id = %capture_id,
            landmark = %landmark.name,
            confidence = result.confidence,
            "Landmark resolved"
        );
        self.event_bus.emit_lossy(GuideEvent::LandmarkResolved {
            capture_id,
            landmark_id: landmark.id,
            landmark_name: landmark.name.clone(),
            confidence: result.confidence,
            timestamp: Utc::now(),
        });
        Ok(IdentOutcome::Resolved {
            landmark,
            label: result.label,
            confidence: result.confidence,
            origin: result.origin,
        })
    }

    async fn finish_low_confidence(
        &self,
        session: &mut IdentSession,
        result: ClassificationResult,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = session.capture_id.unwrap_or_default();
        self.transition(session, WorkflowState::Resolved).await;
        tracing::info!(
            capture_id = %capture_id,
            label = %result.label,
            confidence = result.confidence,
            "Confidence below threshold"
        );
        self.event_bus.emit_lossy(GuideEvent::LowConfidence {
            capture_id,
            label: result.label.clone(),
            confidence_percent: result.confidence_percent(),
            timestamp: Utc::now(),
        });
        Ok(IdentOutcome::LowConfidence {
            label: result.label,
            confidence: result.confidence,
        })
    }

    async fn finish_not_found(
        &self,
        session: &mut IdentSession,
        result: ClassificationResult,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = session.capture_id.unwrap_or_default();
        self.transition(session, WorkflowState::Resolved).await;
        self.event_bus.emit_lossy(GuideEvent::LandmarkNotFound {
            capture_id,
            label: result.label.clone(),
            timestamp: Utc::now(),
        });
        Ok(IdentOutcome::NotFound {
            label: result.label,
            confidence: result.confidence,
        })
    }

    async fn finish_cancelled(
        &self,
        session: &mut IdentSession,
    ) -> Result<IdentOutcome, IdentError> {
        let capture_id = session.capture_id.unwrap_or_default();
        self.transition(session, WorkflowState::Cancelled).await;
        tracing::info!(capture_id = %capture_id, "Capture cancelled");
        self.event_bus.emit_lossy(GuideEvent::CaptureCancelled {
            capture_id,
            timestamp: Utc::now(),
        });
        Err(IdentError::Cancelled)
    }

    /// Advance the session, publishing to the status snapshot only while
    /// this capture still owns it. A superseded capture keeps mutating
    /// its own session but no longer touches shared state.
    async fn transition(&self, session: &mut IdentSession, state: WorkflowState) {
        let transition = session.transition_to(state);
        tracing::debug!(
            capture_id = %transition.capture_id,
            old_state = ?transition.old_state,
            new_state = ?transition.new_state,
            "Workflow state transition"
        );
        let mut current = self.current.write().await;
        if current.capture_id == session.capture_id {
            *current = session.clone();
        }
    }
}
