//! Pending upload queue
//!
//! Captures identified on-device while offline wait here until the
//! classification server is reachable again. Strict FIFO: a drain
//! delivers entries oldest-first and stops at the first failure, leaving
//! the failed entry at the head for the next attempt.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use uuid::Uuid;

use guide_common::events::{EventBus, GuideEvent};

use crate::models::CaptureRequest;
use crate::services::remote_classifier::RemoteClassifier;

/// A capture waiting for remote submission
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub capture: CaptureRequest,

    /// Label the on-device model assigned, sent as `offline_result`
    pub offline_label: String,

    pub queued_at: DateTime<Utc>,
}

impl PendingUpload {
    pub fn new(capture: CaptureRequest, offline_label: String) -> Self {
        Self {
            capture,
            offline_label,
            queued_at: Utc::now(),
        }
    }
}

/// Result of a drain pass
#[derive(Debug)]
pub struct DrainOutcome {
    /// Entries delivered this pass
    pub delivered: usize,

    /// Entries still queued after the pass
    pub remaining: usize,

    /// Why the pass stopped early, if it did
    pub stalled: Option<String>,
}

/// In-memory FIFO queue of pending uploads.
///
/// Queue contents do not survive a process restart.
pub struct UploadQueue {
    entries: Mutex<VecDeque<PendingUpload>>,
    // Held for the duration of a drain pass; concurrent triggers skip
    drain_lock: Mutex<()>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            drain_lock: Mutex::new(()),
        }
    }

    /// Append an upload, returning the new queue length
    pub async fn push(&self, upload: PendingUpload) -> usize {
        let mut entries = self.entries.lock().await;
        entries.push_back(upload);
        entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Capture ids in queue order, oldest first
    pub async fn capture_ids(&self) -> Vec<Uuid> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|u| u.capture.capture_id)
            .collect()
    }

    /// Deliver queued uploads oldest-first, stopping at the first failure.
    ///
    /// An entry is removed only after the server accepts it, so a crash or
    /// failure mid-pass never loses captures. Only one drain runs at a
    /// time; overlapping triggers return immediately.
    pub async fn drain(&self, remote: &dyn RemoteClassifier, event_bus: &EventBus) -> DrainOutcome {
        let _guard = match self.drain_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("Drain already in progress, skipping");
                return DrainOutcome {
                    delivered: 0,
                    remaining: self.len().await,
                    stalled: None,
                };
            }
        };

        let mut delivered = 0;
        let mut stalled = None;

        loop {
            // Peek without holding the entry lock across the network call
            let head = {
                let entries = self.entries.lock().await;
                entries.front().cloned()
            };
            let Some(upload) = head else { break };

            let capture_id = upload.capture.capture_id;
            let attempt = async {
                let image = upload
                    .capture
                    .image
                    .read()
                    .await
                    .map_err(|e| format!("unreadable image: {}", e))?;
                remote
                    .classify(
                        image,
                        &upload.capture.upload_file_name(),
                        Some(&upload.offline_label),
                    )
                    .await
                    .map_err(|e| e.to_string())
            };

            match attempt.await {
                Ok(_) => {
                    let remaining = {
                        let mut entries = self.entries.lock().await;
                        entries.pop_front();
                        entries.len()
                    };
                    delivered += 1;
                    tracing::info!(capture_id = %capture_id, remaining, "Queued upload delivered");
                    event_bus.emit_lossy(GuideEvent::UploadDelivered {
                        capture_id,
                        remaining,
                        timestamp: Utc::now(),
                    });
                }
                Err(reason) => {
                    let remaining = self.len().await;
                    tracing::warn!(
                        capture_id = %capture_id,
                        remaining,
                        reason = %reason,
                        "Upload drain stalled"
                    );
                    event_bus.emit_lossy(GuideEvent::UploadDrainStalled {
                        remaining,
                        reason: reason.clone(),
                        timestamp: Utc::now(),
                    });
                    stalled = Some(reason);
                    break;
                }
            }
        }

        DrainOutcome {
            delivered,
            remaining: self.len().await,
            stalled,
        }
    }
}

impl Default for UploadQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationResult, ClassifierOrigin};
    use crate::services::remote_classifier::RemoteError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds until `fail_after` deliveries, then fails every call
    struct FlakyRemote {
        fail_after: usize,
        calls: AtomicUsize,
        hints: Mutex<Vec<Option<String>>>,
    }

    impl FlakyRemote {
        fn new(fail_after: usize) -> Self {
            Self {
                fail_after,
                calls: AtomicUsize::new(0),
                hints: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl RemoteClassifier for FlakyRemote {
        async fn classify(
            &self,
            _image: Vec<u8>,
            _file_name: &str,
            offline_result: Option<&str>,
        ) -> Result<ClassificationResult, RemoteError> {
            self.hints
                .lock()
                .await
                .push(offline_result.map(str::to_string));
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_after {
                Ok(ClassificationResult {
                    label: "НОВАТ".to_string(),
                    confidence: 0.9,
                    origin: ClassifierOrigin::Remote,
                })
            } else {
                Err(RemoteError::Network("connection refused".to_string()))
            }
        }
    }

    fn upload(label: &str) -> PendingUpload {
        PendingUpload::new(
            CaptureRequest::from_bytes(vec![0xff, 0xd8], None),
            label.to_string(),
        )
    }

    #[tokio::test]
    async fn drain_delivers_fifo_and_stops_at_failure() {
        let queue = UploadQueue::new();
        let first = upload("novat");
        let second = upload("old_house");
        let third = upload("theater_globus");
        let stuck_id = second.capture.capture_id;
        queue.push(first).await;
        queue.push(second).await;
        queue.push(third).await;

        let remote = FlakyRemote::new(1);
        let outcome = queue.drain(&remote, &EventBus::new(16)).await;

        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.remaining, 2);
        assert!(outcome.stalled.is_some());
        // Failed entry stays at the head for the next pass
        assert_eq!(queue.capture_ids().await[0], stuck_id);
    }

    #[tokio::test]
    async fn drain_sends_offline_label_as_hint() {
        let queue = UploadQueue::new();
        queue.push(upload("novat")).await;

        let remote = FlakyRemote::new(usize::MAX);
        let outcome = queue.drain(&remote, &EventBus::new(16)).await;

        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.remaining, 0);
        assert_eq!(
            remote.hints.lock().await.as_slice(),
            &[Some("novat".to_string())]
        );
    }

    #[tokio::test]
    async fn drain_emits_delivery_events() {
        let queue = UploadQueue::new();
        let queued = upload("novat");
        let capture_id = queued.capture.capture_id;
        queue.push(queued).await;

        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        queue.drain(&FlakyRemote::new(usize::MAX), &bus).await;

        match events.recv().await.unwrap() {
            GuideEvent::UploadDelivered {
                capture_id: id,
                remaining,
                ..
            } => {
                assert_eq!(id, capture_id);
                assert_eq!(remaining, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_queue_drain_is_a_noop() {
        let queue = UploadQueue::new();
        let outcome = queue.drain(&FlakyRemote::new(0), &EventBus::new(16)).await;
        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.remaining, 0);
        assert!(outcome.stalled.is_none());
    }
}
