//! Connectivity monitoring
//!
//! Tracks whether the classification backend is reachable and broadcasts
//! changes over a watch channel. The upload drain task watches for the
//! offline-to-online edge; the workflow only reads the current value.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use guide_common::events::{EventBus, GuideEvent};

/// Reachability check seam
#[async_trait::async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> bool;
}

/// TCP connect probe against a well-known address
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: String, timeout: Duration) -> Self {
        Self { addr, timeout }
    }
}

#[async_trait::async_trait]
impl ReachabilityProbe for TcpProbe {
    async fn probe(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}

/// Shared reachability state
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
    event_bus: EventBus,
}

impl ConnectivityMonitor {
    pub fn new(initially_reachable: bool, event_bus: EventBus) -> Self {
        let (tx, _rx) = watch::channel(initially_reachable);
        Self { tx, event_bus }
    }

    /// Current reachability
    pub fn is_reachable(&self) -> bool {
        *self.tx.borrow()
    }

    /// Watch for reachability changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Record a probe result, notifying watchers only on change
    pub fn set_reachable(&self, reachable: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != reachable {
                *current = reachable;
                true
            } else {
                false
            }
        });

        if changed {
            tracing::info!(reachable, "Connectivity changed");
            self.event_bus.emit_lossy(GuideEvent::ConnectivityChanged {
                reachable,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Spawn a background poller that keeps the state fresh
    pub fn spawn_poller(
        self: &Arc<Self>,
        probe: Arc<dyn ReachabilityProbe>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let reachable = probe.probe().await;
                monitor.set_reachable(reachable);
                tokio::time::sleep(interval).await;
            }
        })
    }
}
