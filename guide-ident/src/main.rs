//! guide-ident - Photo Identification Microservice
//!
//! Identifies landmarks in captured photos via a remote classification
//! server, falling back to an on-device model when offline, and queues
//! offline results for later remote submission.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use guide_common::events::EventBus;
use guide_ident::config::{Args, ServiceConfig};
use guide_ident::services::{
    ConnectivityMonitor, HttpLandmarkDirectory, HttpRemoteClassifier, LocalClassifier, TcpProbe,
    UnconfiguredModel, UploadQueue,
};
use guide_ident::{AppState, IdentWorkflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::resolve(&args)?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("Starting guide-ident (Photo Identification) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Classifier: {}", config.classifier_url);
    info!("Directory: {}", config.directory_url);

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);

    // Collaborators
    let remote = Arc::new(HttpRemoteClassifier::new(
        config.classifier_url.clone(),
        config.request_timeout,
    )?);
    warn!("No on-device inference runtime linked; offline captures will report failure");
    let local = Arc::new(LocalClassifier::new(Arc::new(UnconfiguredModel)));
    let directory = Arc::new(HttpLandmarkDirectory::new(
        config.directory_url.clone(),
        config.request_timeout,
    )?);
    let connectivity = Arc::new(ConnectivityMonitor::new(true, event_bus.clone()));
    let queue = Arc::new(UploadQueue::new());

    // Background reachability polling
    let probe = Arc::new(TcpProbe::new(
        config.probe_addr.clone(),
        config.request_timeout,
    ));
    let _poller = connectivity.spawn_poller(probe, config.probe_interval);

    // Workflow engine and the queue drain on connectivity return
    let workflow = Arc::new(IdentWorkflow::new(
        remote,
        local,
        directory,
        connectivity,
        queue,
        event_bus.clone(),
    ));
    let _drain = workflow.spawn_connectivity_drain();

    // Build router and serve
    let state = AppState::new(workflow, event_bus);
    let app = guide_ident::build_router(state);

    let addr = format!("127.0.0.1:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
