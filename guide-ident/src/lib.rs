//! guide-ident library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult, IdentError};
pub use crate::workflow::{IdentWorkflow, CONFIDENCE_THRESHOLD};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use guide_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Identification workflow engine
    pub workflow: Arc<IdentWorkflow>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(workflow: Arc<IdentWorkflow>, event_bus: EventBus) -> Self {
        Self {
            workflow,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::identify_routes())
        .merge(api::event_routes())
        .merge(api::health_routes())
        // Mobile clients call from a different origin
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
