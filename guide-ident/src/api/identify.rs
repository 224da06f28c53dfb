//! Identification workflow API handlers
//!
//! POST /identify, POST /identify/cancel, GET /identify/status,
//! POST /uploads/retry

use axum::{
    extract::{Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{CaptureRequest, IdentOutcome},
    workflow::WorkflowStatus,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct IdentifyParams {
    /// Cancel any in-flight capture instead of rejecting with 409
    #[serde(default)]
    pub supersede: bool,
}

/// POST /identify response
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub capture_id: Uuid,
    pub message: String,
    #[serde(flatten)]
    pub result: IdentOutcome,
}

/// POST /identify/cancel response
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// POST /uploads/retry response
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub delivered: usize,
    pub remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stalled: Option<String>,
}

/// POST /identify
///
/// Multipart upload with an `image` part. Runs the full identification
/// workflow and returns the outcome. 409 if a capture is already in
/// flight, unless `?supersede=true`.
pub async fn identify(
    State(state): State<AppState>,
    Query(params): Query<IdentifyParams>,
    mut multipart: Multipart,
) -> ApiResult<Json<IdentifyResponse>> {
    let mut image: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("image") => {
                file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable image part: {}", e)))?;
                image = Some(bytes.to_vec());
            }
            _ => continue,
        }
    }

    let image = image.ok_or_else(|| ApiError::BadRequest("missing 'image' part".to_string()))?;
    if image.is_empty() {
        return Err(ApiError::BadRequest("empty 'image' part".to_string()));
    }

    let capture = CaptureRequest::from_bytes(image, file_name);
    let capture_id = capture.capture_id;
    tracing::info!(capture_id = %capture_id, supersede = params.supersede, "Identify request received");

    let result = if params.supersede {
        state.workflow.supersede(capture).await?
    } else {
        state.workflow.start(capture).await?
    };

    Ok(Json(IdentifyResponse {
        capture_id,
        message: result.message(),
        result,
    }))
}

/// POST /identify/cancel
///
/// Cancel the in-flight capture. Idempotent; succeeds even when nothing
/// is running.
pub async fn cancel_identify(State(state): State<AppState>) -> Json<CancelResponse> {
    state.workflow.cancel().await;
    Json(CancelResponse { cancelled: true })
}

/// GET /identify/status
pub async fn identify_status(State(state): State<AppState>) -> Json<WorkflowStatus> {
    Json(state.workflow.status().await)
}

/// POST /uploads/retry
///
/// Drain the pending upload queue now instead of waiting for the next
/// connectivity change.
pub async fn retry_uploads(State(state): State<AppState>) -> Json<RetryResponse> {
    let outcome = state.workflow.retry_pending().await;
    Json(RetryResponse {
        delivered: outcome.delivered,
        remaining: outcome.remaining,
        stalled: outcome.stalled,
    })
}

/// Build identification workflow routes
pub fn identify_routes() -> Router<AppState> {
    Router::new()
        .route("/identify", post(identify))
        .route("/identify/cancel", post(cancel_identify))
        .route("/identify/status", get(identify_status))
        .route("/uploads/retry", post(retry_uploads))
}
