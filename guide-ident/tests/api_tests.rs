//! HTTP API tests against the assembled router

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use guide_ident::services::local_classifier::LocalModel;
use guide_ident::{build_router, AppState};

use common::*;

const BOUNDARY: &str = "test-boundary-7a3f";

fn multipart_image_body(image: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn identify_request(image: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/identify")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_image_body(image)))
        .unwrap()
}

fn app(h: &TestHarness) -> axum::Router {
    build_router(AppState::new(
        Arc::clone(&h.workflow),
        h.event_bus.clone(),
    ))
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn identify_returns_resolved_landmark() {
    let remote = Arc::new(ScriptedRemote::new(vec![remote_ok("НОВАТ", 0.93)]));
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), true);

    let response = app(&h).oneshot(identify_request(&tiny_png())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["outcome"], "resolved");
    assert_eq!(body["landmark"]["name"], "НОВАТ");
    assert_eq!(body["origin"], "remote");
    assert!(body["capture_id"].is_string());
}

#[tokio::test]
async fn identify_without_image_part_is_bad_request() {
    let remote = Arc::new(ScriptedRemote::new(vec![]));
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), true);

    let request = Request::builder()
        .method("POST")
        .uri("/identify")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();

    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn identify_while_busy_is_conflict() {
    let remote = Arc::new(
        ScriptedRemote::new(vec![remote_ok("НОВАТ", 0.9)])
            .with_delay(Duration::from_millis(300)),
    );
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), true);

    let router = app(&h);
    let first_router = router.clone();
    let image = tiny_png();
    let first_image = image.clone();
    let first = tokio::spawn(async move {
        first_router
            .oneshot(identify_request(&first_image))
            .await
            .unwrap()
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = router.oneshot(identify_request(&image)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let first_response = first.await.unwrap();
    assert_eq!(first_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cancel_endpoint_is_idempotent() {
    let remote = Arc::new(ScriptedRemote::new(vec![]));
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), true);

    let request = Request::builder()
        .method("POST")
        .uri("/identify/cancel")
        .body(Body::empty())
        .unwrap();
    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["cancelled"], true);
}

#[tokio::test]
async fn status_reports_idle_service() {
    let remote = Arc::new(ScriptedRemote::new(vec![]));
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), true);

    let request = Request::builder()
        .uri("/identify/status")
        .body(Body::empty())
        .unwrap();
    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["state"], "IDLE");
    assert_eq!(body["pending_uploads"], 0);
    assert_eq!(body["reachable"], true);
}

#[tokio::test]
async fn retry_endpoint_reports_drain_outcome() {
    let remote = Arc::new(ScriptedRemote::new(vec![]));
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), true);

    let request = Request::builder()
        .method("POST")
        .uri("/uploads/retry")
        .body(Body::empty())
        .unwrap();
    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["delivered"], 0);
    assert_eq!(body["remaining"], 0);
}

#[tokio::test]
async fn health_reports_module_and_backend_state() {
    let remote = Arc::new(ScriptedRemote::new(vec![]));
    let model = Arc::new(FixedModel::new(vec![0.0; 5]));
    let h = harness(remote, model as Arc<dyn LocalModel>, catalog(), false);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(&h).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "guide-ident");
    assert_eq!(body["backend_reachable"], false);
}
