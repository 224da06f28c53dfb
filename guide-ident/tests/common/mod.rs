//! Shared test fixtures: scripted collaborators and a workflow builder
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use guide_common::events::EventBus;
use guide_common::Landmark;
use guide_ident::models::{ClassificationResult, ClassifierOrigin};
use guide_ident::services::local_classifier::{LocalError, LocalModel};
use guide_ident::services::remote_classifier::{RemoteClassifier, RemoteError};
use guide_ident::services::{
    ConnectivityMonitor, LocalClassifier, StaticLandmarkDirectory, UploadQueue,
};
use guide_ident::IdentWorkflow;

/// Remote classifier that replays a scripted list of responses
pub struct ScriptedRemote {
    responses: Mutex<VecDeque<Result<ClassificationResult, RemoteError>>>,
    pub calls: AtomicUsize,
    pub hints: Mutex<Vec<Option<String>>>,
    pub delay: Option<Duration>,
}

impl ScriptedRemote {
    pub fn new(responses: Vec<Result<ClassificationResult, RemoteError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteClassifier for ScriptedRemote {
    async fn classify(
        &self,
        _image: Vec<u8>,
        _file_name: &str,
        offline_result: Option<&str>,
    ) -> Result<ClassificationResult, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hints
            .lock()
            .await
            .push(offline_result.map(str::to_string));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Network("script exhausted".to_string())))
    }
}

pub fn remote_ok(label: &str, confidence: f64) -> Result<ClassificationResult, RemoteError> {
    Ok(ClassificationResult {
        label: label.to_string(),
        confidence,
        origin: ClassifierOrigin::Remote,
    })
}

pub fn remote_err(reason: &str) -> Result<ClassificationResult, RemoteError> {
    Err(RemoteError::Network(reason.to_string()))
}

/// On-device model returning fixed scores
pub struct FixedModel {
    scores: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedModel {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LocalModel for FixedModel {
    fn run(&self, _input: &ndarray::Array3<f32>) -> Result<Vec<f32>, LocalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// On-device model that blocks before answering
pub struct SlowModel {
    scores: Vec<f32>,
    delay: Duration,
}

impl SlowModel {
    pub fn new(scores: Vec<f32>, delay: Duration) -> Self {
        Self { scores, delay }
    }
}

impl LocalModel for SlowModel {
    fn run(&self, _input: &ndarray::Array3<f32>) -> Result<Vec<f32>, LocalError> {
        std::thread::sleep(self.delay);
        Ok(self.scores.clone())
    }
}

/// On-device model that always fails
pub struct BrokenModel;

impl LocalModel for BrokenModel {
    fn run(&self, _input: &ndarray::Array3<f32>) -> Result<Vec<f32>, LocalError> {
        Err(LocalError::Model("runtime crashed".to_string()))
    }
}

pub fn landmark(id: i64, name: &str, tag: &str) -> Landmark {
    Landmark {
        id,
        name: name.to_string(),
        description: format!("{} description", name),
        photo_url: String::new(),
        location: "Novosibirsk".to_string(),
        coordinates: String::new(),
        tag: tag.to_string(),
    }
}

/// Directory entries matching the on-device label set
pub fn catalog() -> Vec<Landmark> {
    vec![
        landmark(1, "НОВАТ", "novat"),
        landmark(2, "Театр «Старый дом»", "old_house"),
        landmark(3, "Театр «Глобус»", "theater_globus"),
        landmark(4, "Памятник императору Александру III", "monument_alexanderthird"),
    ]
}

/// A small but valid PNG for the on-device preprocessing path
pub fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 80, 40]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub struct TestHarness {
    pub workflow: Arc<IdentWorkflow>,
    pub event_bus: EventBus,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub queue: Arc<UploadQueue>,
}

/// Build a workflow wired to scripted collaborators
pub fn harness(
    remote: Arc<ScriptedRemote>,
    model: Arc<dyn LocalModel>,
    landmarks: Vec<Landmark>,
    reachable: bool,
) -> TestHarness {
    let event_bus = EventBus::new(64);
    let connectivity = Arc::new(ConnectivityMonitor::new(reachable, event_bus.clone()));
    let queue = Arc::new(UploadQueue::new());
    let workflow = Arc::new(IdentWorkflow::new(
        remote,
        Arc::new(LocalClassifier::new(model)),
        Arc::new(StaticLandmarkDirectory::new(landmarks)),
        Arc::clone(&connectivity),
        Arc::clone(&queue),
        event_bus.clone(),
    ));
    TestHarness {
        workflow,
        event_bus,
        connectivity,
        queue,
    }
}
