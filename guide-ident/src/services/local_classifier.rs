//! On-device fallback classifier
//!
//! Decodes the captured image, resizes it to the model's 224x224 RGB
//! input, normalizes to [0.0, 1.0] and runs whatever inference runtime is
//! plugged in behind [`LocalModel`]. Preprocessing and inference are CPU
//! bound, so they run on the blocking pool.

use ndarray::Array3;
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{ClassificationResult, ClassifierOrigin};
use crate::services::labels::LABELS;

/// Model input edge length in pixels
pub const IMAGE_SIZE: u32 = 224;

/// On-device classifier errors
#[derive(Debug, Error)]
pub enum LocalError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Model inference failed: {0}")]
    Model(String),

    #[error("Model output malformed: expected {expected} scores, got {got}")]
    BadOutput { expected: usize, got: usize },
}

/// Inference runtime seam.
///
/// Takes a 224x224x3 tensor of [0.0, 1.0] floats and returns one score
/// per entry of [`LABELS`], in order.
pub trait LocalModel: Send + Sync {
    fn run(&self, input: &Array3<f32>) -> Result<Vec<f32>, LocalError>;
}

/// Stand-in used when no inference runtime is linked into the binary.
/// Every capture on the offline path then reports a classification
/// failure instead of a bogus label.
pub struct UnconfiguredModel;

impl LocalModel for UnconfiguredModel {
    fn run(&self, _input: &Array3<f32>) -> Result<Vec<f32>, LocalError> {
        Err(LocalError::Model(
            "no on-device inference runtime configured".to_string(),
        ))
    }
}

/// On-device classifier: preprocessing plus a pluggable model
pub struct LocalClassifier {
    model: Arc<dyn LocalModel>,
}

impl LocalClassifier {
    pub fn new(model: Arc<dyn LocalModel>) -> Self {
        Self { model }
    }

    /// Decode, resize and normalize an image into the model input tensor
    pub fn preprocess(bytes: &[u8]) -> Result<Array3<f32>, LocalError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| LocalError::Decode(e.to_string()))?
            .resize_exact(
                IMAGE_SIZE,
                IMAGE_SIZE,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        let tensor = Array3::from_shape_fn(
            (IMAGE_SIZE as usize, IMAGE_SIZE as usize, 3),
            |(y, x, c)| img.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
        );

        Ok(tensor)
    }

    /// Classify an image, returning the best-scoring label
    pub async fn classify(&self, bytes: Vec<u8>) -> Result<ClassificationResult, LocalError> {
        let model = Arc::clone(&self.model);
        let scores = tokio::task::spawn_blocking(move || {
            let input = Self::preprocess(&bytes)?;
            model.run(&input)
        })
        .await
        .map_err(|e| LocalError::Model(e.to_string()))??;

        if scores.len() != LABELS.len() {
            return Err(LocalError::BadOutput {
                expected: LABELS.len(),
                got: scores.len(),
            });
        }

        let (best_index, best_score) = scores
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .ok_or(LocalError::BadOutput {
                expected: LABELS.len(),
                got: 0,
            })?;

        let label = LABELS[best_index].to_string();
        tracing::info!(
            label = %label,
            confidence = best_score,
            "On-device classification succeeded"
        );

        Ok(ClassificationResult {
            label,
            confidence: best_score as f64,
            origin: ClassifierOrigin::Local,
        })
    }
}
