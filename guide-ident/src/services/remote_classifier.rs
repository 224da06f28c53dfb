//! Remote classification client
//!
//! Posts the captured image as multipart form data to the classification
//! server's `/predict` endpoint. Queued offline results ride along in an
//! `offline_result` text part so the server can reconcile them.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{ClassificationResult, ClassifierOrigin};

const PREDICT_PATH: &str = "/predict";
const USER_AGENT: &str = "guide-ident/0.1.0";

/// Remote classifier errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Classification server response payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictResponse {
    pub landmark: String,
    pub confidence: f64,
}

/// Remote classification seam, mocked in tests
#[async_trait::async_trait]
pub trait RemoteClassifier: Send + Sync {
    /// Classify an image, optionally reporting an earlier offline result
    async fn classify(
        &self,
        image: Vec<u8>,
        file_name: &str,
        offline_result: Option<&str>,
    ) -> Result<ClassificationResult, RemoteError>;
}

/// Classification server client
pub struct HttpRemoteClassifier {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRemoteClassifier {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl RemoteClassifier for HttpRemoteClassifier {
    async fn classify(
        &self,
        image: Vec<u8>,
        file_name: &str,
        offline_result: Option<&str>,
    ) -> Result<ClassificationResult, RemoteError> {
        let image_part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().part("image", image_part);
        if let Some(offline) = offline_result {
            form = form.text("offline_result", offline.to_string());
        }

        let url = format!("{}{}", self.base_url, PREDICT_PATH);
        tracing::debug!(url = %url, file_name = %file_name, "Sending image for classification");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(status.as_u16(), body));
        }

        let predict: PredictResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        if !(0.0..=1.0).contains(&predict.confidence) {
            return Err(RemoteError::Parse(format!(
                "confidence {} outside [0.0, 1.0]",
                predict.confidence
            )));
        }

        tracing::info!(
            landmark = %predict.landmark,
            confidence = predict.confidence,
            "Remote classification succeeded"
        );

        Ok(ClassificationResult {
            label: predict.landmark,
            confidence: predict.confidence,
            origin: ClassifierOrigin::Remote,
        })
    }
}
