//! Landmark directory lookup
//!
//! Fetches the landmark catalog from the guide backend and resolves
//! classifier labels against it. Directory failures degrade to "no
//! match" rather than failing the capture; the classifier result still
//! reaches the user as an unresolved label.

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use guide_common::models::LandmarksResponse;
use guide_common::Landmark;

const LANDMARKS_PATH: &str = "/landmarks";

/// Catalog entries stay fresh this long before a refetch
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Directory lookup seam
#[async_trait::async_trait]
pub trait LandmarkDirectory: Send + Sync {
    /// Match on display name or class tag (remote results carry either)
    async fn find_by_name_or_tag(&self, text: &str) -> Option<Landmark>;

    /// Match on display name only (on-device results)
    async fn find_by_name(&self, text: &str) -> Option<Landmark>;
}

struct CacheEntry {
    landmarks: Vec<Landmark>,
    fetched_at: Instant,
}

/// Backend-served landmark directory with a TTL cache
pub struct HttpLandmarkDirectory {
    http_client: reqwest::Client,
    base_url: String,
    cache: RwLock<Option<CacheEntry>>,
}

impl HttpLandmarkDirectory {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, guide_common::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| guide_common::Error::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: RwLock::new(None),
        })
    }

    /// Current catalog, from cache when fresh.
    ///
    /// Fetch failures return the empty list, mirroring lookup semantics:
    /// an unreachable directory means "nothing matched", not an error.
    pub async fn landmarks(&self) -> Vec<Landmark> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.fetched_at.elapsed() < CACHE_TTL {
                    return entry.landmarks.clone();
                }
            }
        }

        match self.fetch().await {
            Ok(landmarks) => {
                let mut cache = self.cache.write().await;
                *cache = Some(CacheEntry {
                    landmarks: landmarks.clone(),
                    fetched_at: Instant::now(),
                });
                landmarks
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch landmark catalog");
                // Serve a stale catalog over nothing
                let cache = self.cache.read().await;
                cache
                    .as_ref()
                    .map(|entry| entry.landmarks.clone())
                    .unwrap_or_default()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Landmark>, guide_common::Error> {
        let url = format!("{}{}", self.base_url, LANDMARKS_PATH);
        tracing::debug!(url = %url, "Fetching landmark catalog");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| guide_common::Error::Internal(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(guide_common::Error::Internal(format!(
                "landmark catalog request returned {}",
                status
            )));
        }

        let body: LandmarksResponse = response
            .json()
            .await
            .map_err(|e| guide_common::Error::Internal(e.to_string()))?;

        tracing::info!(count = body.landmarks.len(), "Landmark catalog refreshed");
        Ok(body.landmarks)
    }
}

#[async_trait::async_trait]
impl LandmarkDirectory for HttpLandmarkDirectory {
    async fn find_by_name_or_tag(&self, text: &str) -> Option<Landmark> {
        self.landmarks()
            .await
            .into_iter()
            .find(|lm| lm.matches_name_or_tag(text))
    }

    async fn find_by_name(&self, text: &str) -> Option<Landmark> {
        self.landmarks()
            .await
            .into_iter()
            .find(|lm| lm.matches_name(text))
    }
}

/// Fixed in-memory directory, used when no backend is available
pub struct StaticLandmarkDirectory {
    landmarks: Vec<Landmark>,
}

impl StaticLandmarkDirectory {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }
}

#[async_trait::async_trait]
impl LandmarkDirectory for StaticLandmarkDirectory {
    async fn find_by_name_or_tag(&self, text: &str) -> Option<Landmark> {
        self.landmarks
            .iter()
            .find(|lm| lm.matches_name_or_tag(text))
            .cloned()
    }

    async fn find_by_name(&self, text: &str) -> Option<Landmark> {
        self.landmarks
            .iter()
            .find(|lm| lm.matches_name(text))
            .cloned()
    }
}
