//! Photo capture request

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

/// Where a capture's image bytes live.
///
/// Queued uploads keep the source rather than a decoded image, so a
/// file-backed capture is re-read at delivery time.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image on local storage
    File(PathBuf),
    /// Image already in memory (e.g. received over HTTP)
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Load the raw image bytes
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ImageSource::File(path) => tokio::fs::read(path).await,
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// A single photo capture submitted for identification
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Unique capture identifier
    pub capture_id: Uuid,

    /// Image payload
    pub image: ImageSource,

    /// Client-supplied file name, if any
    pub file_name: Option<String>,

    /// Capture creation time
    pub created_at: DateTime<Utc>,
}

impl CaptureRequest {
    pub fn from_bytes(bytes: Vec<u8>, file_name: Option<String>) -> Self {
        Self {
            capture_id: Uuid::new_v4(),
            image: ImageSource::Bytes(bytes),
            file_name,
            created_at: Utc::now(),
        }
    }

    pub fn from_file(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            capture_id: Uuid::new_v4(),
            image: ImageSource::File(path),
            file_name,
            created_at: Utc::now(),
        }
    }

    /// File name used for the multipart upload part
    pub fn upload_file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("{}.jpg", self.capture_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bytes_source_reads_back_payload() {
        let capture = CaptureRequest::from_bytes(vec![1, 2, 3], Some("shot.jpg".into()));
        assert_eq!(capture.image.read().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(capture.upload_file_name(), "shot.jpg");
    }

    #[tokio::test]
    async fn file_source_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpeg-bytes").unwrap();
        let capture = CaptureRequest::from_file(path);
        assert_eq!(capture.image.read().await.unwrap(), b"jpeg-bytes");
        assert_eq!(capture.upload_file_name(), "photo.jpg");
    }

    #[test]
    fn default_upload_name_uses_capture_id() {
        let capture = CaptureRequest::from_bytes(vec![], None);
        assert_eq!(
            capture.upload_file_name(),
            format!("{}.jpg", capture.capture_id)
        );
    }
}
