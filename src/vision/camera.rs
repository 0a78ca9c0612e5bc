//! Camera frame capture

use async_trait::async_trait;

use crate::{Error, Result};

/// One captured camera frame (encoded image bytes, typically JPEG)
#[derive(Debug, Clone)]
pub struct Frame(pub Vec<u8>);

/// Source of camera frames
///
/// A capture error is treated as unrecoverable by the emotion loop and
/// terminates sampling for the rest of the session, so implementations
/// should only fail when the device is genuinely gone.
#[async_trait]
pub trait FrameSource: Send {
    /// Capture one frame
    async fn capture(&mut self) -> Result<Frame>;
}

/// Bound on one snapshot request so a hung camera cannot stall shutdown
const CAPTURE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Fetches frames from an IP camera snapshot endpoint
pub struct SnapshotCamera {
    client: reqwest::Client,
    url: String,
}

impl SnapshotCamera {
    /// Create a camera reading JPEG snapshots from `url`
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl FrameSource for SnapshotCamera {
    async fn capture(&mut self) -> Result<Frame> {
        let response = self
            .client
            .get(&self.url)
            .timeout(CAPTURE_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Camera(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Camera(format!(
                "snapshot endpoint returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Camera(e.to_string()))?;

        if bytes.is_empty() {
            return Err(Error::Camera("empty snapshot response".to_string()));
        }

        tracing::debug!(bytes = bytes.len(), "frame captured");
        Ok(Frame(bytes.to_vec()))
    }
}
