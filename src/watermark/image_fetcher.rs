//! Remote image fetcher.
//!
//! Downloads an image over HTTP(S), validates the response, and decodes the
//! buffered body into a [`Raster`].
//!
//! # Checks, in order
//!
//! 1. Non-success status: `Fetch` error carrying the remote status
//! 2. Missing or non-`image/*` content type: `UnsupportedContentType` (415)
//! 3. Body larger than the configured limit: `PayloadTooLarge` (413)
//! 4. Undecodable body: `Decode` (400)
//!
//! There is no cache and no retry; every call issues exactly one request.
//!
//! # Example
//!
//! ```ignore
//! use watermarking::watermark::{ImageFetcher, ImageReference};
//!
//! let fetcher = ImageFetcher::new(&FetcherConfig::default())?;
//! let source = ImageReference::parse("imageUrl", "https://picsum.photos/800/600")?;
//! let raster = fetcher.fetch(&source).await?;
//! ```

use super::{ImageReference, Raster, WatermarkError};
use crate::config::FetcherConfig;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// HTTP fetcher for source and watermark images.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    http_client: reqwest::Client,
    max_body_bytes: usize,
}

impl ImageFetcher {
    /// Create a new image fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::Config` if the HTTP client cannot be created
    /// (e.g., TLS configuration issues).
    pub fn new(config: &FetcherConfig) -> Result<Self, WatermarkError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                WatermarkError::config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch and decode the image behind `reference`.
    pub async fn fetch(&self, reference: &ImageReference) -> Result<Raster, WatermarkError> {
        let url = reference.as_str();
        tracing::debug!(url, "Fetching image");

        let response = self
            .http_client
            .get(reference.url().clone())
            .send()
            .await
            .map_err(|e| WatermarkError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Image download failed");
            return Err(WatermarkError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        ensure_image_content_type(content_type.as_deref())?;

        if let Some(length) = response.content_length() {
            self.ensure_within_limit(usize::try_from(length).unwrap_or(usize::MAX))?;
        }

        let body = self.read_body(url, response).await?;
        let raster = decode_image(body).await?;
        tracing::debug!(
            url,
            width = raster.width(),
            height = raster.height(),
            "Image decoded"
        );
        Ok(raster)
    }

    /// Buffer the body chunk by chunk, giving up as soon as it passes the limit.
    /// Chunked responses carry no `Content-Length` to check up front.
    async fn read_body(
        &self,
        url: &str,
        mut response: reqwest::Response,
    ) -> Result<Bytes, WatermarkError> {
        let mut body = BytesMut::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| WatermarkError::Transport {
                url: url.to_string(),
                message: format!("Failed to read body: {}", e),
            })?
        {
            self.ensure_within_limit(body.len().saturating_add(chunk.len()))?;
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    fn ensure_within_limit(&self, size: usize) -> Result<(), WatermarkError> {
        if size > self.max_body_bytes {
            return Err(WatermarkError::PayloadTooLarge {
                size,
                max: self.max_body_bytes,
            });
        }
        Ok(())
    }
}

/// Accept only `image/*` media types. Parameters are ignored, case is not significant.
fn ensure_image_content_type(content_type: Option<&str>) -> Result<(), WatermarkError> {
    let is_image = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|media_type| media_type.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false);

    if is_image {
        Ok(())
    } else {
        Err(WatermarkError::UnsupportedContentType {
            content_type: content_type.map(str::to_string),
        })
    }
}

/// Decode on the blocking pool so large images don't stall the runtime.
async fn decode_image(body: Bytes) -> Result<Raster, WatermarkError> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&body)
            .map(Raster::from_dynamic)
            .map_err(|e| WatermarkError::decode(e.to_string()))
    })
    .await
    .map_err(|e| WatermarkError::decode(format!("Decode task failed: {}", e)))?
}
