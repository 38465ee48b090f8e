//! Error types for the watermark pipeline.
//!
//! Two families live here:
//!
//! - [`WatermarkError`] is terminal. It ends a request and is surfaced to the
//!   caller together with an HTTP-style status hint.
//! - [`RenderFault`] is recoverable. Compositors log it with the elapsed time
//!   and carry on with whatever raster state they have.

use thiserror::Error;

/// Terminal failures of a watermark request.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// Malformed input: bad URL, neither or both watermark inputs, missing font.
    #[error("{0}")]
    Validation(String),

    /// The remote server answered with a non-success status.
    #[error("Failed to download image from {url}. Status code: {status}")]
    Fetch { url: String, status: u16 },

    /// The request never produced a usable response (DNS, connect, timeout, body read).
    #[error("Failed to download image from {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Unsupported content type: {}", .content_type.as_deref().unwrap_or("none"))]
    UnsupportedContentType { content_type: Option<String> },

    #[error("Image body of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("The watermark image is larger than the main image. Please use a smaller watermark.")]
    SizeConstraint,

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WatermarkError {
    /// Status code the boundary should answer with, when the failure implies one.
    ///
    /// Transport failures carry no remote status; callers fall back to 500.
    pub fn status_hint(&self) -> Option<u16> {
        match self {
            // 400 Bad Request
            WatermarkError::Validation(_)
            | WatermarkError::Decode(_)
            | WatermarkError::SizeConstraint => Some(400),

            // Remote status passes straight through
            WatermarkError::Fetch { status, .. } => Some(*status),
            WatermarkError::Transport { .. } => None,

            // 413 Payload Too Large
            WatermarkError::PayloadTooLarge { .. } => Some(413),

            // 415 Unsupported Media Type
            WatermarkError::UnsupportedContentType { .. } => Some(415),

            // 500 Internal Server Error
            WatermarkError::Encode(_) | WatermarkError::Config(_) => Some(500),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WatermarkError::Validation(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        WatermarkError::Decode(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        WatermarkError::Config(message.into())
    }
}

/// Faults raised while transforming or drawing a watermark.
///
/// These never fail a request; they are logged with the elapsed duration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderFault {
    #[error("Cannot rotate watermark by {angle} degrees")]
    Rotation { angle: f32 },

    #[error("Font '{font}' could not be resolved: {reason}")]
    FontResolution { font: String, reason: String },

    #[error("Text draw failed: {0}")]
    Draw(String),
}
