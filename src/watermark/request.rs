//! Validated watermark requests.
//!
//! Raw caller input (strings and optional fields) goes through
//! [`WatermarkRequest::from_parts`]; everything downstream works with the
//! validated form, where "exactly one watermark input" holds by construction.

use super::position::AnchorPosition;
use super::WatermarkError;
use reqwest::Url;
use std::fmt;

/// Absolute `http`/`https` locator of a remote image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference(Url);

impl ImageReference {
    /// Parse an absolute URL. Relative references and non-HTTP schemes are rejected.
    pub fn parse(field: &str, raw: &str) -> Result<Self, WatermarkError> {
        let url = Url::parse(raw.trim()).map_err(|e| {
            WatermarkError::validation(format!("{field} must be a valid absolute URL: {e}"))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(WatermarkError::validation(format!(
                "{field} must use http or https, got '{other}'"
            ))),
        }
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Which kind of watermark to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkKind {
    Image(ImageReference),
    Text(String),
}

/// A watermark request that has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkRequest {
    pub source: ImageReference,
    pub kind: WatermarkKind,
    /// Font family name. Only meaningful on the text path.
    pub font_name: String,
    /// Rotation in degrees, clockwise positive. Only applied on the image path.
    pub angle_degrees: f32,
    /// `None` when the caller gave no code or an unknown one; resolves as center.
    pub position: Option<AnchorPosition>,
}

impl WatermarkRequest {
    /// Validate raw request input.
    ///
    /// Blank strings count as absent. Exactly one of `watermark_image` and
    /// `watermark_text` must be present, and the text path needs a font.
    pub fn from_parts(
        source: &str,
        watermark_image: Option<&str>,
        watermark_text: Option<&str>,
        font_name: Option<&str>,
        angle_degrees: f32,
        position: Option<i32>,
    ) -> Result<Self, WatermarkError> {
        let source = non_blank(Some(source))
            .ok_or_else(|| WatermarkError::validation("imageUrl is required"))?;
        let source = ImageReference::parse("imageUrl", source)?;

        let font_name = non_blank(font_name).unwrap_or_default().to_string();

        let kind = match (non_blank(watermark_image), non_blank(watermark_text)) {
            (Some(_), Some(_)) => {
                return Err(WatermarkError::validation(
                    "Provide either watermarkImageUrl or watermarkText, not both",
                ))
            }
            (None, None) => {
                return Err(WatermarkError::validation(
                    "Either watermarkImageUrl or watermarkText is required",
                ))
            }
            (Some(image), None) => {
                WatermarkKind::Image(ImageReference::parse("watermarkImageUrl", image)?)
            }
            (None, Some(text)) => {
                if font_name.is_empty() {
                    return Err(WatermarkError::validation(
                        "fontName is required for text watermarks",
                    ));
                }
                WatermarkKind::Text(text.to_string())
            }
        };

        let position = match position {
            Some(code) => {
                let resolved = AnchorPosition::from_code(code);
                if resolved.is_none() {
                    tracing::debug!(code, "Unknown position code, using center");
                }
                resolved
            }
            None => None,
        };

        Ok(Self {
            source,
            kind,
            font_name,
            angle_degrees,
            position,
        })
    }

    pub fn is_image_watermark(&self) -> bool {
        matches!(self.kind, WatermarkKind::Image(_))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
