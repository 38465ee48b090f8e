//! Owned RGBA pixel buffer passed between pipeline stages.

use super::WatermarkError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder as _, RgbaImage};
use std::fmt;
use std::io::Cursor;

/// A decoded image.
///
/// Deliberately not `Clone`: each stage takes the raster by value and hands
/// it on, so a buffer is never shared between requests.
pub struct Raster(RgbaImage);

impl Raster {
    pub fn new(image: RgbaImage) -> Self {
        Self(image)
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self(image.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    pub(crate) fn as_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.0
    }

    pub fn into_inner(self) -> RgbaImage {
        self.0
    }

    /// Encode as baseline JPEG. Alpha is dropped.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, WatermarkError> {
        let rgb = rgba_to_rgb(self.0.as_raw());

        let mut output = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
            .write_image(&rgb, self.width(), self.height(), image::ColorType::Rgb8)
            .map_err(|e| WatermarkError::Encode(e.to_string()))?;

        Ok(output.into_inner())
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    rgb
}
