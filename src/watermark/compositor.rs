//! Image watermark compositor.
//!
//! Rotates a watermark raster and alpha-blends it onto the source raster.
//!
//! Rotation faults are not fatal: they are logged with the elapsed time and
//! the unrotated watermark is overlaid instead. Only the size precondition
//! can fail the operation.
//!
//! # Example
//!
//! ```ignore
//! use watermarking::watermark::compositor::ImageCompositor;
//!
//! let compositor = ImageCompositor::new(logger, 0.5);
//! let result = compositor.composite(source, watermark, 45.0, anchor);
//! assert!(result.is_success());
//! ```

use super::position::Anchor;
use super::{OperationResult, Raster, RenderFault, WatermarkError};
use crate::logging::WatermarkLogger;
use image::{imageops, Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Instant;

/// Overlays image watermarks.
#[derive(Clone)]
pub struct ImageCompositor {
    logger: Arc<dyn WatermarkLogger>,
    opacity: f32,
}

impl ImageCompositor {
    pub fn new(logger: Arc<dyn WatermarkLogger>, opacity: f32) -> Self {
        Self {
            logger,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Rotate `watermark` by `angle_degrees` (clockwise) and blend it onto
    /// `source` with its top-left corner at `anchor`.
    pub fn composite(
        &self,
        source: Raster,
        watermark: Raster,
        angle_degrees: f32,
        anchor: Anchor,
    ) -> OperationResult {
        if watermark.width() > source.width() || watermark.height() > source.height() {
            tracing::debug!(
                source = ?source.dimensions(),
                watermark = ?watermark.dimensions(),
                "Watermark larger than source"
            );
            return OperationResult::Failed(WatermarkError::SizeConstraint);
        }

        let started = Instant::now();
        let layer = match rotate(watermark.as_image(), angle_degrees) {
            Ok(rotated) => {
                self.logger.information(&format!(
                    "Image watermarking took {} ms",
                    started.elapsed().as_millis()
                ));
                rotated
            }
            Err(fault) => {
                self.logger.error(
                    &fault,
                    &format!(
                        "Image watermarking failed after {} ms",
                        started.elapsed().as_millis()
                    ),
                );
                watermark.into_inner()
            }
        };

        let mut source = source;
        let (x, y) = anchor.to_pixel();
        blend_layer(source.as_image_mut(), &layer, x, y, self.opacity);

        OperationResult::Success(source)
    }
}

impl std::fmt::Debug for ImageCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCompositor")
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Rotate clockwise around the image center.
///
/// The canvas grows to the rotated bounding box; uncovered pixels are
/// transparent. Quarter turns are exact, other angles are sampled bilinearly.
pub fn rotate(image: &RgbaImage, degrees: f32) -> Result<RgbaImage, RenderFault> {
    if !degrees.is_finite() {
        return Err(RenderFault::Rotation { angle: degrees });
    }

    // rem_euclid may round tiny negative angles up to exactly 360.
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 || normalized >= 360.0 {
        return Ok(image.clone());
    }

    Ok(match normalized {
        n if n == 90.0 => imageops::rotate90(image),
        n if n == 180.0 => imageops::rotate180(image),
        n if n == 270.0 => imageops::rotate270(image),
        n => rotate_bilinear(image, n),
    })
}

fn rotate_bilinear(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;

    let dst_w = (src_w * cos.abs() + src_h * sin.abs()).ceil().max(1.0) as u32;
    let dst_h = (src_w * sin.abs() + src_h * cos.abs()).ceil().max(1.0) as u32;

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    let mut rotated = RgbaImage::new(dst_w, dst_h);

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            // Pixel centers, mapped back through the inverse rotation.
            let rx = dx as f32 + 0.5 - dst_cx;
            let ry = dy as f32 + 0.5 - dst_cy;

            let sx = rx * cos + ry * sin + src_cx - 0.5;
            let sy = -rx * sin + ry * cos + src_cy - 0.5;

            if let Some(pixel) = sample_bilinear(image, sx, sy) {
                rotated.put_pixel(dx, dy, pixel);
            }
        }
    }

    rotated
}

/// Bilinear sample with transparent padding outside the image.
fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    if x <= -1.0 || y <= -1.0 || x >= w as f32 || y >= h as f32 {
        return None;
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let fetch = |px: i64, py: i64| -> [f32; 4] {
        if px < 0 || py < 0 || px >= w || py >= h {
            [0.0; 4]
        } else {
            let p = image.get_pixel(px as u32, py as u32);
            [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
        }
    };

    let taps = [
        (fetch(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (fetch(x0 + 1, y0), fx * (1.0 - fy)),
        (fetch(x0, y0 + 1), (1.0 - fx) * fy),
        (fetch(x0 + 1, y0 + 1), fx * fy),
    ];

    // Weight color by alpha so transparent padding doesn't darken edges.
    let alpha: f32 = taps.iter().map(|(p, wgt)| p[3] * wgt).sum();
    if alpha <= 0.0 {
        return None;
    }

    let channel = |c: usize| -> u8 {
        let v: f32 = taps.iter().map(|(p, wgt)| p[c] * p[3] * wgt).sum::<f32>() / alpha;
        v.round().clamp(0.0, 255.0) as u8
    };

    Some(Rgba([
        channel(0),
        channel(1),
        channel(2),
        alpha.round().clamp(0.0, 255.0) as u8,
    ]))
}

/// Blend `layer` onto `target` with its top-left corner at (`x`, `y`),
/// clipped to the target bounds.
fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, x: i32, y: i32, opacity: f32) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;
    let (x, y) = (x as i64, y as i64);

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + layer.width() as i64).min(target_width);
    let y_end = (y + layer.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wm_pixel = layer.get_pixel((tx - x) as u32, (ty - y) as u32);
            let target_pixel = target.get_pixel_mut(tx as u32, ty as u32);
            *target_pixel = blend_pixels(*target_pixel, *wm_pixel, opacity);
        }
    }
}

/// Porter-Duff "over" with an extra opacity factor on the foreground.
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
