//! Text watermark rendering.
//!
//! Draws text directly onto the source raster. The text block is right and
//! bottom aligned to the anchor, so the anchor marks its lower-right corner.
//!
//! # Features
//!
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Font lookup by family name through a [`FontRegistry`]
//! - Multi-line text, each line right aligned
//!
//! Like image compositing, drawing faults (including an unknown font) are
//! logged and the operation still succeeds.

use super::fonts::FontRegistry;
use super::position::Anchor;
use super::{OperationResult, Raster, RenderFault, WatermarkError};
use crate::config::TextWatermarkConfig;
use crate::logging::WatermarkLogger;
use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Instant;

/// Parsed RGB color from hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `green`.
    pub fn green() -> Self {
        Self::new(0, 128, 0)
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// ```
/// use watermarking::watermark::text_renderer::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::new(255, 255, 255));
/// assert_eq!(parse_hex_color("#008000").unwrap(), Color::green());
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::validation("Color must start with '#'"))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WatermarkError::validation(format!(
            "Invalid hex digit in color '{}'",
            hex
        )));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| WatermarkError::validation("Invalid hex digit"))
    };

    match digits.len() {
        // #RGB: each digit doubled, 0xF -> 0xFF
        3 => Ok(Color::new(
            component(0..1)? * 17,
            component(1..2)? * 17,
            component(2..3)? * 17,
        )),
        6 => Ok(Color::new(
            component(0..2)?,
            component(2..4)?,
            component(4..6)?,
        )),
        n => Err(WatermarkError::validation(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            n
        ))),
    }
}

/// Style applied to every text watermark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Em size in pixels.
    pub font_size: f32,
    pub color: Color,
    pub opacity: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 108.0,
            color: Color::green(),
            opacity: 0.5,
        }
    }
}

impl TryFrom<&TextWatermarkConfig> for TextStyle {
    type Error = WatermarkError;

    fn try_from(config: &TextWatermarkConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            font_size: config.font_size,
            color: parse_hex_color(&config.color)?,
            opacity: config.opacity.clamp(0.0, 1.0),
        })
    }
}

/// Measured layout of a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Advance width of each line.
    pub line_widths: Vec<f32>,
    pub line_height: f32,
    pub width: f32,
    pub height: f32,
}

impl TextLayout {
    /// Top-left corner of the block when its lower-right corner sits on `anchor`.
    pub fn origin_for(&self, anchor: Anchor) -> (f32, f32) {
        (anchor.x - self.width, anchor.y - self.height)
    }

    /// Left edge of `line` so that it ends at `right`.
    pub fn line_start(&self, line: usize, right: f32) -> f32 {
        right - self.line_widths.get(line).copied().unwrap_or(0.0)
    }
}

/// Draws text watermarks.
#[derive(Clone)]
pub struct TextCompositor {
    logger: Arc<dyn WatermarkLogger>,
    fonts: Arc<dyn FontRegistry>,
    style: TextStyle,
}

impl TextCompositor {
    pub fn new(
        logger: Arc<dyn WatermarkLogger>,
        fonts: Arc<dyn FontRegistry>,
        style: TextStyle,
    ) -> Self {
        Self {
            logger,
            fonts,
            style,
        }
    }

    /// Draw `text` in `font_name` with its lower-right corner at `anchor`.
    ///
    /// Always succeeds; faults are logged with the elapsed time.
    pub fn composite(
        &self,
        source: Raster,
        text: &str,
        font_name: &str,
        anchor: Anchor,
    ) -> OperationResult {
        let mut source = source;
        let started = Instant::now();

        match self.draw(source.as_image_mut(), text, font_name, anchor) {
            Ok(()) => self.logger.information(&format!(
                "Text watermarking took {} ms",
                started.elapsed().as_millis()
            )),
            Err(fault) => self.logger.error(
                &fault,
                &format!(
                    "Text watermarking failed after {} ms",
                    started.elapsed().as_millis()
                ),
            ),
        }

        OperationResult::Success(source)
    }

    fn draw(
        &self,
        target: &mut RgbaImage,
        text: &str,
        font_name: &str,
        anchor: Anchor,
    ) -> Result<(), RenderFault> {
        let font = self.fonts.resolve(font_name)?;
        let scale = em_scale(&font, self.style.font_size)?;
        let layout = measure_text(&font, scale, text);
        render_text(target, &font, scale, text, &layout, anchor, &self.style);
        Ok(())
    }
}

impl std::fmt::Debug for TextCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCompositor")
            .field("style", &self.style)
            .finish()
    }
}

/// Pixel scale at which one em spans `size` pixels.
///
/// `PxScale` measures ascent-to-descent height, which is larger than the em
/// for most fonts.
fn em_scale(font: &FontVec, size: f32) -> Result<PxScale, RenderFault> {
    if !size.is_finite() || size <= 0.0 {
        return Err(RenderFault::Draw(format!("invalid font size {}", size)));
    }

    let scale = match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => size * font.height_unscaled() / units_per_em,
        _ => size,
    };
    Ok(PxScale::from(scale))
}

/// Measure each line of `text` at `scale`.
pub fn measure_text(font: &FontVec, scale: PxScale, text: &str) -> TextLayout {
    let scaled_font = font.as_scaled(scale);

    let line_widths: Vec<f32> = text
        .lines()
        .map(|line| {
            let mut width = 0.0f32;
            let mut prev_glyph: Option<GlyphId> = None;

            for c in line.chars() {
                let glyph_id = scaled_font.glyph_id(c);
                if let Some(prev) = prev_glyph {
                    width += scaled_font.kern(prev, glyph_id);
                }
                width += scaled_font.h_advance(glyph_id);
                prev_glyph = Some(glyph_id);
            }
            width
        })
        .collect();

    let line_height = scaled_font.height();
    let line_gap = scaled_font.line_gap();
    let lines = line_widths.len().max(1) as f32;

    TextLayout {
        width: line_widths.iter().copied().fold(0.0, f32::max),
        height: line_height * lines + line_gap * (lines - 1.0),
        line_widths,
        line_height,
    }
}

fn render_text(
    target: &mut RgbaImage,
    font: &FontVec,
    scale: PxScale,
    text: &str,
    layout: &TextLayout,
    anchor: Anchor,
    style: &TextStyle,
) {
    let scaled_font = font.as_scaled(scale);
    let (_, top) = layout.origin_for(anchor);
    let alpha = style.opacity.clamp(0.0, 1.0);
    let (width, height) = (target.width() as i32, target.height() as i32);

    for (index, line) in text.lines().enumerate() {
        let baseline_y = top
            + scaled_font.ascent()
            + index as f32 * (layout.line_height + scaled_font.line_gap());
        let mut cursor_x = layout.line_start(index, anchor.x);
        let mut prev_glyph: Option<GlyphId> = None;

        for c in line.chars() {
            let glyph_id = scaled_font.glyph_id(c);
            if let Some(prev) = prev_glyph {
                cursor_x += scaled_font.kern(prev, glyph_id);
            }

            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();

                outlined.draw(|px, py, coverage| {
                    let x = px as i32 + bounds.min.x as i32;
                    let y = py as i32 + bounds.min.y as i32;

                    if x >= 0 && y >= 0 && x < width && y < height {
                        let pixel = target.get_pixel_mut(x as u32, y as u32);
                        *pixel = blend_coverage(*pixel, style.color, coverage * alpha);
                    }
                });
            }

            cursor_x += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }
    }
}

/// Blend a solid color with the given effective alpha over `bottom`.
fn blend_coverage(bottom: Rgba<u8>, color: Color, top_alpha: f32) -> Rgba<u8> {
    let top_alpha = top_alpha.clamp(0.0, 1.0);
    let bottom_alpha = bottom[3] as f32 / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let result = (t as f32 * top_alpha + b as f32 * bottom_alpha * (1.0 - top_alpha))
            / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(color.r, bottom[0]),
        blend(color.g, bottom[1]),
        blend(color.b, bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
