// Test utilities: in-memory images, mock image servers and processors
// wired to an inspectable logger.

use httpmock::prelude::*;
use httpmock::Mock;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use watermarking::config::Config;
use watermarking::logging::MemoryLogger;
use watermarking::watermark::{FontRegistry, SystemFontRegistry, WatermarkProcessor};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// DejaVu Sans Mono, checked in so text tests never depend on host fonts.
pub const FIXTURE_FONT: &[u8] = include_bytes!("../fixtures/DejaVuSansMono.ttf");
pub const FIXTURE_FONT_FAMILY: &str = "DejaVu Sans Mono";

/// Encode a solid-color image.
pub fn solid_image(width: u32, height: u32, color: Rgba<u8>, format: ImageOutputFormat) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, color);
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

pub fn png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    solid_image(width, height, color, ImageOutputFormat::Png)
}

/// Serve `body` at `path` with the given status and content type.
pub async fn serve<'a>(
    server: &'a MockServer,
    path: &str,
    status: u16,
    content_type: &str,
    body: Vec<u8>,
) -> Mock<'a> {
    let path = path.to_string();
    let content_type = content_type.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path(path);
            then.status(status)
                .header("Content-Type", content_type)
                .body(body);
        })
        .await
}

pub async fn serve_png<'a>(
    server: &'a MockServer,
    path: &str,
    width: u32,
    height: u32,
    color: Rgba<u8>,
) -> Mock<'a> {
    serve(server, path, 200, "image/png", png(width, height, color)).await
}

/// A processor with default configuration, a recording logger and the
/// given font registry.
pub struct TestProcessor {
    pub processor: WatermarkProcessor,
    pub logger: MemoryLogger,
}

impl TestProcessor {
    pub fn new(config: &Config, fonts: Arc<dyn FontRegistry>) -> Self {
        let logger = MemoryLogger::new();
        let processor =
            WatermarkProcessor::with_components(config, Arc::new(logger.clone()), fonts)
                .expect("processor should build from a valid config");
        Self { processor, logger }
    }

    /// Processor whose font registry is empty, so every text draw faults.
    pub fn without_fonts() -> Self {
        Self::new(
            &Config::default(),
            Arc::new(SystemFontRegistry::from_font_data(Vec::new())),
        )
    }

    /// Processor that knows only the checked-in fixture font.
    pub fn with_fixture_font() -> Self {
        Self::new(
            &Config::default(),
            Arc::new(SystemFontRegistry::from_font_data(vec![FIXTURE_FONT.to_vec()])),
        )
    }
}

/// Inclusive bounding box `(min_x, min_y, max_x, max_y)` of pixels that
/// differ from `background`, or `None` when nothing was drawn.
pub fn changed_bounds(image: &RgbaImage, background: Rgba<u8>) -> Option<(u32, u32, u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != background)
        .fold(None, |bounds, (x, y, _)| match bounds {
            None => Some((x, y, x, y)),
            Some((min_x, min_y, max_x, max_y)) => {
                Some((min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)))
            }
        })
}
