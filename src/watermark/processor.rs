//! Watermark request orchestration.
//!
//! Runs one request through fetch, anchor resolution and compositing:
//!
//! ```text
//! Start -> FetchingSource -> Failed
//!                         -> FetchingWatermark -> Failed
//!                                              -> ResolvingAnchor -> Compositing -> Done
//!                         -> ResolvingAnchor -> Compositing -> Done
//! ```
//!
//! Every stage runs at most once and stages never overlap.

use super::compositor::ImageCompositor;
use super::fonts::{FontRegistry, SystemFontRegistry};
use super::image_fetcher::ImageFetcher;
use super::position::{self, Anchor};
use super::text_renderer::{TextCompositor, TextStyle};
use super::{OperationResult, Raster, WatermarkError, WatermarkKind, WatermarkRequest};
use crate::config::{Config, PlacementConfig};
use crate::logging::{TracingLogger, WatermarkLogger};
use std::sync::Arc;

/// Applies image or text watermarks to remote images.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct WatermarkProcessor {
    fetcher: ImageFetcher,
    placement: PlacementConfig,
    image_compositor: ImageCompositor,
    text_compositor: TextCompositor,
}

impl WatermarkProcessor {
    /// Build a processor from configuration, logging through `tracing` and
    /// resolving fonts from the system font database.
    pub fn from_config(config: &Config) -> Result<Self, WatermarkError> {
        let fonts = Arc::new(SystemFontRegistry::new(&config.fonts));
        Self::with_components(config, Arc::new(TracingLogger), fonts)
    }

    /// Build a processor with explicit logging and font collaborators.
    pub fn with_components(
        config: &Config,
        logger: Arc<dyn WatermarkLogger>,
        fonts: Arc<dyn FontRegistry>,
    ) -> Result<Self, WatermarkError> {
        config.validate()?;

        let fetcher = ImageFetcher::new(&config.fetcher)?;
        let style = TextStyle::try_from(&config.text_watermark)?;

        Ok(Self {
            fetcher,
            placement: config.placement.clone(),
            image_compositor: ImageCompositor::new(
                logger.clone(),
                config.image_watermark.opacity,
            ),
            text_compositor: TextCompositor::new(logger, fonts, style),
        })
    }

    /// Run one request to completion.
    pub async fn run(&self, request: &WatermarkRequest) -> OperationResult {
        tracing::debug!(source = %request.source, "Fetching source image");
        let source = match self.fetcher.fetch(&request.source).await {
            Ok(raster) => raster,
            Err(err) => return self.fail(&request.source.to_string(), err),
        };

        match &request.kind {
            WatermarkKind::Image(reference) => {
                tracing::debug!(watermark = %reference, "Fetching watermark image");
                let watermark = match self.fetcher.fetch(reference).await {
                    Ok(raster) => raster,
                    Err(err) => return self.fail(&reference.to_string(), err),
                };

                let anchor = self.resolve_anchor(&source, request);
                tracing::debug!(
                    x = anchor.x,
                    y = anchor.y,
                    angle = request.angle_degrees,
                    "Compositing image watermark"
                );
                self.image_compositor
                    .composite(source, watermark, request.angle_degrees, anchor)
            }
            WatermarkKind::Text(text) => {
                let anchor = self.resolve_anchor(&source, request);
                tracing::debug!(
                    x = anchor.x,
                    y = anchor.y,
                    font = %request.font_name,
                    "Compositing text watermark"
                );
                self.text_compositor
                    .composite(source, text, &request.font_name, anchor)
            }
        }
    }

    /// Run a request and encode the result as JPEG.
    pub async fn run_to_jpeg(
        &self,
        request: &WatermarkRequest,
        quality: u8,
    ) -> Result<Vec<u8>, WatermarkError> {
        let raster = self.run(request).await.into_result()?;
        raster.encode_jpeg(quality)
    }

    /// Anchor for `request` on the given source raster.
    pub fn resolve_anchor(&self, source: &Raster, request: &WatermarkRequest) -> Anchor {
        position::resolve(
            source.width(),
            source.height(),
            request.position,
            self.placement.offset_x,
            self.placement.offset_y,
        )
    }

    fn fail(&self, url: &str, err: WatermarkError) -> OperationResult {
        tracing::warn!(url, error = %err, status = ?err.status_hint(), "Watermark request failed");
        OperationResult::Failed(err)
    }
}
