//! Watermark pipeline: fetch remote images, resolve the anchor, and
//! composite an image or text watermark onto the source.
//!
//! # Features
//!
//! - **Image watermarks** rotated by any angle and blended at 50% opacity
//! - **Text watermarks** drawn in a named system font, right/bottom aligned
//! - **9 anchor positions** with fixed pixel offsets
//! - **Non-fatal rendering**: rotation and draw faults are logged, not returned
//!
//! # Example
//!
//! ```ignore
//! use watermarking::config::Config;
//! use watermarking::watermark::{WatermarkProcessor, WatermarkRequest};
//!
//! let processor = WatermarkProcessor::from_config(&Config::default())?;
//! let request = WatermarkRequest::from_parts(
//!     "https://picsum.photos/800/600",
//!     None,
//!     Some("Sample"),
//!     Some("Arial"),
//!     45.0,
//!     Some(1),
//! )?;
//!
//! let result = processor.run(&request).await;
//! let jpeg = result.into_result()?.encode_jpeg(75)?;
//! ```

pub mod compositor;
pub mod error;
pub mod fonts;
pub mod image_fetcher;
pub mod position;
pub mod processor;
pub mod raster;
pub mod request;
pub mod result;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::ImageCompositor;
pub use error::{RenderFault, WatermarkError};
pub use fonts::{FontRegistry, SystemFontRegistry};
pub use image_fetcher::ImageFetcher;
pub use position::{resolve, Anchor, AnchorPosition};
pub use processor::WatermarkProcessor;
pub use raster::Raster;
pub use request::{ImageReference, WatermarkKind, WatermarkRequest};
pub use result::OperationResult;
pub use text_renderer::{parse_hex_color, Color, TextCompositor, TextStyle};
