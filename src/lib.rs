// Watermarking library
// Fetches remote images and composites image or text watermarks onto them.

pub mod config;
pub mod logging;
pub mod watermark;
