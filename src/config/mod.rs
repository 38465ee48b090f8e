// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::watermark::text_renderer::parse_hex_color;
use crate::watermark::WatermarkError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub placement: PlacementConfig,
    pub image_watermark: ImageWatermarkConfig,
    pub text_watermark: TextWatermarkConfig,
    pub fonts: FontsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Outbound HTTP settings for asset downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Largest accepted response body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("watermarking/{}", env!("CARGO_PKG_VERSION"))
}

/// Default max body size (25 MB)
fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

/// Pixel offsets applied when resolving anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            offset_x: 200.0,
            offset_y: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageWatermarkConfig {
    pub opacity: f32,
}

impl Default for ImageWatermarkConfig {
    fn default() -> Self {
        Self { opacity: 0.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextWatermarkConfig {
    /// Em size in pixels.
    pub font_size: f32,
    /// `#RGB` or `#RRGGBB`.
    pub color: String,
    pub opacity: f32,
}

impl Default for TextWatermarkConfig {
    fn default() -> Self {
        Self {
            font_size: 108.0,
            color: "#008000".to_string(),
            opacity: 0.5,
        }
    }
}

/// Where text watermark fonts are looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    pub load_system_fonts: bool,
    /// Extra directories scanned recursively for font files.
    pub dirs: Vec<PathBuf>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            dirs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 75 }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Parse YAML, substituting `${VAR_NAME}` with environment variables first.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, WatermarkError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| WatermarkError::config(e.to_string()))?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });

        if let Some(var_name) = missing {
            return Err(WatermarkError::config(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            )));
        }

        serde_yaml::from_str(&substituted).map_err(|e| WatermarkError::config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WatermarkError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| WatermarkError::config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.fetcher.timeout_secs == 0 {
            return Err(WatermarkError::config(
                "fetcher.timeout_secs must be greater than 0",
            ));
        }

        if self.fetcher.max_body_bytes == 0 {
            return Err(WatermarkError::config(
                "fetcher.max_body_bytes must be greater than 0",
            ));
        }

        let offsets = [self.placement.offset_x, self.placement.offset_y];
        if offsets.iter().any(|o| !o.is_finite()) {
            return Err(WatermarkError::config("placement offsets must be finite"));
        }

        for (name, opacity) in [
            ("image_watermark.opacity", self.image_watermark.opacity),
            ("text_watermark.opacity", self.text_watermark.opacity),
        ] {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(WatermarkError::config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, opacity
                )));
            }
        }

        let font_size = self.text_watermark.font_size;
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(WatermarkError::config(format!(
                "text_watermark.font_size must be positive, got {}",
                font_size
            )));
        }

        parse_hex_color(&self.text_watermark.color).map_err(|e| {
            WatermarkError::config(format!("text_watermark.color is invalid: {}", e))
        })?;

        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(WatermarkError::config(format!(
                "output.jpeg_quality must be between 1 and 100, got {}",
                self.output.jpeg_quality
            )));
        }

        Ok(())
    }
}
