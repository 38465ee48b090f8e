use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use watermarking::config::{Config, LogFormat};
use watermarking::watermark::{OperationResult, WatermarkProcessor, WatermarkRequest};

/// Watermarking - apply an image or text watermark to a remote image
#[derive(Parser, Debug)]
#[command(name = "watermarking")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL of the image to watermark
    #[arg(short, long)]
    source: String,

    /// URL of the watermark image
    #[arg(long)]
    watermark_image: Option<String>,

    /// Watermark text
    #[arg(long)]
    watermark_text: Option<String>,

    /// Font family for text watermarks
    #[arg(short, long)]
    font: Option<String>,

    /// Rotation in degrees, clockwise
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f32,

    /// Position code: 1-3 top row, 4-6 middle row, 7-9 bottom row
    #[arg(short, long)]
    position: Option<i32>,

    /// Where to write the JPEG output
    #[arg(short, long, default_value = "watermarked.jpg")]
    output: PathBuf,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }),
        None => Config::default(),
    };

    if args.json_logs {
        config.logging.format = LogFormat::Json;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    if let Err(e) = watermarking::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(path) = &args.config {
        tracing::info!(config_file = %path.display(), "Configuration loaded successfully");
    }

    match run(&args, &config).await {
        Ok(Outcome::Written(bytes)) => {
            tracing::info!(output = %args.output.display(), bytes, "Watermarked image written");
        }
        Ok(Outcome::Failed { status, message }) => {
            eprintln!("{} {}", status, message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

enum Outcome {
    Written(usize),
    Failed { status: u16, message: String },
}

async fn run(args: &Args, config: &Config) -> anyhow::Result<Outcome> {
    let processor =
        WatermarkProcessor::from_config(config).context("Failed to build watermark processor")?;

    let request = match WatermarkRequest::from_parts(
        &args.source,
        args.watermark_image.as_deref(),
        args.watermark_text.as_deref(),
        args.font.as_deref(),
        args.angle,
        args.position,
    ) {
        Ok(request) => request,
        Err(e) => return Ok(failed(OperationResult::Failed(e))),
    };

    let raster = match processor.run(&request).await {
        OperationResult::Success(raster) => raster,
        failure => return Ok(failed(failure)),
    };

    let jpeg = raster
        .encode_jpeg(config.output.jpeg_quality)
        .context("Failed to encode output")?;
    tokio::fs::write(&args.output, &jpeg)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    Ok(Outcome::Written(jpeg.len()))
}

fn failed(result: OperationResult) -> Outcome {
    Outcome::Failed {
        status: result.status_code().unwrap_or(500),
        message: result.error_message().unwrap_or_default(),
    }
}
