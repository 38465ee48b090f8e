// Logging module: subscriber setup and the logging capability injected into
// the watermark pipeline.

use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides `config.level` when set. Output goes to stderr so the
/// binary can keep stdout free for data.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
///
/// # Examples
///
/// ```
/// use watermarking::config::LoggingConfig;
/// use watermarking::logging::init_subscriber;
///
/// let _ = init_subscriber(&LoggingConfig::default());
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()?,
    }

    Ok(())
}

/// Logging capability consumed by the compositors.
///
/// Implementations must tolerate concurrent calls from many requests.
pub trait WatermarkLogger: Send + Sync {
    fn information(&self, message: &str);

    fn error(&self, fault: &(dyn Error + 'static), message: &str);
}

/// Forwards entries to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl WatermarkLogger for TracingLogger {
    fn information(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, fault: &(dyn Error + 'static), message: &str) {
        tracing::error!(error = %fault, "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Information,
    Error,
}

/// One recorded entry of a [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Display form of the fault for error entries.
    pub fault: Option<String>,
}

/// Keeps entries in memory, guarded by a lock so concurrent writers never
/// interleave within an entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn push(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }
}

impl WatermarkLogger for MemoryLogger {
    fn information(&self, message: &str) {
        self.push(LogEntry {
            level: LogLevel::Information,
            message: message.to_string(),
            fault: None,
        });
    }

    fn error(&self, fault: &(dyn Error + 'static), message: &str) {
        self.push(LogEntry {
            level: LogLevel::Error,
            message: message.to_string(),
            fault: Some(fault.to_string()),
        });
    }
}
