//! Logging capability.
//!
//! The host owns the process-wide logger. Components log through a [`LogSink`]
//! handed to them, so an embedding host or a test can swap the destination.

use std::sync::Mutex;

/// Log source tag used by this plugin.
pub const LOG_SOURCE: &str = "vits_tts_plugin";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Normal progress.
    Info,
    /// Recoverable oddities.
    Warning,
    /// Failures.
    Error,
}

/// Destination for plugin log records.
pub trait LogSink: Send + Sync {
    /// Record a message.
    fn log(&self, level: LogLevel, source: &str, message: &str);

    /// Log a debug message.
    fn log_debug(&self, source: &str, message: &str) {
        self.log(LogLevel::Debug, source, message);
    }

    /// Log an info message.
    fn log_info(&self, source: &str, message: &str) {
        self.log(LogLevel::Info, source, message);
    }

    /// Log a warning message.
    fn log_warning(&self, source: &str, message: &str) {
        self.log(LogLevel::Warning, source, message);
    }

    /// Log an error message.
    fn log_error(&self, source: &str, message: &str) {
        self.log(LogLevel::Error, source, message);
    }
}

/// Sink that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, source: &str, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(source, "{}", message),
            LogLevel::Info => tracing::info!(source, "{}", message),
            LogLevel::Warning => tracing::warn!(source, "{}", message),
            LogLevel::Error => tracing::error!(source, "{}", message),
        }
    }
}

/// A captured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Source tag.
    pub source: String,
    /// Message text.
    pub message: String,
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Whether any record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, source: &str, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                level,
                source: source.to_string(),
                message: message.to_string(),
            });
        }
    }
}
