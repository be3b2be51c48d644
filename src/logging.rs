//! Log sinks and tracing setup.
//!
//! The engine never logs through a global. It holds an `Arc<dyn LogSink>`
//! and every ingestion or query event goes through it, tagged with a
//! category (`ingest`, `extract`, `search`, `snapshot`). The default
//! [`TracingSink`] forwards to `tracing`; [`MemorySink`] keeps entries in
//! memory so callers (and tests) can read the session log back.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Destination for engine log events.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, category: &str, message: &str, data: Option<serde_json::Value>);
}

/// Forwards to `tracing` events.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, category: &str, message: &str, data: Option<serde_json::Value>) {
        let data = data.map(|d| d.to_string()).unwrap_or_default();
        match level {
            LogLevel::Debug => tracing::debug!(category, data = %data, "{}", message),
            LogLevel::Info => tracing::info!(category, data = %data, "{}", message),
            LogLevel::Warn => tracing::warn!(category, data = %data, "{}", message),
            LogLevel::Error => tracing::error!(category, data = %data, "{}", message),
        }
    }
}

/// Collects entries in memory.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Entries at or above `level`.
    pub fn at_least(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level >= level)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, category: &str, message: &str, data: Option<serde_json::Value>) {
        self.entries.lock().push(LogEntry {
            level,
            category: category.to_string(),
            message: message.to_string(),
            data,
        });
    }
}

/// Install the global fmt subscriber on stderr. `RUST_LOG` overrides
/// `default_level`. Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
