//! Ingestion progress reporting.
//!
//! The pipeline emits an [`IngestEvent`] after every file and on every
//! status change. Reporters for the CLI write to **stderr** so stdout stays
//! parseable for scripts; [`CallbackProgress`] adapts the two plain
//! callbacks an embedding UI wants, `(current, total)` and `(message)`.

use std::io::Write;

use crate::ingest::ProcessingStatus;

/// A single progress event for an ingestion batch.
#[derive(Clone, Debug, PartialEq)]
pub enum IngestEvent {
    /// The batch moved to a new stage.
    Status(ProcessingStatus),
    /// A file finished (indexed or not). `current` counts from 1.
    File {
        current: usize,
        total: usize,
        name: String,
    },
    /// A file was skipped or failed to extract.
    Failed { name: String, message: String },
}

/// Receives ingestion events. Called from the pipeline's consumer task.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: IngestEvent);
}

/// Human-friendly progress on stderr: "index  1,234 / 5,000 files  report.pdf".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: IngestEvent) {
        let line = match &event {
            IngestEvent::Status(status) => format!("index  {}\n", status),
            IngestEvent::File {
                current,
                total,
                name,
            } => format!(
                "index  {} / {} files  {}\n",
                format_number(*current as u64),
                format_number(*total as u64),
                name
            ),
            IngestEvent::Failed { name, message } => {
                format!("index  failed  {}: {}\n", name, message)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &IngestEvent) -> serde_json::Value {
        match event {
            IngestEvent::Status(status) => serde_json::json!({
                "event": "status",
                "status": status,
            }),
            IngestEvent::File {
                current,
                total,
                name,
            } => serde_json::json!({
                "event": "progress",
                "current": current,
                "total": total,
                "file": name,
            }),
            IngestEvent::Failed { name, message } => serde_json::json!({
                "event": "error",
                "file": name,
                "message": message,
            }),
        }
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: IngestEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: IngestEvent) {}
}

type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&str) + Send + Sync>;

/// Forwards file progress and failures to plain callbacks.
///
/// The error callback receives `"<file name>: <message>"`.
#[derive(Default)]
pub struct CallbackProgress {
    on_progress: Option<ProgressFn>,
    on_error: Option<ErrorFn>,
}

impl CallbackProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl ProgressReporter for CallbackProgress {
    fn report(&self, event: IngestEvent) {
        match event {
            IngestEvent::File { current, total, .. } => {
                if let Some(f) = &self.on_progress {
                    f(current, total);
                }
            }
            IngestEvent::Failed { name, message } => {
                if let Some(f) = &self.on_error {
                    f(&format!("{}: {}", name, message));
                }
            }
            IngestEvent::Status(_) => {}
        }
    }
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
