//! Injected logging capability.
//!
//! # Design
//! The client never reaches for a global logger. A `LogSink` is built once by
//! the application and handed to every client as an `Arc<dyn LogSink>`.
//! `TracingSink` forwards to `tracing`; `LineSink` writes `SEVERITY:` prefixed
//! lines to any writer; `MemorySink` keeps entries for later inspection.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use serde_json::Value;

/// Severity of a client log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Error,
    /// Misuse of the client or a broken environment, as opposed to a
    /// transient failure.
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for client log messages.
pub trait LogSink: Send + Sync {
    fn log(&self, severity: Severity, message: &str);
}

/// Emit a structured value, flattened to multi-line text.
pub fn log_value(sink: &dyn LogSink, severity: Severity, value: &Value) {
    sink.log(severity, &flatten_value(value));
}

/// Printable form of a JSON value. Strings are emitted bare, everything else
/// is pretty-printed one field per line.
pub fn flatten_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Forwards messages to `tracing` under the `swretail` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!(target: "swretail", "{message}"),
            Severity::Error => tracing::error!(target: "swretail", "{message}"),
            Severity::Critical => tracing::error!(target: "swretail", critical = true, "{message}"),
        }
    }
}

/// Writes every line of a message with a `SEVERITY:` prefix.
pub struct LineSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl LineSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> LogSink for LineSink<W> {
    fn log(&self, severity: Severity, message: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        // Write errors are dropped.
        for line in message.lines() {
            let _ = writeln!(out, "{severity}:{line}");
        }
        if message.is_empty() {
            let _ = writeln!(out, "{severity}:");
        }
        let _ = out.flush();
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn log(&self, severity: Severity, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((severity, message.to_string()));
        }
    }
}
