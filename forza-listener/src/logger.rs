//! Logging abstraction for testable output.
//!
//! Provides a trait-based logger so the ingest loop's log output can be
//! asserted on in tests without global state.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Local;

/// Log level, ordered from always shown to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Recoverable failures (always shown)
    Warn,
    /// Normal output (always shown)
    Info,
    /// Per-packet record dumps (--verbose)
    Debug,
}

impl Level {
    /// Level selected by the --verbose flag.
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Level::Debug
        } else {
            Level::Info
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }
}

/// Trait for logging output.
pub trait Logger: Send + Sync {
    /// Log a message at the given level.
    fn log(&self, level: Level, message: &str);

    /// Whether messages at `level` are emitted. Lets callers skip
    /// building expensive messages.
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
}

/// Logger that writes timestamped lines to stderr, optionally mirrored to
/// a file.
#[derive(Debug)]
pub struct StderrLogger {
    level: Level,
    mirror: Option<Mutex<File>>,
}

impl StderrLogger {
    /// Create a new stderr logger with the given level.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            mirror: None,
        }
    }

    /// Create a logger that also appends every emitted line to `path`.
    pub fn with_mirror(level: Level, path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            level,
            mirror: Some(Mutex::new(file)),
        })
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Logger for StderrLogger {
    fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let line = format_line(&timestamp, level, message);
        let _ = writeln!(io::stderr(), "{}", line);

        if let Some(mirror) = &self.mirror {
            if let Ok(mut file) = mirror.lock() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }
}

fn format_line(timestamp: &str, level: Level, message: &str) -> String {
    format!("{} {:<5} {}", timestamp, level.label(), message)
}

/// Mock logger for testing that captures all messages.
#[derive(Debug, Clone)]
pub struct MockLogger {
    messages: Arc<RwLock<Vec<LogEntry>>>,
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

impl Default for MockLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLogger {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get all captured log entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.messages.read().unwrap().clone()
    }

    /// Get all captured messages (just the text).
    pub fn messages(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.message.clone()).collect()
    }

    /// Get messages at a specific level.
    pub fn messages_at_level(&self, level: Level) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Check if any message contains the given substring.
    pub fn contains(&self, substring: &str) -> bool {
        self.messages().iter().any(|m| m.contains(substring))
    }

    /// Count messages containing the given substring.
    pub fn count_containing(&self, substring: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(substring)).count()
    }

    pub fn clear(&self) {
        self.messages.write().unwrap().clear();
    }

    pub fn count(&self) -> usize {
        self.messages.read().unwrap().len()
    }
}

impl Logger for MockLogger {
    fn log(&self, level: Level, message: &str) {
        // Capture every level so tests can see what would be logged
        self.messages.write().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

/// A no-op logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl NullLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}
