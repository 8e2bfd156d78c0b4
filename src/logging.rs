//! Structured event log.
//!
//! Every dashboard event worth keeping (fetch failures, transitions, notices)
//! is appended as one JSON line to `~/.hivewatch/dashboard.jsonl`. Writes are
//! best-effort: a full disk or missing home directory never takes the
//! dashboard down.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One line of `dashboard.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    /// Short machine-friendly tag, e.g. `fetch_stats` or `toggle`.
    pub event: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, event: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            level,
            event: event.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Appends entries to the event log and optionally mirrors them to stderr.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
    echo: bool,
}

impl EventLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            path: if config.enabled { log_path() } else { None },
            echo: config.echo,
        }
    }

    /// A logger writing to an explicit file, used by tests.
    pub fn to_file(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            echo: false,
        }
    }

    /// Turn stderr mirroring off, e.g. while a full-screen view owns the terminal.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn record(&self, entry: &LogEntry) {
        if self.echo {
            let tag = match entry.level {
                Level::Info => "info".dimmed(),
                Level::Warn => "warn".yellow(),
                Level::Error => "error".red().bold(),
            };
            eprintln!("{tag} {}: {}", entry.event, entry.message);
        }
        if let Some(path) = &self.path {
            let _ = append_entry(path, entry);
        }
    }

    pub fn info(&self, event: &str, message: impl Into<String>) {
        self.record(&LogEntry::new(Level::Info, event, message));
    }

    pub fn error(&self, event: &str, message: impl Into<String>) {
        self.record(&LogEntry::new(Level::Error, event, message));
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

fn append_entry(path: &PathBuf, entry: &LogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read all entries from a log file, skipping malformed lines.
pub fn read_entries(path: &PathBuf) -> Vec<LogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<LogEntry>(&line).ok())
        .collect()
}

/// `~/.hivewatch/dashboard.jsonl`.
pub fn log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hivewatch").join("dashboard.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
