//! Process output events and line filtering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single event observed on a running process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// When the event was observed
    pub timestamp: DateTime<Utc>,
    /// The type of event
    pub event_type: ProcessEventType,
    /// The output line for `Stdout`/`Stderr` events
    pub data: Option<String>,
}

impl ProcessEvent {
    /// Create an event without a payload
    pub fn new(event_type: ProcessEventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            data: None,
        }
    }

    /// Create an event carrying one line of output
    pub fn new_with_data(event_type: ProcessEventType, data: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            data: Some(data),
        }
    }

    /// Shorthand for a stdout line
    pub fn stdout(line: impl Into<String>) -> Self {
        Self::new_with_data(ProcessEventType::Stdout, line.into())
    }

    /// Shorthand for a stderr line
    pub fn stderr(line: impl Into<String>) -> Self {
        Self::new_with_data(ProcessEventType::Stderr, line.into())
    }

    /// The stream a line came from, if this is an output event
    pub fn source(&self) -> Option<LogSource> {
        match self.event_type {
            ProcessEventType::Stdout => Some(LogSource::Stdout),
            ProcessEventType::Stderr => Some(LogSource::Stderr),
            ProcessEventType::Started { .. } => None,
        }
    }

    /// The output line, if this is an output event
    pub fn line(&self) -> Option<&str> {
        self.source().and(self.data.as_deref())
    }
}

/// Types of process events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProcessEventType {
    /// Process has started
    Started {
        /// OS process id
        pid: u32,
    },
    /// Line from stdout
    Stdout,
    /// Line from stderr
    Stderr,
}

/// Filter applied to every output line before it becomes an event
pub trait LogFilter: Send + Sync {
    /// Filter a line, returning None to drop it
    ///
    /// The returned &str can be the input itself or a substring of it.
    fn filter<'a>(&self, line: &'a str, source: LogSource) -> Option<&'a str>;
}

/// Source of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogSource {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// A filter that passes all lines through
pub struct NoOpFilter;

impl LogFilter for NoOpFilter {
    fn filter<'a>(&self, line: &'a str, _source: LogSource) -> Option<&'a str> {
        Some(line)
    }
}

/// Strips a trailing carriage return left by CRLF output
pub struct TrimCarriageReturn;

impl LogFilter for TrimCarriageReturn {
    fn filter<'a>(&self, line: &'a str, _source: LogSource) -> Option<&'a str> {
        Some(line.strip_suffix('\r').unwrap_or(line))
    }
}
