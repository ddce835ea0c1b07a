use std::collections::VecDeque;

use serde::Serialize;

/// Severity tag attached to every console log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Ok,
    Warn,
    Err,
}

/// A human-readable log line produced by the automation engine or the
/// command interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub message: String,
    pub severity: Severity,
}

impl LogEvent {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Ok)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warn)
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Err)
    }
}

impl std::fmt::Display for LogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Destination for log events.
pub trait LogSink {
    fn emit(&mut self, event: LogEvent);
}

/// A log event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub seq: u64,
    #[serde(flatten)]
    pub event: LogEvent,
}

/// Bounded in-memory log; the oldest entries are evicted once `capacity`
/// is reached. Sequence numbers keep increasing across evictions.
#[derive(Debug)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
}

pub const DEFAULT_LOG_CAPACITY: usize = 500;

impl LogBook {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    /// Entries with `seq >= since`, oldest first.
    pub fn since(&self, since: u64) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.seq >= since)
            .cloned()
            .collect()
    }

    /// Sequence number the next entry will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl LogSink for LogBook {
    fn emit(&mut self, event: LogEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }
}
