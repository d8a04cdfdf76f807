//! In-memory log retention.
//!
//! [`LogBuffer`] is a [`tracing_subscriber::Layer`] that keeps the most recent
//! events in memory so they can be inspected or dumped after a run, next to
//! whatever formatting layer the binary installs.

mod visitor;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;
use visitor::FieldVisitor;

/// Number of entries retained by [`LogBuffer::new`].
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// One captured log event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Lower-case level name (`info`, `warn`, ...).
    pub level: String,
    /// Event message.
    pub message: String,
    /// Structured fields other than the message.
    pub data: BTreeMap<String, String>,
    /// Time the event was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Layer retaining the last `capacity` events.
///
/// Clones share the same buffer, so one clone can be installed in the
/// subscriber while another is kept for reading.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    capacity: usize,
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogBuffer {
    /// Creates a buffer holding [`DEFAULT_LOG_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Creates a buffer holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Returns a copy of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Drops all retained entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Subscriber> Layer<S> for LogBuffer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.push(LogEntry {
            level: event.metadata().level().as_str().to_ascii_lowercase(),
            message: visitor.message,
            data: visitor.fields,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn captures_level_message_and_fields() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(buffer.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(theme = "neon", attempts = 2, "Invalid theme value");
        });

        let entries = buffer.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, "warn");
        assert_eq!(entries[0].message, "Invalid theme value");
        assert_eq!(entries[0].data.get("theme").map(String::as_str), Some("neon"));
        assert_eq!(entries[0].data.get("attempts").map(String::as_str), Some("2"));
    }

    #[test]
    fn keeps_only_the_most_recent_entries() {
        let buffer = LogBuffer::with_capacity(3);
        let subscriber = tracing_subscriber::registry().with(buffer.clone());

        tracing::subscriber::with_default(subscriber, || {
            for i in 0..5 {
                tracing::info!(i, "event");
            }
        });

        let kept: Vec<_> = buffer
            .entries()
            .into_iter()
            .map(|entry| entry.data["i"].clone())
            .collect();
        assert_eq!(kept, ["2", "3", "4"]);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(buffer.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("boom");
        });
        assert_eq!(buffer.entries().len(), 1);

        buffer.clear();
        assert!(buffer.entries().is_empty());
    }

    #[test]
    fn default_capacity_is_one_hundred() {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::registry().with(buffer.clone());

        tracing::subscriber::with_default(subscriber, || {
            for i in 0..150 {
                tracing::info!(i, "event");
            }
        });

        let entries = buffer.entries();
        assert_eq!(entries.len(), DEFAULT_LOG_CAPACITY);
        assert_eq!(entries[0].data["i"], "50");
    }
}
