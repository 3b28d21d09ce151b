//! Rolling Logger
//!
//! A `tracing` layer that keeps the most recent log lines in a bounded
//! in-memory buffer, for display inside the app. Each line can also be
//! echoed to a sink (the browser console, stderr, ...).

use chrono::Local;
use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Receives every formatted line
pub type Sink = Box<dyn Fn(Level, &str) + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

/// One formatted event
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// Local wall clock, `HH:MM:SS.mmm`
    pub timestamp: String,
    pub level: Level,
    pub target: String,
    /// Message followed by ` key=value` fields
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: {}", self.timestamp, self.level, self.target, self.message)
    }
}

/// Shared ring buffer of log lines; clones see the same lines
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<LogLine>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogLine>> {
        // A panic mid-push leaves the deque intact
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append, evicting the oldest line when full
    pub fn push(&self, line: LogLine) {
        let mut lines = self.lock();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Oldest first
    pub fn snapshot(&self) -> Vec<LogLine> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

pub struct RollingLayer {
    buffer: LogBuffer,
    sink: Option<Sink>,
}

impl RollingLayer {
    pub fn new(buffer: LogBuffer, sink: Option<Sink>) -> Self {
        Self { buffer, sink }
    }
}

impl<S: Subscriber> Layer<S> for RollingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = LogLine {
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            level: *meta.level(),
            target: meta.target().to_string(),
            message: visitor.finish(),
        };
        if let Some(sink) = &self.sink {
            sink(line.level, &line.to_string());
        }
        self.buffer.push(line);
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Lines kept in memory
    pub capacity: usize,
    /// Most verbose level recorded
    pub level: Level,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            level: Level::INFO,
        }
    }
}

/// Install the rolling layer as the global subscriber.
///
/// Returns the buffer the layer writes into.
pub fn init_logger(config: LoggerConfig, sink: Option<Sink>) -> Result<LogBuffer, LoggerError> {
    let buffer = LogBuffer::new(config.capacity);
    tracing_subscriber::registry()
        .with(LevelFilter::from_level(config.level))
        .with(RollingLayer::new(buffer.clone(), sink))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn line(message: &str) -> LogLine {
        LogLine {
            timestamp: "00:00:00.000".to_string(),
            level: Level::INFO,
            target: "test".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push(line("a"));
        buffer.push(line("b"));
        buffer.push(line("c"));

        let messages: Vec<String> = buffer.snapshot().into_iter().map(|l| l.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
        assert_eq!(buffer.len(), 2);

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_one_line() {
        let buffer = LogBuffer::new(0);
        buffer.push(line("a"));
        buffer.push(line("b"));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.snapshot()[0].message, "b");
    }

    #[test]
    fn test_display_format() {
        let rendered = line("hello").to_string();
        assert_eq!(rendered, "00:00:00.000 INFO test: hello");
    }

    #[test]
    fn test_layer_records_message_and_fields() {
        let buffer = LogBuffer::new(10);
        let echoed = Arc::new(AtomicUsize::new(0));
        let counter = echoed.clone();
        let sink: Sink = Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::INFO)
            .with(RollingLayer::new(buffer.clone(), Some(sink)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(item_id = 7, "created item");
            tracing::debug!("filtered out");
            tracing::warn!(key = "x", "careful");
        });

        let lines = buffer.snapshot();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "created item item_id=7");
        assert_eq!(lines[1].level, Level::WARN);
        assert_eq!(lines[1].message, "careful key=x");
        assert_eq!(echoed.load(Ordering::SeqCst), 2);
    }
}
