use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One captured tracing event, pre-rendered for the dashboard's log panel.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// `12:00:01 WARN  scan Status query failed | path=/src/a`
    pub fn format_compact(&self) -> String {
        let mut line = format!(
            "{} {:<5} {} {}",
            self.timestamp,
            self.level,
            short_target(&self.target),
            self.message
        );
        if !self.fields.is_empty() {
            let mut extras: Vec<String> = self
                .fields
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            extras.sort();
            line.push_str(" | ");
            line.push_str(&extras.join(" "));
        }
        line
    }
}

/// `scope_core::scan` -> `scan`.
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Bounded, shareable ring of recent log entries.
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// The newest `count` entries, oldest first.
    pub fn tail(&self, count: usize) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| {
                let skip = entries.len().saturating_sub(count);
                entries.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }
}

/// Tracing layer that records every event into a [`LogBuffer`].
#[derive(Clone)]
pub struct LogLayer {
    buffer: LogBuffer,
}

impl LogLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        self.buffer.push(LogEntry {
            timestamp: clock_label(OffsetDateTime::now_utc()),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.push(field, format!("{value:?}"));
    }
}

fn clock_label(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(format_description!("[hour repr:24]:[minute]:[second]"))
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string())
}
