//! Log capture for tests that assert on what the debug gate let through.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

use super::{LogKind, TARGET};

/// One event seen by the capture layer.
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Level it was emitted at.
    pub level: Level,
    /// Event target.
    pub target: String,
    /// Rendered message.
    pub message: String,
    /// Structured fields other than the message, by name.
    pub fields: BTreeMap<String, String>,
}

impl LogRecord {
    /// Whether the client runtime emitted it.
    pub fn is_client(&self) -> bool {
        self.target == TARGET
    }

    /// A structured field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Shared handle to the captured records.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl CapturedLogs {
    fn with<R>(&self, f: impl FnOnce(&mut Vec<LogRecord>) -> R) -> R {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut records)
    }

    /// Every record so far, oldest first.
    pub fn events(&self) -> Vec<LogRecord> {
        self.with(|records| records.clone())
    }

    /// Records emitted by the client runtime.
    pub fn client_events(&self) -> Vec<LogRecord> {
        self.with(|records| records.iter().filter(|r| r.is_client()).cloned().collect())
    }

    /// Whether any record's message contains `needle`.
    pub fn has_message(&self, needle: &str) -> bool {
        self.with(|records| records.iter().any(|r| r.message.contains(needle)))
    }

    /// Whether any record at `level` has a message containing `needle`.
    pub fn has_event(&self, level: Level, needle: &str) -> bool {
        self.with(|records| {
            records
                .iter()
                .any(|r| r.level == level && r.message.contains(needle))
        })
    }

    /// Number of client records emitted for `kind`.
    pub fn count_kind(&self, kind: LogKind) -> usize {
        let level = kind.level();
        self.with(|records| {
            records
                .iter()
                .filter(|r| r.is_client() && r.level == level)
                .count()
        })
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.with(Vec::clear);
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

impl RecordVisitor {
    fn put(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            let _ = self.fields.insert(field.name().to_owned(), value);
        }
    }
}

struct CaptureLayer(CapturedLogs);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let record = LogRecord {
            level: *metadata.level(),
            target: metadata.target().to_owned(),
            message: visitor.message,
            fields: visitor.fields,
        };
        self.0.with(|records| records.push(record));
    }
}

/// Capture every event on the current thread until the guard drops.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer(logs.clone()));
    (logs, tracing::subscriber::set_default(subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_level_and_message() {
        let (logs, _guard) = capture_logs();
        tracing::warn!("something went wrong");
        assert!(logs.has_event(Level::WARN, "something went wrong"));
        assert!(!logs.has_event(Level::ERROR, "something went wrong"));
    }

    #[test]
    fn client_events_filter_by_target() {
        let (logs, _guard) = capture_logs();
        tracing::info!(target: "uibuilder", "client event");
        tracing::info!(target: "host::page", "page event");

        let ours = logs.client_events();
        assert_eq!(ours.len(), 1);
        assert_eq!(ours[0].message, "client event");
        assert_eq!(logs.events().len(), 2);
    }

    #[test]
    fn count_kind_and_clear() {
        let (logs, _guard) = capture_logs();
        tracing::info!(target: "uibuilder", "one");
        tracing::info!(target: "uibuilder", "two");
        tracing::info!(target: "elsewhere", "three");
        assert_eq!(logs.count_kind(LogKind::Info), 2);
        assert_eq!(logs.count_kind(LogKind::Error), 0);

        logs.clear();
        assert!(logs.events().is_empty());
    }

    #[test]
    fn structured_fields_are_kept() {
        let (logs, _guard) = capture_logs();
        tracing::info!(namespace = "/uib", attempt = 3_u64, "retry");

        let record = &logs.events()[0];
        assert_eq!(record.field("namespace"), Some("/uib"));
        assert_eq!(record.field("attempt"), Some("3"));
        assert_eq!(record.field("missing"), None);
    }
}
