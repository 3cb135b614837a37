//! Recording doubles for [`Transport`] and [`Document`].
//!
//! Both record every call so tests can assert on what the runtime did
//! without a server or a page.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::document::Document;
use crate::errors::TransportError;
use crate::transport::{ConnectOptions, Transport};

/// One call made on a [`RecordingTransport`].
#[derive(Clone, Debug, PartialEq)]
pub enum TransportCall {
    /// `open` with these options.
    Open(ConnectOptions),
    /// `close`.
    Close,
    /// `emit` of `message` on `channel`.
    Emit {
        /// Logical channel.
        channel: String,
        /// Message as given.
        message: Value,
    },
}

/// A [`Transport`] that records calls and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    fail_open: AtomicBool,
    fail_emit: AtomicBool,
}

impl RecordingTransport {
    /// Create a transport that succeeds at everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, oldest first.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Number of `open` calls.
    pub fn opens(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Open(_)))
    }

    /// Number of `close` calls.
    pub fn closes(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Close))
    }

    /// `(channel, message)` for every `emit`, oldest first.
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Emit { channel, message } => Some((channel.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Make later `open` calls fail.
    pub fn fail_opens(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::Relaxed);
    }

    /// Make later `emit` calls fail.
    pub fn fail_emits(&self, fail: bool) {
        self.fail_emit.store(fail, Ordering::Relaxed);
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }
}

impl Transport for RecordingTransport {
    fn open(&self, options: &ConnectOptions) -> Result<(), TransportError> {
        self.calls.lock().push(TransportCall::Open(options.clone()));
        if self.fail_open.load(Ordering::Relaxed) {
            return Err(TransportError::Open("refused".into()));
        }
        Ok(())
    }

    fn close(&self) {
        self.calls.lock().push(TransportCall::Close);
    }

    fn emit(&self, channel: &str, message: &Value) -> Result<(), TransportError> {
        self.calls.lock().push(TransportCall::Emit {
            channel: channel.to_owned(),
            message: message.clone(),
        });
        if self.fail_emit.load(Ordering::Relaxed) {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }
}

/// A block appended to a [`RecordingDocument`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Injected {
    /// Deferred script appended to the body.
    Script(String),
    /// Style appended to the head.
    Style(String),
}

/// A [`Document`] that records appended blocks.
#[derive(Debug, Default)]
pub struct RecordingDocument {
    injected: Mutex<Vec<Injected>>,
}

impl RecordingDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every appended block, oldest first.
    pub fn injected(&self) -> Vec<Injected> {
        self.injected.lock().clone()
    }

    /// Script bodies appended to the body.
    pub fn scripts(&self) -> Vec<String> {
        self.injected
            .lock()
            .iter()
            .filter_map(|block| match block {
                Injected::Script(text) => Some(text.clone()),
                Injected::Style(_) => None,
            })
            .collect()
    }

    /// Style bodies appended to the head.
    pub fn styles(&self) -> Vec<String> {
        self.injected
            .lock()
            .iter()
            .filter_map(|block| match block {
                Injected::Style(text) => Some(text.clone()),
                Injected::Script(_) => None,
            })
            .collect()
    }
}

impl Document for RecordingDocument {
    fn append_script(&self, text: &str) {
        self.injected.lock().push(Injected::Script(text.to_owned()));
    }

    fn append_style(&self, text: &str) {
        self.injected.lock().push(Injected::Style(text.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transport_records_calls() {
        let transport = RecordingTransport::new();
        transport.close();
        transport.emit("c", &json!(1)).unwrap();
        assert_eq!(transport.closes(), 1);
        assert_eq!(transport.opens(), 0);
        assert_eq!(transport.emitted(), vec![("c".to_string(), json!(1))]);
        transport.clear();
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn transport_failures_still_record() {
        let transport = RecordingTransport::new();
        transport.fail_emits(true);
        assert_eq!(transport.emit("c", &json!(1)), Err(TransportError::NotConnected));
        assert_eq!(transport.emitted().len(), 1);
    }

    #[test]
    fn document_splits_by_kind() {
        let document = RecordingDocument::new();
        document.append_script("a()");
        document.append_style("b {}");
        assert_eq!(document.scripts(), vec!["a()"]);
        assert_eq!(document.styles(), vec!["b {}"]);
        assert_eq!(document.injected().len(), 2);
    }
}
