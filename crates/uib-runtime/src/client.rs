//! The application-facing handle.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};
use uib_core::constants::version_banner;
use uib_core::{LogKind, PropertyKey};
use uib_settings::ClientSettings;

use crate::context::Context;
use crate::document::Document;
use crate::router;
use crate::supervisor::{ConnectionState, Supervisor};
use crate::transport::Transport;

/// What [`UiBuilder::me`] returns.
#[derive(Clone, Debug, PartialEq)]
pub enum Introspection {
    /// Full client state, returned while debugging.
    State(Value),
    /// Version banner, returned otherwise.
    Version(String),
}

/// Cloneable handle to one client session.
///
/// Every clone talks to the same store and transport. The handle never
/// blocks on the network: `send` hands the message to the transport and
/// returns.
#[derive(Clone)]
pub struct UiBuilder {
    ctx: Arc<Context>,
}

impl UiBuilder {
    /// Build a session for the page at `page_path`.
    ///
    /// Nothing is opened yet. The returned [`Supervisor`] does that when it
    /// is started or run.
    pub fn new(
        settings: ClientSettings,
        page_path: &str,
        transport: Arc<dyn Transport>,
        document: Arc<dyn Document>,
    ) -> (Self, Supervisor) {
        let ctx = Arc::new(Context::new(settings, page_path, transport, document));
        let supervisor = Supervisor::new(ctx.clone());
        (Self { ctx }, supervisor)
    }

    /// Current value of a property.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.ctx.store.get(name)
    }

    /// Set an application property.
    ///
    /// Protected names are refused with a debug-gated warning and nothing
    /// changes.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let _ = self.ctx.store.set_external(name, value.into());
    }

    /// Register `callback` to run whenever `name` is set.
    pub fn on_change<F>(&self, name: &str, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.ctx.store.on_change(name, callback);
    }

    /// Send a message to the server.
    pub fn send(&self, message: impl Into<Value>) {
        router::send(&self.ctx, message.into());
    }

    /// Whether debug output is on.
    pub fn debug(&self) -> bool {
        self.ctx.log.is_enabled()
    }

    /// Turn debug output on or off.
    pub fn set_debug(&self, on: bool) {
        let _ = self.ctx.log.set_enabled(on);
    }

    /// Log `message` at the level for `kind`, if debugging.
    pub fn ui_debug(&self, kind: LogKind, message: impl fmt::Display) {
        self.ctx.log.log(kind, message);
    }

    /// Full state while debugging, otherwise just the version banner.
    pub fn me(&self) -> Introspection {
        if !self.debug() {
            return Introspection::Version(version_banner());
        }
        let listeners = self.ctx.store.listeners();
        let listener_counts: serde_json::Map<String, Value> = listeners
            .names()
            .into_iter()
            .map(|name| {
                let count = listeners.count(&name);
                (name, json!(count))
            })
            .collect();
        Introspection::State(json!({
            "version": uib_core::constants::VERSION,
            "debug": true,
            "namespace": self.ctx.namespace,
            "connectionState": self.ctx.state(),
            "settings": serde_json::to_value(&self.ctx.settings).unwrap_or_default(),
            "properties": self.ctx.store.snapshot(),
            "listeners": listener_counts,
        }))
    }

    /// Last message received from the server, `{}` before the first one.
    pub fn msg(&self) -> Value {
        self.get(PropertyKey::Msg.as_str())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }

    /// Namespace derived from the page path.
    pub fn namespace(&self) -> &str {
        &self.ctx.namespace
    }

    /// Whether the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.ctx.store.flag(PropertyKey::IoConnected.as_str())
    }

    /// Current supervisor state.
    pub fn connection_state(&self) -> ConnectionState {
        self.ctx.state()
    }
}

impl fmt::Debug for UiBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiBuilder").field("ctx", &self.ctx).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NoopDocument;
    use crate::testing::RecordingTransport;
    use assert_matches::assert_matches;
    use uib_core::logging::test_utils::capture_logs;

    fn client() -> (UiBuilder, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let (ui, _supervisor) = UiBuilder::new(
            ClientSettings::default(),
            "/uibuilder/app/",
            transport.clone(),
            Arc::new(NoopDocument),
        );
        (ui, transport)
    }

    #[test]
    fn set_and_get_application_value() {
        let (ui, _) = client();
        ui.set("myVar", 42);
        assert_eq!(ui.get("myVar"), Some(json!(42)));
    }

    #[test]
    fn set_protected_is_ignored() {
        let (ui, _) = client();
        ui.set("msgsSent", 99);
        ui.set("me", "overwritten");
        assert_eq!(ui.get("msgsSent"), Some(json!(0)));
        assert_eq!(ui.get("me"), None);
    }

    #[test]
    fn on_change_then_set_fires() {
        let (ui, _) = client();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        ui.on_change("colour", move |v| sink.lock().push(v.clone()));
        ui.set("colour", "red");
        assert_eq!(*seen.lock(), vec![json!("red")]);
    }

    #[test]
    fn clones_share_state() {
        let (ui, _) = client();
        let other = ui.clone();
        other.set("shared", true);
        assert_eq!(ui.get("shared"), Some(json!(true)));
    }

    #[test]
    fn send_emits_on_client_channel() {
        let (ui, transport) = client();
        ui.send(json!({"payload": "x"}));
        assert_eq!(
            transport.emitted(),
            vec![("uiBuilderClient".to_string(), json!({"payload": "x"}))]
        );
        assert_eq!(ui.get("msgsSent"), Some(json!(1)));
    }

    #[test]
    fn debug_toggle() {
        let (ui, _) = client();
        assert!(!ui.debug());
        ui.set_debug(true);
        assert!(ui.debug());
    }

    #[test]
    fn ui_debug_is_gated() {
        let (logs, _guard) = capture_logs();
        let (ui, _) = client();
        ui.ui_debug(LogKind::Info, "hidden");
        assert!(!logs.has_message("hidden"));
        ui.set_debug(true);
        ui.ui_debug(LogKind::Warn, "shown");
        assert!(logs.has_event(tracing::Level::WARN, "shown"));
    }

    #[test]
    fn me_returns_version_when_not_debugging() {
        let (ui, _) = client();
        assert_eq!(ui.me(), Introspection::Version(version_banner()));
    }

    #[test]
    fn me_returns_state_when_debugging() {
        let (ui, _) = client();
        ui.on_change("msg", |_| {});
        ui.set_debug(true);
        let state = assert_matches!(ui.me(), Introspection::State(state) => state);
        assert_eq!(state["namespace"], "/uibuilder/app");
        assert_eq!(state["connectionState"], "idle");
        assert_eq!(state["properties"]["msgsReceived"], 0);
        assert_eq!(state["settings"]["ioPath"], "/uibuilder/socket.io");
        assert_eq!(state["listeners"]["msg"], 1);
    }

    #[test]
    fn msg_defaults_to_empty_object() {
        let (ui, _) = client();
        assert_eq!(ui.msg(), json!({}));
    }

    #[test]
    fn accessors() {
        let (ui, _) = client();
        assert_eq!(ui.namespace(), "/uibuilder/app");
        assert!(!ui.is_connected());
        assert_eq!(ui.connection_state(), ConnectionState::Idle);
    }
}
