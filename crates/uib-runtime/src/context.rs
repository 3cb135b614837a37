//! State shared between the facade and the supervisor.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use uib_core::constants::VERSION;
use uib_core::{DebugLog, LogKind, PropertyKey};
use uib_settings::ClientSettings;

use crate::document::Document;
use crate::namespace::derive_namespace;
use crate::store::PropertyStore;
use crate::supervisor::ConnectionState;
use crate::transport::{ConnectOptions, Transport};

/// One client session: settings, property store, debug gate, and the two
/// host-provided seams.
///
/// Built once by [`UiBuilder::new`](crate::UiBuilder::new) and shared by
/// `Arc` with the [`Supervisor`](crate::Supervisor). Nothing outside the
/// crate can reach it, so protected properties only change through the
/// router and the supervisor.
pub(crate) struct Context {
    pub(crate) settings: ClientSettings,
    pub(crate) namespace: String,
    pub(crate) log: Arc<DebugLog>,
    pub(crate) store: PropertyStore,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) document: Arc<dyn Document>,
    pub(crate) state: Mutex<ConnectionState>,
}

impl Context {
    /// Build a context and seed the store. Seeding notifies nobody.
    pub(crate) fn new(
        settings: ClientSettings,
        page_path: &str,
        transport: Arc<dyn Transport>,
        document: Arc<dyn Document>,
    ) -> Self {
        let log = Arc::new(DebugLog::new(settings.debug));
        let namespace = derive_namespace(page_path);
        log.log(LogKind::Log, format!("IO Namespace: {namespace}"));

        let ctx = Self {
            store: PropertyStore::new(log.clone()),
            settings,
            namespace,
            log,
            transport,
            document,
            state: Mutex::new(ConnectionState::Idle),
        };
        ctx.seed();
        ctx
    }

    fn seed(&self) {
        let settings = &self.settings;
        let transports: Vec<&str> = settings.transports.iter().map(|t| t.as_str()).collect();
        let seeds = [
            (PropertyKey::Version.as_str(), json!(VERSION)),
            (PropertyKey::Msg.as_str(), json!({})),
            (PropertyKey::CtrlMsg.as_str(), json!({})),
            (PropertyKey::SentMsg.as_str(), json!({})),
            (PropertyKey::MsgsSent.as_str(), json!(0)),
            (PropertyKey::MsgsReceived.as_str(), json!(0)),
            (PropertyKey::MsgsCtrl.as_str(), json!(0)),
            (
                PropertyKey::IoChannels.as_str(),
                json!({
                    "control": settings.channels.control,
                    "client": settings.channels.client,
                    "server": settings.channels.server,
                }),
            ),
            (PropertyKey::RetryMs.as_str(), json!(settings.retry.initial_delay_ms)),
            (PropertyKey::RetryFactor.as_str(), json!(settings.retry.factor)),
            (PropertyKey::TimerId.as_str(), Value::Null),
            (PropertyKey::IoNamespace.as_str(), json!(self.namespace)),
            (PropertyKey::IoPath.as_str(), json!(settings.io_path)),
            (PropertyKey::IoTransport.as_str(), json!(transports)),
            (PropertyKey::IoConnected.as_str(), json!(false)),
            ("allowScript", json!(settings.injection.allow_script)),
            ("allowStyle", json!(settings.injection.allow_style)),
            ("removeScript", json!(settings.injection.remove_script)),
            ("removeStyle", json!(settings.injection.remove_style)),
        ];
        for (name, value) in seeds {
            self.store.write_quiet(name, value);
        }
    }

    /// Options passed to [`Transport::open`].
    pub(crate) fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            namespace: self.namespace.clone(),
            path: self.settings.io_path.clone(),
            transports: self.settings.transports.clone(),
        }
    }

    /// Current connection state.
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        if previous != next {
            self.log
                .log(LogKind::Log, format!("connection state: {previous} -> {next}"));
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("namespace", &self.namespace)
            .field("state", &self.state())
            .field("debug", &self.log.is_enabled())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
