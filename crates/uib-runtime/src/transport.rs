//! The bidirectional channel to the server.
//!
//! The runtime never talks to the network itself. A host supplies a
//! [`Transport`] for outbound calls and feeds what the channel library
//! reports back in as [`TransportEvent`]s through an [`EventSender`].

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uib_settings::TransportKind;

use crate::errors::TransportError;

/// Outbound side of the channel.
///
/// Calls are made from the supervisor task and from facade callers, so
/// implementations must be thread-safe. None of them may block for long.
pub trait Transport: Send + Sync {
    /// Start connecting. Completion is reported later as
    /// [`TransportEvent::Connect`].
    fn open(&self, options: &ConnectOptions) -> Result<(), TransportError>;

    /// Drop the current connection, if any.
    fn close(&self);

    /// Send `message` on the logical channel `channel`.
    fn emit(&self, channel: &str, message: &Value) -> Result<(), TransportError>;
}

/// Parameters for [`Transport::open`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Namespace derived from the page path, e.g. `/uibuilder/app`.
    pub namespace: String,
    /// Transport endpoint path on the server.
    pub path: String,
    /// Transports to try, in order.
    pub transports: Vec<TransportKind>,
}

/// Why the channel went down, as reported by the channel library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server ended the session (`io server disconnect`).
    ServerDisconnect,
    /// This side closed the channel (`io client disconnect`).
    ClientDisconnect,
    /// The underlying connection closed (`transport close`).
    TransportClose,
    /// The underlying connection failed (`transport error`).
    TransportError,
    /// Heartbeats stopped arriving (`ping timeout`).
    PingTimeout,
    /// Anything else.
    Other(String),
}

impl DisconnectReason {
    /// Parse the reason string the channel library reports.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "io server disconnect" => Self::ServerDisconnect,
            "io client disconnect" => Self::ClientDisconnect,
            "transport close" => Self::TransportClose,
            "transport error" => Self::TransportError,
            "ping timeout" => Self::PingTimeout,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Reason string as reported on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ServerDisconnect => "io server disconnect",
            Self::ClientDisconnect => "io client disconnect",
            Self::TransportClose => "transport close",
            Self::TransportError => "transport error",
            Self::PingTimeout => "ping timeout",
            Self::Other(reason) => reason,
        }
    }

    /// Whether the server ended the session. The channel library does not
    /// recover from this on its own, so only this reason starts the manual
    /// reconnect loop.
    pub fn is_server_initiated(&self) -> bool {
        matches!(self, Self::ServerDisconnect)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the channel library reported.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// The channel is up.
    Connect,
    /// The channel went down.
    Disconnect(DisconnectReason),
    /// A message arrived on a logical channel.
    Message {
        /// Logical channel name.
        channel: String,
        /// Raw payload, any JSON value.
        payload: Value,
    },
}

impl TransportEvent {
    /// A disconnect with the given wire reason.
    pub fn disconnect(reason: &str) -> Self {
        Self::Disconnect(DisconnectReason::from_wire(reason))
    }

    /// A message on `channel`.
    pub fn message(channel: impl Into<String>, payload: Value) -> Self {
        Self::Message {
            channel: channel.into(),
            payload,
        }
    }
}

/// Sending half used by transports to report events.
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Receiving half consumed by [`Supervisor::run`](crate::Supervisor::run).
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Create the event channel between a transport and the supervisor.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
