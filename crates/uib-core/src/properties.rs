//! Well-known property names and the protected-name registry.
//!
//! The store itself is keyed by plain strings so applications can keep their
//! own state next to the client's. The names the client owns are listed here
//! as [`PropertyKey`]; every one of them is protected from the external `set`,
//! as are the facade's own method names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Properties maintained by the client runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    /// Client library version.
    Version,
    /// Last message received on the server-to-client channel.
    Msg,
    /// Last message received on the control channel.
    CtrlMsg,
    /// Last message sent to the server.
    SentMsg,
    /// Number of messages sent.
    MsgsSent,
    /// Number of data messages received.
    MsgsReceived,
    /// Number of control messages received.
    MsgsCtrl,
    /// Logical channel names in use.
    IoChannels,
    /// Initial reconnect delay in milliseconds.
    RetryMs,
    /// Multiplier applied to the delay after each reconnect attempt.
    RetryFactor,
    /// Identifier of the pending reconnect timer, null when none.
    #[serde(rename = "timerid")]
    TimerId,
    /// Namespace derived from the page path.
    IoNamespace,
    /// Path of the transport endpoint on the server.
    IoPath,
    /// Transport preference list.
    IoTransport,
    /// Whether the transport is currently connected.
    IoConnected,
}

impl PropertyKey {
    /// Every well-known key, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Version,
        Self::Msg,
        Self::CtrlMsg,
        Self::SentMsg,
        Self::MsgsSent,
        Self::MsgsReceived,
        Self::MsgsCtrl,
        Self::IoChannels,
        Self::RetryMs,
        Self::RetryFactor,
        Self::TimerId,
        Self::IoNamespace,
        Self::IoPath,
        Self::IoTransport,
        Self::IoConnected,
    ];

    /// Name as stored in the property map.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Msg => "msg",
            Self::CtrlMsg => "ctrlMsg",
            Self::SentMsg => "sentMsg",
            Self::MsgsSent => "msgsSent",
            Self::MsgsReceived => "msgsReceived",
            Self::MsgsCtrl => "msgsCtrl",
            Self::IoChannels => "ioChannels",
            Self::RetryMs => "retryMs",
            Self::RetryFactor => "retryFactor",
            Self::TimerId => "timerid",
            Self::IoNamespace => "ioNamespace",
            Self::IoPath => "ioPath",
            Self::IoTransport => "ioTransport",
            Self::IoConnected => "ioConnected",
        }
    }

    /// Look up a well-known key by its stored name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl AsRef<str> for PropertyKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method and internal names that are reserved alongside the well-known keys.
pub const RESERVED_NAMES: [&str; 12] = [
    "set",
    "get",
    "debug",
    "send",
    "onChange",
    "socket",
    "checkConnect",
    "events",
    "emit",
    "uiReturn",
    "uiDebug",
    "me",
];

/// Whether `name` may only be written by the runtime itself.
#[must_use]
pub fn is_protected(name: &str) -> bool {
    PropertyKey::from_name(name).is_some() || RESERVED_NAMES.contains(&name)
}
