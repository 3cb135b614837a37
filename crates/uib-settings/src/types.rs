//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial
//! JSON document only needs the fields it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings for the client runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Reconnect supervision.
    pub retry: RetrySettings,
    /// Logical channel names.
    pub channels: ChannelNames,
    /// Path of the transport endpoint on the server.
    pub io_path: String,
    /// Transport preference list, tried in order.
    pub transports: Vec<TransportKind>,
    /// Script/style injection from inbound messages.
    pub injection: InjectionSettings,
    /// Initial debug state.
    pub debug: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            retry: RetrySettings::default(),
            channels: ChannelNames::default(),
            io_path: "/uibuilder/socket.io".to_string(),
            transports: vec![TransportKind::Polling, TransportKind::Websocket],
            injection: InjectionSettings::default(),
            debug: false,
        }
    }
}

impl ClientSettings {
    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        self.channels.validate()?;
        if self.transports.is_empty() {
            return Err(SettingsError::InvalidValue(
                "transports must list at least one transport".into(),
            ));
        }
        Ok(())
    }
}

/// Reconnect timer parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    /// Delay before the first reconnect attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub factor: f64,
    /// Upper bound on the delay in milliseconds; `0` leaves growth unbounded.
    pub max_delay_ms: u64,
    /// Arm the retry timer at startup so a first connection that never
    /// succeeds is retried too.
    pub watch_startup: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2000,
            factor: 1.5,
            max_delay_ms: 60_000,
            watch_startup: true,
        }
    }
}

impl RetrySettings {
    /// Settings with no delay cap, matching the classic client exactly.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Initial delay as a [`Duration`].
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Delay cap, `None` when unbounded.
    #[must_use]
    pub fn max_delay(&self) -> Option<Duration> {
        (self.max_delay_ms > 0).then(|| Duration::from_millis(self.max_delay_ms))
    }

    fn validate(&self) -> Result<()> {
        if self.initial_delay_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "retry.initialDelayMs must be greater than 0".into(),
            ));
        }
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(SettingsError::InvalidValue(format!(
                "retry.factor must be a finite number >= 1, got {}",
                self.factor
            )));
        }
        if self.max_delay_ms > 0 && self.max_delay_ms < self.initial_delay_ms {
            return Err(SettingsError::InvalidValue(format!(
                "retry.maxDelayMs ({}) is below retry.initialDelayMs ({})",
                self.max_delay_ms, self.initial_delay_ms
            )));
        }
        Ok(())
    }
}

/// Names of the three logical channels multiplexed over the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelNames {
    /// Server-to-client administrative messages.
    pub control: String,
    /// Client-to-server data.
    pub client: String,
    /// Server-to-client data.
    pub server: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            control: "uiBuilderControl".to_string(),
            client: "uiBuilderClient".to_string(),
            server: "uiBuilder".to_string(),
        }
    }
}

impl ChannelNames {
    fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("control", &self.control),
            ("client", &self.client),
            ("server", &self.server),
        ] {
            if name.trim().is_empty() {
                return Err(SettingsError::InvalidValue(format!(
                    "channels.{field} must not be empty"
                )));
            }
        }
        if self.control == self.client || self.control == self.server || self.client == self.server
        {
            return Err(SettingsError::InvalidValue(
                "channel names must be distinct".into(),
            ));
        }
        Ok(())
    }
}

/// Transport mechanisms the channel library may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// HTTP long-polling.
    Polling,
    /// WebSocket streaming upgrade.
    Websocket,
}

impl TransportKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Websocket => "websocket",
        }
    }
}

/// Controls for script/style payloads carried on inbound messages.
///
/// These seed the `allowScript`, `allowStyle`, `removeScript` and
/// `removeStyle` properties, which the application may change later.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InjectionSettings {
    /// Inject `msg.script` into the document body.
    pub allow_script: bool,
    /// Inject `msg.style` into the document head.
    pub allow_style: bool,
    /// Drop `msg.script` from the stored message after injection.
    pub remove_script: bool,
    /// Drop `msg.style` from the stored message after injection.
    pub remove_style: bool,
}

impl Default for InjectionSettings {
    fn default() -> Self {
        Self {
            allow_script: true,
            allow_style: true,
            remove_script: true,
            remove_style: true,
        }
    }
}
