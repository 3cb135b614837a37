//! Debug-gated diagnostics on top of `tracing`.
//!
//! The client stays silent unless debug mode is on. Debug mode can be flipped
//! by the application through the facade or by the server through a control
//! message, so the flag lives in a shared [`DebugLog`] that every component
//! logs through.
//!
//! - [`LogKind`]: the console-style kinds the facade accepts
//! - [`DebugLog`]: the gate itself
//! - [`init_subscriber`]: stderr `tracing` subscriber for hosts that want one
//! - [`test_utils`]: in-memory capture for assertions

pub mod test_utils;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Target used for every event emitted through [`DebugLog`].
pub const TARGET: &str = "uibuilder";

/// Console-style log kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Plain log line (DEBUG).
    Log,
    /// Informational (INFO).
    Info,
    /// Warning (WARN).
    Warn,
    /// Error (ERROR).
    Error,
    /// Structured dump of a value (TRACE).
    Dir,
}

impl LogKind {
    /// Parse a kind name; anything unrecognized is a plain log line.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            "dir" => Self::Dir,
            _ => Self::Log,
        }
    }

    /// Matching `tracing` level.
    #[must_use]
    pub const fn level(self) -> tracing::Level {
        match self {
            Self::Log => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
            Self::Dir => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
            Self::Dir => write!(f, "dir"),
        }
    }
}

/// Shared debug switch; every diagnostic goes through it.
#[derive(Debug, Default)]
pub struct DebugLog {
    enabled: AtomicBool,
}

impl DebugLog {
    /// Create a gate with the given initial state.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Whether debug output is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Turn debug output on or off, returning the previous state.
    pub fn set_enabled(&self, on: bool) -> bool {
        self.enabled.swap(on, Ordering::Relaxed)
    }

    /// Emit `message` at the level matching `kind`, if debugging.
    pub fn log(&self, kind: LogKind, message: impl fmt::Display) {
        if !self.is_enabled() {
            return;
        }
        match kind {
            LogKind::Log => tracing::debug!(target: TARGET, "{message}"),
            LogKind::Info => tracing::info!(target: TARGET, "{message}"),
            LogKind::Warn => tracing::warn!(target: TARGET, "{message}"),
            LogKind::Error => tracing::error!(target: TARGET, "{message}"),
            LogKind::Dir => tracing::trace!(target: TARGET, "{message}"),
        }
    }

    /// Dump a JSON value under a label, if debugging.
    pub fn dir(&self, label: &str, value: &serde_json::Value) {
        if self.is_enabled() {
            tracing::trace!(target: TARGET, value = %value, "{label}");
        }
    }
}

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at startup; later calls are no-ops. `RUST_LOG` wins over
/// `level` when set.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}
