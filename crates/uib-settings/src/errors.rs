//! Errors raised while building [`ClientSettings`](crate::ClientSettings).
//!
//! Only settings loading returns errors to the host. Once a session is
//! running, transport and property failures are logged through the debug
//! gate instead.

use std::path::PathBuf;

use thiserror::Error;

/// Why a uibuilder client configuration could not be produced.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read uibuilder client settings from {}: {source}", path.display())]
    Io {
        /// File the host pointed the loader at.
        path: PathBuf,
        /// Underlying read failure.
        source: std::io::Error,
    },
    /// The document is not JSON, or does not fit the client settings shape
    /// (unknown transport kind, wrong field type).
    #[error("uibuilder client settings are malformed: {0}")]
    Json(#[from] serde_json::Error),
    /// A field parsed but breaks a constraint such as `retry.factor >= 1`.
    #[error("invalid uibuilder client setting: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
