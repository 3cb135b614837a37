//! Transport error types.

use thiserror::Error;

/// Errors a [`Transport`](crate::Transport) implementation may report.
///
/// The runtime never escalates these: they are logged through the debug gate
/// and the supervisor keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The channel is not open.
    #[error("transport is not connected")]
    NotConnected,
    /// Opening the channel failed.
    #[error("failed to open transport: {0}")]
    Open(String),
    /// Emitting a message failed.
    #[error("failed to emit on channel {channel}: {reason}")]
    Emit {
        /// Channel the message was aimed at.
        channel: String,
        /// Why the emit failed.
        reason: String,
    },
}
