//! Property store error types.

use thiserror::Error;

/// Errors raised when mutating the property store through the external path.
///
/// These never reach the host page: the facade logs them through the debug
/// gate and drops the write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The property name is reserved for internal state.
    #[error("\"{0}\" is in list of excluded attributes, not set")]
    Protected(String),
}

impl PropertyError {
    /// Name of the property the write was aimed at.
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Protected(name) => name,
        }
    }
}
