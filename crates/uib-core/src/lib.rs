//! # uib-core
//!
//! Foundation types shared by the uibuilder client crates:
//!
//! - **Property keys**: [`PropertyKey`] for the well-known state names and the
//!   protected-name check used by the external `set`
//! - **Messages**: [`Message`] and [`normalize_message`] for coercing inbound
//!   payloads into a mapping
//! - **Errors**: [`PropertyError`] via `thiserror`
//! - **Logging**: [`DebugLog`] gate over `tracing`, subscriber setup, and log
//!   capture for tests

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod logging;
pub mod message;
pub mod properties;

pub use errors::PropertyError;
pub use logging::{DebugLog, LogKind};
pub use message::{Message, is_truthy, normalize_message};
pub use properties::{PropertyKey, is_protected};
