//! # uib-settings
//!
//! Configuration for the uibuilder client runtime.
//!
//! Everything has a compiled-in default ([`ClientSettings::default()`]) that
//! reproduces the classic front-end behaviour: 2 s initial reconnect delay,
//! ×1.5 growth, the three `uiBuilder*` channel names, polling before
//! websocket, and script/style injection enabled.
//!
//! A host may layer a JSON document over the defaults:
//!
//! ```no_run
//! use uib_settings::load_settings_from_str;
//!
//! let settings = load_settings_from_str(r#"{"retry": {"maxDelayMs": 30000}}"#)?;
//! assert_eq!(settings.retry.initial_delay_ms, 2000);
//! # Ok::<(), uib_settings::SettingsError>(())
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings_from_path, load_settings_from_str};
pub use types::*;
