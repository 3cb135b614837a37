//! Package-level constants.

/// Current version of the uibuilder client (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name, used as the prefix of introspection strings.
pub const NAME: &str = "uibuilder";

/// Human-readable version banner returned by `me()` outside debug mode.
#[must_use]
pub fn version_banner() -> String {
    format!("{NAME} client version: {VERSION}")
}
