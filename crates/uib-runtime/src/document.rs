//! Where injected script and style blocks go.

/// The page document, as far as the runtime touches it.
///
/// Blocks are only ever appended; nothing is removed.
pub trait Document: Send + Sync {
    /// Append a deferred `<script>` holding `text` to the end of the body.
    fn append_script(&self, text: &str);

    /// Append a `<style>` holding `text` to the end of the head.
    fn append_style(&self, text: &str);
}

/// A document that discards everything, for headless hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDocument;

impl Document for NoopDocument {
    fn append_script(&self, _text: &str) {}

    fn append_style(&self, _text: &str) {}
}
