//! Inbound message normalization.
//!
//! Whatever arrives on a channel is turned into a JSON object before it is
//! stored, so listeners can always index into `msg` and `ctrlMsg`.

use serde_json::{Map, Value};

/// A normalized message: always a JSON object.
pub type Message = Map<String, Value>;

/// Field that non-object payloads are wrapped under.
pub const PAYLOAD_FIELD: &str = "payload";

/// Coerce a raw channel payload into a [`Message`].
///
/// - objects are used as they are
/// - `null` becomes an empty object
/// - anything else, arrays included, is wrapped as `{ "payload": raw }`
#[must_use]
pub fn normalize_message(raw: Value) -> Message {
    match raw {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            let _ = map.insert(PAYLOAD_FIELD.to_owned(), other);
            map
        }
    }
}

/// Loose truthiness used when a control message toggles debug mode.
///
/// `false`, `null`, `0`, and the empty string are false; everything else,
/// including empty arrays and objects, is true.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
