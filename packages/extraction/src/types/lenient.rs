//! Tolerant readers for stored fields.
//!
//! A stored value of the wrong shape reads as absent instead of failing the
//! whole record.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Non-empty trimmed string; numbers and booleans are rendered as text.
pub(crate) fn text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Score in 0..=100 from an integer, a float (rounded) or a numeric string.
pub(crate) fn score(value: Option<Value>) -> Option<u8> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rounded = raw.round();
    (0.0..=100.0).contains(&rounded).then_some(rounded as u8)
}

/// Typed value, or `None` when the shape does not match.
pub(crate) fn typed<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}
