pub mod canvas;
pub mod simulate;
pub mod timers;
pub mod webhook;

use serde_json::Value;

/// Inbox payloads send ids as strings or numbers.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
