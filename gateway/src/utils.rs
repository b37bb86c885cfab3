use serde_json::Value;

/// JavaScript-style truthiness for relayed JSON values. The backend's
/// looser contracts (counts, chat replies) are defined in those terms.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Reads a non-empty string field out of a JSON body, tolerating bodies
/// that are not JSON at all.
pub(crate) fn json_field(body: &str, field: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
