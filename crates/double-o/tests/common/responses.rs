//! Canned service response bodies

use serde_json::{Value, json};

/// Successful `/api/secret` body.
pub fn secret_response(value: &str) -> Value {
    json!({ "value": value })
}

/// Successful `/api/env` body.
pub fn env_response(pairs: &[(&str, &str)]) -> Value {
    let secrets: serde_json::Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
        .collect();
    json!({ "secrets": secrets })
}

/// 2xx body reporting an upstream error.
pub fn error_response(message: &str) -> Value {
    json!({ "error": message })
}
