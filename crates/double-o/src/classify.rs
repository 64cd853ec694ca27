//! Response classification
//!
//! Turns the outcome of one call (a response of any status, or a transport
//! failure that survived the retry budget) into either the value the caller
//! asked for or exactly one typed [`Error`].
//!
//! Rules, applied in order:
//!
//! 1. HTTP 401 on any endpoint is [`Error::Authentication`], whatever the body.
//! 2. A transport failure becomes the endpoint's error kind, carrying the
//!    failure's message.
//! 3. Any other non-2xx status becomes the endpoint's error kind with an
//!    `HTTP error` message.
//! 4. A 2xx JSON body with an `error` field becomes [`Error::Authentication`]
//!    if the message mentions `auth` or `token` (case-insensitive), and the
//!    endpoint's error kind otherwise.
//! 5. A 2xx body without the expected field becomes the endpoint's error kind
//!    with a "no value returned" message.
//! 6. Otherwise the expected field is returned.
//!
//! Rule 4 is a heuristic over free text. An upstream message such as
//! `"token quota exceeded"` is reported as an authentication failure.
//!
//! Proxy responses skip rules 4-6: a 2xx JSON body is returned as-is, even
//! when it contains an `error` field.

use crate::environment::EnvironmentMap;
use crate::error::{Error, Result, TransportError};
use crate::http::RawResponse;
use serde_json::{Map, Value};

/// The endpoint family a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `/api/secret`
    Secret,
    /// `/api/env`
    Env,
    /// `/api/proxy/...`
    Proxy,
}

impl Endpoint {
    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Secret => "secret",
            Endpoint::Env => "env",
            Endpoint::Proxy => "proxy",
        }
    }

    /// Build this endpoint's error kind.
    pub fn error(self, message: impl Into<String>, status: Option<u16>) -> Error {
        let message = message.into();
        match self {
            Endpoint::Secret => Error::Secret { message, status },
            Endpoint::Env => Error::Env { message, status },
            Endpoint::Proxy => Error::Proxy { message, status },
        }
    }

    fn unauthorized(self) -> Error {
        let message = match self {
            Endpoint::Proxy => "Invalid proxy token",
            Endpoint::Secret | Endpoint::Env => "Invalid token",
        };
        Error::authentication(message, Some(401))
    }

    /// The field a successful body must carry.
    fn success_field(self) -> Option<&'static str> {
        match self {
            Endpoint::Secret => Some("value"),
            Endpoint::Env => Some("secrets"),
            Endpoint::Proxy => None,
        }
    }
}

/// Classify a secret response: rules 1, 3-6 with success field `value`.
pub fn classify_secret(response: &RawResponse) -> Result<String> {
    match extract_field(Endpoint::Secret, response)? {
        Value::String(secret) => Ok(secret),
        other => Err(Endpoint::Secret.error(
            format!("Malformed response: `value` is a {}, not a string", json_type(&other)),
            Some(response.status()),
        )),
    }
}

/// Classify an environment response: rules 1, 3-6 with success field `secrets`.
pub fn classify_env(response: &RawResponse) -> Result<EnvironmentMap> {
    let secrets = extract_field(Endpoint::Env, response)?;
    serde_json::from_value(secrets).map_err(|e| {
        Endpoint::Env.error(
            format!("Malformed response: `secrets` must map names to strings ({e})"),
            Some(response.status()),
        )
    })
}

/// Classify a proxy response: rules 1 and 3, then the JSON body as-is.
///
/// An empty 2xx body yields `Value::Null`.
pub fn classify_proxy(response: &RawResponse) -> Result<Value> {
    check_status(Endpoint::Proxy, response)?;
    if response.body().trim().is_empty() {
        return Ok(Value::Null);
    }
    parse_json(Endpoint::Proxy, response)
}

/// Classify a transport failure that exhausted the retry budget (rule 2).
pub fn classify_failure(endpoint: Endpoint, error: TransportError) -> Error {
    match error {
        TransportError::Status { status: 401, .. } => endpoint.unauthorized(),
        TransportError::Status { status, .. } => {
            endpoint.error(format!("HTTP error: {status}"), Some(status))
        }
        other => endpoint.error(format!("Request failed: {other}"), None),
    }
}

/// Whether an upstream error message is treated as an authentication failure.
pub fn mentions_auth(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("auth") || lower.contains("token")
}

fn check_status(endpoint: Endpoint, response: &RawResponse) -> Result<()> {
    match response.status() {
        401 => Err(endpoint.unauthorized()),
        _ if response.is_success() => Ok(()),
        status => Err(endpoint.error(http_error_message(status), Some(status))),
    }
}

fn http_error_message(status: u16) -> String {
    match http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("HTTP error: {status} {reason}"),
        None => format!("HTTP error: {status}"),
    }
}

fn parse_json(endpoint: Endpoint, response: &RawResponse) -> Result<Value> {
    serde_json::from_str(response.body()).map_err(|e| {
        endpoint.error(
            format!("Invalid JSON response: {e}"),
            Some(response.status()),
        )
    })
}

/// Rules 1 and 3-5 for endpoints with a success field.
fn extract_field(endpoint: Endpoint, response: &RawResponse) -> Result<Value> {
    check_status(endpoint, response)?;
    let status = Some(response.status());

    let mut body: Map<String, Value> = match parse_json(endpoint, response)? {
        Value::Object(map) => map,
        other => {
            return Err(endpoint.error(
                format!("Malformed response: expected an object, got a {}", json_type(&other)),
                status,
            ));
        }
    };

    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(if mentions_auth(&message) {
            Error::authentication(message, status)
        } else {
            endpoint.error(message, status)
        });
    }

    let Some(field) = endpoint.success_field() else {
        return Ok(Value::Object(body));
    };
    match body.remove(field) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(endpoint.error(no_value_message(endpoint), status)),
    }
}

fn no_value_message(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Env => "Unknown error: no secrets returned",
        Endpoint::Secret | Endpoint::Proxy => "Unknown error: no value returned",
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
