//! Normalization of the backend's response envelopes.
//!
//! Depending on the endpoint the backend answers with the bare payload,
//! `{ "data": payload }`, or `{ "data": { "data": payload } }`, and failures
//! may come back with a 2xx status as `{ "success": false, "message": ... }`.
//! [`normalize`] is the only place that knows about these shapes.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Message used when a failure carries no usable text.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// A response body with its envelope removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    List(Vec<Value>),
    Item(Value),
    Error(String),
}

impl Normalized {
    /// The payload as JSON again, or the failure message.
    pub fn into_value(self) -> Result<Value, String> {
        match self {
            Self::List(items) => Ok(Value::Array(items)),
            Self::Item(item) => Ok(item),
            Self::Error(message) => Err(message),
        }
    }

    /// Deserialize the payload into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, String> {
        let value = self.into_value()?;
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

/// Strip up to two levels of `data` envelope from `body`.
///
/// A `null` inner `data` counts as absent, so `{ "data": null }` normalizes
/// to the envelope itself rather than to `null`.
pub fn normalize(body: Value) -> Normalized {
    if let Some(message) = explicit_failure(&body) {
        return Normalized::Error(message);
    }

    let payload = unwrap_data(unwrap_data(body));
    match payload {
        Value::Array(items) => Normalized::List(items),
        item => Normalized::Item(item),
    }
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) if !inner.is_null() => inner,
            Some(inner) => {
                map.insert("data".into(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

fn explicit_failure(body: &Value) -> Option<String> {
    let map = body.as_object()?;
    if map.get("success")? != &Value::Bool(false) {
        return None;
    }
    Some(message_of(body).unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
}

/// The human-readable message of an error body, if it carries one.
///
/// Looks at `message`, then `error`, then `data.message`.
pub fn message_of(body: &Value) -> Option<String> {
    let text = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    text(body.get("message"))
        .or_else(|| text(body.get("error")))
        .or_else(|| text(body.get("data").and_then(|d| d.get("message"))))
}
