//! Response envelope returned by every admin API endpoint
//!
//! Canonical shape: `{success, statusCode, message?, data, errors, timestamp}`.
//! Legacy endpoints answer `{success, message, data}`; the missing members
//! default to `None`, so both shapes deserialize into [`Envelope`]. Any other
//! top-level members (for example a `totalCount` beside `data`) are kept in
//! [`Envelope::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::RequestError;

/// JSON wrapper around every response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = Value> {
    pub success: bool,
    #[serde(default, alias = "status_code", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope<Value> {
    /// Interprets a 2xx response body.
    ///
    /// Objects carrying a `success` member are envelopes. Any other JSON
    /// (some internal-job endpoints answer a bare `{jobs, totalCount}`) is
    /// wrapped as the `data` of a successful envelope.
    ///
    /// # Errors
    /// Returns the serde error when a body that claims to be an envelope
    /// does not match its shape.
    pub fn from_body(body: Value, http_status: u16) -> Result<Self, serde_json::Error> {
        let is_envelope = body.as_object().is_some_and(|map| map.contains_key("success"));
        if is_envelope {
            serde_json::from_value(body)
        } else {
            Ok(Self { data: Some(body), ..Self::empty(http_status) })
        }
    }
}

impl<T> Envelope<T> {
    /// Successful envelope for a response without a body (200/204).
    pub fn empty(status: u16) -> Self {
        Self {
            success: true,
            status_code: Some(status),
            message: None,
            data: None,
            errors: None,
            timestamp: None,
            extra: Map::new(),
        }
    }

    /// Best human-readable message: `message`, else a rendering of `errors`.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            return Some(message.to_string());
        }
        self.errors.as_ref().and_then(render_errors)
    }

    /// `Ok(self)` when `success`, otherwise a `ServerRejected` error carrying
    /// the envelope's status code and message.
    ///
    /// # Errors
    /// Returns the rejection described above.
    pub fn into_result(self) -> Result<Self, RequestError> {
        if self.success {
            Ok(self)
        } else {
            Err(RequestError::rejected(self.status_code, self.server_message()))
        }
    }

    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            status_code: self.status_code,
            message: self.message,
            data: self.data.map(f),
            errors: self.errors,
            timestamp: self.timestamp,
            extra: self.extra,
        }
    }
}

/// Flattens the `errors` member into one line.
///
/// Strings are used as-is, arrays are joined, objects contribute their
/// values (validation maps look like `{"email": ["is taken"]}`).
fn render_errors(errors: &Value) -> Option<String> {
    let mut parts = Vec::new();
    collect_error_strings(errors, &mut parts);
    (!parts.is_empty()).then(|| parts.join("; "))
}

fn collect_error_strings(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => parts.push(s.trim().to_string()),
        Value::Array(items) => items.iter().for_each(|v| collect_error_strings(v, parts)),
        Value::Object(map) => map.values().for_each(|v| collect_error_strings(v, parts)),
        Value::Number(n) => parts.push(n.to_string()),
        _ => {}
    }
}
