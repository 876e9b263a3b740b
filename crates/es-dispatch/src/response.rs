//! Response normalization.
//!
//! A fully read response body becomes either a [`Response`] or a
//! [`DispatchError`]: statuses in `200..400` succeed (as JSON unless raw text
//! was requested), everything else fails with the server's `message` field or
//! the raw body text.

use http::StatusCode;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult};

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Parsed JSON body.
    Json(Value),
    /// Raw body text, when JSON parsing was turned off.
    Text(String),
}

impl Response {
    /// The JSON body, if this is a JSON response.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The raw text, if this is a text response.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Consume the response, returning the JSON body if there is one.
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

/// Whether `status` counts as success (`200..400`).
#[must_use]
pub fn is_success(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

/// Turn a status and a complete body into the outcome of the request.
pub fn normalize_response(status: StatusCode, body: &[u8], expect_json: bool) -> DispatchResult<Response> {
    let text = String::from_utf8_lossy(body).into_owned();

    if !is_success(status) {
        return Err(DispatchError::Status {
            status,
            message: error_message(text),
        });
    }

    if !expect_json {
        return Ok(Response::Text(text));
    }

    serde_json::from_str(&text)
        .map(Response::Json)
        .map_err(|_| DispatchError::InvalidJsonResponse { response_text: text })
}

/// The `message` field of a JSON error body when it is a string, otherwise the
/// whole body text. A non-string `message` such as `42` is not stringified on
/// its own; the raw body is returned so no detail is lost.
fn error_message(text: String) -> String {
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(mut body)) => match body.remove("message") {
            Some(Value::String(message)) => message,
            _ => text,
        },
        _ => text,
    }
}
