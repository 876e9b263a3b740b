//! Request parameters.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult};

/// Request body: text is sent verbatim, anything else as serialized JSON.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Sent as-is (e.g. an NDJSON `_bulk` payload).
    Text(String),
    /// Serialized to JSON text before sending.
    Json(Value),
}

impl Message {
    /// The bytes to send as the request body.
    pub fn to_body(&self) -> DispatchResult<Bytes> {
        match self {
            Self::Text(text) => Ok(Bytes::from(text.clone())),
            Self::Json(value) => serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| DispatchError::InvalidRequest(format!("unserializable message: {e}"))),
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Json(other),
        }
    }
}

/// Parameters of a single request.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestParams {
    /// HTTP method, any case.
    pub method: String,
    /// Request path, optionally with a query string (`/_search?q=rust`).
    #[serde(default)]
    pub path: String,
    /// Optional request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Parse the response as JSON (`true`) or return the raw text.
    #[serde(default = "default_json")]
    pub json: bool,
}

fn default_json() -> bool {
    true
}

impl RequestParams {
    /// Create parameters for `method` on `path`, expecting a JSON response.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            message: None,
            json: true,
        }
    }

    /// Attach a request body.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Choose between a parsed JSON response and raw text.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Read parameters from a loosely-typed JSON object.
    ///
    /// `null` or a non-object is [`DispatchError::MissingParams`]; an absent
    /// or falsy `method` (`null`, `false`, `0`, `""`) is
    /// [`DispatchError::MissingMethod`]. Only an explicit `"json": false` turns
    /// JSON parsing off, and a falsy message means no body.
    pub fn from_value(value: &Value) -> DispatchResult<Self> {
        let object = value.as_object().ok_or(DispatchError::MissingParams)?;

        let method = match object.get("method") {
            None => return Err(DispatchError::MissingMethod),
            Some(value) if is_falsy(value) => return Err(DispatchError::MissingMethod),
            Some(Value::String(method)) => method.clone(),
            Some(other) => {
                return Err(DispatchError::InvalidRequest(format!(
                    "method must be a string, got {other}"
                )));
            }
        };

        let path = match object.get("path") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(path)) => path.clone(),
            Some(other) => {
                return Err(DispatchError::InvalidRequest(format!(
                    "path must be a string, got {other}"
                )));
            }
        };

        let message = object
            .get("message")
            .filter(|value| !is_falsy(value))
            .map(|value| Message::from(value.clone()));

        Ok(Self {
            method,
            path,
            message,
            json: !matches!(object.get("json"), Some(Value::Bool(false))),
        })
    }

    /// Check that a method is present.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.method.trim().is_empty() {
            return Err(DispatchError::MissingMethod);
        }
        Ok(())
    }

    /// The uppercased HTTP method.
    pub fn http_method(&self) -> DispatchResult<http::Method> {
        let upper = self.method.trim().to_ascii_uppercase();
        http::Method::from_bytes(upper.as_bytes())
            .map_err(|_| DispatchError::InvalidRequest(format!("invalid method {:?}", self.method)))
    }

    /// The request body, if any.
    pub fn body(&self) -> DispatchResult<Bytes> {
        self.message
            .as_ref()
            .map_or_else(|| Ok(Bytes::new()), Message::to_body)
    }
}

/// `null`, `false`, zero and `""` count as unset.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
