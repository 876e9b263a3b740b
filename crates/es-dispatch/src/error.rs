//! Error types for the dispatcher.

use std::error::Error as StdError;

use es_dispatch_auth::AuthError;

/// Boxed error value handed over by a transport.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by an [`HttpTransport`](crate::transport::HttpTransport):
/// connection errors, DNS failures, errors while streaming the body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A failure described only by text.
    #[error("{0}")]
    Message(String),

    /// A failure carrying the transport's own error value.
    #[error(transparent)]
    Source(BoxError),
}

impl TransportError {
    /// Wrap an error value produced by the transport.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Source(error.into())
    }

    /// The transport's own error value, if one was given.
    #[must_use]
    pub fn get_ref(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Message(_) => None,
            Self::Source(source) => Some(source.as_ref()),
        }
    }
}

impl From<String> for TransportError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for TransportError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error)
    }
}

/// Invalid dispatcher configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No endpoint was configured.
    #[error("missing endpoint")]
    MissingEndpoint,

    /// The endpoint could not be parsed as a host or an http(s) URL.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The configured endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No region was configured.
    #[error("missing region")]
    MissingRegion,

    /// No signing service name was configured.
    #[error("missing service name")]
    MissingService,
}

/// Everything a single `send` can fail with.
///
/// Exactly one of these (or a response) is produced per request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The parameters were absent or not an object.
    #[error("Missing or invalid parameters")]
    MissingParams,

    /// The parameters carry no HTTP method.
    #[error("Missing method")]
    MissingMethod,

    /// The parameters could not be turned into an HTTP request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credentials could not be resolved or the request could not be signed.
    #[error(transparent)]
    Signing(#[from] AuthError),

    /// The transport failed before a complete response was read.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Building, signing or sending the request panicked.
    #[error("{0}")]
    Panicked(String),

    /// A successful response was expected to be JSON but was not.
    #[error("Invalid JSON response")]
    InvalidJsonResponse {
        /// The raw response text.
        response_text: String,
    },

    /// The server answered with a status outside `200..400`.
    #[error("{message}")]
    Status {
        /// The response status.
        status: http::StatusCode,
        /// The server's `message` field, or the raw response text.
        message: String,
    },
}

impl DispatchError {
    /// Whether the caller passed unusable parameters.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParams | Self::MissingMethod | Self::InvalidRequest(_)
        )
    }

    /// The raw response text attached to an [`DispatchError::InvalidJsonResponse`].
    #[must_use]
    pub fn response_text(&self) -> Option<&str> {
        match self {
            Self::InvalidJsonResponse { response_text } => Some(response_text),
            _ => None,
        }
    }

    /// The HTTP status of a [`DispatchError::Status`] error.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The underlying transport error, if the exchange failed in transport.
    #[must_use]
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(error) => Some(error),
            _ => None,
        }
    }
}

/// Convenience result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
