//! Endpoint parsing.
//!
//! The configured endpoint may be a bare host (`search-logs.eu-west-1.es.amazonaws.com`),
//! a host with a port, or a full `http`/`https` URL. Without a scheme, `https`
//! is assumed. Default ports are dropped from the host so that the `Host`
//! header matches what the server sees.

use std::fmt;
use std::str::FromStr;

use http::Uri;
use http::uri::Scheme;

use crate::error::{ConfigError, DispatchError, DispatchResult};

/// A parsed service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
}

impl Endpoint {
    /// The URL scheme (`https` unless configured otherwise).
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.scheme.as_str()
    }

    /// The host, with the port if it is not the scheme default.
    ///
    /// This is the value sent in the `Host` header.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the absolute URI for a request path.
    ///
    /// An empty path becomes `/`; a path without a leading slash gets one.
    pub fn uri_for(&self, path: &str) -> DispatchResult<Uri> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!("{}://{}{separator}{path}", self.scheme, self.host)
            .parse()
            .map_err(|e| DispatchError::InvalidRequest(format!("invalid path {path:?}: {e}")))
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            endpoint: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };
        let uri: Uri = with_scheme.parse().map_err(|_| invalid("not a valid URL"))?;

        let scheme = uri.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        let default_port = if scheme == Scheme::HTTPS {
            443
        } else if scheme == Scheme::HTTP {
            80
        } else {
            return Err(invalid("scheme must be http or https"));
        };

        let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;
        if authority.as_str().contains('@') {
            return Err(invalid("user info is not supported"));
        }
        if uri.path() != "/" || uri.query().is_some() {
            return Err(invalid("endpoint must not carry a path or query"));
        }

        let host = match authority.port_u16() {
            Some(port) if port != default_port => format!("{}:{port}", authority.host()),
            _ => authority.host().to_owned(),
        };

        Ok(Self { scheme, host })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}
