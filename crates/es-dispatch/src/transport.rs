//! The HTTP transport seam.
//!
//! The dispatcher hands a signed `http::Request<Bytes>` to an [`HttpTransport`]
//! and gets back a response whose body is read incrementally. Timeouts,
//! pooling and TLS belong to the transport.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;

use crate::error::TransportError;

/// Response body as a stream of `Bytes` chunks.
pub type ResponseBody = UnsyncBoxBody<Bytes, TransportError>;

/// Future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<http::Response<ResponseBody>, TransportError>> + Send + 'a>>;

/// Sends signed requests.
///
/// The request must reach the wire unchanged: any header added or rewritten
/// after signing breaks the signature.
pub trait HttpTransport: Send + Sync + 'static {
    /// Send `request` and resolve once the response head has arrived.
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_>;
}

/// [`HttpTransport`] backed by a [`reqwest::Client`].
///
/// Redirects are returned to the caller, never followed: a 3xx is a result in
/// its own right, and replaying a signed request against another path only
/// produces a signature error.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Create a transport with a client that does not follow redirects.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, like [`reqwest::Client::new`].
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("TLS backend cannot be initialized");
        Self { client }
    }

    /// Create a transport around an existing client (e.g. with timeouts configured).
    ///
    /// The client must be built with `redirect(Policy::none())`; a client that
    /// follows redirects re-sends the signed request to the new location and
    /// the 3xx response never reaches the dispatcher.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        Box::pin(async move {
            let request = reqwest::Request::try_from(request)?;
            let response = self.client.execute(request).await?;
            let response: http::Response<reqwest::Body> = response.into();

            Ok(response.map(|body| body.map_err(TransportError::from).boxed_unsync()))
        })
    }
}
