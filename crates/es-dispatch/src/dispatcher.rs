//! The request dispatcher.
//!
//! Per request: validate the parameters, build the request, resolve
//! credentials, sign, send, read the whole body and normalize the response.
//! Every path ends in exactly one `DispatchResult`; panics raised while
//! building, signing or sending are caught and returned as errors.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use es_dispatch_auth::{CredentialProvider, EnvironmentCredentialProvider, SigV4Signer};
use futures::FutureExt;
use http::HeaderValue;
use http::header::HOST;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DispatcherConfig;
use crate::endpoint::Endpoint;
use crate::error::{ConfigError, DispatchError, DispatchResult};
use crate::params::RequestParams;
use crate::response::{Response, normalize_response};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Header that stops the signer from producing a presigned (query) signature.
pub const PRESIGNED_EXPIRES: &str = "presigned-expires";

struct Inner {
    endpoint: Endpoint,
    signer: SigV4Signer,
    credentials: Arc<dyn CredentialProvider>,
    transport: Arc<dyn HttpTransport>,
}

/// Signs and sends requests to one search endpoint.
///
/// Holds no per-request state, so clones can be used from many tasks at once.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.inner.endpoint)
            .field("signer", &self.inner.signer)
            .field("credentials", &"...")
            .field("transport", &"...")
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher from its collaborators.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialProvider>,
        config: &DispatcherConfig,
    ) -> Result<Self, ConfigError> {
        let endpoint = config.validate()?;

        debug!(
            endpoint = %endpoint,
            region = %config.region,
            service = %config.service,
            "created dispatcher"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                endpoint,
                signer: SigV4Signer::new(config.region.trim(), config.service.trim()),
                credentials,
                transport,
            }),
        })
    }

    /// Create a dispatcher using [`ReqwestTransport`] and credentials from the
    /// `AWS_*` environment variables.
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, ConfigError> {
        Self::new(
            Arc::new(ReqwestTransport::new()),
            Arc::new(EnvironmentCredentialProvider::default()),
            config,
        )
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Sign and send one request.
    pub async fn send(&self, params: &RequestParams) -> DispatchResult<Response> {
        AssertUnwindSafe(self.dispatch(params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DispatchError::Panicked(panic_message(panic.as_ref()))))
    }

    /// Validate a loosely-typed parameter object, then [`send`](Self::send) it.
    pub async fn send_value(&self, params: &Value) -> DispatchResult<Response> {
        let params = RequestParams::from_value(params)?;
        self.send(&params).await
    }

    /// Error-first completion: `callback` runs exactly once, on a newly
    /// spawned task, with the outcome of the request.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn send_with_callback<F>(&self, params: Value, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(DispatchResult<Response>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.send_value(&params).await;
            callback(result);
        })
    }

    /// Build the unsigned request for `params`.
    ///
    /// Sets `presigned-expires: false` and a `Host` header matching the endpoint.
    pub fn build_request(&self, params: &RequestParams) -> DispatchResult<http::Request<Bytes>> {
        params.validate()?;

        let host = HeaderValue::from_str(self.inner.endpoint.host())
            .map_err(|_| DispatchError::InvalidRequest("endpoint host is not a valid header".to_owned()))?;

        http::Request::builder()
            .method(params.http_method()?)
            .uri(self.inner.endpoint.uri_for(&params.path)?)
            .header(PRESIGNED_EXPIRES, "false")
            .header(HOST, host)
            .body(params.body()?)
            .map_err(|e| DispatchError::InvalidRequest(e.to_string()))
    }

    async fn dispatch(&self, params: &RequestParams) -> DispatchResult<Response> {
        let mut request = self.build_request(params)?;

        let credentials = self.inner.credentials.provide_credentials()?;
        self.inner
            .signer
            .sign(&mut request, &credentials, Utc::now())?;

        let method = request.method().clone();
        let uri = request.uri().clone();
        debug!(%method, %uri, body_len = request.body().len(), "sending signed request");

        let result = self.exchange(request, params.json).await;
        match &result {
            Ok(_) => debug!(%method, %uri, "request succeeded"),
            Err(e) => warn!(%method, %uri, error = %e, "request failed"),
        }
        result
    }

    async fn exchange(&self, request: http::Request<Bytes>, expect_json: bool) -> DispatchResult<Response> {
        let response = self.inner.transport.send(request).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();

        debug!(status = %parts.status, bytes = body.len(), "received response");

        normalize_response(parts.status, &body, expect_json)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "request panicked".to_owned())
}
