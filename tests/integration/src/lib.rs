//! Integration tests for es-dispatch.
//!
//! Every test starts a small search-like server on a random local port. The
//! server verifies the SigV4 signature of each request against a fixed access
//! key and answers from a static route table, so the whole path (build, sign,
//! reqwest transport, chunked bodies, normalization) runs for real.
//!
//! ```text
//! cargo test -p es-dispatch-integration
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use bytes::Bytes;
use es_dispatch::{
    Credentials, Dispatcher, DispatcherConfig, ReqwestTransport, StaticCredentialProvider,
};
use es_dispatch_auth::verify_request;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Access key the server accepts.
pub const ACCESS_KEY: &str = "AKIDINTEGRATION";
/// Secret for [`ACCESS_KEY`].
pub const SECRET_KEY: &str = "integration-secret";
/// Region the dispatchers sign for.
pub const REGION: &str = "eu-west-1";

/// Chunks the `/_chunked` route streams, in order.
pub const CHUNKS: &[&str] = &["{\"results\":[", "\"one\",", "\"two\"]}"];

type ServerBody = BoxBody<Bytes, Infallible>;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A running signature-checking server.
#[derive(Debug)]
pub struct SearchServer {
    addr: SocketAddr,
}

impl SearchServer {
    /// Bind to a random local port and serve until the runtime shuts down.
    pub async fn start() -> Result<Self> {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test server")?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            while let Ok((stream, peer_addr)) = listener.accept().await {
                tokio::spawn(async move {
                    let conn = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service_fn(handle));
                    if let Err(e) = conn.await {
                        warn!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }
        });

        Ok(Self { addr })
    }

    /// The server's endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A dispatcher holding the credentials the server accepts.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher_with(Credentials::new(ACCESS_KEY, SECRET_KEY))
    }

    /// A dispatcher signing with arbitrary credentials.
    ///
    /// # Panics
    ///
    /// Panics if the endpoint is rejected, which would be a bug in the harness.
    #[must_use]
    pub fn dispatcher_with(&self, credentials: Credentials) -> Dispatcher {
        Dispatcher::new(
            Arc::new(ReqwestTransport::new()),
            Arc::new(StaticCredentialProvider::new(credentials)),
            &DispatcherConfig::new(self.endpoint(), REGION),
        )
        .unwrap_or_else(|e| panic!("failed to create dispatcher: {e}"))
    }
}

/// Return an endpoint nothing is listening on.
pub async fn closed_endpoint() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

async fn handle(request: http::Request<Incoming>) -> Result<http::Response<ServerBody>, Infallible> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return Ok(json_response(400, &json!({ "message": e.to_string() }))),
    };
    let request = http::Request::from_parts(parts, body);

    let keys = StaticCredentialProvider::new(Credentials::new(ACCESS_KEY, SECRET_KEY));
    if let Err(e) = verify_request(&request, &keys) {
        debug!(error = %e, "rejecting request");
        return Ok(json_response(403, &json!({ "message": e.to_string() })));
    }

    Ok(route(&request))
}

fn route(request: &http::Request<Bytes>) -> http::Response<ServerBody> {
    let path = request.uri().path();
    match (request.method().as_str(), path) {
        ("GET", "/_cat/indices") => text_response(200, "green open logs 1 0\n"),
        ("GET", "/_chunked") => {
            let frames = CHUNKS
                .iter()
                .copied()
                .map(|chunk| Ok::<_, Infallible>(Frame::data(Bytes::from_static(chunk.as_bytes()))));
            http::Response::new(StreamBody::new(futures::stream::iter(frames)).boxed())
        }
        ("GET", "/_moved") => {
            let mut response = json_response(302, &json!({ "moved": true }));
            response.headers_mut().insert(
                http::header::LOCATION,
                http::HeaderValue::from_static("/elsewhere"),
            );
            response
        }
        ("GET", "/_broken") => text_response(200, "response text expecting json"),
        (_, "/_plain_error") => text_response(400, "plain text"),
        (method, "/_echo") => json_response(
            200,
            &json!({
                "method": method,
                "query": request.uri().query(),
                "body": String::from_utf8_lossy(request.body()),
                "presignedExpires": request
                    .headers()
                    .get("presigned-expires")
                    .and_then(|v| v.to_str().ok()),
            }),
        ),
        _ => json_response(404, &json!({ "message": format!("no such index [{path}]") })),
    }
}

fn text_response(status: u16, text: &'static str) -> http::Response<ServerBody> {
    let mut response = http::Response::new(Full::new(Bytes::from_static(text.as_bytes())).boxed());
    *response.status_mut() = http::StatusCode::from_u16(status).unwrap_or_default();
    response
}

fn json_response(status: u16, body: &Value) -> http::Response<ServerBody> {
    let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())).boxed());
    *response.status_mut() = http::StatusCode::from_u16(status).unwrap_or_default();
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

mod test_dispatch;
mod test_error;
