//! SigV4-signed request dispatcher for Amazon OpenSearch / Elasticsearch Service.
//!
//! A [`Dispatcher`] takes a small [`RequestParams`] value (method, path,
//! optional body, whether to parse the response as JSON), signs the request
//! with AWS Signature Version 4 and sends it through an [`HttpTransport`].
//! The response is read completely and normalized into a [`Response`] or a
//! [`DispatchError`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use es_dispatch::{Dispatcher, DispatcherConfig, RequestParams};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DispatcherConfig::new("search-logs.eu-west-1.es.amazonaws.com", "eu-west-1");
//! let es = Dispatcher::from_config(&config)?;
//!
//! let indices = es
//!     .send(&RequestParams::new("get", "/_cat/indices").with_json(false))
//!     .await?;
//! println!("{}", indices.as_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Dispatcher configuration
//! - [`dispatcher`] - Validation, signing, dispatch and callback delivery
//! - [`endpoint`] - Endpoint parsing
//! - [`error`] - Error types
//! - [`params`] - Request parameters
//! - [`response`] - Response normalization
//! - [`transport`] - The transport trait and its reqwest implementation

pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod params;
pub mod response;
pub mod transport;

pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use endpoint::Endpoint;
pub use error::{ConfigError, DispatchError, DispatchResult, TransportError};
pub use params::{Message, RequestParams};
pub use response::Response;
pub use transport::{HttpTransport, ReqwestTransport, ResponseBody};

pub use es_dispatch_auth::{
    CredentialProvider, Credentials, EnvironmentCredentialProvider, StaticCredentialProvider,
};
