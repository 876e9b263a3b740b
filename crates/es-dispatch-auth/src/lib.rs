//! AWS Signature Version 4 request signing for es-dispatch.
//!
//! This crate signs outgoing HTTP requests for AWS-hosted services such as
//! Amazon OpenSearch Service (`es`) and verifies such signatures on the
//! receiving side.
//!
//! # Usage
//!
//! ```rust
//! use chrono::Utc;
//! use es_dispatch_auth::{Credentials, SigV4Signer};
//!
//! let mut request = http::Request::builder()
//!     .method("GET")
//!     .uri("https://search-logs.eu-west-1.es.amazonaws.com/_cat/indices")
//!     .body(Vec::new())
//!     .unwrap();
//!
//! let signer = SigV4Signer::new("eu-west-1", "es");
//! signer
//!     .sign(&mut request, &Credentials::new("AKID", "secret"), Utc::now())
//!     .unwrap();
//! assert!(request.headers().contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction
//! - [`credentials`] - Credentials and credential providers
//! - [`error`] - Authentication error types
//! - [`sigv4`] - Request signing
//! - [`verify`] - Signature verification

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod sigv4;
pub mod verify;

pub use credentials::{
    CredentialProvider, Credentials, EnvironmentCredentialProvider, SecretKeyLookup,
    StaticCredentialProvider,
};
pub use error::AuthError;
pub use sigv4::{SigV4Signer, hash_payload};
pub use verify::{VerifiedRequest, verify_request};
