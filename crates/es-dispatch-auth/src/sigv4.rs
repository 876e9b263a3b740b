//! AWS Signature Version 4 signing.
//!
//! [`SigV4Signer::sign`] follows the header-based signing flow:
//!
//! 1. Stamp the request with `X-Amz-Date` (and `X-Amz-Security-Token` for
//!    temporary credentials).
//! 2. Build the canonical request from the method, path, query, signable
//!    headers and the payload hash.
//! 3. Build the string to sign from the timestamp, credential scope and the
//!    canonical request hash.
//! 4. Derive the signing key and compute the signature.
//! 5. Set the `Authorization` header.
//!
//! The request is mutated in place; nothing else about it changes.

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use http::HeaderValue;
use http::header::{AUTHORIZATION, HOST};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonical::{CanonicalRequest, select_signed_headers};
use crate::credentials::Credentials;
use crate::error::AuthError;

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Header carrying the signing timestamp.
pub const X_AMZ_DATE: &str = "x-amz-date";

/// Header carrying the session token of temporary credentials.
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_FORMAT: &str = "%Y%m%d";

type HmacSha256 = Hmac<Sha256>;

/// Signs requests for one region and service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigV4Signer {
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Create a signer scoped to `region` and `service` (e.g. `es`).
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// The region requests are signed for.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The service requests are signed for.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Sign `request` with `credentials` at time `now`.
    ///
    /// A missing `Host` header is filled in from the URI authority. Any
    /// previous `Authorization`, `X-Amz-Date` or `X-Amz-Security-Token`
    /// headers are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHost`] if the request names no host, or
    /// [`AuthError::InvalidHeaderValue`] if a header value is not visible
    /// ASCII.
    pub fn sign<B: AsRef<[u8]>>(
        &self,
        request: &mut http::Request<B>,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let date = now.format(DATE_FORMAT).to_string();

        if !request.headers().contains_key(HOST) {
            let authority = request
                .uri()
                .authority()
                .ok_or(AuthError::MissingHost)?
                .as_str();
            let host = header_value(HOST.as_str(), authority)?;
            request.headers_mut().insert(HOST, host);
        }

        let headers = request.headers_mut();
        headers.remove(AUTHORIZATION);
        headers.insert(X_AMZ_DATE, header_value(X_AMZ_DATE, &timestamp)?);
        match credentials.session_token() {
            Some(token) => {
                headers.insert(X_AMZ_SECURITY_TOKEN, header_value(X_AMZ_SECURITY_TOKEN, token)?);
            }
            None => {
                headers.remove(X_AMZ_SECURITY_TOKEN);
            }
        }

        let authorization = {
            let header_pairs = request
                .headers()
                .iter()
                .map(|(name, value)| {
                    value
                        .to_str()
                        .map(|v| (name.as_str(), v))
                        .map_err(|_| AuthError::InvalidHeaderValue(name.as_str().to_owned()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let signed_headers = select_signed_headers(header_pairs.iter().map(|(name, _)| *name));
            let signed_headers_str = signed_headers.join(";");
            let payload_hash = hash_payload(request.body().as_ref());

            let canonical_request = CanonicalRequest {
                method: request.method().as_str(),
                path: request.uri().path(),
                query: request.uri().query().unwrap_or(""),
                headers: header_pairs,
                signed_headers,
                payload_hash: &payload_hash,
                s3_path: self.service == "s3",
            }
            .render();

            debug!(canonical_request, "Built canonical request");

            let credential_scope = self.credential_scope(&date);
            let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
            let string_to_sign = build_string_to_sign(&timestamp, &credential_scope, &canonical_hash);

            debug!(string_to_sign, "Built string to sign");

            let signing_key = derive_signing_key(
                credentials.secret_access_key(),
                &date,
                &self.region,
                &self.service,
            );
            let signature = compute_signature(&signing_key, &string_to_sign);

            format_authorization(
                credentials.access_key_id(),
                &credential_scope,
                &signed_headers_str,
                &signature,
            )
        };

        request
            .headers_mut()
            .insert(AUTHORIZATION, header_value(AUTHORIZATION.as_str(), &authorization)?);

        debug!(
            access_key_id = %credentials.access_key_id(),
            region = %self.region,
            service = %self.service,
            timestamp,
            "Signed request"
        );

        Ok(())
    }

    fn credential_scope(&self, date: &str) -> String {
        format!("{date}/{}/{}/aws4_request", self.region, self.service)
    }
}

/// Build the SigV4 string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the signing key with the HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

/// Hex-encoded HMAC-SHA256 of `data` under `signing_key`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Format the `Authorization` header value.
#[must_use]
pub fn format_authorization(
    access_key_id: &str,
    credential_scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={access_key_id}/{credential_scope}, \
         SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// Hex-encoded SHA-256 of a payload.
///
/// # Examples
///
/// ```
/// use es_dispatch_auth::sigv4::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))
}
