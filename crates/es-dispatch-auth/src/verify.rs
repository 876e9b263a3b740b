//! SigV4 verification for the receiving side of a signed request.
//!
//! Rebuilds the canonical request from the received request and the headers
//! named in `SignedHeaders`, then compares signatures in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::CanonicalRequest;
use crate::credentials::SecretKeyLookup;
use crate::error::AuthError;
use crate::sigv4::{
    ALGORITHM, X_AMZ_DATE, build_string_to_sign, compute_signature, derive_signing_key,
    hash_payload,
};

/// The outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequest {
    /// The access key ID that signed the request.
    pub access_key_id: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The headers covered by the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed `Authorization` header.
///
/// ```text
/// AWS4-HMAC-SHA256 Credential=AKID/20150830/us-east-1/es/aws4_request,
///   SignedHeaders=host;x-amz-date, Signature=<hex-signature>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuthorization {
    /// The access key ID.
    pub access_key_id: String,
    /// `YYYYMMDD` date from the credential scope.
    pub date: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// Lowercase signed header names.
    pub signed_headers: Vec<String>,
    /// Hex-encoded signature.
    pub signature: String,
}

/// Parse a SigV4 `Authorization` header value.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`], [`AuthError::UnsupportedAlgorithm`]
/// or [`AuthError::InvalidCredential`] for malformed input.
pub fn parse_authorization(header: &str) -> Result<ParsedAuthorization, AuthError> {
    let (algorithm, rest) = header.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;
    if algorithm != ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;
    for part in rest.split(',').map(str::trim) {
        match part.split_once('=') {
            Some(("Credential", v)) => credential = Some(v),
            Some(("SignedHeaders", v)) => signed_headers = Some(v),
            Some(("Signature", v)) => signature = Some(v),
            _ => {}
        }
    }

    let credential = credential.ok_or(AuthError::InvalidAuthHeader)?;
    let signed_headers = signed_headers.ok_or(AuthError::InvalidAuthHeader)?;
    let signature = signature.ok_or(AuthError::InvalidAuthHeader)?;

    let [access_key_id, date, region, service, terminator]: [&str; 5] = credential
        .splitn(5, '/')
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| AuthError::InvalidCredential)?;
    if terminator != "aws4_request" {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuthorization {
        access_key_id: access_key_id.to_owned(),
        date: date.to_owned(),
        region: region.to_owned(),
        service: service.to_owned(),
        signed_headers: signed_headers.split(';').map(ToOwned::to_owned).collect(),
        signature: signature.to_owned(),
    })
}

/// Verify a header-signed request.
///
/// # Errors
///
/// Returns an [`AuthError`] when the header is missing or malformed, the access
/// key is unknown, a signed header is missing, or the signature does not match.
pub fn verify_request<B: AsRef<[u8]>>(
    request: &http::Request<B>,
    keys: &dyn SecretKeyLookup,
) -> Result<VerifiedRequest, AuthError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parsed = parse_authorization(auth_header)?;
    let secret_key = keys.get_secret_key(&parsed.access_key_id)?;
    let timestamp = header_str(request, X_AMZ_DATE)?;

    let header_pairs = parsed
        .signed_headers
        .iter()
        .map(|name| header_str(request, name).map(|value| (name.as_str(), value)))
        .collect::<Result<Vec<_>, _>>()?;
    let payload_hash = hash_payload(request.body().as_ref());

    let canonical_request = CanonicalRequest {
        method: request.method().as_str(),
        path: request.uri().path(),
        query: request.uri().query().unwrap_or(""),
        headers: header_pairs,
        signed_headers: parsed.signed_headers.clone(),
        payload_hash: &payload_hash,
        s3_path: parsed.service == "s3",
    }
    .render();

    let credential_scope = format!(
        "{}/{}/{}/aws4_request",
        parsed.date, parsed.region, parsed.service
    );
    let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    let string_to_sign = build_string_to_sign(timestamp, &credential_scope, &canonical_hash);
    let signing_key =
        derive_signing_key(&secret_key, &parsed.date, &parsed.region, &parsed.service);
    let expected = compute_signature(&signing_key, &string_to_sign);

    if expected.as_bytes().ct_eq(parsed.signature.as_bytes()).into() {
        debug!(access_key_id = %parsed.access_key_id, "Signature verification succeeded");
        Ok(VerifiedRequest {
            access_key_id: parsed.access_key_id,
            region: parsed.region,
            service: parsed.service,
            signed_headers: parsed.signed_headers,
        })
    } else {
        debug!(canonical_request, "Signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

fn header_str<'a, B>(request: &'a http::Request<B>, name: &str) -> Result<&'a str, AuthError> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))
}
