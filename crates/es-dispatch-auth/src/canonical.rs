//! Canonical request construction for AWS Signature Version 4.
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Non-S3 services (including `es`) sign the path encoded a second time, so
//! `/idx/a%3Ab` is signed as `/idx/a%253Ab`. S3 signs the path encoded once.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything except RFC 3986 unreserved characters is encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Headers never included in the signature, matching the AWS SDKs.
pub const UNSIGNABLE_HEADERS: &[&str] = &[
    "authorization",
    "content-type",
    "content-length",
    "user-agent",
    "presigned-expires",
    "expect",
    "x-amzn-trace-id",
];

/// The inputs of a canonical request, borrowed from the request being signed.
#[derive(Debug, Clone)]
pub struct CanonicalRequest<'a> {
    /// Uppercase HTTP method.
    pub method: &'a str,
    /// Raw request path, as sent on the wire.
    pub path: &'a str,
    /// Raw query string without the leading `?`.
    pub query: &'a str,
    /// Header name/value pairs. Names may be in any case.
    pub headers: Vec<(&'a str, &'a str)>,
    /// Lowercase names of the headers to sign.
    pub signed_headers: Vec<String>,
    /// Hex-encoded SHA-256 of the payload.
    pub payload_hash: &'a str,
    /// Whether the path is signed with the single-encoding rules of S3.
    pub s3_path: bool,
}

impl CanonicalRequest<'_> {
    /// Render the newline-separated canonical request string.
    #[must_use]
    pub fn render(&self) -> String {
        let canonical_uri = build_canonical_uri(self.path, self.s3_path);
        let canonical_query = build_canonical_query_string(self.query);
        let signed: Vec<&str> = self.signed_headers.iter().map(String::as_str).collect();
        let canonical_headers = build_canonical_headers(&self.headers, &signed);
        let signed_headers_str = build_signed_headers_string(&signed);

        format!(
            "{}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers_str}\n{}",
            self.method, self.payload_hash
        )
    }
}

/// Pick the headers to sign: every header present, minus [`UNSIGNABLE_HEADERS`].
///
/// Names are lowercased, deduplicated and sorted.
#[must_use]
pub fn select_signed_headers<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut selected: Vec<String> = names
        .into_iter()
        .map(str::to_ascii_lowercase)
        .filter(|name| !UNSIGNABLE_HEADERS.contains(&name.as_str()))
        .collect();
    selected.sort_unstable();
    selected.dedup();
    selected
}

/// Build the canonical URI.
///
/// Empty paths are normalized to `/`. Slashes are kept and every segment is
/// URI-encoded.
///
/// # Examples
///
/// ```
/// use es_dispatch_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("", false), "/");
/// assert_eq!(build_canonical_uri("/idx/a%3Ab", false), "/idx/a%253Ab");
/// assert_eq!(build_canonical_uri("/bucket/a%3Ab", true), "/bucket/a%3Ab");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str, s3_path: bool) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            if s3_path {
                uri_encode(&percent_decode_str(segment).decode_utf8_lossy())
            } else {
                uri_encode(segment)
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the canonical query string.
///
/// Each key and value is decoded and then strictly re-encoded, so `+`, `:`
/// and `*` end up in the same form whatever the caller wrote. Pairs are sorted
/// by encoded key, then by encoded value.
///
/// # Examples
///
/// ```
/// use es_dispatch_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string("size=10&q=a b"), "q=a%20b&size=10");
/// assert_eq!(build_canonical_query_string("pretty"), "pretty=");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (k, v) = param.split_once('=').unwrap_or((param, ""));
            (requote(k), requote(v))
        })
        .collect();

    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers block (without the trailing newline).
///
/// Only `signed_headers` are included, sorted by name. Values are trimmed and
/// inner runs of whitespace collapse to one space; repeated headers are joined
/// with commas.
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    let mut sorted_signed: Vec<&str> = signed_headers.to_vec();
    sorted_signed.sort_unstable();

    sorted_signed
        .iter()
        .filter_map(|name| header_map.get(*name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Semicolon-separated, sorted list of signed header names.
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.join(";")
}

fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

fn requote(component: &str) -> String {
    let spaced = component.replace('+', " ");
    uri_encode(&percent_decode_str(&spaced).decode_utf8_lossy())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
