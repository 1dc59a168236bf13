// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Signature Version 4.
//!
//! The functions in this module compute the canonical request, the string to
//! sign, and the signature, and then attach the `authorization` header (plus
//! the headers it depends on) to the request headers.

use crate::credentials::Credentials;
use crate::errors::SigningError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use url::Url;

/// The signing algorithm name.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
/// Use as the payload hash when the body cannot be read before sending.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const AMZ_DATE: &str = "x-amz-date";
const SECURITY_TOKEN: &str = "x-amz-security-token";
const TERMINATOR: &str = "aws4_request";

// Headers that intermediaries may change, these never participate in the
// signature.
const UNSIGNED_HEADERS: [&str; 5] = [
    "authorization",
    "connection",
    "expect",
    "user-agent",
    "x-amzn-trace-id",
];

// Everything except the RFC 3986 unreserved characters.
const URI_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

/// The inputs to the signature, other than the request itself.
#[derive(Clone, Debug)]
pub struct SigningParams<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
    /// The signing time, already corrected for any clock skew.
    pub time: DateTime<Utc>,
}

/// Returns the hex-encoded SHA-256 digest of `payload`.
pub fn payload_hash(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Signs a request, inserting `host`, `x-amz-date`, `x-amz-security-token`
/// (for temporary credentials) and `authorization` into `headers`.
///
/// Returns the signature.
pub fn sign(
    method: &Method,
    url: &Url,
    headers: &mut HeaderMap,
    payload_hash: &str,
    params: &SigningParams<'_>,
) -> Result<String, SigningError> {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();

    headers.insert(http::header::HOST, header_value("host", &host(url)?)?);
    headers.insert(AMZ_DATE, header_value(AMZ_DATE, &amz_date)?);
    if let Some(token) = params.credentials.session_token() {
        headers.insert(SECURITY_TOKEN, header_value(SECURITY_TOKEN, token)?);
    }

    let (canonical_headers, signed_headers) = canonical_headers(headers);
    let canonical_request = [
        method.as_str(),
        &canonical_uri(url),
        &canonical_query(url),
        &canonical_headers,
        &signed_headers,
        payload_hash,
    ]
    .join("\n");

    let scope = format!("{date}/{}/{}/{TERMINATOR}", params.region, params.service);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(params, &date)?;
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);
    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        params.credentials.access_key_id()
    );
    headers.insert(
        http::header::AUTHORIZATION,
        header_value("authorization", &authorization)?,
    );
    Ok(signature)
}

fn host(url: &Url) -> Result<String, SigningError> {
    let host = url
        .host_str()
        .ok_or_else(|| SigningError::MissingHost(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, SigningError> {
    HeaderValue::from_str(value).map_err(|source| SigningError::InvalidHeader { name, source })
}

fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, URI_ENCODE).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs = url
        .query_pairs()
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k, URI_ENCODE).to_string(),
                utf8_percent_encode(&v, URI_ENCODE).to_string(),
            )
        })
        .collect::<Vec<_>>();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_headers(headers: &HeaderMap) -> (String, String) {
    let mut names = headers
        .keys()
        .filter(|name| !UNSIGNED_HEADERS.contains(&name.as_str()))
        .collect::<Vec<&HeaderName>>();
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    names.dedup();

    let mut canonical = String::new();
    for name in &names {
        let values = headers
            .get_all(*name)
            .iter()
            .map(|v| normalize_whitespace(&String::from_utf8_lossy(v.as_bytes())))
            .collect::<Vec<_>>()
            .join(",");
        canonical.push_str(name.as_str());
        canonical.push(':');
        canonical.push_str(&values);
        canonical.push('\n');
    }
    let signed = names
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(";");
    (canonical, signed)
}

fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn signing_key(params: &SigningParams<'_>, date: &str) -> Result<Vec<u8>, SigningError> {
    let secret = format!("AWS4{}", params.credentials.secret_access_key());
    let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, params.region.as_bytes())?;
    let k_service = hmac(&k_region, params.service.as_bytes())?;
    hmac(&k_service, TERMINATOR.as_bytes())
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
