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

//! Sign requests.
//!
//! The signing stage asks a [SignerProvider] for the [Signer] to use on each
//! attempt. Services that do not require authentication use [NoOpSigner].

use crate::Result;
use crate::content;
use crate::error::Error;
use crate::request::Request;
use crate::request_config::RequestConfig;
use auth::credentials::Credentials;
use auth::sigv4::{self, SigningParams};
use std::sync::Arc;
use url::Url;

/// Signs requests in place.
pub trait Signer: Send + Sync {
    /// Adds the authentication headers to `request`.
    ///
    /// `credentials` is `None` only if the signer returns true from
    /// [can_handle_null_credentials][Self::can_handle_null_credentials].
    fn sign(&self, request: &mut Request, credentials: Option<&Credentials>) -> Result<()>;

    /// Returns true if the signer can run without credentials.
    fn can_handle_null_credentials(&self) -> bool {
        false
    }
}

/// Selects the signer for a request.
pub trait SignerProvider: Send + Sync {
    fn signer(&self, uri: &Url, request_config: &RequestConfig) -> Arc<dyn Signer>;
}

pub type SharedSignerProvider = Arc<dyn SignerProvider>;

/// Always returns the same signer.
#[derive(Clone)]
pub struct StaticSignerProvider(Arc<dyn Signer>);

impl StaticSignerProvider {
    pub fn new<S: Signer + 'static>(signer: S) -> Self {
        Self(Arc::new(signer))
    }
}

impl SignerProvider for StaticSignerProvider {
    fn signer(&self, _uri: &Url, _request_config: &RequestConfig) -> Arc<dyn Signer> {
        self.0.clone()
    }
}

impl std::fmt::Debug for StaticSignerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticSignerProvider").finish_non_exhaustive()
    }
}

/// Leaves the request unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpSigner;

impl Signer for NoOpSigner {
    fn sign(&self, _request: &mut Request, _credentials: Option<&Credentials>) -> Result<()> {
        Ok(())
    }

    fn can_handle_null_credentials(&self) -> bool {
        true
    }
}

/// Signs requests with [Signature Version 4].
///
/// The signing time is the current time minus the request time offset, so a
/// client whose clock runs ahead of the service still produces a signature
/// the service accepts.
///
/// [Signature Version 4]: https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_sigv.html
#[derive(Clone, Debug)]
pub struct Aws4Signer {
    region: String,
    service: String,
}

impl Aws4Signer {
    pub fn new<R: Into<String>, S: Into<String>>(region: R, service: S) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// Hashes the content if it can be read and rewound to the current mark.
    ///
    /// Content of unknown length, or longer than the request read limit, is
    /// sent as `UNSIGNED-PAYLOAD`.
    fn payload_hash(request: &Request) -> Result<String> {
        let Some(body) = request.content() else {
            return Ok(sigv4::payload_hash(b""));
        };
        let length = content::content_length(body).map_err(Error::ser)?;
        let within_limit = length.is_some_and(|l| l <= request.read_limit() as u64);
        if !within_limit || !content::mark_supported(body).map_err(Error::ser)? {
            return Ok(sigv4::UNSIGNED_PAYLOAD.to_string());
        }
        let bytes = content::read_all(body).map_err(Error::ser)?;
        content::reset(body).map_err(Error::ser)?;
        Ok(sigv4::payload_hash(&bytes))
    }
}

impl Signer for Aws4Signer {
    fn sign(&self, request: &mut Request, credentials: Option<&Credentials>) -> Result<()> {
        let Some(credentials) = credentials else {
            return Ok(());
        };
        let time =
            chrono::Utc::now() - chrono::Duration::seconds(i64::from(request.time_offset()));
        let payload_hash = Self::payload_hash(request)?;
        let url = request.uri();
        let method = request.method().clone();
        let params = SigningParams {
            credentials,
            region: &self.region,
            service: &self.service,
            time,
        };
        sigv4::sign(&method, &url, request.headers_mut(), &payload_hash, &params)
            .map_err(Error::ser)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BufferedContent, BytesContent, ReaderContent};
    use http::Method;
    use std::sync::Mutex;

    fn request() -> Request {
        Request::new(
            "svc",
            Method::POST,
            Url::parse("https://svc.us-east-1.example.com").expect("valid url"),
        )
        .set_resource_path("/items")
        .add_parameter("b", "2")
    }

    fn signed_headers(request: &Request) -> Option<&str> {
        request
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn no_op() -> anyhow::Result<()> {
        let mut request = request();
        NoOpSigner.sign(&mut request, None)?;
        assert!(request.headers().is_empty());
        assert!(NoOpSigner.can_handle_null_credentials());
        Ok(())
    }

    #[test]
    fn static_provider() {
        let provider = StaticSignerProvider::new(NoOpSigner);
        let url = Url::parse("https://example.com").expect("valid url");
        let signer = provider.signer(&url, &RequestConfig::default());
        assert!(signer.can_handle_null_credentials());
    }

    #[test]
    fn aws4_signs() -> anyhow::Result<()> {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret").with_session_token("token");
        let mut request = request().set_content(BytesContent::shared("hello"));
        let signer = Aws4Signer::new("us-east-1", "svc");
        assert!(!signer.can_handle_null_credentials());
        signer.sign(&mut request, Some(&credentials))?;

        let auth = signed_headers(&request).unwrap_or_default();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"), "{auth}");
        assert!(auth.contains("/us-east-1/svc/aws4_request"), "{auth}");
        assert!(request.headers().contains_key("x-amz-date"));
        assert!(request.headers().contains_key("x-amz-security-token"));
        assert!(request.headers().contains_key(http::header::HOST));

        // The content is still readable after hashing.
        let body = request.content().map(content::read_all).transpose()?;
        assert_eq!(body.as_deref(), Some(&b"hello"[..]));
        Ok(())
    }

    #[test]
    fn aws4_without_credentials() -> anyhow::Result<()> {
        let mut request = request();
        Aws4Signer::new("us-east-1", "svc").sign(&mut request, None)?;
        assert!(signed_headers(&request).is_none());
        Ok(())
    }

    #[test]
    fn aws4_time_offset() -> anyhow::Result<()> {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret");
        let mut request = request();
        request.set_time_offset(3600 * 24 * 400);
        Aws4Signer::new("us-east-1", "svc").sign(&mut request, Some(&credentials))?;
        let date = request
            .headers()
            .get("x-amz-date")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let year = (chrono::Utc::now() - chrono::Duration::days(400))
            .format("%Y")
            .to_string();
        assert!(date.starts_with(&year), "{date} {year}");
        Ok(())
    }

    #[test]
    fn payload_hash() -> anyhow::Result<()> {
        let empty = request();
        assert_eq!(Aws4Signer::payload_hash(&empty)?, sigv4::payload_hash(b""));

        let rewindable = request().set_content(BytesContent::shared("abc"));
        assert_eq!(
            Aws4Signer::payload_hash(&rewindable)?,
            sigv4::payload_hash(b"abc")
        );

        let one_shot = request().set_content(Arc::new(Mutex::new(ReaderContent::new(
            std::io::Cursor::new(b"abc".to_vec()),
        ))));
        assert_eq!(Aws4Signer::payload_hash(&one_shot)?, sigv4::UNSIGNED_PAYLOAD);

        let streaming = request().set_content(Arc::new(Mutex::new(BufferedContent::new(
            std::io::Cursor::new(b"abc".to_vec()),
        ))));
        assert_eq!(Aws4Signer::payload_hash(&streaming)?, sigv4::UNSIGNED_PAYLOAD);
        Ok(())
    }

    #[test]
    fn payload_hash_respects_read_limit() -> anyhow::Result<()> {
        let mut request = request().set_content(BytesContent::shared("0123456789"));
        request.set_read_limit(4);
        assert_eq!(Aws4Signer::payload_hash(&request)?, sigv4::UNSIGNED_PAYLOAD);
        request.set_read_limit(10);
        assert_eq!(
            Aws4Signer::payload_hash(&request)?,
            sigv4::payload_hash(b"0123456789")
        );
        Ok(())
    }
}
