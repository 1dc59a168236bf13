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

use crate::content::{DEFAULT_READ_LIMIT, SharedContent};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// The query parameters of a request, each name may have multiple values.
pub type Parameters = BTreeMap<String, Vec<String>>;

/// A reference to the high-level request object that originated the call.
///
/// The pipeline never inspects this object, it only passes it along to retry
/// policies and lifecycle handlers, which may downcast it.
#[derive(Clone)]
pub struct OriginalRequest(Arc<dyn Any + Send + Sync>);

impl OriginalRequest {
    pub fn new<T: Any + Send + Sync>(v: T) -> Self {
        Self(Arc::new(v))
    }

    /// Returns the original request if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for OriginalRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OriginalRequest").finish_non_exhaustive()
    }
}

/// The descriptor for a single logical call.
///
/// Marshallers create one `Request` per call. The retry engine keeps the
/// original as an immutable snapshot and gives each attempt its own clone.
/// Clones share the content stream: the stream position is controlled with
/// mark and reset, not by copying the data.
#[derive(Clone, Debug)]
pub struct Request {
    service_name: String,
    method: Method,
    endpoint: Url,
    resource_path: String,
    headers: HeaderMap,
    parameters: Parameters,
    content: Option<SharedContent>,
    time_offset: i32,
    read_limit: usize,
    original_request: Option<OriginalRequest>,
}

impl Request {
    /// Creates a request without headers, parameters or content.
    ///
    /// # Example
    /// ```
    /// # use sdk_runtime::request::Request;
    /// let endpoint = url::Url::parse("https://example.com")?;
    /// let request = Request::new("example", http::Method::GET, endpoint)
    ///     .set_resource_path("/v1/things")
    ///     .add_parameter("page", "2");
    /// assert_eq!(request.uri().as_str(), "https://example.com/v1/things?page=2");
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn new<S: Into<String>>(service_name: S, method: Method, endpoint: Url) -> Self {
        Self {
            service_name: service_name.into(),
            method,
            endpoint,
            resource_path: String::new(),
            headers: HeaderMap::new(),
            parameters: Parameters::new(),
            content: None,
            time_offset: 0,
            read_limit: DEFAULT_READ_LIMIT,
            original_request: None,
        }
    }

    pub fn set_resource_path<T: Into<String>>(mut self, v: T) -> Self {
        self.resource_path = v.into();
        self
    }

    pub fn add_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn add_parameter<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn set_content(mut self, v: SharedContent) -> Self {
        self.content = Some(v);
        self
    }

    pub fn set_original_request(mut self, v: OriginalRequest) -> Self {
        self.original_request = Some(v);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn content(&self) -> Option<&SharedContent> {
        self.content.as_ref()
    }

    pub fn replace_content(&mut self, v: Option<SharedContent>) -> Option<SharedContent> {
        std::mem::replace(&mut self.content, v)
    }

    /// The clock skew, in seconds, between this client and the service.
    ///
    /// Positive values mean the client clock is ahead of the service clock.
    pub fn time_offset(&self) -> i32 {
        self.time_offset
    }

    pub fn set_time_offset(&mut self, v: i32) {
        self.time_offset = v;
    }

    /// The number of bytes of content that can be read and still rewind to
    /// the current mark.
    pub fn read_limit(&self) -> usize {
        self.read_limit
    }

    pub fn set_read_limit(&mut self, v: usize) {
        self.read_limit = v;
    }

    pub fn original_request(&self) -> Option<&OriginalRequest> {
        self.original_request.as_ref()
    }

    /// Composes the endpoint, resource path, and query parameters.
    pub fn uri(&self) -> Url {
        let mut url = self.endpoint.clone();
        if !self.resource_path.is_empty() {
            let path = format!(
                "{}/{}",
                url.path().trim_end_matches('/'),
                self.resource_path.trim_start_matches('/')
            );
            url.set_path(&path);
        }
        if !self.parameters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, values) in &self.parameters {
                if values.is_empty() {
                    pairs.append_key_only(name);
                }
                for value in values {
                    pairs.append_pair(name, value);
                }
            }
        }
        url
    }
}
