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

//! The HTTP representations exchanged with the transports.

use crate::content::{self, SharedContent};
use bytes::Bytes;
use http::header::{AsHeaderName, HeaderMap};
use http::{Method, StatusCode};
use url::Url;

/// The transport-level request, produced from a [Request][crate::request::Request]
/// once it is fully prepared and signed.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    content: Option<SharedContent>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            content: None,
        }
    }

    pub fn set_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    pub fn set_content(mut self, v: Option<SharedContent>) -> Self {
        self.content = v;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content(&self) -> Option<&SharedContent> {
        self.content.as_ref()
    }

    /// Reads the rest of the request body, empty if the request has no
    /// content.
    ///
    /// Transports call this once per attempt.
    pub fn read_body(&self) -> std::io::Result<Bytes> {
        match &self.content {
            None => Ok(Bytes::new()),
            Some(c) => content::read_all(c),
        }
    }
}

/// A fully buffered HTTP response.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    status: StatusCode,
    status_text: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn set_status_text<T: Into<String>>(mut self, v: T) -> Self {
        self.status_text = Some(v.into());
        self
    }

    pub fn set_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    pub fn set_body<T: Into<Bytes>>(mut self, v: T) -> Self {
        self.body = v.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase, as sent by the service.
    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value for `name`, if it is valid UTF-8.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Any 2xx status is a success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// A request and the response it produced.
#[derive(Clone, Debug)]
pub struct HttpExchange {
    pub request: HttpRequest,
    pub response: HttpResponse,
}

/// The state of a transport connection pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionPoolStats {
    pub available: u32,
    pub leased: u32,
    pub pending: u32,
}
