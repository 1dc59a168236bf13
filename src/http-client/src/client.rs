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

use crate::errors::{status_text, to_io_error};
use runtime::http::{HttpRequest, HttpResponse};
use runtime::transport::HttpClient;

/// A request/response transport based on [reqwest::Client].
///
/// Each call sends one request and buffers the full response. The runtime
/// applies the request timeouts, configure the underlying client for
/// connection settings.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a pre-configured [reqwest::Client].
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &HttpRequest) -> std::io::Result<HttpResponse> {
        let body = request.read_body()?;
        let mut builder = self
            .inner
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if !body.is_empty() {
            builder = builder.body(body);
        }
        let response = builder.send().await.map_err(to_io_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        tracing::trace!(%status, url = %request.url(), "response received");
        let body = response.bytes().await.map_err(to_io_error)?;
        let mut converted = HttpResponse::new(status)
            .set_headers(headers)
            .set_body(body);
        if let Some(text) = status_text(status) {
            converted = converted.set_status_text(text);
        }
        Ok(converted)
    }
}
