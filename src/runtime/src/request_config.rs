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

//! Per-call configuration.

use crate::content::DEFAULT_READ_LIMIT;
use crate::progress::{NoopProgressListener, ProgressListener, SharedProgressListener};
use crate::request::{OriginalRequest, Parameters};
use http::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

/// A set of options configuring a single logical call.
///
/// Generated clients create one per call, from the options the application
/// set on the call builder. Values set here override the corresponding
/// [ClientConfig][crate::client_config::ClientConfig] values.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    request_timeout: Option<Duration>,
    client_execution_timeout: Option<Duration>,
    progress_listener: SharedProgressListener,
    custom_headers: Vec<(HeaderName, HeaderValue)>,
    custom_query_parameters: Parameters,
    original_request: Option<OriginalRequest>,
    read_limit: usize,
    request_type: Option<String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The timeout for each attempt.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn set_request_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.request_timeout = Some(v.into());
        self
    }

    /// The timeout for the logical call, including all retries and backoff.
    pub fn client_execution_timeout(&self) -> Option<Duration> {
        self.client_execution_timeout
    }

    pub fn set_client_execution_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.client_execution_timeout = Some(v.into());
        self
    }

    pub fn progress_listener(&self) -> &SharedProgressListener {
        &self.progress_listener
    }

    pub fn set_progress_listener<L: ProgressListener + 'static>(mut self, v: L) -> Self {
        self.progress_listener = Arc::new(v);
        self
    }

    /// Headers added to every attempt, after the client-level headers.
    pub fn custom_headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.custom_headers
    }

    pub fn add_custom_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.custom_headers.push((name, value));
        self
    }

    /// Query parameters appended to every attempt.
    pub fn custom_query_parameters(&self) -> &Parameters {
        &self.custom_query_parameters
    }

    pub fn add_custom_query_parameter<K: Into<String>, V: Into<String>>(
        mut self,
        name: K,
        value: V,
    ) -> Self {
        self.custom_query_parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn original_request(&self) -> Option<&OriginalRequest> {
        self.original_request.as_ref()
    }

    pub fn set_original_request(mut self, v: OriginalRequest) -> Self {
        self.original_request = Some(v);
        self
    }

    /// The maximum number of body bytes that can be replayed on a retry.
    pub fn read_limit(&self) -> usize {
        self.read_limit
    }

    pub fn set_read_limit(mut self, v: usize) -> Self {
        self.read_limit = v;
        self
    }

    /// The name of the operation, used in metrics.
    pub fn request_type(&self) -> Option<&str> {
        self.request_type.as_deref()
    }

    pub fn set_request_type<T: Into<String>>(mut self, v: T) -> Self {
        self.request_type = Some(v.into());
        self
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            client_execution_timeout: None,
            progress_listener: Arc::new(NoopProgressListener),
            custom_headers: Vec::new(),
            custom_query_parameters: Parameters::new(),
            original_request: None,
            read_limit: DEFAULT_READ_LIMIT,
            request_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RequestConfig::new();
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.client_execution_timeout(), None);
        assert!(config.custom_headers().is_empty());
        assert!(config.custom_query_parameters().is_empty());
        assert!(config.original_request().is_none());
        assert_eq!(config.read_limit(), DEFAULT_READ_LIMIT);
        assert_eq!(config.request_type(), None);
    }

    #[test]
    fn setters() {
        let config = RequestConfig::new()
            .set_request_timeout(Duration::from_secs(1))
            .set_client_execution_timeout(Duration::from_secs(10))
            .add_custom_header(
                HeaderName::from_static("x-custom"),
                HeaderValue::from_static("v1"),
            )
            .add_custom_query_parameter("a", "1")
            .add_custom_query_parameter("a", "2")
            .set_original_request(OriginalRequest::new("GetItem"))
            .set_read_limit(16)
            .set_request_type("GetItem");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(
            config.client_execution_timeout(),
            Some(Duration::from_secs(10))
        );
        assert_eq!(config.custom_headers().len(), 1);
        assert_eq!(
            config.custom_query_parameters().get("a"),
            Some(&vec!["1".to_string(), "2".to_string()])
        );
        assert_eq!(
            config
                .original_request()
                .and_then(|o| o.downcast_ref::<&str>()),
            Some(&"GetItem")
        );
        assert_eq!(config.read_limit(), 16);
        assert_eq!(config.request_type(), Some("GetItem"));
    }
}
