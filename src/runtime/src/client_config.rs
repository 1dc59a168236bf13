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

//! Client-level configuration.

use crate::retry_capacity::RetryCapacity;
use crate::retry_policy::{RetryPolicyArg, SharedRetryPolicy, default_retry_policy};
use http::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

/// The default value for the `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("sdk-runtime-rust/", env!("CARGO_PKG_VERSION"));

/// Configure a client.
///
/// A client is configured once, the configuration applies to all the calls
/// made through it. Most applications use the defaults, some may want to
/// change the retry policy, the timeouts, or disable throttled retries.
///
/// # Example
/// ```
/// # use sdk_runtime::client_config::ClientConfig;
/// # use sdk_runtime::retry_policy::NoRetryPolicy;
/// use std::time::Duration;
/// let config = ClientConfig::new()
///     .set_retry_policy(NoRetryPolicy)
///     .set_request_timeout(Duration::from_secs(5));
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub(crate) user_agent: String,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) retry_policy: Option<SharedRetryPolicy>,
    pub(crate) throttled_retries: bool,
    pub(crate) retry_capacity: Option<Arc<RetryCapacity>>,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) client_execution_timeout: Option<Duration>,
    pub(crate) form_parameters_in_body: bool,
    pub(crate) metrics_enabled: bool,
}

impl ClientConfig {
    /// Returns a default [ClientConfig].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Replaces the `User-Agent` header value.
    pub fn set_user_agent<T: Into<String>>(mut self, v: T) -> Self {
        self.user_agent = v.into();
        self
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Adds a header to every request made by the client.
    pub fn add_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// The retry policy, [default_retry_policy] if not set.
    pub fn retry_policy(&self) -> SharedRetryPolicy {
        self.retry_policy
            .clone()
            .unwrap_or_else(|| Arc::new(default_retry_policy()))
    }

    /// Configure the retry policy.
    pub fn set_retry_policy<V: Into<RetryPolicyArg>>(mut self, v: V) -> Self {
        self.retry_policy = Some(v.into().0);
        self
    }

    /// Enables or disables the retry capacity pool.
    ///
    /// With throttled retries enabled each retry of a non-throttling error
    /// consumes capacity from a pool shared by all calls made by the client.
    /// Retries stop when the pool is exhausted, and successful calls refill
    /// it. Enabled by default.
    pub fn set_throttled_retries(mut self, v: bool) -> Self {
        self.throttled_retries = v;
        self
    }

    pub fn throttled_retries(&self) -> bool {
        self.throttled_retries
    }

    /// Use an existing retry capacity pool, overrides
    /// [set_throttled_retries][Self::set_throttled_retries].
    ///
    /// Clients sharing the same pool share the retry budget.
    pub fn set_retry_capacity(mut self, v: Arc<RetryCapacity>) -> Self {
        self.retry_capacity = Some(v);
        self
    }

    /// The retry capacity pool for a new client.
    pub fn retry_capacity(&self) -> Arc<RetryCapacity> {
        match (&self.retry_capacity, self.throttled_retries) {
            (Some(c), _) => c.clone(),
            (None, true) => Arc::new(RetryCapacity::default()),
            (None, false) => Arc::new(RetryCapacity::disabled()),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// The default timeout for each attempt.
    pub fn set_request_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.request_timeout = Some(v.into());
        self
    }

    pub fn client_execution_timeout(&self) -> Option<Duration> {
        self.client_execution_timeout
    }

    /// The default timeout for each logical call.
    pub fn set_client_execution_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.client_execution_timeout = Some(v.into());
        self
    }

    pub fn form_parameters_in_body(&self) -> bool {
        self.form_parameters_in_body
    }

    /// Send the query parameters of `POST` requests without content as a
    /// form-encoded body. Services using query-style protocols need this.
    pub fn set_form_parameters_in_body(mut self, v: bool) -> Self {
        self.form_parameters_in_body = v;
        self
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Collect connection pool statistics on each attempt.
    pub fn set_metrics_enabled(mut self, v: bool) -> Self {
        self.metrics_enabled = v;
        self
    }
}

impl std::default::Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            retry_policy: None,
            throttled_retries: true,
            retry_capacity: None,
            request_timeout: None,
            client_execution_timeout: None,
            form_parameters_in_body: false,
            metrics_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry_capacity::DEFAULT_MAX_CAPACITY;
    use crate::retry_policy::NoRetryPolicy;

    #[test]
    fn defaults() {
        let config = ClientConfig::new();
        assert!(config.user_agent().starts_with("sdk-runtime-rust/"));
        assert!(config.headers().is_empty());
        assert!(config.throttled_retries());
        assert_eq!(
            config.retry_capacity().available_capacity(),
            Some(DEFAULT_MAX_CAPACITY)
        );
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.client_execution_timeout(), None);
        assert!(!config.form_parameters_in_body());
        assert!(!config.metrics_enabled());
        let policy = format!("{:?}", config.retry_policy());
        assert!(policy.contains("SimpleRetryPolicy"), "{policy}");
    }

    #[test]
    fn setters() {
        let shared = Arc::new(RetryCapacity::new(10));
        let config = ClientConfig::new()
            .set_user_agent("test/1.0")
            .add_header(
                HeaderName::from_static("x-custom"),
                HeaderValue::from_static("v"),
            )
            .set_retry_policy(NoRetryPolicy)
            .set_retry_capacity(shared.clone())
            .set_request_timeout(Duration::from_secs(1))
            .set_client_execution_timeout(Duration::from_secs(2))
            .set_form_parameters_in_body(true)
            .set_metrics_enabled(true);
        assert_eq!(config.user_agent(), "test/1.0");
        assert_eq!(config.headers().len(), 1);
        assert!(Arc::ptr_eq(&config.retry_capacity(), &shared));
        let policy = format!("{:?}", config.retry_policy());
        assert!(policy.contains("NoRetryPolicy"), "{policy}");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(
            config.client_execution_timeout(),
            Some(Duration::from_secs(2))
        );
        assert!(config.form_parameters_in_body());
        assert!(config.metrics_enabled());
    }

    #[test]
    fn throttled_retries_disabled() {
        let config = ClientConfig::new().set_throttled_retries(false);
        let capacity = config.retry_capacity();
        assert!(!capacity.is_enabled());
        assert_eq!(capacity.available_capacity(), None);
    }
}
