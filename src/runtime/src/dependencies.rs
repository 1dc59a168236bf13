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

//! The collaborators shared by all the calls made through one client.

use crate::client_config::ClientConfig;
use crate::retry_capacity::RetryCapacity;
use crate::retry_policy::SharedRetryPolicy;
use crate::transport::{SharedAsyncHttpClient, SharedHttpClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

/// Client-lifetime state, shared by reference between concurrent calls.
///
/// Besides the configuration and transports this holds the two pieces of
/// mutable state shared between calls: the retry capacity pool and the
/// client-level clock skew.
pub struct HttpClientDependencies {
    config: ClientConfig,
    retry_policy: SharedRetryPolicy,
    retry_capacity: Arc<RetryCapacity>,
    http_client: Option<SharedHttpClient>,
    async_http_client: Option<SharedAsyncHttpClient>,
    time_offset: AtomicI32,
}

impl HttpClientDependencies {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            retry_policy: config.retry_policy(),
            retry_capacity: config.retry_capacity(),
            config,
            http_client: None,
            async_http_client: None,
            time_offset: AtomicI32::new(0),
        }
    }

    pub fn with_http_client(mut self, v: SharedHttpClient) -> Self {
        self.http_client = Some(v);
        self
    }

    pub fn with_async_http_client(mut self, v: SharedAsyncHttpClient) -> Self {
        self.async_http_client = Some(v);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &SharedRetryPolicy {
        &self.retry_policy
    }

    pub fn retry_capacity(&self) -> &Arc<RetryCapacity> {
        &self.retry_capacity
    }

    pub fn http_client(&self) -> Option<&SharedHttpClient> {
        self.http_client.as_ref()
    }

    pub fn async_http_client(&self) -> Option<&SharedAsyncHttpClient> {
        self.async_http_client.as_ref()
    }

    /// The difference, in seconds, between the local clock and the service
    /// clock, as last observed by any call.
    pub fn time_offset(&self) -> i32 {
        self.time_offset.load(Ordering::Relaxed)
    }

    /// Records a new clock skew. Concurrent writers race, the last one wins.
    pub fn update_time_offset(&self, v: i32) {
        self.time_offset.store(v, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for HttpClientDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientDependencies")
            .field("config", &self.config)
            .field("retry_policy", &self.retry_policy)
            .field("retry_capacity", &self.retry_capacity)
            .field("http_client", &self.http_client.is_some())
            .field("async_http_client", &self.async_http_client.is_some())
            .field("time_offset", &self.time_offset())
            .finish()
    }
}
