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

//! The per-call execution context.

use crate::Result;
use crate::error::Error;
use crate::handler::SharedRequestHandler;
use crate::metrics::{NoopRequestMetrics, RequestMetrics};
use crate::request_config::RequestConfig;
use crate::signer::{NoOpSigner, SharedSignerProvider, StaticSignerProvider};
use auth::credentials::SharedCredentialsProvider;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The collaborators for one logical call, shared by all its attempts.
///
/// The context is created before the call starts and is read-only
/// afterwards, except for the metrics recorder.
pub struct RequestExecutionContext {
    request_config: RequestConfig,
    credentials_provider: Option<SharedCredentialsProvider>,
    signer_provider: SharedSignerProvider,
    request_handlers: Vec<SharedRequestHandler>,
    metrics: Arc<dyn RequestMetrics>,
    cancellation: CancellationToken,
    invocation_id: Uuid,
}

impl RequestExecutionContext {
    pub fn builder() -> RequestExecutionContextBuilder {
        RequestExecutionContextBuilder::default()
    }

    pub fn request_config(&self) -> &RequestConfig {
        &self.request_config
    }

    pub fn credentials_provider(&self) -> Option<&SharedCredentialsProvider> {
        self.credentials_provider.as_ref()
    }

    pub fn signer_provider(&self) -> &SharedSignerProvider {
        &self.signer_provider
    }

    /// The lifecycle handlers, in registration order.
    pub fn request_handlers(&self) -> &[SharedRequestHandler] {
        &self.request_handlers
    }

    pub fn metrics(&self) -> &Arc<dyn RequestMetrics> {
        &self.metrics
    }

    /// Signals the call to stop. Stages observe it at their next checkpoint.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The id sent in the `amz-sdk-invocation-id` header, the same for all
    /// attempts.
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Returns an error if the call was cancelled.
    pub fn check_interrupted(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(Error::interrupted("the call was cancelled"));
        }
        Ok(())
    }

    pub(crate) fn set_cancellation_token(&mut self, v: CancellationToken) {
        self.cancellation = v;
    }
}

impl std::fmt::Debug for RequestExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutionContext")
            .field("request_config", &self.request_config)
            .field("credentials_provider", &self.credentials_provider)
            .field("request_handlers", &self.request_handlers.len())
            .field("metrics", &self.metrics)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("invocation_id", &self.invocation_id)
            .finish_non_exhaustive()
    }
}

/// Creates [RequestExecutionContext] instances.
///
/// # Example
/// ```
/// # use sdk_runtime::context::RequestExecutionContext;
/// # use sdk_runtime::request_config::RequestConfig;
/// # use sdk_runtime::signer::{Aws4Signer, StaticSignerProvider};
/// # use auth::credentials::{Credentials, StaticCredentialsProvider};
/// let context = RequestExecutionContext::builder()
///     .with_request_config(RequestConfig::new().set_request_type("ListItems"))
///     .with_credentials_provider(StaticCredentialsProvider::new(Credentials::new("id", "secret")))
///     .with_signer_provider(StaticSignerProvider::new(Aws4Signer::new("us-east-1", "items")))
///     .build();
/// assert_eq!(context.request_config().request_type(), Some("ListItems"));
/// ```
#[derive(Default)]
pub struct RequestExecutionContextBuilder {
    request_config: Option<RequestConfig>,
    credentials_provider: Option<SharedCredentialsProvider>,
    signer_provider: Option<SharedSignerProvider>,
    request_handlers: Vec<SharedRequestHandler>,
    metrics: Option<Arc<dyn RequestMetrics>>,
    cancellation: Option<CancellationToken>,
}

impl RequestExecutionContextBuilder {
    pub fn with_request_config(mut self, v: RequestConfig) -> Self {
        self.request_config = Some(v);
        self
    }

    pub fn with_credentials_provider<P>(mut self, v: P) -> Self
    where
        P: auth::credentials::CredentialsProvider + 'static,
    {
        self.credentials_provider = Some(Arc::new(v));
        self
    }

    pub fn with_shared_credentials_provider(mut self, v: SharedCredentialsProvider) -> Self {
        self.credentials_provider = Some(v);
        self
    }

    pub fn with_signer_provider<P: crate::signer::SignerProvider + 'static>(mut self, v: P) -> Self {
        self.signer_provider = Some(Arc::new(v));
        self
    }

    /// Appends a lifecycle handler, handlers run in the order they are added.
    pub fn with_request_handler(mut self, v: SharedRequestHandler) -> Self {
        self.request_handlers.push(v);
        self
    }

    pub fn with_metrics(mut self, v: Arc<dyn RequestMetrics>) -> Self {
        self.metrics = Some(v);
        self
    }

    /// Use an existing token to cancel the call.
    pub fn with_cancellation_token(mut self, v: CancellationToken) -> Self {
        self.cancellation = Some(v);
        self
    }

    pub fn build(self) -> RequestExecutionContext {
        RequestExecutionContext {
            request_config: self.request_config.unwrap_or_default(),
            credentials_provider: self.credentials_provider,
            signer_provider: self
                .signer_provider
                .unwrap_or_else(|| Arc::new(StaticSignerProvider::new(NoOpSigner))),
            request_handlers: self.request_handlers,
            metrics: self
                .metrics
                .unwrap_or_else(|| Arc::new(NoopRequestMetrics)),
            cancellation: self.cancellation.unwrap_or_default(),
            invocation_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let context = RequestExecutionContext::builder().build();
        assert!(context.credentials_provider().is_none());
        assert!(context.request_handlers().is_empty());
        assert!(!context.metrics().is_enabled());
        assert!(context.check_interrupted().is_ok());
        let other = RequestExecutionContext::builder().build();
        assert_ne!(context.invocation_id(), other.invocation_id());
    }

    #[test]
    fn cancellation() {
        let token = CancellationToken::new();
        let context = RequestExecutionContext::builder()
            .with_cancellation_token(token.clone())
            .build();
        assert!(context.check_interrupted().is_ok());
        token.cancel();
        let err = context.check_interrupted().unwrap_err();
        assert!(err.is_interrupted(), "{err:?}");
    }

    #[test]
    fn send_and_sync() {
        static_assertions::assert_impl_all!(RequestExecutionContext: Send, Sync);
    }
}
