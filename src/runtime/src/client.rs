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

//! The entry point for service clients.
//!
//! A [HttpPipelineClient] owns the state shared by all the calls made
//! through it: the client configuration, the HTTP transports, the retry
//! capacity pool and the clock skew observed on previous calls. Each call
//! runs through the same sequence of stages:
//!
//! 1. Lifecycle callbacks, once per call.
//! 1. The retry loop.
//! 1. Rewinding the request body after failed attempts.
//! 1. Request preparation: invocation id, user agent, custom headers and
//!    parameters, content length, and signing.
//! 1. Sending the request, with the sync or async transport.
//! 1. Interpreting the response.

use crate::Result;
use crate::client_config::ClientConfig;
use crate::context::RequestExecutionContext;
use crate::dependencies::HttpClientDependencies;
use crate::error::Error;
use crate::http::{HttpExchange, HttpRequest};
use crate::metrics::Field;
use crate::pipeline::{RequestPipeline, RequestPipelineBuilder};
use crate::request::Request;
use crate::response::Response;
use crate::response_handler::{SharedErrorResponseHandler, SharedResponseHandler};
use crate::stages::{
    AfterCallbackStage, AfterUnmarshallingCallbackStage, ApplyTransactionIdStage,
    ApplyUserAgentStage, BeforeUnmarshallingCallbackStage, HandleResponseStage,
    HttpRequestAdaptingStage, LastResetInputStreamStage, MakeAsyncHttpRequestStage,
    MakeHttpRequestStage, MergeCustomHeadersStage, MoveParametersToBodyStage, RetryableStage,
    SetContentLengthStage, SigningStage,
};
use crate::transport::{SharedAsyncHttpClient, SharedHttpClient};
use std::sync::Arc;
use tracing::Instrument;

/// Errors creating a [HttpPipelineClient].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BuilderError {
    #[error("the client needs at least one HTTP transport")]
    MissingTransport,
}

/// Executes requests against a service.
///
/// Cloning the client is cheap, clones share the retry capacity pool and the
/// clock skew correction.
///
/// # Example
/// ```no_run
/// # use sdk_runtime::client::HttpPipelineClient;
/// # use sdk_runtime::client_config::ClientConfig;
/// # use sdk_runtime::context::RequestExecutionContext;
/// # use sdk_runtime::request::Request;
/// # use sdk_runtime::response_handler::*;
/// # use sdk_runtime::transport::SharedHttpClient;
/// # use std::sync::Arc;
/// # async fn sample(transport: SharedHttpClient) -> anyhow::Result<()> {
/// let client = HttpPipelineClient::builder(ClientConfig::new())
///     .with_http_client(transport)
///     .build()?;
/// let request = Request::new(
///     "echo",
///     http::Method::GET,
///     url::Url::parse("https://echo.example.com")?,
/// );
/// let body = client
///     .execute(
///         request,
///         RequestExecutionContext::builder().build(),
///         Arc::new(StringResponseHandler),
///         Arc::new(JsonErrorResponseHandler::new()),
///     )
///     .await?;
/// println!("{body}");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct HttpPipelineClient {
    dependencies: Arc<HttpClientDependencies>,
}

impl HttpPipelineClient {
    pub fn builder(config: ClientConfig) -> HttpPipelineClientBuilder {
        HttpPipelineClientBuilder {
            config,
            http_client: None,
            async_http_client: None,
        }
    }

    pub fn dependencies(&self) -> &Arc<HttpClientDependencies> {
        &self.dependencies
    }

    /// Executes the request using the request/response transport.
    pub async fn execute<T: Send>(
        &self,
        request: Request,
        context: RequestExecutionContext,
        response_handler: SharedResponseHandler<T>,
        error_handler: SharedErrorResponseHandler,
    ) -> Result<T> {
        let pipeline = build_pipeline(
            self.dependencies.clone(),
            MakeHttpRequestStage::new(self.dependencies.clone()),
            response_handler,
            error_handler,
        );
        self.run(pipeline, request, context).await
    }

    /// Executes the request using the callback based transport.
    pub async fn execute_async<T: Send>(
        &self,
        request: Request,
        context: RequestExecutionContext,
        response_handler: SharedResponseHandler<T>,
        error_handler: SharedErrorResponseHandler,
    ) -> Result<T> {
        let pipeline = build_pipeline(
            self.dependencies.clone(),
            MakeAsyncHttpRequestStage::new(self.dependencies.clone()),
            response_handler,
            error_handler,
        );
        self.run(pipeline, request, context).await
    }

    async fn run<P, T>(
        &self,
        pipeline: P,
        mut request: Request,
        mut context: RequestExecutionContext,
    ) -> Result<T>
    where
        P: RequestPipeline<Input = Request, Output = Response<T>>,
        T: Send,
    {
        for handler in context.request_handlers() {
            handler.before_request(&mut request);
        }
        let span = tracing::info_span!(
            "sdk.request",
            service = request.service_name(),
            method = %request.method(),
            resource_path = request.resource_path(),
            invocation_id = %context.invocation_id(),
        );

        let metrics = context.metrics().clone();
        metrics.add_property(Field::ServiceName, request.service_name().to_string());
        if let Some(request_type) = context.request_config().request_type() {
            metrics.add_property(Field::RequestType, request_type.to_string());
        }

        let timeout = context
            .request_config()
            .client_execution_timeout()
            .or(self.dependencies.config().client_execution_timeout());
        let token = context.cancellation_token().child_token();
        context.set_cancellation_token(token.clone());

        metrics.start_event(Field::ClientExecuteTime);
        let result = async {
            let call = pipeline.execute(request, &context);
            let Some(timeout) = timeout else {
                return call.await;
            };
            tokio::pin!(call);
            let timer = tokio::time::sleep(timeout);
            tokio::pin!(timer);
            let mut timed_out = false;
            loop {
                tokio::select! {
                    result = &mut call => {
                        return match result {
                            Err(e) if timed_out && e.is_interrupted() => Err(Error::timeout(
                                format!("the call did not complete within {timeout:?}"),
                            )),
                            r => r,
                        };
                    }
                    _ = &mut timer, if !timed_out => {
                        tracing::debug!(?timeout, "client execution timeout, cancelling the call");
                        timed_out = true;
                        token.cancel();
                    }
                }
            }
        }
        .instrument(span)
        .await;
        metrics.end_event(Field::ClientExecuteTime);
        result?.into_result()
    }
}

/// Chains the stages for one call, `make_request` sends each attempt.
fn build_pipeline<M, T>(
    dependencies: Arc<HttpClientDependencies>,
    make_request: M,
    response_handler: SharedResponseHandler<T>,
    error_handler: SharedErrorResponseHandler,
) -> impl RequestPipeline<Input = Request, Output = Response<T>>
where
    M: RequestPipeline<Input = HttpRequest, Output = HttpExchange>,
    T: Send,
{
    let config = dependencies.config();
    RequestPipelineBuilder::first(ApplyTransactionIdStage)
        .then(ApplyUserAgentStage::new(config.user_agent()))
        .then(MergeCustomHeadersStage::new(config.headers().to_vec()))
        .then(MoveParametersToBodyStage::new(config.form_parameters_in_body()))
        .then(SetContentLengthStage)
        .then(SigningStage::new(dependencies.clone()))
        .then(HttpRequestAdaptingStage)
        .then(make_request)
        .then(BeforeUnmarshallingCallbackStage)
        .then(HandleResponseStage::new(response_handler, error_handler))
        .then(AfterUnmarshallingCallbackStage::new())
        .wrapped_by(LastResetInputStreamStage::new)
        .wrapped_by(|inner| RetryableStage::new(inner, dependencies))
        .wrapped_by(AfterCallbackStage::new)
        .build()
}

/// Configures a [HttpPipelineClient].
pub struct HttpPipelineClientBuilder {
    config: ClientConfig,
    http_client: Option<SharedHttpClient>,
    async_http_client: Option<SharedAsyncHttpClient>,
}

impl HttpPipelineClientBuilder {
    pub fn with_http_client(mut self, v: SharedHttpClient) -> Self {
        self.http_client = Some(v);
        self
    }

    pub fn with_async_http_client(mut self, v: SharedAsyncHttpClient) -> Self {
        self.async_http_client = Some(v);
        self
    }

    pub fn build(self) -> std::result::Result<HttpPipelineClient, BuilderError> {
        if self.http_client.is_none() && self.async_http_client.is_none() {
            return Err(BuilderError::MissingTransport);
        }
        let mut dependencies = HttpClientDependencies::new(self.config);
        if let Some(client) = self.http_client {
            dependencies = dependencies.with_http_client(client);
        }
        if let Some(client) = self.async_http_client {
            dependencies = dependencies.with_async_http_client(client);
        }
        Ok(HttpPipelineClient {
            dependencies: Arc::new(dependencies),
        })
    }
}
