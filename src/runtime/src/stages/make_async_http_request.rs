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

use super::make_http_request::{attempt_timeout, interrupted, with_timeout};
use crate::Result;
use crate::context::RequestExecutionContext;
use crate::dependencies::HttpClientDependencies;
use crate::error::Error;
use crate::http::{HttpExchange, HttpRequest, HttpResponse};
use crate::metrics::Field;
use crate::pipeline::RequestPipeline;
use crate::progress::{ProgressEventType, SharedProgressListener, publish_progress};
use crate::transport::{
    AsyncResponseHandler, DataChannel, RequestProvider, TransportContext,
};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Sends the request with the [AsyncHttpClient][crate::transport::AsyncHttpClient].
///
/// The request body is read into memory and offered to the transport as a
/// single chunk. The response body is buffered until the transport signals
/// completion.
#[derive(Clone, Debug)]
pub struct MakeAsyncHttpRequestStage {
    dependencies: Arc<HttpClientDependencies>,
}

impl MakeAsyncHttpRequestStage {
    pub fn new(dependencies: Arc<HttpClientDependencies>) -> Self {
        Self { dependencies }
    }
}

impl RequestPipeline for MakeAsyncHttpRequestStage {
    type Input = HttpRequest;
    type Output = HttpExchange;

    async fn execute(
        &self,
        request: HttpRequest,
        context: &RequestExecutionContext,
    ) -> Result<HttpExchange> {
        context.check_interrupted()?;
        let client = self
            .dependencies
            .async_http_client()
            .ok_or_else(|| Error::other("the client has no async HTTP transport configured"))?;
        let metrics = context.metrics();
        metrics.set_counter(
            Field::RetryCapacityConsumed,
            i64::from(self.dependencies.retry_capacity().consumed_capacity()),
        );
        let body = request.read_body().map_err(Error::io)?;

        let (sender, receiver) = oneshot::channel();
        let listener = context.request_config().progress_listener().clone();
        let provider = SimpleRequestProvider {
            request: request.clone(),
            context: TransportContext::new(metrics.clone(), context.invocation_id()),
            body,
        };
        let handler = SimpleResponseHandler::new(sender, listener.clone());

        publish_progress(listener.as_ref(), ProgressEventType::HttpRequestStarted);
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
        metrics.start_event(Field::HttpRequestTime);
        let mut runnable = client.prepare_request(Box::new(provider), Box::new(handler));
        runnable.run();
        let response = async {
            receiver.await.unwrap_or_else(|_| {
                Err(std::io::Error::other(
                    "the transport dropped the request without a response",
                ))
            })
        };
        let timeout = attempt_timeout(&self.dependencies, context);
        let result = tokio::select! {
            r = with_timeout(timeout, response) => r,
            _ = context.cancellation_token().cancelled() => Err(interrupted()),
        };
        metrics.end_event(Field::HttpRequestTime);
        if result.is_err() {
            runnable.abort();
        }
        let response = result?;
        metrics.add_property(Field::StatusCode, response.status().as_u16().to_string());
        Ok(HttpExchange { request, response })
    }
}

struct SimpleRequestProvider {
    request: HttpRequest,
    context: TransportContext,
    body: Bytes,
}

impl RequestProvider for SimpleRequestProvider {
    fn request(&self) -> &HttpRequest {
        &self.request
    }

    fn context(&self) -> &TransportContext {
        &self.context
    }

    fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    fn ready_for_data(&mut self, channel: &mut dyn DataChannel) -> std::io::Result<()> {
        if !self.body.is_empty() {
            channel.write(self.body.clone())?;
        }
        channel.done();
        Ok(())
    }
}

struct SimpleResponseHandler {
    response: HttpResponse,
    body: BytesMut,
    sender: oneshot::Sender<std::io::Result<HttpResponse>>,
    listener: SharedProgressListener,
}

impl SimpleResponseHandler {
    fn new(
        sender: oneshot::Sender<std::io::Result<HttpResponse>>,
        listener: SharedProgressListener,
    ) -> Self {
        Self {
            response: HttpResponse::default(),
            body: BytesMut::new(),
            sender,
            listener,
        }
    }
}

impl AsyncResponseHandler for SimpleResponseHandler {
    fn headers_received(
        &mut self,
        status: StatusCode,
        status_text: Option<String>,
        headers: HeaderMap,
    ) {
        let response = HttpResponse::new(status).set_headers(headers);
        self.response = match status_text {
            Some(text) => response.set_status_text(text),
            None => response,
        };
    }

    fn body_part_received(&mut self, part: Bytes) {
        self.body.extend_from_slice(&part);
    }

    fn complete(self: Box<Self>) {
        let this = *self;
        publish_progress(
            this.listener.as_ref(),
            ProgressEventType::HttpRequestCompleted,
        );
        let response = this.response.set_body(this.body.freeze());
        // The receiver is gone if the attempt was cancelled or timed out.
        let _ = this.sender.send(Ok(response));
    }

    fn exception_occurred(self: Box<Self>, error: std::io::Error) {
        let _ = self.sender.send(Err(error));
    }
}
