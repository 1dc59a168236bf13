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

//! The contracts implemented by HTTP transports.
//!
//! The pipeline supports two transport shapes. A [HttpClient] takes a
//! request and returns a response. An [AsyncHttpClient] is driven by
//! callbacks: it pulls the request body from a [RequestProvider] and pushes
//! the response into an [AsyncResponseHandler].

use crate::http::{ConnectionPoolStats, HttpRequest, HttpResponse};
use crate::metrics::RequestMetrics;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

/// A transport that returns the response for each request.
///
/// Implementations must not retry, the retry engine owns all retry
/// decisions.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends the request and receives the full response.
    ///
    /// Returns an error if the request could not be sent or the response
    /// could not be received. Error responses from the service are not
    /// errors at this level.
    async fn execute(&self, request: &HttpRequest) -> std::io::Result<HttpResponse>;

    /// The connection pool statistics, if the transport tracks them.
    fn pool_stats(&self) -> Option<ConnectionPoolStats> {
        None
    }
}

pub type SharedHttpClient = Arc<dyn HttpClient>;

/// Information about the attempt, available to callback transports.
#[derive(Clone, Debug)]
pub struct TransportContext {
    metrics: Arc<dyn RequestMetrics>,
    invocation_id: Uuid,
}

impl TransportContext {
    pub fn new(metrics: Arc<dyn RequestMetrics>, invocation_id: Uuid) -> Self {
        Self {
            metrics,
            invocation_id,
        }
    }

    pub fn metrics(&self) -> &Arc<dyn RequestMetrics> {
        &self.metrics
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }
}

/// Receives the request body from a [RequestProvider].
pub trait DataChannel: Send {
    fn write(&mut self, chunk: Bytes) -> std::io::Result<()>;

    /// No more data follows.
    fn done(&mut self);
}

/// The source of the request sent by an [AsyncHttpClient].
pub trait RequestProvider: Send {
    fn request(&self) -> &HttpRequest;

    fn context(&self) -> &TransportContext;

    fn content_length(&self) -> u64;

    /// Called by the transport when it is ready to send the body.
    fn ready_for_data(&mut self, channel: &mut dyn DataChannel) -> std::io::Result<()>;
}

/// Receives the response from an [AsyncHttpClient].
///
/// The transport calls [headers_received][Self::headers_received], then zero
/// or more [body_part_received][Self::body_part_received], then exactly one of
/// [complete][Self::complete] or [exception_occurred][Self::exception_occurred].
/// The last two consume the handler, they cannot both be called.
pub trait AsyncResponseHandler: Send {
    fn headers_received(
        &mut self,
        status: StatusCode,
        status_text: Option<String>,
        headers: HeaderMap,
    );

    fn body_part_received(&mut self, part: Bytes);

    fn complete(self: Box<Self>);

    fn exception_occurred(self: Box<Self>, error: std::io::Error);
}

/// A prepared request in a callback transport.
pub trait AbortableRunnable: Send {
    /// Starts sending the request, returns without waiting for the response.
    fn run(&mut self);

    /// Stops the request, if it is still running.
    fn abort(&mut self);
}

/// A transport driven by callbacks.
pub trait AsyncHttpClient: Send + Sync {
    fn prepare_request(
        &self,
        provider: Box<dyn RequestProvider>,
        handler: Box<dyn AsyncResponseHandler>,
    ) -> Box<dyn AbortableRunnable>;
}

pub type SharedAsyncHttpClient = Arc<dyn AsyncHttpClient>;
