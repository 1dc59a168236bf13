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
use bytes::{Bytes, BytesMut};
use runtime::metrics::Field;
use runtime::transport::{
    AbortableRunnable, AsyncHttpClient, AsyncResponseHandler, DataChannel, RequestProvider,
};
use tokio::task::JoinHandle;

/// A callback based transport, running each exchange on a tokio task.
///
/// The response headers and each body chunk are delivered to the handler as
/// they arrive. Aborting the exchange stops the task, the handler is then
/// dropped without a terminal callback.
#[derive(Clone, Debug, Default)]
pub struct ReqwestAsyncHttpClient {
    inner: reqwest::Client,
}

impl ReqwestAsyncHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a pre-configured [reqwest::Client].
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl AsyncHttpClient for ReqwestAsyncHttpClient {
    fn prepare_request(
        &self,
        provider: Box<dyn RequestProvider>,
        handler: Box<dyn AsyncResponseHandler>,
    ) -> Box<dyn AbortableRunnable> {
        Box::new(Exchange {
            client: self.inner.clone(),
            pending: Some((provider, handler)),
            task: None,
        })
    }
}

struct Exchange {
    client: reqwest::Client,
    pending: Option<(Box<dyn RequestProvider>, Box<dyn AsyncResponseHandler>)>,
    task: Option<JoinHandle<()>>,
}

impl AbortableRunnable for Exchange {
    fn run(&mut self) {
        let Some((provider, handler)) = self.pending.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let client = self.client.clone();
                self.task = Some(runtime.spawn(exchange(client, provider, handler)));
            }
            Err(e) => handler.exception_occurred(std::io::Error::other(e)),
        }
    }

    fn abort(&mut self) {
        self.pending = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Collects the request body pushed by the provider.
#[derive(Default)]
struct BodyChannel {
    body: BytesMut,
    done: bool,
}

impl DataChannel for BodyChannel {
    fn write(&mut self, chunk: Bytes) -> std::io::Result<()> {
        if self.done {
            return Err(std::io::Error::other("write after the body was complete"));
        }
        self.body.extend_from_slice(&chunk);
        Ok(())
    }

    fn done(&mut self) {
        self.done = true;
    }
}

async fn exchange(
    client: reqwest::Client,
    mut provider: Box<dyn RequestProvider>,
    mut handler: Box<dyn AsyncResponseHandler>,
) {
    let mut channel = BodyChannel::default();
    if let Err(e) = provider.ready_for_data(&mut channel) {
        handler.exception_occurred(e);
        return;
    }
    let mut builder = {
        let request = provider.request();
        client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
    };
    if !channel.body.is_empty() {
        provider
            .context()
            .metrics()
            .set_counter(Field::BytesProcessed, channel.body.len() as i64);
        builder = builder.body(channel.body.freeze());
    }

    let mut response = match builder.send().await {
        Ok(r) => r,
        Err(e) => {
            handler.exception_occurred(to_io_error(e));
            return;
        }
    };
    let status = response.status();
    handler.headers_received(status, status_text(status), response.headers().clone());
    loop {
        match response.chunk().await {
            Ok(Some(part)) => handler.body_part_received(part),
            Ok(None) => break,
            Err(e) => {
                handler.exception_occurred(to_io_error(e));
                return;
            }
        }
    }
    tracing::trace!(%status, invocation_id = %provider.context().invocation_id(), "exchange complete");
    handler.complete();
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};
    use httptest::matchers::request::{body, method_path};
    use httptest::{Expectation, Server, all_of, responders::*};
    use runtime::context::RequestExecutionContext;
    use runtime::http::HttpRequest;
    use runtime::metrics::NoopRequestMetrics;
    use runtime::transport::TransportContext;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    type Outcome = std::result::Result<(StatusCode, Vec<u8>), std::io::ErrorKind>;

    struct Provider {
        request: HttpRequest,
        context: TransportContext,
        body: Bytes,
    }

    impl Provider {
        fn new(url: &str, body: &'static str) -> anyhow::Result<Box<Self>> {
            let invocation_id = RequestExecutionContext::builder().build().invocation_id();
            Ok(Box::new(Self {
                request: HttpRequest::new(http::Method::POST, reqwest::Url::parse(url)?),
                context: TransportContext::new(Arc::new(NoopRequestMetrics), invocation_id),
                body: Bytes::from_static(body.as_bytes()),
            }))
        }
    }

    impl RequestProvider for Provider {
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
            channel.write(self.body.clone())?;
            channel.done();
            Ok(())
        }
    }

    struct Handler {
        status: Option<StatusCode>,
        body: Vec<u8>,
        sender: oneshot::Sender<Outcome>,
    }

    impl Handler {
        fn new() -> (Box<Self>, oneshot::Receiver<Outcome>) {
            let (sender, receiver) = oneshot::channel();
            let handler = Self {
                status: None,
                body: Vec::new(),
                sender,
            };
            (Box::new(handler), receiver)
        }
    }

    impl AsyncResponseHandler for Handler {
        fn headers_received(&mut self, status: StatusCode, _text: Option<String>, _headers: HeaderMap) {
            self.status = Some(status);
        }

        fn body_part_received(&mut self, part: Bytes) {
            self.body.extend_from_slice(&part);
        }

        fn complete(self: Box<Self>) {
            let outcome = match self.status {
                Some(status) => Ok((status, self.body)),
                None => Err(std::io::ErrorKind::InvalidData),
            };
            let _ = self.sender.send(outcome);
        }

        fn exception_occurred(self: Box<Self>, error: std::io::Error) {
            let _ = self.sender.send(Err(error.kind()));
        }
    }

    #[tokio::test]
    async fn exchange_complete() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![method_path("POST", "/upload"), body("payload")])
                .respond_with(status_code(202).body("accepted")),
        );
        let (handler, receiver) = Handler::new();
        let provider = Provider::new(&server.url_str("/upload"), "payload")?;
        let mut runnable = ReqwestAsyncHttpClient::new().prepare_request(provider, handler);
        runnable.run();
        let got = receiver.await?;
        assert_eq!(got, Ok((StatusCode::ACCEPTED, b"accepted".to_vec())));
        Ok(())
    }

    #[tokio::test]
    async fn exchange_exception() -> anyhow::Result<()> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let address = listener.local_addr()?;
        drop(listener);
        let (handler, receiver) = Handler::new();
        let provider = Provider::new(&format!("http://{address}/upload"), "payload")?;
        let mut runnable = ReqwestAsyncHttpClient::new().prepare_request(provider, handler);
        runnable.run();
        let got = receiver.await?;
        assert_eq!(got, Err(std::io::ErrorKind::ConnectionRefused));
        Ok(())
    }

    #[tokio::test]
    async fn abort_before_run() -> anyhow::Result<()> {
        let (handler, receiver) = Handler::new();
        let provider = Provider::new("http://127.0.0.1:1/unused", "payload")?;
        let mut runnable = ReqwestAsyncHttpClient::new().prepare_request(provider, handler);
        runnable.abort();
        runnable.run();
        // The handler is dropped without a terminal callback.
        assert!(receiver.await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn drop_stops_exchange() -> anyhow::Result<()> {
        // Accepts connections through the backlog, never responds.
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let address = listener.local_addr()?;
        let (handler, receiver) = Handler::new();
        let provider = Provider::new(&format!("http://{address}/upload"), "payload")?;
        let mut runnable = ReqwestAsyncHttpClient::new().prepare_request(provider, handler);
        runnable.run();
        drop(runnable);
        let got = tokio::time::timeout(std::time::Duration::from_secs(5), receiver).await?;
        assert!(got.is_err(), "{got:?}");
        drop(listener);
        Ok(())
    }

    #[test]
    fn body_channel() {
        let mut channel = BodyChannel::default();
        assert!(channel.write(Bytes::from_static(b"abc")).is_ok());
        assert!(channel.write(Bytes::from_static(b"def")).is_ok());
        channel.done();
        assert!(channel.write(Bytes::from_static(b"ghi")).is_err());
        assert_eq!(&channel.body[..], b"abcdef");
    }
}
