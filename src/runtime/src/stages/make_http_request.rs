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

use crate::Result;
use crate::context::RequestExecutionContext;
use crate::dependencies::HttpClientDependencies;
use crate::error::Error;
use crate::http::{HttpExchange, HttpRequest, HttpResponse};
use crate::metrics::{Field, RequestMetrics};
use crate::pipeline::RequestPipeline;
use crate::progress::{ProgressEventType, publish_progress};
use crate::transport::HttpClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Sends the request with the [HttpClient] and waits for the response.
///
/// Transport failures become [Error::io], attempts that exceed the request
/// timeout become [Error::timeout]. Both are eligible for retries. The
/// response status is not interpreted here.
#[derive(Clone, Debug)]
pub struct MakeHttpRequestStage {
    dependencies: Arc<HttpClientDependencies>,
}

impl MakeHttpRequestStage {
    pub fn new(dependencies: Arc<HttpClientDependencies>) -> Self {
        Self { dependencies }
    }
}

impl RequestPipeline for MakeHttpRequestStage {
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
            .http_client()
            .ok_or_else(|| Error::other("the client has no HTTP transport configured"))?;
        let metrics = context.metrics();
        record_attempt_metrics(&self.dependencies, client.as_ref(), metrics.as_ref());

        let listener = context.request_config().progress_listener();
        publish_progress(listener.as_ref(), ProgressEventType::HttpRequestStarted);
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
        metrics.start_event(Field::HttpRequestTime);
        let timeout = attempt_timeout(&self.dependencies, context);
        let result = tokio::select! {
            r = with_timeout(timeout, client.execute(&request)) => r,
            _ = context.cancellation_token().cancelled() => Err(interrupted()),
        };
        metrics.end_event(Field::HttpRequestTime);
        let response = result?;
        publish_progress(listener.as_ref(), ProgressEventType::HttpRequestCompleted);
        metrics.add_property(Field::StatusCode, response.status().as_u16().to_string());
        Ok(HttpExchange { request, response })
    }
}

pub(crate) fn interrupted() -> Error {
    Error::interrupted("the call was cancelled while waiting for the response")
}

/// The per-attempt timeout, the request config overrides the client config.
pub(crate) fn attempt_timeout(
    dependencies: &HttpClientDependencies,
    context: &RequestExecutionContext,
) -> Option<Duration> {
    context
        .request_config()
        .request_timeout()
        .or(dependencies.config().request_timeout())
}

pub(crate) async fn with_timeout<F>(timeout: Option<Duration>, future: F) -> Result<HttpResponse>
where
    F: Future<Output = std::io::Result<HttpResponse>>,
{
    let result = match timeout {
        None => future.await,
        Some(t) => tokio::time::timeout(t, future)
            .await
            .map_err(|_| Error::timeout(format!("the attempt did not complete within {t:?}")))?,
    };
    result.map_err(Error::io)
}

fn record_attempt_metrics(
    dependencies: &HttpClientDependencies,
    client: &dyn HttpClient,
    metrics: &dyn RequestMetrics,
) {
    metrics.set_counter(
        Field::RetryCapacityConsumed,
        i64::from(dependencies.retry_capacity().consumed_capacity()),
    );
    if !dependencies.config().metrics_enabled() {
        return;
    }
    if let Some(stats) = client.pool_stats() {
        metrics.set_counter(Field::HttpClientPoolAvailableCount, i64::from(stats.available));
        metrics.set_counter(Field::HttpClientPoolLeasedCount, i64::from(stats.leased));
        metrics.set_counter(Field::HttpClientPoolPendingCount, i64::from(stats.pending));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_config::ClientConfig;
    use crate::http::ConnectionPoolStats;
    use crate::metrics::DefaultRequestMetrics;
    use crate::request_config::RequestConfig;
    use http::{Method, StatusCode};

    mockall::mock! {
        Client {}
        #[async_trait::async_trait]
        impl HttpClient for Client {
            async fn execute(&self, request: &HttpRequest) -> std::io::Result<HttpResponse>;
            fn pool_stats(&self) -> Option<ConnectionPoolStats>;
        }
    }

    fn http_request() -> HttpRequest {
        HttpRequest::new(
            Method::GET,
            url::Url::parse("https://example.com").expect("hard-coded URL is valid"),
        )
    }

    fn stage(client: MockClient, config: ClientConfig) -> MakeHttpRequestStage {
        let deps = HttpClientDependencies::new(config).with_http_client(Arc::new(client));
        MakeHttpRequestStage::new(Arc::new(deps))
    }

    #[tokio::test]
    async fn success() -> anyhow::Result<()> {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(StatusCode::ACCEPTED).set_body("ok")));
        client.expect_pool_stats().return_const(ConnectionPoolStats {
            available: 3,
            leased: 2,
            pending: 1,
        });
        let metrics = Arc::new(DefaultRequestMetrics::new());
        let context = RequestExecutionContext::builder()
            .with_metrics(metrics.clone())
            .build();
        let exchange = stage(client, ClientConfig::new().set_metrics_enabled(true))
            .execute(http_request(), &context)
            .await?;
        assert_eq!(exchange.response.status(), StatusCode::ACCEPTED);
        assert_eq!(exchange.request.url().as_str(), "https://example.com/");
        assert_eq!(metrics.properties(Field::StatusCode), vec!["202"]);
        assert_eq!(metrics.timings(Field::HttpRequestTime).len(), 1);
        assert_eq!(metrics.counter(Field::HttpClientPoolAvailableCount), Some(3));
        assert_eq!(metrics.counter(Field::HttpClientPoolLeasedCount), Some(2));
        assert_eq!(metrics.counter(Field::HttpClientPoolPendingCount), Some(1));
        assert_eq!(metrics.counter(Field::RetryCapacityConsumed), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn pool_stats_only_with_metrics() -> anyhow::Result<()> {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .returning(|_| Ok(HttpResponse::new(StatusCode::OK)));
        client.expect_pool_stats().never();
        let metrics = Arc::new(DefaultRequestMetrics::new());
        let context = RequestExecutionContext::builder()
            .with_metrics(metrics.clone())
            .build();
        stage(client, ClientConfig::new())
            .execute(http_request(), &context)
            .await?;
        assert_eq!(metrics.counter(Field::HttpClientPoolAvailableCount), None);
        Ok(())
    }

    #[tokio::test]
    async fn transport_error() {
        let mut client = MockClient::new();
        client
            .expect_execute()
            .returning(|_| Err(std::io::Error::other("connection reset")));
        let context = RequestExecutionContext::builder().build();
        let err = stage(client, ClientConfig::new())
            .execute(http_request(), &context)
            .await
            .unwrap_err();
        assert!(err.is_io(), "{err:?}");
        assert!(err.to_string().contains("connection reset"), "{err}");
    }

    #[tokio::test]
    async fn missing_transport() {
        let deps = HttpClientDependencies::new(ClientConfig::new());
        let context = RequestExecutionContext::builder().build();
        let err = MakeHttpRequestStage::new(Arc::new(deps))
            .execute(http_request(), &context)
            .await
            .unwrap_err();
        assert!(!err.is_io(), "{err:?}");
    }

    #[test]
    fn attempt_timeout_from_request_config() {
        let deps = HttpClientDependencies::new(
            ClientConfig::new().set_request_timeout(Duration::from_secs(60)),
        );
        let context = RequestExecutionContext::builder()
            .with_request_config(RequestConfig::new().set_request_timeout(Duration::from_secs(1)))
            .build();
        assert_eq!(
            attempt_timeout(&deps, &context),
            Some(Duration::from_secs(1))
        );
        let context = RequestExecutionContext::builder().build();
        assert_eq!(
            attempt_timeout(&deps, &context),
            Some(Duration::from_secs(60))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn times_out() {
        let result = with_timeout(Some(Duration::from_secs(1)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(HttpResponse::new(StatusCode::OK))
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.is_timeout(), "{err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_while_waiting() {
        #[derive(Clone)]
        struct Hang;
        #[async_trait::async_trait]
        impl HttpClient for Hang {
            async fn execute(&self, _request: &HttpRequest) -> std::io::Result<HttpResponse> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(HttpResponse::new(StatusCode::OK))
            }
        }
        let deps = HttpClientDependencies::new(ClientConfig::new()).with_http_client(Arc::new(Hang));
        let context = RequestExecutionContext::builder().build();
        let token = context.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });
        let err = MakeHttpRequestStage::new(Arc::new(deps))
            .execute(http_request(), &context)
            .await
            .unwrap_err();
        assert!(err.is_interrupted(), "{err:?}");
    }
}
