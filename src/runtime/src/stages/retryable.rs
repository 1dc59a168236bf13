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
use crate::content;
use crate::context::RequestExecutionContext;
use crate::dependencies::HttpClientDependencies;
use crate::error::Error;
use crate::http::HttpResponse;
use crate::metrics::Field;
use crate::pipeline::RequestPipeline;
use crate::progress::{ProgressEventType, publish_progress};
use crate::request::Request;
use crate::response::Response;
use crate::retry_capacity::{NO_RETRY_INCREMENT, THROTTLED_RETRY_COST};
use crate::retry_policy_context::RetryPolicyContext;
use http::HeaderValue;
use http::header::{DATE, HeaderMap};
use std::sync::Arc;
use std::time::Duration;

/// The header describing the retry state of each attempt.
///
/// The value is `{retries}/{last backoff in ms}/{available capacity}`, the
/// last field is empty when the client does not use a retry capacity pool.
pub const RETRY_HEADER: &str = "amz-sdk-retry";

/// Runs the inner pipeline until it succeeds, or fails in a way that cannot
/// be retried.
///
/// Each attempt starts from a copy of the original request. Retries of
/// errors other than throttling consume capacity from the client retry pool,
/// once the pool is exhausted such errors are not retried. Successful calls
/// return capacity to the pool.
///
/// The error returned to the caller is always the error from the last
/// attempt. If that attempt received a response, the error is returned as a
/// failed [Response] so the lifecycle handlers can inspect it.
#[derive(Clone, Debug)]
pub struct RetryableStage<P> {
    inner: P,
    dependencies: Arc<HttpClientDependencies>,
}

impl<P> RetryableStage<P> {
    pub fn new(inner: P, dependencies: Arc<HttpClientDependencies>) -> Self {
        Self {
            inner,
            dependencies,
        }
    }
}

impl<P, T> RequestPipeline for RetryableStage<P>
where
    P: RequestPipeline<Input = Request, Output = Response<T>>,
    T: Send,
{
    type Input = Request;
    type Output = Response<T>;

    async fn execute(
        &self,
        request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Response<T>> {
        RetryExecutor::new(request, &self.dependencies, context)
            .execute(&self.inner)
            .await
    }
}

/// The outcome of one attempt, as seen by the retry loop.
#[derive(Debug)]
enum Attempt<T> {
    Success(Response<T>),
    RetryableFailure {
        error: Error,
        response: Option<HttpResponse>,
    },
    TerminalFailure(Error),
}

impl<T> From<Result<Response<T>>> for Attempt<T> {
    fn from(result: Result<Response<T>>) -> Self {
        match result {
            Ok(response) => match response.into_parts() {
                (Ok(value), http) => Attempt::Success(Response::success(value, http)),
                (Err(error), http) => Attempt::RetryableFailure {
                    error,
                    response: Some(http),
                },
            },
            Err(error) if error.is_io() || error.is_timeout() => Attempt::RetryableFailure {
                error,
                response: None,
            },
            Err(error) => Attempt::TerminalFailure(error),
        }
    }
}

/// The state of the retry loop for one call.
struct RetryExecutor<'a> {
    snapshot: Request,
    dependencies: &'a HttpClientDependencies,
    context: &'a RequestExecutionContext,
    request_count: u32,
    last_backoff_delay: Duration,
    next_backoff_delay: Duration,
    retry_capacity_consumed: bool,
}

impl<'a> RetryExecutor<'a> {
    fn new(
        snapshot: Request,
        dependencies: &'a HttpClientDependencies,
        context: &'a RequestExecutionContext,
    ) -> Self {
        Self {
            snapshot,
            dependencies,
            context,
            request_count: 0,
            last_backoff_delay: Duration::ZERO,
            next_backoff_delay: Duration::ZERO,
            retry_capacity_consumed: false,
        }
    }

    async fn execute<P, T>(mut self, inner: &P) -> Result<Response<T>>
    where
        P: RequestPipeline<Input = Request, Output = Response<T>>,
        T: Send,
    {
        loop {
            if let Err(e) = self.context.check_interrupted() {
                self.refund_capacity();
                return Err(e);
            }
            self.request_count += 1;
            self.context
                .metrics()
                .set_counter(Field::RequestCount, i64::from(self.request_count));

            let mut request = self.snapshot.clone();
            if self.is_retry() {
                self.pause_before_retry(&request).await?;
            }
            let read_limit = self.context.request_config().read_limit();
            if let Some(body) = request.content() {
                content::mark(body, read_limit).map_err(Error::io)?;
            }
            request.set_read_limit(read_limit);
            self.add_retry_header(&mut request)?;

            match Attempt::from(inner.execute(request, self.context).await) {
                Attempt::Success(response) => {
                    self.release_capacity_on_success();
                    return Ok(response);
                }
                Attempt::TerminalFailure(error) => {
                    if error.is_interrupted() {
                        self.refund_capacity();
                    }
                    return Err(error);
                }
                Attempt::RetryableFailure { error, response } => {
                    let metrics = self.context.metrics();
                    metrics.add_property(Field::Exception, error.to_string());
                    if error.is_throttling() {
                        metrics.increment_counter(Field::ThrottleException);
                    }
                    if error.is_clock_skew() {
                        let headers = response
                            .as_ref()
                            .map(HttpResponse::headers)
                            .or_else(|| error.http_headers());
                        self.adjust_clock_skew(headers);
                    }
                    let status = response
                        .as_ref()
                        .map(|r| r.status().as_u16())
                        .or_else(|| error.http_status_code());
                    if !self.should_retry(&error, status) {
                        return match response {
                            Some(http) => Ok(Response::failure(error, http)),
                            None => Err(error),
                        };
                    }
                }
            }
        }
    }

    fn is_retry(&self) -> bool {
        self.request_count > 1
    }

    /// Rewinds the content and sleeps for the computed backoff.
    async fn pause_before_retry(&mut self, request: &Request) -> Result<()> {
        if let Some(body) = request.content() {
            if let Err(e) = content::reset(body) {
                self.refund_capacity();
                return Err(Error::reset(e));
            }
        }
        let listener = self.context.request_config().progress_listener();
        publish_progress(listener.as_ref(), ProgressEventType::ClientRequestRetry);

        self.last_backoff_delay = self.next_backoff_delay;
        tracing::debug!(
            attempt = self.request_count,
            delay_ms = self.last_backoff_delay.as_millis() as u64,
            "retrying request"
        );
        let metrics = self.context.metrics();
        metrics.start_event(Field::RetryPauseTime);
        let cancelled = tokio::select! {
            _ = tokio::time::sleep(self.last_backoff_delay) => false,
            _ = self.context.cancellation_token().cancelled() => true,
        };
        metrics.end_event(Field::RetryPauseTime);
        if cancelled {
            self.refund_capacity();
            return Err(Error::interrupted(
                "the call was cancelled during the retry backoff",
            ));
        }
        Ok(())
    }

    fn add_retry_header(&self, request: &mut Request) -> Result<()> {
        let available = self
            .dependencies
            .retry_capacity()
            .available_capacity()
            .map(|c| c.to_string())
            .unwrap_or_default();
        let value = format!(
            "{}/{}/{available}",
            self.request_count - 1,
            self.last_backoff_delay.as_millis()
        );
        let value = HeaderValue::from_str(&value).map_err(Error::ser)?;
        request.headers_mut().insert(RETRY_HEADER, value);
        Ok(())
    }

    /// Decides if the call continues after a retryable failure, and computes
    /// the delay before the next attempt.
    fn should_retry(&mut self, error: &Error, status: Option<u16>) -> bool {
        let capacity = self.dependencies.retry_capacity();
        self.retry_capacity_consumed = false;
        if !error.is_throttling() {
            if !capacity.acquire(THROTTLED_RETRY_COST) {
                self.context
                    .metrics()
                    .increment_counter(Field::ThrottledRetryCount);
                tracing::debug!(
                    attempt = self.request_count,
                    "retry capacity exhausted, not retrying"
                );
                return false;
            }
            self.retry_capacity_consumed = true;
        }

        let original_request = self
            .context
            .request_config()
            .original_request()
            .or(self.snapshot.original_request());
        let policy_context = RetryPolicyContext::new(&self.snapshot, error)
            .set_original_request(original_request)
            .set_retries_attempted(self.request_count - 1)
            .set_http_status_code(status);
        let policy = self.dependencies.retry_policy();
        if !policy.should_retry(&policy_context) {
            if self.retry_capacity_consumed {
                capacity.release(THROTTLED_RETRY_COST);
                self.retry_capacity_consumed = false;
            }
            return false;
        }
        self.next_backoff_delay = policy.compute_delay_before_next_retry(&policy_context);
        true
    }

    fn release_capacity_on_success(&mut self) {
        let capacity = self.dependencies.retry_capacity();
        if self.is_retry() && self.retry_capacity_consumed {
            capacity.release(THROTTLED_RETRY_COST);
        } else {
            capacity.release(NO_RETRY_INCREMENT);
        }
        self.retry_capacity_consumed = false;
    }

    fn refund_capacity(&mut self) {
        if self.retry_capacity_consumed {
            self.dependencies
                .retry_capacity()
                .release(THROTTLED_RETRY_COST);
            self.retry_capacity_consumed = false;
        }
    }

    /// Records the clock skew reported by the service, for this call and for
    /// any future call made by the same client.
    fn adjust_clock_skew(&mut self, headers: Option<&HeaderMap>) {
        let skew = match headers.and_then(server_time) {
            Some(server) => clock_skew(chrono::Utc::now(), server),
            None => {
                tracing::warn!(
                    "unable to parse the server date, the clock skew adjustment is reset"
                );
                0
            }
        };
        self.dependencies.update_time_offset(skew);
        self.snapshot.set_time_offset(skew);
    }
}

fn server_time(headers: &HeaderMap) -> Option<chrono::DateTime<chrono::Utc>> {
    let date = headers.get(DATE)?.to_str().ok()?;
    chrono::DateTime::parse_from_rfc2822(date)
        .ok()
        .map(|d| d.with_timezone(&chrono::Utc))
}

/// The difference between the local and server clocks, in seconds.
fn clock_skew(local: chrono::DateTime<chrono::Utc>, server: chrono::DateTime<chrono::Utc>) -> i32 {
    let seconds = (local - server).num_seconds();
    seconds.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
