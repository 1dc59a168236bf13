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
use crate::pipeline::RequestPipeline;
use crate::progress::{ProgressEventType, publish_progress};
use crate::request::Request;
use crate::response::Response;

/// Invokes the lifecycle handlers once the call has a final outcome.
///
/// Exactly one of `after_response` or `after_error` runs for each handler,
/// however many attempts the inner pipeline made. A failed service response
/// counts as a failure, the handlers receive the response and its error.
#[derive(Clone, Debug)]
pub struct AfterCallbackStage<P> {
    inner: P,
}

impl<P> AfterCallbackStage<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P, T> RequestPipeline for AfterCallbackStage<P>
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
        context.check_interrupted()?;
        let listener = context.request_config().progress_listener();
        publish_progress(listener.as_ref(), ProgressEventType::ClientRequestStarted);
        let original = request.clone();

        match self.inner.execute(request, context).await {
            Ok(response) if response.is_success() => {
                for handler in context.request_handlers() {
                    handler.after_response(&original, response.http_response());
                    context.check_interrupted()?;
                }
                publish_progress(listener.as_ref(), ProgressEventType::ClientRequestSuccess);
                Ok(response)
            }
            Ok(response) => {
                publish_progress(listener.as_ref(), ProgressEventType::ClientRequestFailed);
                if let Some(error) = response.exception() {
                    for handler in context.request_handlers() {
                        handler.after_error(&original, Some(response.http_response()), error);
                    }
                }
                Ok(response)
            }
            Err(error) => {
                publish_progress(listener.as_ref(), ProgressEventType::ClientRequestFailed);
                for handler in context.request_handlers() {
                    handler.after_error(&original, None, &error);
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ServiceError};
    use crate::handler::RequestHandler;
    use crate::http::HttpResponse;
    use crate::progress::{ProgressEvent, ProgressListener};
    use crate::request_config::RequestConfig;
    use crate::stages::test_utils;
    use http::StatusCode;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, v: String) {
            if let Ok(mut events) = self.events.lock() {
                events.push(v);
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    impl RequestHandler for Recorder {
        fn after_response(&self, _request: &Request, response: &HttpResponse) {
            self.push(format!("after_response {}", response.status().as_u16()));
        }

        fn after_error(&self, _request: &Request, response: Option<&HttpResponse>, error: &Error) {
            let status = response.map(|r| r.status().as_u16());
            self.push(format!("after_error {status:?} {}", error.is_io()));
        }
    }

    impl ProgressListener for Recorder {
        fn progress_changed(&self, event: &ProgressEvent) {
            self.push(format!("{:?}", event.event_type));
        }
    }

    enum Outcome {
        Success,
        ServiceFailure,
        TransportFailure,
    }

    struct Inner(Outcome);

    impl RequestPipeline for Inner {
        type Input = Request;
        type Output = Response<String>;

        async fn execute(
            &self,
            _request: Request,
            _context: &RequestExecutionContext,
        ) -> Result<Response<String>> {
            match self.0 {
                Outcome::Success => Ok(Response::success(
                    "ok".to_string(),
                    HttpResponse::new(StatusCode::OK),
                )),
                Outcome::ServiceFailure => Ok(Response::failure(
                    Error::service(ServiceError::new(400)),
                    HttpResponse::new(StatusCode::BAD_REQUEST),
                )),
                Outcome::TransportFailure => Err(Error::io("connection reset")),
            }
        }
    }

    fn context(recorder: &Arc<Recorder>) -> RequestExecutionContext {
        RequestExecutionContext::builder()
            .with_request_config(RequestConfig::default().set_progress_listener(recorder.clone()))
            .with_request_handler(recorder.clone())
            .build()
    }

    #[tokio::test]
    async fn success() -> anyhow::Result<()> {
        let recorder = Arc::new(Recorder::default());
        let stage = AfterCallbackStage::new(Inner(Outcome::Success));
        let got = stage
            .execute(test_utils::request(), &context(&recorder))
            .await?;
        assert_eq!(got.value().map(String::as_str), Some("ok"));
        assert_eq!(
            recorder.events(),
            vec![
                "ClientRequestStarted",
                "after_response 200",
                "ClientRequestSuccess"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn service_failure() -> anyhow::Result<()> {
        let recorder = Arc::new(Recorder::default());
        let stage = AfterCallbackStage::new(Inner(Outcome::ServiceFailure));
        let got = stage
            .execute(test_utils::request(), &context(&recorder))
            .await?;
        assert!(!got.is_success());
        assert_eq!(
            recorder.events(),
            vec![
                "ClientRequestStarted",
                "ClientRequestFailed",
                "after_error Some(400) false"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure() -> anyhow::Result<()> {
        let recorder = Arc::new(Recorder::default());
        let stage = AfterCallbackStage::new(Inner(Outcome::TransportFailure));
        let err = stage
            .execute(test_utils::request(), &context(&recorder))
            .await
            .unwrap_err();
        assert!(err.is_io(), "{err:?}");
        assert_eq!(
            recorder.events(),
            vec![
                "ClientRequestStarted",
                "ClientRequestFailed",
                "after_error None true"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_before_start() -> anyhow::Result<()> {
        let recorder = Arc::new(Recorder::default());
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let context = RequestExecutionContext::builder()
            .with_request_handler(recorder.clone())
            .with_cancellation_token(token)
            .build();
        let stage = AfterCallbackStage::new(Inner(Outcome::Success));
        let err = stage
            .execute(test_utils::request(), &context)
            .await
            .unwrap_err();
        assert!(err.is_interrupted(), "{err:?}");
        assert!(recorder.events().is_empty());
        Ok(())
    }
}
