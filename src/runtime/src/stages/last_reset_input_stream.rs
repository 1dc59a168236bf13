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
use crate::pipeline::RequestPipeline;
use crate::request::Request;
use crate::response::Response;

/// Rewinds the request content after a failed attempt.
///
/// The reset is best effort: failures are logged and the original outcome is
/// returned unchanged. Cancelled calls are not reset.
#[derive(Clone, Debug)]
pub struct LastResetInputStreamStage<P> {
    inner: P,
}

impl<P> LastResetInputStreamStage<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P, T> RequestPipeline for LastResetInputStreamStage<P>
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
        let body = request.content().cloned();
        let result = self.inner.execute(request, context).await;
        let failed = match &result {
            Ok(response) => !response.is_success(),
            Err(e) => !e.is_interrupted(),
        };
        if let (true, Some(body)) = (failed, body) {
            if let Err(e) = content::reset(&body) {
                tracing::debug!("cannot reset the request content after a failed attempt: {e}");
            }
        }
        result
    }
}
