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
use crate::http::HttpExchange;
use crate::pipeline::RequestPipeline;
use crate::response::Response;
use crate::response_handler::{SharedErrorResponseHandler, SharedResponseHandler};

/// Interprets the response.
///
/// Successful responses are converted with the response handler. Anything
/// else is converted into an error with the error response handler, and
/// returned as a failed [Response], so the retry engine can examine it.
/// A successful response that cannot be interpreted is an error.
pub struct HandleResponseStage<T> {
    response_handler: SharedResponseHandler<T>,
    error_handler: SharedErrorResponseHandler,
}

impl<T> HandleResponseStage<T> {
    pub fn new(
        response_handler: SharedResponseHandler<T>,
        error_handler: SharedErrorResponseHandler,
    ) -> Self {
        Self {
            response_handler,
            error_handler,
        }
    }
}

impl<T> Clone for HandleResponseStage<T> {
    fn clone(&self) -> Self {
        Self {
            response_handler: self.response_handler.clone(),
            error_handler: self.error_handler.clone(),
        }
    }
}

impl<T: Send> RequestPipeline for HandleResponseStage<T> {
    type Input = HttpExchange;
    type Output = Response<T>;

    async fn execute(
        &self,
        exchange: HttpExchange,
        context: &RequestExecutionContext,
    ) -> Result<Response<T>> {
        context.check_interrupted()?;
        let response = exchange.response;
        if response.is_success() {
            let value = self.response_handler.handle(&response)?;
            return Ok(Response::success(value, response));
        }
        let error = self.error_handler.handle(&response);
        tracing::debug!(status = response.status().as_u16(), error = %error, "service returned an error");
        Ok(Response::failure(error, response))
    }
}
