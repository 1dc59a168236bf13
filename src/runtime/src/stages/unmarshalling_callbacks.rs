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
use std::marker::PhantomData;

/// Gives each lifecycle handler a chance to inspect, or replace, the raw
/// response before it is interpreted.
#[derive(Clone, Debug, Default)]
pub struct BeforeUnmarshallingCallbackStage;

impl RequestPipeline for BeforeUnmarshallingCallbackStage {
    type Input = HttpExchange;
    type Output = HttpExchange;

    async fn execute(
        &self,
        exchange: HttpExchange,
        context: &RequestExecutionContext,
    ) -> Result<HttpExchange> {
        context.check_interrupted()?;
        let HttpExchange {
            request,
            mut response,
        } = exchange;
        for handler in context.request_handlers() {
            response = handler.before_unmarshalling(&request, response);
        }
        Ok(HttpExchange { request, response })
    }
}

/// Notifies each lifecycle handler of the interpreted response.
#[derive(Debug)]
pub struct AfterUnmarshallingCallbackStage<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> AfterUnmarshallingCallbackStage<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for AfterUnmarshallingCallbackStage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> RequestPipeline for AfterUnmarshallingCallbackStage<T> {
    type Input = Response<T>;
    type Output = Response<T>;

    async fn execute(
        &self,
        response: Response<T>,
        context: &RequestExecutionContext,
    ) -> Result<Response<T>> {
        context.check_interrupted()?;
        for handler in context.request_handlers() {
            handler.after_unmarshalling(response.http_response(), response.exception());
        }
        Ok(response)
    }
}
