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
use crate::http::HttpRequest;
use crate::pipeline::RequestPipeline;
use crate::request::Request;

/// Converts the fully prepared request into the transport representation.
#[derive(Clone, Debug, Default)]
pub struct HttpRequestAdaptingStage;

impl RequestPipeline for HttpRequestAdaptingStage {
    type Input = Request;
    type Output = HttpRequest;

    async fn execute(
        &self,
        request: Request,
        context: &RequestExecutionContext,
    ) -> Result<HttpRequest> {
        context.check_interrupted()?;
        Ok(HttpRequest::new(request.method().clone(), request.uri())
            .set_headers(request.headers().clone())
            .set_content(request.content().cloned()))
    }
}
