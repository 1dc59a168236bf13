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
use crate::request::Request;
use http::{HeaderName, HeaderValue};

/// Adds the client-level headers, the per-call headers, and the per-call
/// query parameters to the request.
///
/// Per-call headers replace client-level headers with the same name, and
/// both replace any value already in the request. Query parameters are
/// appended to any existing values.
#[derive(Clone, Debug, Default)]
pub struct MergeCustomHeadersStage {
    client_headers: Vec<(HeaderName, HeaderValue)>,
}

impl MergeCustomHeadersStage {
    pub fn new(client_headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self { client_headers }
    }
}

impl RequestPipeline for MergeCustomHeadersStage {
    type Input = Request;
    type Output = Request;

    async fn execute(
        &self,
        mut request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Request> {
        context.check_interrupted()?;
        let config = context.request_config();
        let headers = request.headers_mut();
        for (name, value) in self.client_headers.iter().chain(config.custom_headers()) {
            headers.insert(name.clone(), value.clone());
        }
        let parameters = request.parameters_mut();
        for (name, values) in config.custom_query_parameters() {
            parameters
                .entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        Ok(request)
    }
}
