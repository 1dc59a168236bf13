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
use crate::content::BytesContent;
use crate::context::RequestExecutionContext;
use crate::pipeline::RequestPipeline;
use crate::request::Request;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Moves the query parameters of a `POST` request into a form-encoded body.
///
/// Only applies to clients configured for query-style protocols, and only
/// to requests without content.
#[derive(Clone, Debug, Default)]
pub struct MoveParametersToBodyStage {
    enabled: bool,
}

impl MoveParametersToBodyStage {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn applies(&self, request: &Request) -> bool {
        self.enabled
            && request.method() == Method::POST
            && request.content().is_none()
            && !request.parameters().is_empty()
    }
}

impl RequestPipeline for MoveParametersToBodyStage {
    type Input = Request;
    type Output = Request;

    async fn execute(
        &self,
        mut request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Request> {
        context.check_interrupted()?;
        if !self.applies(&request) {
            return Ok(request);
        }
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (name, values) in request.parameters() {
            for value in values {
                form.append_pair(name, value);
            }
        }
        let body = form.finish();
        request.parameters_mut().clear();
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        request.replace_content(Some(BytesContent::shared(body)));
        Ok(request)
    }
}
