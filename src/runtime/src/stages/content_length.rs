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
use crate::error::Error;
use crate::pipeline::RequestPipeline;
use crate::progress::publish_request_content_length;
use crate::request::Request;
use http::HeaderValue;
use http::header::CONTENT_LENGTH;

/// Sets the `Content-Length` header when the length of the content is known.
#[derive(Clone, Debug, Default)]
pub struct SetContentLengthStage;

impl RequestPipeline for SetContentLengthStage {
    type Input = Request;
    type Output = Request;

    async fn execute(
        &self,
        mut request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Request> {
        context.check_interrupted()?;
        let Some(body) = request.content() else {
            return Ok(request);
        };
        let existing = request
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let length = match existing {
            Some(n) => Some(n),
            None => content::content_length(body).map_err(Error::io)?,
        };
        let Some(length) = length else {
            return Ok(request);
        };
        if existing.is_none() {
            request
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        publish_request_content_length(
            context.request_config().progress_listener().as_ref(),
            length,
        );
        Ok(request)
    }
}
