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
use crate::error::Error;
use crate::pipeline::RequestPipeline;
use crate::request::Request;
use http::HeaderValue;
use http::header::USER_AGENT;

/// Sets the `User-Agent` header.
///
/// If the request already has a user agent, for example one set by a
/// lifecycle handler, the client user agent is prepended to it.
#[derive(Clone, Debug)]
pub struct ApplyUserAgentStage {
    user_agent: String,
}

impl ApplyUserAgentStage {
    pub fn new<T: Into<String>>(user_agent: T) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl RequestPipeline for ApplyUserAgentStage {
    type Input = Request;
    type Output = Request;

    async fn execute(
        &self,
        mut request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Request> {
        context.check_interrupted()?;
        let value = match request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
        {
            Some(existing) if !existing.is_empty() => format!("{} {existing}", self.user_agent),
            _ => self.user_agent.clone(),
        };
        let value = HeaderValue::from_str(&value).map_err(Error::ser)?;
        request.headers_mut().insert(USER_AGENT, value);
        Ok(request)
    }
}
