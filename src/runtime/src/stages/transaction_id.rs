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

/// The header used to correlate all the attempts of a call.
pub const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

/// Stamps the invocation id on the request.
///
/// The id is generated once per call, so retries carry the same value.
#[derive(Clone, Debug, Default)]
pub struct ApplyTransactionIdStage;

impl RequestPipeline for ApplyTransactionIdStage {
    type Input = Request;
    type Output = Request;

    async fn execute(
        &self,
        mut request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Request> {
        context.check_interrupted()?;
        let id = context.invocation_id().to_string();
        let value = HeaderValue::from_str(&id).map_err(Error::ser)?;
        request.headers_mut().insert(INVOCATION_ID_HEADER, value);
        Ok(request)
    }
}
