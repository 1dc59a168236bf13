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
use crate::dependencies::HttpClientDependencies;
use crate::error::Error;
use crate::metrics::Field;
use crate::pipeline::RequestPipeline;
use crate::request::Request;
use std::sync::Arc;

/// Resolves the credentials and signs the request.
///
/// The client-level clock skew, when known, replaces the request time offset
/// before signing. Requests are not signed without credentials, unless the
/// signer can handle that case.
#[derive(Clone, Debug)]
pub struct SigningStage {
    dependencies: Arc<HttpClientDependencies>,
}

impl SigningStage {
    pub fn new(dependencies: Arc<HttpClientDependencies>) -> Self {
        Self { dependencies }
    }
}

impl RequestPipeline for SigningStage {
    type Input = Request;
    type Output = Request;

    async fn execute(
        &self,
        mut request: Request,
        context: &RequestExecutionContext,
    ) -> Result<Request> {
        context.check_interrupted()?;
        let metrics = context.metrics();
        let credentials = match context.credentials_provider() {
            None => None,
            Some(provider) => {
                metrics.start_event(Field::CredentialsRequestTime);
                let credentials = provider.credentials().await;
                metrics.end_event(Field::CredentialsRequestTime);
                Some(credentials.map_err(Error::authentication)?)
            }
        };

        let signer = context
            .signer_provider()
            .signer(&request.uri(), context.request_config());
        let offset = self.dependencies.time_offset();
        if offset != 0 {
            request.set_time_offset(offset);
        }
        if credentials.is_none() && !signer.can_handle_null_credentials() {
            tracing::trace!("no credentials, skipping request signing");
            return Ok(request);
        }
        metrics.start_event(Field::RequestSigningTime);
        let result = signer.sign(&mut request, credentials.as_ref());
        metrics.end_event(Field::RequestSigningTime);
        result?;
        Ok(request)
    }
}
