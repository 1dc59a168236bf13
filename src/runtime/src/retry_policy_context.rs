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

//! The information available to retry policies.

use crate::error::Error;
use crate::request::{OriginalRequest, Request};

/// The state of a call after a failed attempt.
///
/// Retry conditions and backoff strategies use this to decide if, and when,
/// the request is sent again.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicyContext<'a> {
    request: &'a Request,
    original_request: Option<&'a OriginalRequest>,
    exception: &'a Error,
    retries_attempted: u32,
    http_status_code: Option<u16>,
}

impl<'a> RetryPolicyContext<'a> {
    pub fn new(request: &'a Request, exception: &'a Error) -> Self {
        Self {
            request,
            original_request: request.original_request(),
            exception,
            retries_attempted: 0,
            http_status_code: exception.http_status_code(),
        }
    }

    pub fn set_original_request(mut self, v: Option<&'a OriginalRequest>) -> Self {
        self.original_request = v;
        self
    }

    pub fn set_retries_attempted(mut self, v: u32) -> Self {
        self.retries_attempted = v;
        self
    }

    pub fn set_http_status_code(mut self, v: Option<u16>) -> Self {
        self.http_status_code = v;
        self
    }

    /// The request as it was before the first attempt.
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// The user-level request object, if the caller provided one.
    pub fn original_request(&self) -> Option<&'a OriginalRequest> {
        self.original_request
    }

    /// The error from the last attempt.
    pub fn exception(&self) -> &'a Error {
        self.exception
    }

    /// The number of retries so far, this is `0` after the first attempt.
    pub fn retries_attempted(&self) -> u32 {
        self.retries_attempted
    }

    /// The HTTP status code of the last attempt, if a response was received.
    pub fn http_status_code(&self) -> Option<u16> {
        self.http_status_code
    }
}
