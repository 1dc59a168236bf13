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

//! Request lifecycle handlers.

use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::Request;
use std::sync::Arc;

/// Observes, and sometimes modifies, each logical call.
///
/// Handlers are invoked in registration order, never concurrently for the
/// same call. All the hooks have empty default implementations.
///
/// For each call exactly one of [after_response][Self::after_response] or
/// [after_error][Self::after_error] is invoked, exactly once, no matter how
/// many attempts the call needed. The other hooks run on every attempt.
pub trait RequestHandler: Send + Sync {
    /// Called once per call, before the first attempt.
    fn before_request(&self, _request: &mut Request) {}

    /// Called on each attempt, before the response is interpreted. May
    /// replace the response.
    fn before_unmarshalling(&self, _request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        response
    }

    /// Called on each attempt, after the response is interpreted. `error` is
    /// set if the service returned an error.
    fn after_unmarshalling(&self, _response: &HttpResponse, _error: Option<&Error>) {}

    /// Called once, if the call succeeds.
    fn after_response(&self, _request: &Request, _response: &HttpResponse) {}

    /// Called once, if the call fails. Receives the final error.
    fn after_error(&self, _request: &Request, _response: Option<&HttpResponse>, _error: &Error) {}
}

pub type SharedRequestHandler = Arc<dyn RequestHandler>;
