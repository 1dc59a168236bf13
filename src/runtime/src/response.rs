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

use crate::error::Error;
use crate::http::HttpResponse;

/// The outcome of one attempt.
///
/// Holds either the interpreted value of a successful response, or the error
/// returned by the service. In both cases the raw HTTP response is kept for
/// diagnostics.
///
/// # Example
/// ```
/// # use sdk_runtime::response::Response;
/// # use sdk_runtime::http::HttpResponse;
/// let response = Response::success("value", HttpResponse::new(http::StatusCode::OK));
/// assert!(response.is_success());
/// assert_eq!(response.value(), Some(&"value"));
/// ```
#[derive(Debug)]
pub struct Response<T> {
    outcome: std::result::Result<T, Error>,
    http_response: HttpResponse,
}

impl<T> Response<T> {
    pub fn success(value: T, http_response: HttpResponse) -> Self {
        Self {
            outcome: Ok(value),
            http_response,
        }
    }

    pub fn failure(error: Error, http_response: HttpResponse) -> Self {
        Self {
            outcome: Err(error),
            http_response,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn exception(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    pub fn http_response(&self) -> &HttpResponse {
        &self.http_response
    }

    /// Returns the value, or the error returned by the service.
    pub fn into_result(self) -> crate::Result<T> {
        self.outcome
    }

    pub fn into_parts(self) -> (std::result::Result<T, Error>, HttpResponse) {
        (self.outcome, self.http_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use http::StatusCode;

    #[test]
    fn success() {
        let response = Response::success(42, HttpResponse::new(StatusCode::OK));
        assert!(response.is_success());
        assert_eq!(response.value(), Some(&42));
        assert!(response.exception().is_none());
        assert_eq!(response.http_response().status(), StatusCode::OK);
        assert!(matches!(response.into_result(), Ok(42)));
    }

    #[test]
    fn failure() {
        let response = Response::<i32>::failure(
            Error::service(ServiceError::new(503)),
            HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE),
        );
        assert!(!response.is_success());
        assert!(response.value().is_none());
        assert_eq!(
            response.exception().and_then(Error::http_status_code),
            Some(503)
        );
        let (outcome, http_response) = response.into_parts();
        assert!(outcome.is_err());
        assert_eq!(http_response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
