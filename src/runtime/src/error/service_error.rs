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

/// The error codes services use to report throttling.
pub const THROTTLING_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "ProvisionedThroughputExceededException",
    "SlowDown",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "RequestThrottled",
    "RequestThrottledException",
    "EC2ThrottledException",
    "PriorRequestNotComplete",
];

/// The error codes services use when the request signature time is too far
/// from the server time.
pub const CLOCK_SKEW_ERROR_CODES: &[&str] = &[
    "RequestTimeTooSkewed",
    "RequestExpired",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "AuthFailure",
    "RequestInTheFuture",
];

/// The HTTP status code used by services to report throttling.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Who the service blames for the error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorType {
    Client,
    Service,
    #[default]
    Unknown,
}

/// The error details returned by a service.
///
/// Error response handlers create these from the HTTP response. All the fields
/// are optional except the HTTP status code, services do not always return a
/// machine readable error code.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ServiceError {
    /// The HTTP status code.
    pub status_code: u16,
    /// The machine readable error code, e.g. `ThrottlingException`.
    pub error_code: Option<String>,
    /// The human readable error message.
    pub message: Option<String>,
    /// The request id assigned by the service, useful when contacting support.
    pub request_id: Option<String>,
    pub error_type: ErrorType,
    pub service_name: Option<String>,
}

impl ServiceError {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Default::default()
        }
    }

    pub fn set_error_code<T: Into<String>>(mut self, v: T) -> Self {
        self.error_code = Some(v.into());
        self
    }

    pub fn set_message<T: Into<String>>(mut self, v: T) -> Self {
        self.message = Some(v.into());
        self
    }

    pub fn set_request_id<T: Into<String>>(mut self, v: T) -> Self {
        self.request_id = Some(v.into());
        self
    }

    pub fn set_error_type(mut self, v: ErrorType) -> Self {
        self.error_type = v;
        self
    }

    pub fn set_service_name<T: Into<String>>(mut self, v: T) -> Self {
        self.service_name = Some(v.into());
        self
    }

    /// Returns true if the service is asking the client to slow down.
    pub fn is_throttling(&self) -> bool {
        self.status_code == TOO_MANY_REQUESTS
            || self
                .error_code
                .as_deref()
                .is_some_and(|c| THROTTLING_ERROR_CODES.contains(&c))
    }

    /// Returns true if the service rejected the request signature time.
    pub fn is_clock_skew(&self) -> bool {
        self.error_code
            .as_deref()
            .is_some_and(|c| CLOCK_SKEW_ERROR_CODES.contains(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(400, Some("ThrottlingException"), true)]
    #[test_case(503, Some("SlowDown"), true)]
    #[test_case(429, None, true)]
    #[test_case(400, Some("ValidationException"), false)]
    #[test_case(500, None, false)]
    fn throttling(status: u16, code: Option<&str>, want: bool) {
        let mut error = ServiceError::new(status);
        error.error_code = code.map(str::to_string);
        assert_eq!(error.is_throttling(), want, "{error:?}");
    }

    #[test_case(Some("RequestTimeTooSkewed"), true)]
    #[test_case(Some("SignatureDoesNotMatch"), true)]
    #[test_case(Some("AccessDenied"), false)]
    #[test_case(None, false)]
    fn clock_skew(code: Option<&str>, want: bool) {
        let mut error = ServiceError::new(403);
        error.error_code = code.map(str::to_string);
        assert_eq!(error.is_clock_skew(), want, "{error:?}");
    }

    #[test]
    fn setters() {
        let error = ServiceError::new(404)
            .set_error_code("NotFound")
            .set_message("no such thing")
            .set_request_id("req-123")
            .set_error_type(ErrorType::Client)
            .set_service_name("test-service");
        assert_eq!(error.status_code, 404);
        assert_eq!(error.error_code.as_deref(), Some("NotFound"));
        assert_eq!(error.message.as_deref(), Some("no such thing"));
        assert_eq!(error.request_id.as_deref(), Some("req-123"));
        assert_eq!(error.error_type, ErrorType::Client);
        assert_eq!(error.service_name.as_deref(), Some("test-service"));
    }
}
