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

//! Interpret HTTP responses.
//!
//! Successful (2xx) responses go to a [HttpResponseHandler], everything else
//! goes to an [ErrorResponseHandler]. The generated service code provides
//! handlers for its wire format, this module includes handlers for JSON.

use crate::Result;
use crate::error::{Error, ErrorType, ServiceError};
use crate::http::HttpResponse;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Converts a successful response into `T`.
pub trait HttpResponseHandler<T>: Send + Sync {
    fn handle(&self, response: &HttpResponse) -> Result<T>;
}

/// Converts an error response into an [Error].
pub trait ErrorResponseHandler: Send + Sync {
    fn handle(&self, response: &HttpResponse) -> Error;
}

pub type SharedResponseHandler<T> = Arc<dyn HttpResponseHandler<T>>;
pub type SharedErrorResponseHandler = Arc<dyn ErrorResponseHandler>;

const REQUEST_ID_HEADERS: [&str; 2] = ["x-amzn-requestid", "x-amz-request-id"];
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Deserializes the body as JSON. An empty body is treated as `{}`.
#[derive(Debug)]
pub struct JsonResponseHandler<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> JsonResponseHandler<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for JsonResponseHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> HttpResponseHandler<T> for JsonResponseHandler<T> {
    fn handle(&self, response: &HttpResponse) -> Result<T> {
        let body = response.body();
        let body: &[u8] = if body.is_empty() { b"{}" } else { body };
        serde_json::from_slice(body).map_err(Error::deser)
    }
}

/// Returns the body as a string.
#[derive(Clone, Debug, Default)]
pub struct StringResponseHandler;

impl HttpResponseHandler<String> for StringResponseHandler {
    fn handle(&self, response: &HttpResponse) -> Result<String> {
        String::from_utf8(response.body().to_vec()).map_err(Error::deser)
    }
}

/// Extracts the error details from a JSON error response.
///
/// The error code comes from the `__type` or `code` fields, or from the
/// `x-amzn-ErrorType` header. Service-qualified codes such as
/// `com.example#ThrottlingException` are reduced to the unqualified name.
#[derive(Clone, Debug, Default)]
pub struct JsonErrorResponseHandler {
    service_name: Option<String>,
}

impl JsonErrorResponseHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_name<T: Into<String>>(mut self, v: T) -> Self {
        self.service_name = Some(v.into());
        self
    }
}

impl ErrorResponseHandler for JsonErrorResponseHandler {
    fn handle(&self, response: &HttpResponse) -> Error {
        let body = serde_json::from_slice::<serde_json::Value>(response.body())
            .unwrap_or(serde_json::Value::Null);
        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| body.get(*n).and_then(serde_json::Value::as_str))
                .map(str::to_string)
        };

        let status = response.status().as_u16();
        let mut details = ServiceError::new(status).set_error_type(if status >= 500 {
            ErrorType::Service
        } else {
            ErrorType::Client
        });
        let code = field(&["__type", "code", "Code"])
            .or_else(|| response.header(ERROR_TYPE_HEADER).map(str::to_string));
        if let Some(code) = code {
            details = details.set_error_code(sanitize_error_code(&code));
        }
        if let Some(message) = field(&["message", "Message", "errorMessage"]) {
            details = details.set_message(message);
        }
        if let Some(id) = REQUEST_ID_HEADERS.iter().find_map(|h| response.header(*h)) {
            details = details.set_request_id(id);
        }
        if let Some(name) = &self.service_name {
            details = details.set_service_name(name.clone());
        }
        Error::service_with_http_metadata(details, response.headers().clone())
    }
}

fn sanitize_error_code(code: &str) -> &str {
    let code = code.split(':').next().unwrap_or(code);
    code.rsplit('#').next().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use serde_json::json;
    use test_case::test_case;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Thing {
        name: String,
        #[serde(default)]
        size: u32,
    }

    #[test]
    fn json_success() -> anyhow::Result<()> {
        let response =
            HttpResponse::new(StatusCode::OK).set_body(json!({"name": "abc", "size": 3}).to_string());
        let got = JsonResponseHandler::<Thing>::new().handle(&response)?;
        assert_eq!(
            got,
            Thing {
                name: "abc".into(),
                size: 3
            }
        );
        Ok(())
    }

    #[test]
    fn json_empty_body() -> anyhow::Result<()> {
        let response = HttpResponse::new(StatusCode::OK);
        let got = JsonResponseHandler::<serde_json::Value>::new().handle(&response)?;
        assert_eq!(got, json!({}));
        Ok(())
    }

    #[test]
    fn json_bad_body() {
        let response = HttpResponse::new(StatusCode::OK).set_body("not json");
        let err = JsonResponseHandler::<Thing>::new()
            .handle(&response)
            .unwrap_err();
        assert!(err.is_deserialization(), "{err:?}");
    }

    #[test]
    fn string_handler() -> anyhow::Result<()> {
        let response = HttpResponse::new(StatusCode::OK).set_body("hello");
        assert_eq!(StringResponseHandler.handle(&response)?, "hello");
        Ok(())
    }

    #[test]
    fn json_error() {
        let mut headers = HeaderMap::new();
        headers.insert("x-amzn-RequestId", HeaderValue::from_static("req-1"));
        let response = HttpResponse::new(StatusCode::BAD_REQUEST)
            .set_headers(headers)
            .set_body(
                json!({"__type": "com.example#ThrottlingException", "message": "slow down"})
                    .to_string(),
            );
        let err = JsonErrorResponseHandler::new()
            .with_service_name("example")
            .handle(&response);
        let details = err.service_error();
        assert_eq!(err.http_status_code(), Some(400));
        assert_eq!(err.error_code(), Some("ThrottlingException"));
        assert_eq!(err.request_id(), Some("req-1"));
        assert_eq!(
            details.and_then(|d| d.message.as_deref()),
            Some("slow down")
        );
        assert_eq!(details.map(|d| d.error_type), Some(ErrorType::Client));
        assert_eq!(
            details.and_then(|d| d.service_name.as_deref()),
            Some("example")
        );
        assert!(err.is_throttling(), "{err:?}");
        assert!(err.http_headers().is_some(), "{err:?}");
    }

    #[test]
    fn error_code_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ERROR_TYPE_HEADER,
            HeaderValue::from_static("RequestTimeTooSkewed:http://internal"),
        );
        let response = HttpResponse::new(StatusCode::FORBIDDEN)
            .set_headers(headers)
            .set_body("<html>not json</html>");
        let err = JsonErrorResponseHandler::new().handle(&response);
        assert_eq!(err.error_code(), Some("RequestTimeTooSkewed"));
        assert!(err.is_clock_skew(), "{err:?}");
    }

    #[test]
    fn server_error_without_details() {
        let response = HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE);
        let err = JsonErrorResponseHandler::new().handle(&response);
        assert_eq!(err.http_status_code(), Some(503));
        assert_eq!(err.error_code(), None);
        assert_eq!(
            err.service_error().map(|d| d.error_type),
            Some(ErrorType::Service)
        );
    }

    #[test_case("ThrottlingException", "ThrottlingException")]
    #[test_case("com.example.v1#SlowDown", "SlowDown")]
    #[test_case("AccessDenied:http://example.com/", "AccessDenied")]
    fn sanitize(input: &str, want: &str) {
        assert_eq!(sanitize_error_code(input), want);
    }
}
