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

use super::ServiceError;
use auth::errors::CredentialsError;
use http::HeaderMap;
use std::error::Error as StdError;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// The core error returned by the request execution pipeline.
///
/// The pipeline reports errors from multiple sources. The service may return
/// an error, the transport may be unable to send the request, the request may
/// time out, the content stream may not support a retry, or the call may be
/// cancelled.
///
/// Most applications will just return the error or log it. Applications that
/// need to interrogate the error can use the predicates and accessors in this
/// type, or query the error [source][std::error::Error::source].
///
/// The retry engine never synthesizes errors: the error returned to the caller
/// is always the error from the last attempt.
///
/// # Example
/// ```
/// use sdk_runtime::error::Error;
/// match example_function() {
///     Err(e) if e.is_throttling() => { println!("slow down {e}"); },
///     Err(e) if e.is_io() => { println!("network problems {e}"); },
///     Err(e) => { println!("some other error {e}"); },
///     Ok(_) => { println!("success, how boring"); },
/// }
///
/// fn example_function() -> Result<String, Error> {
///     # use sdk_runtime::error::ServiceError;
///     # Err(Error::service(ServiceError::new(429)))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error with the information returned by the service.
    ///
    /// # Example
    /// ```
    /// use sdk_runtime::error::{Error, ServiceError};
    /// let details = ServiceError::new(400).set_error_code("ValidationException");
    /// let error = Error::service(details.clone());
    /// assert_eq!(error.service_error(), Some(&details));
    /// assert_eq!(error.http_status_code(), Some(400));
    /// ```
    pub fn service(details: ServiceError) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(ServiceDetails {
                details,
                headers: None,
            })),
            source: None,
        }
    }

    /// Creates a service error that also captures the response headers.
    pub fn service_with_http_metadata(details: ServiceError, headers: HeaderMap) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(ServiceDetails {
                details,
                headers: Some(headers),
            })),
            source: None,
        }
    }

    /// Creates an error representing a transport failure.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use sdk_runtime::error::Error;
    /// let error = Error::io("connection reset by peer");
    /// assert!(error.is_io());
    /// assert!(error.source().is_some());
    /// ```
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Io,
            source: Some(source.into()),
        }
    }

    /// The request could not be sent, or the response could not be received.
    ///
    /// These errors are detected by the client. The request may or may not
    /// have reached the service. The retry engine consults the retry policy
    /// for them, the default policy retries them.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error representing a timeout.
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// The attempt, or the whole call, could not complete in time.
    ///
    /// Attempt timeouts are retry-eligible, the retry engine treats them as
    /// transport failures. A whole-call timeout is always terminal.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Creates an error representing a content stream that cannot be rewound.
    pub fn reset<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Reset,
            source: Some(source.into()),
        }
    }

    /// The request body could not be rewound to send it again.
    ///
    /// # Troubleshooting
    ///
    /// The content stream for the request does not support mark and reset, or
    /// more than the read limit was consumed since the mark. Use a rewindable
    /// content stream, or increase the read limit in the request config.
    pub fn is_reset(&self) -> bool {
        matches!(self.kind, ErrorKind::Reset)
    }

    /// Creates an error representing a cancelled call.
    pub fn interrupted<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Interrupted,
            source: Some(source.into()),
        }
    }

    /// The call was cancelled before it completed.
    ///
    /// These errors are never retried.
    pub fn is_interrupted(&self) -> bool {
        matches!(self.kind, ErrorKind::Interrupted)
    }

    /// Creates an error representing a failure to resolve credentials.
    pub fn authentication(source: CredentialsError) -> Self {
        Self {
            kind: ErrorKind::Authentication,
            source: Some(source.into()),
        }
    }

    /// Could not resolve the credentials to sign the request.
    pub fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication)
    }

    /// Creates an error representing a problem producing the request.
    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            source: Some(source.into()),
        }
    }

    /// The request, or some part of it, could not be produced.
    ///
    /// This includes signing failures, which typically indicate that header
    /// values contain invalid characters.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// Creates an error representing a problem interpreting a response.
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The service returned a successful response that cannot be interpreted.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// A problem that does not fit any other category.
    pub fn other<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Other,
            source: Some(source.into()),
        }
    }

    /// The error details returned by the service, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match &self.kind {
            ErrorKind::Service(d) => Some(&d.details),
            _ => None,
        }
    }

    /// The HTTP status code, if the error was returned by the service.
    pub fn http_status_code(&self) -> Option<u16> {
        self.service_error().map(|d| d.status_code)
    }

    /// The HTTP headers of the error response, if available.
    pub fn http_headers(&self) -> Option<&HeaderMap> {
        match &self.kind {
            ErrorKind::Service(d) => d.headers.as_ref(),
            _ => None,
        }
    }

    /// The machine readable error code returned by the service, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.service_error().and_then(|d| d.error_code.as_deref())
    }

    /// The request id returned by the service, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.service_error().and_then(|d| d.request_id.as_deref())
    }

    /// The service is asking the client to slow down.
    ///
    /// Throttling errors do not consume retry capacity.
    pub fn is_throttling(&self) -> bool {
        self.service_error().is_some_and(ServiceError::is_throttling)
    }

    /// The service rejected the request because the client clock is off.
    pub fn is_clock_skew(&self) -> bool {
        self.service_error().is_some_and(ServiceError::is_clock_skew)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Service(d), _) => d.display(f),
            (ErrorKind::Io, Some(e)) => write!(f, "unable to execute HTTP request: {e}"),
            (ErrorKind::Timeout, Some(e)) => {
                write!(f, "the request exceeded its deadline: {e}")
            }
            (ErrorKind::Reset, Some(e)) => {
                write!(f, "cannot reset the request content stream: {e}")
            }
            (ErrorKind::Interrupted, Some(e)) => write!(f, "the request was interrupted: {e}"),
            (ErrorKind::Authentication, Some(e)) => {
                write!(f, "cannot resolve the credentials to sign the request: {e}")
            }
            (ErrorKind::Serialization, Some(e)) => write!(f, "cannot serialize the request: {e}"),
            (ErrorKind::Deserialization, Some(e)) => {
                write!(f, "cannot deserialize the response: {e}")
            }
            (ErrorKind::Other, Some(e)) => {
                write!(f, "an unclassified problem making a request: {e}")
            }
            (_, None) => write!(f, "{:?}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

/// The type of error held by an [Error] instance.
#[derive(Debug)]
enum ErrorKind {
    Service(Box<ServiceDetails>),
    Io,
    Timeout,
    Reset,
    Interrupted,
    Authentication,
    Serialization,
    Deserialization,
    /// A uncategorized error.
    Other,
}

#[derive(Debug)]
struct ServiceDetails {
    details: ServiceError,
    headers: Option<HeaderMap>,
}

impl ServiceDetails {
    fn display(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = &self.details;
        write!(f, "the service reports an error with HTTP status {}", d.status_code)?;
        if let Some(code) = &d.error_code {
            write!(f, ", error code {code}")?;
        }
        if let Some(message) = &d.message {
            write!(f, ", described as: {message}")?;
        }
        if let Some(id) = &d.request_id {
            write!(f, " (request id {id})")?;
        }
        Ok(())
    }
}
