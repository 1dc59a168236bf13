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

use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

/// Represents an error creating or using [Credentials].
///
/// Credentials providers may fail to produce credentials, for example because
/// the environment is missing the required variables, or because a remote
/// credentials endpoint is temporarily unavailable. The latter kind of errors
/// are retryable.
///
/// # Example
/// ```
/// # use sdk_auth::errors::CredentialsError;
/// let err = CredentialsError::from_msg(true, "simulated retryable error");
/// assert!(err.is_retryable());
/// assert!(format!("{err}").contains("simulated retryable error"));
/// ```
///
/// [Credentials]: crate::credentials::Credentials
#[derive(Clone, Debug)]
pub struct CredentialsError {
    /// If `true`, the operation that resulted in this error might succeed upon
    /// retry.
    is_retryable: bool,
    source: CredentialsErrorImpl,
}

#[derive(Clone, Debug)]
enum CredentialsErrorImpl {
    SimpleMessage(String),
    Source(Arc<dyn Error + Send + Sync>),
}

impl CredentialsError {
    /// Creates a new `CredentialsError` wrapping `source`.
    pub fn new<T: Error + Send + Sync + 'static>(is_retryable: bool, source: T) -> Self {
        CredentialsError {
            is_retryable,
            source: CredentialsErrorImpl::Source(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` from a message.
    pub fn from_msg<T: Into<String>>(is_retryable: bool, message: T) -> Self {
        CredentialsError {
            is_retryable,
            source: CredentialsErrorImpl::SimpleMessage(message.into()),
        }
    }

    /// Returns `true` if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }
}

impl Error for CredentialsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            CredentialsErrorImpl::SimpleMessage(_) => None,
            CredentialsErrorImpl::Source(source) => Some(source.as_ref()),
        }
    }
}

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let kind = if self.is_retryable {
            "a transient"
        } else {
            "a permanent"
        };
        match &self.source {
            CredentialsErrorImpl::SimpleMessage(message) => {
                write!(f, "cannot resolve credentials, {kind} error: {message}")
            }
            CredentialsErrorImpl::Source(source) => {
                write!(f, "cannot resolve credentials, {kind} error: {source}")
            }
        }
    }
}

/// Errors while computing a request signature.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum SigningError {
    #[error("the request URL has no host: {0}")]
    MissingHost(String),
    #[error("cannot create header value for {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("cannot initialize the signing key: {0}")]
    InvalidKey(String),
}
