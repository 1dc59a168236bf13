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

//! Credentials and request signing primitives for the SDK runtime.
//!
//! This crate contains the types used to describe the identity of the caller
//! ([credentials::Credentials]), the trait used to resolve those credentials
//! at request time ([credentials::CredentialsProvider]), and the functions to
//! compute [Signature Version 4] signatures over HTTP requests.
//!
//! The request execution pipeline in `sdk-runtime` consumes these types. Most
//! applications only need to pick a credentials provider.
//!
//! [Signature Version 4]: https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_sigv.html

pub mod errors;

/// Types and functions to work with credentials.
pub mod credentials;

/// Compute Signature Version 4 signatures over HTTP requests.
pub mod sigv4;

/// A `Result` alias where the `Err` case is `sdk_auth::errors::CredentialsError`.
pub type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;
