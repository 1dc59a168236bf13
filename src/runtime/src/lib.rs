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

//! Request execution runtime for service SDKs.
//!
//! This crate runs the requests created by service clients. It prepares,
//! signs and sends each request, retries failed attempts, and interprets the
//! responses. Service clients create a [client::HttpPipelineClient] and call
//! [execute][client::HttpPipelineClient::execute] for each operation.
//!
//! Retries are controlled by a [retry policy][retry_policy::RetryPolicy],
//! and limited by a [retry capacity pool][retry_capacity::RetryCapacity]
//! shared by all the calls made through one client.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
pub type Result<T> = std::result::Result<T, crate::error::Error>;

pub use error::Error;

pub mod backoff_strategy;
pub mod client;
pub mod client_config;
pub mod content;
pub mod context;
pub mod dependencies;

/// The core error types.
pub mod error;

pub mod handler;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod progress;

/// The service request, as built by the service clients.
pub mod request;

pub mod request_config;

/// The interpreted outcome of one attempt.
pub mod response;

pub mod response_handler;
pub mod retry_capacity;
pub mod retry_condition;
pub mod retry_policy;
pub mod retry_policy_context;
pub mod signer;
pub mod stages;
pub mod transport;
