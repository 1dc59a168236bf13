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

//! HTTP transports for the SDK runtime, implemented with [reqwest].
//!
//! [ReqwestHttpClient] implements the request/response transport used by
//! [execute][runtime::client::HttpPipelineClient::execute].
//! [ReqwestAsyncHttpClient] implements the callback based transport used by
//! [execute_async][runtime::client::HttpPipelineClient::execute_async].
//!
//! ```no_run
//! # use sdk_http_client::ReqwestHttpClient;
//! # use runtime::client::HttpPipelineClient;
//! # use runtime::client_config::ClientConfig;
//! # use std::sync::Arc;
//! # fn sample() -> anyhow::Result<()> {
//! let client = HttpPipelineClient::builder(ClientConfig::new())
//!     .with_http_client(Arc::new(ReqwestHttpClient::new()))
//!     .build()?;
//! # Ok(()) }
//! ```

mod async_client;
mod client;
mod errors;

pub use async_client::ReqwestAsyncHttpClient;
pub use client::ReqwestHttpClient;
