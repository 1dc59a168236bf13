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

//! The stages of the request pipeline.
//!
//! [HttpPipelineClient][crate::client::HttpPipelineClient] chains them, from
//! the outermost to the innermost:
//!
//! * [AfterCallbackStage]: runs the `after_response` or `after_error`
//!   lifecycle hooks, once per call.
//! * [RetryableStage]: the retry loop.
//! * [LastResetInputStreamStage]: rewinds the request body after a failed
//!   attempt.
//! * [ApplyTransactionIdStage], [ApplyUserAgentStage],
//!   [MergeCustomHeadersStage], [MoveParametersToBodyStage],
//!   [SetContentLengthStage], [SigningStage]: prepare the request.
//! * [HttpRequestAdaptingStage]: converts the request for the transport.
//! * [MakeHttpRequestStage] or [MakeAsyncHttpRequestStage]: send it.
//! * [BeforeUnmarshallingCallbackStage], [HandleResponseStage],
//!   [AfterUnmarshallingCallbackStage]: interpret the response.

mod after_callback;
mod content_length;
mod handle_response;
mod http_request_adapting;
mod last_reset_input_stream;
mod make_async_http_request;
mod make_http_request;
mod merge_custom_headers;
mod move_parameters_to_body;
mod retryable;
mod signing;
mod transaction_id;
mod unmarshalling_callbacks;
mod user_agent;

pub use after_callback::AfterCallbackStage;
pub use content_length::SetContentLengthStage;
pub use handle_response::HandleResponseStage;
pub use http_request_adapting::HttpRequestAdaptingStage;
pub use last_reset_input_stream::LastResetInputStreamStage;
pub use make_async_http_request::MakeAsyncHttpRequestStage;
pub use make_http_request::MakeHttpRequestStage;
pub use merge_custom_headers::MergeCustomHeadersStage;
pub use move_parameters_to_body::MoveParametersToBodyStage;
pub use retryable::{RETRY_HEADER, RetryableStage};
pub use signing::SigningStage;
pub use transaction_id::{ApplyTransactionIdStage, INVOCATION_ID_HEADER};
pub use unmarshalling_callbacks::{AfterUnmarshallingCallbackStage, BeforeUnmarshallingCallbackStage};
pub use user_agent::ApplyUserAgentStage;
