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

//! Decide if a failed attempt should be retried.
//!
//! A [RetryCondition] only looks at the failure. Limits on the number of
//! attempts and the delay between attempts are the responsibility of the
//! [RetryPolicy][crate::retry_policy::RetryPolicy].
//!
//! # Example
//! ```
//! # use sdk_runtime::retry_condition::*;
//! let condition = SdkDefaultRetryCondition
//!     .or(RetryOnErrorCodes::new(["TransactionInProgressException"]))
//!     .and(MaxNumberOfRetries::new(5));
//! ```

use crate::retry_policy_context::RetryPolicyContext;
use std::collections::HashSet;
use std::sync::Arc;

/// The status codes retried by [SdkDefaultRetryCondition].
pub const RETRYABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Determines if the failure in the context is retryable.
pub trait RetryCondition: Send + Sync + std::fmt::Debug {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool;
}

/// Combinators for [RetryCondition].
pub trait RetryConditionExt: RetryCondition + Sized {
    /// Retries only if both conditions allow it.
    fn and<C: RetryCondition>(self, other: C) -> And<Self, C> {
        And(self, other)
    }

    /// Retries if either condition allows it.
    fn or<C: RetryCondition>(self, other: C) -> Or<Self, C> {
        Or(self, other)
    }
}

impl<T: RetryCondition> RetryConditionExt for T {}

impl<T: RetryCondition + ?Sized> RetryCondition for Arc<T> {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        (**self).should_retry(context)
    }
}

/// Retries transport failures, attempt timeouts, throttling, clock skew, and
/// the usual transient server errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct SdkDefaultRetryCondition;

impl RetryCondition for SdkDefaultRetryCondition {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        let error = context.exception();
        if error.is_io() || error.is_timeout() {
            return true;
        }
        if error.is_throttling() || error.is_clock_skew() {
            return true;
        }
        context
            .http_status_code()
            .is_some_and(|s| RETRYABLE_STATUS_CODES.contains(&s))
    }
}

/// Retries if the last response had one of the given status codes.
#[derive(Clone, Debug)]
pub struct RetryOnStatusCodes(HashSet<u16>);

impl RetryOnStatusCodes {
    pub fn new<I: IntoIterator<Item = u16>>(codes: I) -> Self {
        Self(codes.into_iter().collect())
    }
}

impl RetryCondition for RetryOnStatusCodes {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        context
            .http_status_code()
            .is_some_and(|s| self.0.contains(&s))
    }
}

/// Retries if the service returned one of the given error codes.
#[derive(Clone, Debug)]
pub struct RetryOnErrorCodes(HashSet<String>);

impl RetryOnErrorCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codes.into_iter().map(Into::into).collect())
    }
}

impl RetryCondition for RetryOnErrorCodes {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        context
            .exception()
            .error_code()
            .is_some_and(|c| self.0.contains(c))
    }
}

/// Retries any failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryOnAnyError;

impl RetryCondition for RetryOnAnyError {
    fn should_retry(&self, _context: &RetryPolicyContext<'_>) -> bool {
        true
    }
}

/// Never retries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverRetry;

impl RetryCondition for NeverRetry {
    fn should_retry(&self, _context: &RetryPolicyContext<'_>) -> bool {
        false
    }
}

/// Retries while fewer than `maximum` retries were attempted.
#[derive(Clone, Copy, Debug)]
pub struct MaxNumberOfRetries {
    maximum: u32,
}

impl MaxNumberOfRetries {
    pub fn new(maximum: u32) -> Self {
        Self { maximum }
    }
}

impl RetryCondition for MaxNumberOfRetries {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        context.retries_attempted() < self.maximum
    }
}

/// See [RetryConditionExt::and].
#[derive(Clone, Debug)]
pub struct And<A, B>(A, B);

impl<A: RetryCondition, B: RetryCondition> RetryCondition for And<A, B> {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        self.0.should_retry(context) && self.1.should_retry(context)
    }
}

/// See [RetryConditionExt::or].
#[derive(Clone, Debug)]
pub struct Or<A, B>(A, B);

impl<A: RetryCondition, B: RetryCondition> RetryCondition for Or<A, B> {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        self.0.should_retry(context) || self.1.should_retry(context)
    }
}
