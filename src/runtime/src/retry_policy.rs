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

//! Defines the retry policy trait and some common implementations.
//!
//! The retry engine consults the policy after every failed attempt, once it
//! has secured the retry capacity needed for another attempt. The policy
//! decides if the request is retried and how long to wait before the retry.
//!
//! # Example
//! ```
//! # use sdk_runtime::retry_policy::*;
//! # use sdk_runtime::retry_condition::*;
//! # use sdk_runtime::backoff_strategy::FixedDelayBackoff;
//! use std::time::Duration;
//! let policy = RetryPolicyBuilder::new()
//!     .with_retry_condition(RetryOnStatusCodes::new([503]))
//!     .with_backoff_strategy(FixedDelayBackoff::new(Duration::from_millis(10)))
//!     .with_max_error_retry(5)
//!     .build();
//! assert_eq!(policy.max_error_retry(), 5);
//! ```

use crate::backoff_strategy::{BackoffStrategy, SdkDefaultBackoff};
use crate::retry_condition::{RetryCondition, SdkDefaultRetryCondition};
use crate::retry_policy_context::RetryPolicyContext;
use std::sync::Arc;
use std::time::Duration;

/// The number of retries allowed by [default_retry_policy].
pub const DEFAULT_MAX_ERROR_RETRY: u32 = 3;

/// Controls the retry loop behavior.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Returns true if the failed attempt described by `context` should be
    /// retried.
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool;

    /// The delay before the next attempt.
    ///
    /// Only called if [should_retry][Self::should_retry] returns true for
    /// the same context.
    fn compute_delay_before_next_retry(&self, context: &RetryPolicyContext<'_>) -> Duration;
}

pub type SharedRetryPolicy = Arc<dyn RetryPolicy>;

/// A helper type to use [RetryPolicy] in client options.
#[derive(Clone, Debug)]
pub struct RetryPolicyArg(pub(crate) SharedRetryPolicy);

impl<T: RetryPolicy + 'static> std::convert::From<T> for RetryPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<SharedRetryPolicy> for RetryPolicyArg {
    fn from(value: SharedRetryPolicy) -> Self {
        Self(value)
    }
}

/// Retries up to a fixed number of times, while a condition holds.
#[derive(Clone, Debug)]
pub struct SimpleRetryPolicy {
    retry_condition: Arc<dyn RetryCondition>,
    backoff_strategy: Arc<dyn BackoffStrategy>,
    max_error_retry: u32,
}

impl SimpleRetryPolicy {
    pub fn max_error_retry(&self) -> u32 {
        self.max_error_retry
    }
}

impl RetryPolicy for SimpleRetryPolicy {
    fn should_retry(&self, context: &RetryPolicyContext<'_>) -> bool {
        context.retries_attempted() < self.max_error_retry
            && self.retry_condition.should_retry(context)
    }

    fn compute_delay_before_next_retry(&self, context: &RetryPolicyContext<'_>) -> Duration {
        self.backoff_strategy.delay_before_next_retry(context)
    }
}

/// Creates [SimpleRetryPolicy] instances.
///
/// Unset fields use the defaults: [SdkDefaultRetryCondition],
/// [SdkDefaultBackoff], and [DEFAULT_MAX_ERROR_RETRY].
#[derive(Clone, Debug)]
pub struct RetryPolicyBuilder {
    retry_condition: Arc<dyn RetryCondition>,
    backoff_strategy: Arc<dyn BackoffStrategy>,
    max_error_retry: u32,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self {
            retry_condition: Arc::new(SdkDefaultRetryCondition),
            backoff_strategy: Arc::new(SdkDefaultBackoff::default()),
            max_error_retry: DEFAULT_MAX_ERROR_RETRY,
        }
    }

    pub fn with_retry_condition<C: RetryCondition + 'static>(mut self, v: C) -> Self {
        self.retry_condition = Arc::new(v);
        self
    }

    pub fn with_backoff_strategy<B: BackoffStrategy + 'static>(mut self, v: B) -> Self {
        self.backoff_strategy = Arc::new(v);
        self
    }

    pub fn with_max_error_retry(mut self, v: u32) -> Self {
        self.max_error_retry = v;
        self
    }

    pub fn build(self) -> SimpleRetryPolicy {
        SimpleRetryPolicy {
            retry_condition: self.retry_condition,
            backoff_strategy: self.backoff_strategy,
            max_error_retry: self.max_error_retry,
        }
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The retry policy used when the client config does not set one.
pub fn default_retry_policy() -> SimpleRetryPolicy {
    RetryPolicyBuilder::new().build()
}

/// Never retries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRetryPolicy;

impl RetryPolicy for NoRetryPolicy {
    fn should_retry(&self, _context: &RetryPolicyContext<'_>) -> bool {
        false
    }

    fn compute_delay_before_next_retry(&self, _context: &RetryPolicyContext<'_>) -> Duration {
        Duration::ZERO
    }
}
