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

//! Compute the delay before the next attempt.
//!
//! Retrying immediately rarely helps, the service may need time to recover.
//! The strategies in this module implement [exponential backoff] with
//! different forms of jitter. The exponential ceiling for the `n`-th retry is
//! `min(base_delay * 2^n, max_backoff)`.
//!
//! [exponential backoff]: https://en.wikipedia.org/wiki/Exponential_backoff

use crate::retry_policy_context::RetryPolicyContext;
use std::time::Duration;

/// The base delay used by [SdkDefaultBackoff] for most errors.
pub const BASE_DELAY: Duration = Duration::from_millis(100);

/// The base delay used by [SdkDefaultBackoff] for throttling errors.
pub const THROTTLED_BASE_DELAY: Duration = Duration::from_millis(500);

/// The maximum delay used by [SdkDefaultBackoff].
pub const MAX_BACKOFF: Duration = Duration::from_secs(20);

// 2^30 times any reasonable base delay saturates the ceiling.
const MAX_SHIFT: u32 = 30;

/// The error type for backoff strategy creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the base delay ({0:?}) must be greater than zero")]
    InvalidBaseDelay(Duration),
    #[error("the maximum backoff ({maximum:?}) must be at least the base delay ({base:?})")]
    EmptyRange { base: Duration, maximum: Duration },
}

/// Defines the trait implemented by all backoff strategies.
pub trait BackoffStrategy: Send + Sync + std::fmt::Debug {
    /// Returns the delay before the next retry.
    ///
    /// The context always describes a failed attempt,
    /// [retries_attempted()][RetryPolicyContext::retries_attempted] is `0`
    /// after the first attempt fails.
    fn delay_before_next_retry(&self, context: &RetryPolicyContext<'_>) -> Duration;
}

fn exponential_ceiling(base: Duration, maximum: Duration, retries: u32) -> Duration {
    base.checked_mul(1_u32 << retries.min(MAX_SHIFT))
        .map_or(maximum, |d| d.min(maximum))
}

fn validate(base: Duration, maximum: Duration) -> Result<(), Error> {
    if base.is_zero() {
        return Err(Error::InvalidBaseDelay(base));
    }
    if maximum < base {
        return Err(Error::EmptyRange { base, maximum });
    }
    Ok(())
}

/// Waits the same amount of time before every retry.
#[derive(Clone, Debug)]
pub struct FixedDelayBackoff {
    delay: Duration,
}

impl FixedDelayBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackoffStrategy for FixedDelayBackoff {
    fn delay_before_next_retry(&self, _context: &RetryPolicyContext<'_>) -> Duration {
        self.delay
    }
}

/// Picks a delay uniformly between zero and the exponential ceiling.
#[derive(Clone, Debug)]
pub struct FullJitterBackoff {
    base_delay: Duration,
    max_backoff: Duration,
}

impl FullJitterBackoff {
    /// Creates a new strategy.
    ///
    /// # Example
    /// ```
    /// # use sdk_runtime::backoff_strategy::*;
    /// use std::time::Duration;
    /// let backoff = FullJitterBackoff::new(Duration::from_millis(50), Duration::from_secs(5))?;
    /// # Ok::<(), Error>(())
    /// ```
    pub fn new(base_delay: Duration, max_backoff: Duration) -> Result<Self, Error> {
        validate(base_delay, max_backoff)?;
        Ok(Self {
            base_delay,
            max_backoff,
        })
    }

    fn delay_with_rng(&self, retries: u32, rng: &mut impl rand::Rng) -> Duration {
        let ceiling = exponential_ceiling(self.base_delay, self.max_backoff, retries);
        rng.random_range(Duration::ZERO..=ceiling)
    }
}

impl BackoffStrategy for FullJitterBackoff {
    fn delay_before_next_retry(&self, context: &RetryPolicyContext<'_>) -> Duration {
        self.delay_with_rng(context.retries_attempted(), &mut rand::rng())
    }
}

/// Waits at least half the exponential ceiling, plus a random amount up to
/// the other half.
#[derive(Clone, Debug)]
pub struct EqualJitterBackoff {
    base_delay: Duration,
    max_backoff: Duration,
}

impl EqualJitterBackoff {
    pub fn new(base_delay: Duration, max_backoff: Duration) -> Result<Self, Error> {
        validate(base_delay, max_backoff)?;
        Ok(Self {
            base_delay,
            max_backoff,
        })
    }

    fn delay_with_rng(&self, retries: u32, rng: &mut impl rand::Rng) -> Duration {
        let half = exponential_ceiling(self.base_delay, self.max_backoff, retries) / 2;
        half + rng.random_range(Duration::ZERO..=half)
    }
}

impl BackoffStrategy for EqualJitterBackoff {
    fn delay_before_next_retry(&self, context: &RetryPolicyContext<'_>) -> Duration {
        self.delay_with_rng(context.retries_attempted(), &mut rand::rng())
    }
}

/// The default backoff strategy.
///
/// Uses [FullJitterBackoff] with a 100ms base delay for most errors, and
/// [EqualJitterBackoff] with a 500ms base delay for throttling errors. Both
/// are capped at 20 seconds.
#[derive(Clone, Debug)]
pub struct SdkDefaultBackoff {
    standard: FullJitterBackoff,
    throttled: EqualJitterBackoff,
}

impl Default for SdkDefaultBackoff {
    fn default() -> Self {
        Self {
            standard: FullJitterBackoff {
                base_delay: BASE_DELAY,
                max_backoff: MAX_BACKOFF,
            },
            throttled: EqualJitterBackoff {
                base_delay: THROTTLED_BASE_DELAY,
                max_backoff: MAX_BACKOFF,
            },
        }
    }
}

impl BackoffStrategy for SdkDefaultBackoff {
    fn delay_before_next_retry(&self, context: &RetryPolicyContext<'_>) -> Duration {
        if context.exception().is_throttling() {
            self.throttled.delay_before_next_retry(context)
        } else {
            self.standard.delay_before_next_retry(context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error as SdkError, ServiceError};
    use crate::request::Request;
    use http::Method;
    use test_case::test_case;

    struct MockRng(u64);

    impl rand::RngCore for MockRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }
        fn next_u64(&mut self) -> u64 {
            self.0
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            rand::rand_core::impls::fill_bytes_via_next(self, dst)
        }
    }

    const MS: fn(u64) -> Duration = Duration::from_millis;

    #[test]
    fn build_errors() {
        let b = FullJitterBackoff::new(Duration::ZERO, MS(100));
        assert!(matches!(b, Err(Error::InvalidBaseDelay(_))), "{b:?}");
        let b = EqualJitterBackoff::new(MS(200), MS(100));
        assert!(matches!(b, Err(Error::EmptyRange { .. })), "{b:?}");
        let b = EqualJitterBackoff::new(MS(100), MS(100));
        assert!(b.is_ok(), "{b:?}");
    }

    #[test_case(0, MS(100))]
    #[test_case(1, MS(200))]
    #[test_case(3, MS(800))]
    #[test_case(8, MS(20_000))]
    #[test_case(31, MS(20_000))]
    #[test_case(u32::MAX, MS(20_000))]
    fn ceiling(retries: u32, want: Duration) {
        assert_eq!(exponential_ceiling(BASE_DELAY, MAX_BACKOFF, retries), want);
    }

    #[test]
    fn ceiling_overflow() {
        let got = exponential_ceiling(Duration::from_secs(u64::MAX / 2), Duration::MAX, 30);
        assert_eq!(got, Duration::MAX);
    }

    #[test]
    fn full_jitter() -> anyhow::Result<()> {
        let b = FullJitterBackoff::new(MS(100), MS(1000))?;
        assert_eq!(b.delay_with_rng(0, &mut MockRng(1)), Duration::ZERO);
        assert_eq!(b.delay_with_rng(2, &mut MockRng(u64::MAX)), MS(400));
        assert_eq!(b.delay_with_rng(10, &mut MockRng(u64::MAX)), MS(1000));
        Ok(())
    }

    #[test]
    fn equal_jitter() -> anyhow::Result<()> {
        let b = EqualJitterBackoff::new(MS(100), MS(1000))?;
        assert_eq!(b.delay_with_rng(0, &mut MockRng(1)), MS(50));
        assert_eq!(b.delay_with_rng(2, &mut MockRng(1)), MS(200));
        assert_eq!(b.delay_with_rng(2, &mut MockRng(u64::MAX)), MS(400));
        Ok(())
    }

    #[test]
    fn fixed() -> anyhow::Result<()> {
        let request = Request::new("svc", Method::GET, "https://example.com".parse()?);
        let error = SdkError::io("reset");
        let b = FixedDelayBackoff::new(MS(250));
        for n in 0..5 {
            let ctx = RetryPolicyContext::new(&request, &error).set_retries_attempted(n);
            assert_eq!(b.delay_before_next_retry(&ctx), MS(250));
        }
        Ok(())
    }

    #[test]
    fn sdk_default_bounds() -> anyhow::Result<()> {
        let request = Request::new("svc", Method::GET, "https://example.com".parse()?);
        let b = SdkDefaultBackoff::default();

        let error = SdkError::io("reset");
        for n in 0..10 {
            let ctx = RetryPolicyContext::new(&request, &error).set_retries_attempted(n);
            let got = b.delay_before_next_retry(&ctx);
            assert!(got <= exponential_ceiling(BASE_DELAY, MAX_BACKOFF, n), "{n} {got:?}");
        }

        let error = SdkError::service(ServiceError::new(429));
        for n in 0..10 {
            let ctx = RetryPolicyContext::new(&request, &error).set_retries_attempted(n);
            let got = b.delay_before_next_retry(&ctx);
            let ceiling = exponential_ceiling(THROTTLED_BASE_DELAY, MAX_BACKOFF, n);
            assert!(got >= ceiling / 2 && got <= ceiling, "{n} {got:?}");
        }
        Ok(())
    }
}
