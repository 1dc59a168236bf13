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

//! The retry capacity pool.
//!
//! A client shares one pool across all its calls. Retries of non-throttling
//! errors must acquire [THROTTLED_RETRY_COST] units from the pool before they
//! are attempted, and successful calls return capacity to the pool. When
//! a service is failing most calls, the pool drains and the client stops
//! retrying, which prevents retry storms. When the service recovers, the pool
//! refills as calls succeed.

use std::sync::atomic::{AtomicU32, Ordering};

/// The capacity consumed by each retry of a non-throttling error.
pub const THROTTLED_RETRY_COST: u32 = 5;

/// The number of retries the default pool can hold.
pub const THROTTLED_RETRIES: u32 = 100;

/// The capacity returned to the pool by a successful first attempt.
pub const NO_RETRY_INCREMENT: u32 = 1;

/// The default maximum capacity, enough for [THROTTLED_RETRIES] retries.
pub const DEFAULT_MAX_CAPACITY: u32 = THROTTLED_RETRY_COST * THROTTLED_RETRIES;

/// The error type for retry capacity creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the initial capacity ({initial}) should be less than or equal to the maximum ({maximum})")]
    InitialAboveMaximum { initial: u32, maximum: u32 },
}

/// A token-bucket-like counter with a single integer balance.
///
/// The balance is always in the `[0, max_capacity]` range. Both [acquire]
/// and [release] are atomic with respect to each other, the pool can be used
/// from many calls concurrently without external locks.
///
/// A disabled pool never denies capacity, and reports no available capacity.
///
/// # Example
/// ```
/// # use sdk_runtime::retry_capacity::*;
/// let pool = RetryCapacity::new(10);
/// assert!(pool.acquire(THROTTLED_RETRY_COST));
/// assert_eq!(pool.available_capacity(), Some(5));
/// assert!(pool.acquire(THROTTLED_RETRY_COST));
/// assert!(!pool.acquire(THROTTLED_RETRY_COST));
/// pool.release(100);
/// assert_eq!(pool.available_capacity(), Some(10));
/// ```
///
/// [acquire]: RetryCapacity::acquire
/// [release]: RetryCapacity::release
#[derive(Debug)]
pub struct RetryCapacity {
    max_capacity: Option<u32>,
    available: AtomicU32,
}

impl RetryCapacity {
    /// Creates a full pool with the given maximum capacity.
    pub fn new(max_capacity: u32) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            available: AtomicU32::new(max_capacity),
        }
    }

    /// Creates a pool with a balance different from its maximum.
    pub fn with_initial_capacity(max_capacity: u32, initial: u32) -> Result<Self, Error> {
        if initial > max_capacity {
            return Err(Error::InitialAboveMaximum {
                initial,
                maximum: max_capacity,
            });
        }
        Ok(Self {
            max_capacity: Some(max_capacity),
            available: AtomicU32::new(initial),
        })
    }

    /// Creates a pool that never denies capacity.
    pub fn disabled() -> Self {
        Self {
            max_capacity: None,
            available: AtomicU32::new(0),
        }
    }

    /// Returns true unless the pool was created with [disabled][Self::disabled].
    pub fn is_enabled(&self) -> bool {
        self.max_capacity.is_some()
    }

    /// Attempts to take `capacity` units from the pool.
    ///
    /// Returns `false`, leaving the balance unchanged, if the balance is
    /// smaller than `capacity`.
    pub fn acquire(&self, capacity: u32) -> bool {
        if self.max_capacity.is_none() {
            return true;
        }
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(capacity)
            })
            .is_ok()
    }

    /// Attempts to take a single unit from the pool.
    pub fn acquire_one(&self) -> bool {
        self.acquire(NO_RETRY_INCREMENT)
    }

    /// Returns `capacity` units to the pool, without exceeding the maximum.
    pub fn release(&self, capacity: u32) {
        let Some(max) = self.max_capacity else {
            return;
        };
        // The closure always returns `Some(_)`, the update cannot fail.
        let _ = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(capacity).min(max))
            });
    }

    /// Returns a single unit to the pool.
    pub fn release_one(&self) {
        self.release(NO_RETRY_INCREMENT)
    }

    /// The current balance, `None` if the pool is disabled.
    pub fn available_capacity(&self) -> Option<u32> {
        self.max_capacity
            .map(|_| self.available.load(Ordering::Acquire))
    }

    /// The capacity currently held by retries, zero if the pool is disabled.
    pub fn consumed_capacity(&self) -> u32 {
        match self.max_capacity {
            None => 0,
            Some(max) => max.saturating_sub(self.available.load(Ordering::Acquire)),
        }
    }
}

impl Default for RetryCapacity {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}
