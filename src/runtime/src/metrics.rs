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

//! Per-call metrics.
//!
//! The pipeline records timings, counters, and properties for each logical
//! call. Applications that do not need metrics use the default
//! [NoopRequestMetrics].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// The names of the recorded metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Field {
    ServiceName,
    RequestType,
    StatusCode,
    Exception,
    RequestCount,
    RetryPauseTime,
    ThrottledRetryCount,
    ThrottleException,
    RetryCapacityConsumed,
    HttpRequestTime,
    RequestSigningTime,
    CredentialsRequestTime,
    ClientExecuteTime,
    HttpClientPoolAvailableCount,
    HttpClientPoolLeasedCount,
    HttpClientPoolPendingCount,
    BytesProcessed,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceName => "ServiceName",
            Self::RequestType => "RequestType",
            Self::StatusCode => "StatusCode",
            Self::Exception => "Exception",
            Self::RequestCount => "RequestCount",
            Self::RetryPauseTime => "RetryPauseTime",
            Self::ThrottledRetryCount => "ThrottledRetryCount",
            Self::ThrottleException => "ThrottleException",
            Self::RetryCapacityConsumed => "RetryCapacityConsumed",
            Self::HttpRequestTime => "HttpRequestTime",
            Self::RequestSigningTime => "RequestSigningTime",
            Self::CredentialsRequestTime => "CredentialsRequestTime",
            Self::ClientExecuteTime => "ClientExecuteTime",
            Self::HttpClientPoolAvailableCount => "HttpClientPoolAvailableCount",
            Self::HttpClientPoolLeasedCount => "HttpClientPoolLeasedCount",
            Self::HttpClientPoolPendingCount => "HttpClientPoolPendingCount",
            Self::BytesProcessed => "BytesProcessed",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records timings, counters and properties for one logical call.
///
/// The pipeline calls these functions from a single attempt at a time, but
/// implementations must be `Sync` because the recorder is shared by
/// reference.
pub trait RequestMetrics: Send + Sync + std::fmt::Debug {
    /// Returns false if the recorder discards everything.
    fn is_enabled(&self) -> bool {
        true
    }

    fn start_event(&self, field: Field);

    fn end_event(&self, field: Field);

    fn increment_counter(&self, field: Field);

    fn set_counter(&self, field: Field, value: i64);

    fn add_property(&self, field: Field, value: String);
}

/// Discards all metrics.
#[derive(Clone, Debug, Default)]
pub struct NoopRequestMetrics;

impl RequestMetrics for NoopRequestMetrics {
    fn is_enabled(&self) -> bool {
        false
    }
    fn start_event(&self, _field: Field) {}
    fn end_event(&self, _field: Field) {}
    fn increment_counter(&self, _field: Field) {}
    fn set_counter(&self, _field: Field, _value: i64) {}
    fn add_property(&self, _field: Field, _value: String) {}
}

#[derive(Debug, Default)]
struct Recorded {
    open: HashMap<Field, Instant>,
    timings: HashMap<Field, Vec<Duration>>,
    counters: HashMap<Field, i64>,
    properties: HashMap<Field, Vec<String>>,
}

/// Keeps all metrics in memory.
///
/// Events may repeat, for example `HttpRequestTime` is recorded once per
/// attempt. Each completed event adds one sample to its timings.
#[derive(Debug, Default)]
pub struct DefaultRequestMetrics {
    recorded: Mutex<Recorded>,
}

impl DefaultRequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Recorded) -> R) -> R {
        let mut guard = self
            .recorded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn counter(&self, field: Field) -> Option<i64> {
        self.with(|r| r.counters.get(&field).copied())
    }

    pub fn timings(&self, field: Field) -> Vec<Duration> {
        self.with(|r| r.timings.get(&field).cloned().unwrap_or_default())
    }

    pub fn properties(&self, field: Field) -> Vec<String> {
        self.with(|r| r.properties.get(&field).cloned().unwrap_or_default())
    }

    /// Emits all the recorded metrics as a single `tracing` event.
    pub fn log(&self) {
        self.with(|r| {
            let counters = r
                .counters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            let timings = r
                .timings
                .iter()
                .map(|(k, v)| format!("{k}={v:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            let properties = r
                .properties
                .iter()
                .map(|(k, v)| format!("{k}={}", v.join(",")))
                .collect::<Vec<_>>()
                .join(", ");
            tracing::debug!(%counters, %timings, %properties, "request metrics");
        });
    }
}

impl RequestMetrics for DefaultRequestMetrics {
    fn start_event(&self, field: Field) {
        self.with(|r| {
            r.open.insert(field, Instant::now());
        });
    }

    fn end_event(&self, field: Field) {
        self.with(|r| match r.open.remove(&field) {
            Some(start) => {
                let elapsed = start.elapsed();
                tracing::trace!(%field, ?elapsed, "metrics event completed");
                r.timings.entry(field).or_default().push(elapsed);
            }
            None => tracing::trace!(%field, "metrics event ended without a start"),
        });
    }

    fn increment_counter(&self, field: Field) {
        self.with(|r| *r.counters.entry(field).or_default() += 1);
    }

    fn set_counter(&self, field: Field, value: i64) {
        self.with(|r| {
            r.counters.insert(field, value);
        });
    }

    fn add_property(&self, field: Field, value: String) {
        self.with(|r| r.properties.entry(field).or_default().push(value));
    }
}
