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

//! Progress events published while a call executes.

use std::sync::Arc;

/// The kind of progress event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ProgressEventType {
    ClientRequestStarted,
    ClientRequestSuccess,
    ClientRequestFailed,
    ClientRequestRetry,
    HttpRequestStarted,
    HttpRequestCompleted,
    RequestContentLength,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    pub event_type: ProgressEventType,
    /// The number of bytes associated with the event, zero for most events.
    pub bytes: u64,
}

/// Receives progress events, from the thread or task driving the call.
///
/// Implementations should return quickly, they run inline with the request.
pub trait ProgressListener: Send + Sync + std::fmt::Debug {
    fn progress_changed(&self, event: &ProgressEvent);
}

/// Ignores all events.
#[derive(Clone, Debug, Default)]
pub struct NoopProgressListener;

impl ProgressListener for NoopProgressListener {
    fn progress_changed(&self, _event: &ProgressEvent) {}
}

pub type SharedProgressListener = Arc<dyn ProgressListener>;

impl<T: ProgressListener + ?Sized> ProgressListener for Arc<T> {
    fn progress_changed(&self, event: &ProgressEvent) {
        (**self).progress_changed(event)
    }
}

pub(crate) fn publish_progress(listener: &dyn ProgressListener, event_type: ProgressEventType) {
    listener.progress_changed(&ProgressEvent {
        event_type,
        bytes: 0,
    });
}

pub(crate) fn publish_request_content_length(listener: &dyn ProgressListener, bytes: u64) {
    listener.progress_changed(&ProgressEvent {
        event_type: ProgressEventType::RequestContentLength,
        bytes,
    });
}
