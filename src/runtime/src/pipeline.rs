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

//! Compose request stages into a pipeline.
//!
//! Each stage transforms its input into an output. Stages are chained with
//! [RequestPipelineBuilder::then] when the output of one stage is the input
//! of the next, and wrapped with [RequestPipelineBuilder::wrapped_by] when a
//! stage needs to run the inner pipeline, perhaps more than once.
//!
//! # Example
//! ```
//! # use sdk_runtime::Result;
//! # use sdk_runtime::context::RequestExecutionContext;
//! # use sdk_runtime::pipeline::*;
//! struct Double;
//! impl RequestPipeline for Double {
//!     type Input = i32;
//!     type Output = i32;
//!     async fn execute(&self, input: i32, _context: &RequestExecutionContext) -> Result<i32> {
//!         Ok(input * 2)
//!     }
//! }
//! struct Describe;
//! impl RequestPipeline for Describe {
//!     type Input = i32;
//!     type Output = String;
//!     async fn execute(&self, input: i32, _context: &RequestExecutionContext) -> Result<String> {
//!         Ok(format!("value={input}"))
//!     }
//! }
//! # tokio_test::block_on(async {
//! let pipeline = RequestPipelineBuilder::first(Double)
//!     .then(Double)
//!     .then(Describe)
//!     .build();
//! let context = RequestExecutionContext::builder().build();
//! assert_eq!(pipeline.execute(3, &context).await?, "value=12");
//! # Ok::<(), sdk_runtime::error::Error>(()) });
//! ```

use crate::Result;
use crate::context::RequestExecutionContext;
use std::future::Future;

/// A stage, or a composition of stages, in the request pipeline.
///
/// Stages check for cancellation when they start, and propagate errors from
/// the inner stages unchanged.
pub trait RequestPipeline: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn execute(
        &self,
        input: Self::Input,
        context: &RequestExecutionContext,
    ) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// Runs `A` and then feeds its output to `B`.
#[derive(Clone, Debug)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A, B> RequestPipeline for Then<A, B>
where
    A: RequestPipeline,
    B: RequestPipeline<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    async fn execute(
        &self,
        input: Self::Input,
        context: &RequestExecutionContext,
    ) -> Result<Self::Output> {
        let intermediate = self.first.execute(input, context).await?;
        self.second.execute(intermediate, context).await
    }
}

/// Builds pipelines from stages.
#[derive(Debug)]
pub struct RequestPipelineBuilder<P> {
    pipeline: P,
}

impl<P: RequestPipeline> RequestPipelineBuilder<P> {
    /// Starts a pipeline with `stage`.
    pub fn first(stage: P) -> Self {
        Self { pipeline: stage }
    }

    /// Appends `next`, it receives the output of the pipeline so far.
    pub fn then<N>(self, next: N) -> RequestPipelineBuilder<Then<P, N>>
    where
        N: RequestPipeline<Input = P::Output>,
    {
        RequestPipelineBuilder {
            pipeline: Then {
                first: self.pipeline,
                second: next,
            },
        }
    }

    /// Wraps the pipeline so far in an outer stage.
    pub fn wrapped_by<W, F>(self, wrapper: F) -> RequestPipelineBuilder<W>
    where
        W: RequestPipeline,
        F: FnOnce(P) -> W,
    {
        RequestPipelineBuilder {
            pipeline: wrapper(self.pipeline),
        }
    }

    pub fn build(self) -> P {
        self.pipeline
    }
}
