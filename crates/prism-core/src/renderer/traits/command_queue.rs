// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::CommandBuffer;
use crate::renderer::api::command::{Fence, QueryHeap};
use crate::renderer::error::CommandError;
use std::fmt::Debug;

/// A timeout that never elapses, for [`CommandQueue::wait_fence`].
pub const INFINITE_TIMEOUT: u64 = u64::MAX;

/// Executes submitted command buffers in submission order.
///
/// Submission is thread-safe. Completion is only observable through fences,
/// [`CommandQueue::wait_idle`] and the state of submitted command buffers.
pub trait CommandQueue: Debug + Send + Sync {
    /// Submits an executable primary command buffer.
    /// ## Errors
    /// * `CommandError::InvalidState` - If the buffer is not `Executable`.
    /// * `CommandError::Secondary` - If the buffer is secondary.
    fn submit(&self, command_buffer: &mut dyn CommandBuffer) -> Result<(), CommandError>;

    /// Places `fence` after all work submitted so far.
    fn submit_fence(&self, fence: &Fence) -> Result<(), CommandError>;

    /// Blocks until `fence` is signaled or `timeout_nanos` elapses.
    /// ## Returns
    /// `true` if the fence was signaled, `false` on timeout. A fence that was
    /// never submitted returns `false`.
    fn wait_fence(&self, fence: &Fence, timeout_nanos: u64) -> bool;

    /// Blocks until all submitted work has completed.
    fn wait_idle(&self);

    /// Copies query results starting at `first` into `out`.
    /// ## Returns
    /// `false` if any requested result is not available yet.
    fn query_result(&self, heap: &QueryHeap, first: u32, out: &mut [u64]) -> bool;
}
