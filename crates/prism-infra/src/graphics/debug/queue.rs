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

use prism_core::renderer::{
    CommandBuffer, CommandBufferFlags, CommandBufferState, CommandError, CommandQueue, Fence,
    QueryHeap,
};
use prism_core::telemetry::{ErrorKind, ProfileCommandQueueRecord, RenderingDebugger, WarningKind};
use std::sync::Arc;

/// A command queue wrapper that validates submissions and counts queue work.
#[derive(Debug)]
pub struct DebugCommandQueue {
    inner: Arc<dyn CommandQueue>,
    debugger: RenderingDebugger,
}

impl DebugCommandQueue {
    pub(crate) fn new(inner: Arc<dyn CommandQueue>, debugger: RenderingDebugger) -> Self {
        Self { inner, debugger }
    }

    fn count(&self, update: impl FnOnce(&mut ProfileCommandQueueRecord)) {
        self.debugger.record(|profile| update(&mut profile.command_queue));
    }

    fn reject(&self, kind: ErrorKind, source: &str, text: String) -> CommandError {
        self.debugger.post_error(kind, source, text.clone());
        CommandError::Validation(format!("{source}: {text}"))
    }
}

impl CommandQueue for DebugCommandQueue {
    fn submit(&self, command_buffer: &mut dyn CommandBuffer) -> Result<(), CommandError> {
        if command_buffer.flags().contains(CommandBufferFlags::SECONDARY) {
            return Err(self.reject(
                ErrorKind::InvalidArgument,
                "submit",
                "secondary command buffers are executed, not submitted".into(),
            ));
        }
        let state = command_buffer.state();
        if state != CommandBufferState::Executable {
            return Err(self.reject(
                ErrorKind::InvalidState,
                "submit",
                format!("cannot submit a command buffer that is {state:?}"),
            ));
        }
        self.inner.submit(command_buffer).inspect_err(|err| {
            self.debugger
                .post_error(ErrorKind::InvalidState, "submit", err.to_string());
        })?;
        self.count(|q| q.buffer_submissions += 1);
        Ok(())
    }

    fn submit_fence(&self, fence: &Fence) -> Result<(), CommandError> {
        if fence.is_submitted() && !fence.is_signaled() {
            self.debugger.post_warning(
                WarningKind::ImproperState,
                "submit_fence",
                "fence is submitted again before it was signaled",
            );
        }
        self.inner.submit_fence(fence)?;
        self.count(|q| q.fence_submissions += 1);
        Ok(())
    }

    fn wait_fence(&self, fence: &Fence, timeout_nanos: u64) -> bool {
        if !fence.is_submitted() {
            self.debugger.post_warning(
                WarningKind::ImproperState,
                "wait_fence",
                "waiting on a fence that was never submitted",
            );
        }
        self.count(|q| q.fence_waits += 1);
        self.inner.wait_fence(fence, timeout_nanos)
    }

    fn wait_idle(&self) {
        self.count(|q| q.idle_waits += 1);
        self.inner.wait_idle();
    }

    fn query_result(&self, heap: &QueryHeap, first: u32, out: &mut [u64]) -> bool {
        let end = u64::from(first) + out.len() as u64;
        if end > u64::from(heap.num_queries()) {
            self.debugger.post_error(
                ErrorKind::InvalidArgument,
                "query_result",
                format!(
                    "query range [{first}, {end}) exceeds the {} queries of the heap",
                    heap.num_queries()
                ),
            );
            return false;
        }
        self.inner.query_result(heap, first, out)
    }
}
