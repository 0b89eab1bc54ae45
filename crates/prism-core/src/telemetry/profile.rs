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

//! Frame profiles collected by the debug layer during a capture session.

use serde::Serialize;

/// Counters of queue-level operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileCommandQueueRecord {
    /// Command buffers submitted.
    pub buffer_submissions: u32,
    /// Fences submitted.
    pub fence_submissions: u32,
    /// Fence waits.
    pub fence_waits: u32,
    /// Waits for queue idle.
    pub idle_waits: u32,
    /// Swap-chain presents.
    pub presents: u32,
}

/// Counters of recorded commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileCommandBufferRecord {
    /// Completed `begin`/`end` recordings.
    pub encodings: u32,
    /// Buffer updates.
    pub buffer_updates: u32,
    /// Buffer-to-buffer and buffer/texture copies.
    pub buffer_copies: u32,
    /// Buffer fills.
    pub buffer_fills: u32,
    /// Texture-to-texture copies.
    pub texture_copies: u32,
    /// Mip-chain generations.
    pub mip_generations: u32,
    /// Resource barriers.
    pub resource_barriers: u32,
    /// Vertex buffer bindings.
    pub vertex_buffer_bindings: u32,
    /// Index buffer bindings.
    pub index_buffer_bindings: u32,
    /// Resource heap bindings.
    pub resource_heap_bindings: u32,
    /// Graphics pipeline bindings.
    pub graphics_pipeline_bindings: u32,
    /// Compute pipeline bindings.
    pub compute_pipeline_bindings: u32,
    /// Uniform updates.
    pub uniform_updates: u32,
    /// Render pass scopes.
    pub render_pass_sections: u32,
    /// Attachment clears.
    pub attachment_clears: u32,
    /// Draw commands of any kind.
    pub draw_commands: u32,
    /// Dispatch commands of any kind.
    pub dispatch_commands: u32,
    /// Query scopes.
    pub query_sections: u32,
    /// Secondary command buffers executed.
    pub secondary_executions: u32,
}

/// CPU timing of one annotated command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileTimeRecord {
    /// The command name, e.g. `"draw"`.
    pub annotation: String,
    /// Nanoseconds since the capture started, when the command began.
    pub cpu_start_nanos: u64,
    /// Nanoseconds since the capture started, when the command returned.
    pub cpu_end_nanos: u64,
}

impl ProfileTimeRecord {
    /// The CPU time spent in the command.
    pub fn elapsed_nanos(&self) -> u64 {
        self.cpu_end_nanos.saturating_sub(self.cpu_start_nanos)
    }
}

/// Everything recorded during one capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameProfile {
    /// Queue counters.
    pub command_queue: ProfileCommandQueueRecord,
    /// Recording counters.
    pub command_buffer: ProfileCommandBufferRecord,
    /// Per-command CPU timings, in recording order.
    pub time_records: Vec<ProfileTimeRecord>,
}

impl FrameProfile {
    /// Adds the counters and time records of `other`.
    pub fn accumulate(&mut self, other: &FrameProfile) {
        let q = &mut self.command_queue;
        let o = &other.command_queue;
        q.buffer_submissions += o.buffer_submissions;
        q.fence_submissions += o.fence_submissions;
        q.fence_waits += o.fence_waits;
        q.idle_waits += o.idle_waits;
        q.presents += o.presents;

        let c = &mut self.command_buffer;
        let o = &other.command_buffer;
        c.encodings += o.encodings;
        c.buffer_updates += o.buffer_updates;
        c.buffer_copies += o.buffer_copies;
        c.buffer_fills += o.buffer_fills;
        c.texture_copies += o.texture_copies;
        c.mip_generations += o.mip_generations;
        c.resource_barriers += o.resource_barriers;
        c.vertex_buffer_bindings += o.vertex_buffer_bindings;
        c.index_buffer_bindings += o.index_buffer_bindings;
        c.resource_heap_bindings += o.resource_heap_bindings;
        c.graphics_pipeline_bindings += o.graphics_pipeline_bindings;
        c.compute_pipeline_bindings += o.compute_pipeline_bindings;
        c.uniform_updates += o.uniform_updates;
        c.render_pass_sections += o.render_pass_sections;
        c.attachment_clears += o.attachment_clears;
        c.draw_commands += o.draw_commands;
        c.dispatch_commands += o.dispatch_commands;
        c.query_sections += o.query_sections;
        c.secondary_executions += o.secondary_executions;

        self.time_records.extend(other.time_records.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_and_serialize() {
        let mut total = FrameProfile::default();
        let mut frame = FrameProfile::default();
        frame.command_buffer.draw_commands = 2;
        frame.command_queue.buffer_submissions = 1;
        frame.time_records.push(ProfileTimeRecord {
            annotation: "draw".into(),
            cpu_start_nanos: 10,
            cpu_end_nanos: 25,
        });
        total.accumulate(&frame);
        total.accumulate(&frame);
        assert_eq!(total.command_buffer.draw_commands, 4);
        assert_eq!(total.time_records.len(), 2);
        assert_eq!(total.time_records[0].elapsed_nanos(), 15);

        let json = serde_json::to_value(&total).unwrap();
        assert_eq!(json["command_queue"]["buffer_submissions"], 2);
        assert_eq!(json["time_records"][1]["annotation"], "draw");
    }
}
