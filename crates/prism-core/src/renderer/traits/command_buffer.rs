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

use super::RenderTarget;
use crate::math::Offset3D;
use crate::renderer::api::command::{
    AttachmentClear, ClearFlags, ClearValue, CommandBufferFlags, CommandBufferState, QueryHeap,
    Scissor, Viewport,
};
use crate::renderer::api::core::{BackendOwned, Nameable};
use crate::renderer::api::pass::RenderPass;
use crate::renderer::api::pipeline::{PipelineState, ResourceHeap, StencilFace};
use crate::renderer::api::resource::{Buffer, Texture, TextureRegion};
use crate::renderer::api::util::IndexFormat;
use crate::renderer::error::CommandError;
use std::any::Any;
use std::fmt::Debug;

/// Records GPU work for later submission to a [`super::CommandQueue`].
///
/// A command buffer moves through `Initial -> Recording -> Executable ->
/// Pending` and back. Every recording call is legal only while `Recording`;
/// calls made in any other state fail with [`CommandError::InvalidState`].
/// The binding set (pipeline, vertex/index buffers, resource heap, viewports,
/// scissors) is implicit and reset by [`CommandBuffer::begin`].
pub trait CommandBuffer: Nameable + BackendOwned + Debug + Send {
    /// Returns the current lifecycle state.
    fn state(&self) -> CommandBufferState;

    /// Returns the creation flags.
    fn flags(&self) -> CommandBufferFlags;

    /// Starts a new recording, discarding previously recorded commands.
    /// ## Errors
    /// * `CommandError::InvalidState` - If the buffer is already recording or still pending.
    fn begin(&mut self) -> Result<(), CommandError>;

    /// Finishes the recording.
    ///
    /// Buffers created with `IMMEDIATE_SUBMIT` are submitted here.
    /// ## Errors
    /// * `CommandError::UnclosedScope` - If a render pass, debug group or query is still open.
    fn end(&mut self) -> Result<(), CommandError>;

    /// Writes `data` into `dst` at `offset` in queue order.
    fn update_buffer(&mut self, dst: &Buffer, offset: u64, data: &[u8])
        -> Result<(), CommandError>;

    /// Copies `size` bytes between buffers.
    fn copy_buffer(
        &mut self,
        dst: &Buffer,
        dst_offset: u64,
        src: &Buffer,
        src_offset: u64,
        size: u64,
    ) -> Result<(), CommandError>;

    /// Copies a texture region into a buffer, tightly packed.
    fn copy_buffer_from_texture(
        &mut self,
        dst: &Buffer,
        dst_offset: u64,
        src: &Texture,
        src_region: &TextureRegion,
    ) -> Result<(), CommandError>;

    /// Copies tightly packed texels from a buffer into a texture region.
    fn copy_texture_from_buffer(
        &mut self,
        dst: &Texture,
        dst_region: &TextureRegion,
        src: &Buffer,
        src_offset: u64,
    ) -> Result<(), CommandError>;

    /// Copies `src_region` of `src` to `dst_offset` of the given mip level and
    /// array layer of `dst`.
    fn copy_texture(
        &mut self,
        dst: &Texture,
        dst_mip_level: u32,
        dst_array_layer: u32,
        dst_offset: Offset3D,
        src: &Texture,
        src_region: &TextureRegion,
    ) -> Result<(), CommandError>;

    /// Fills `size` bytes of `dst` at `offset` with a repeated 32-bit value.
    fn fill_buffer(
        &mut self,
        dst: &Buffer,
        offset: u64,
        value: u32,
        size: u64,
    ) -> Result<(), CommandError>;

    /// Generates every mip level of `texture` from level 0.
    fn generate_mips(&mut self, texture: &Texture) -> Result<(), CommandError>;

    /// Orders storage writes to the given resources before later reads.
    ///
    /// Backends with implicit hazard tracking record nothing.
    fn resource_barrier(
        &mut self,
        buffers: &[Buffer],
        textures: &[Texture],
    ) -> Result<(), CommandError>;

    /// Sets the viewports.
    fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<(), CommandError>;

    /// Sets the scissor rectangles.
    fn set_scissors(&mut self, scissors: &[Scissor]) -> Result<(), CommandError>;

    /// Binds vertex buffers to consecutive slots starting at 0.
    fn set_vertex_buffers(&mut self, buffers: &[Buffer]) -> Result<(), CommandError>;

    /// Binds a single vertex buffer to slot 0.
    fn set_vertex_buffer(&mut self, buffer: &Buffer) -> Result<(), CommandError> {
        self.set_vertex_buffers(std::slice::from_ref(buffer))
    }

    /// Binds the index buffer.
    fn set_index_buffer(
        &mut self,
        buffer: &Buffer,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), CommandError>;

    /// Binds descriptor set `descriptor_set` of a resource heap.
    fn set_resource_heap(
        &mut self,
        heap: &ResourceHeap,
        descriptor_set: u32,
    ) -> Result<(), CommandError>;

    /// Binds a pipeline state.
    /// ## Errors
    /// * `CommandError::UnusablePipeline` - If the pipeline failed to compile.
    fn set_pipeline_state(&mut self, pipeline: &PipelineState) -> Result<(), CommandError>;

    /// Sets the dynamic blend constant.
    fn set_blend_factor(&mut self, color: [f32; 4]) -> Result<(), CommandError>;

    /// Sets the dynamic stencil reference of the selected faces.
    fn set_stencil_reference(
        &mut self,
        reference: u32,
        face: StencilFace,
    ) -> Result<(), CommandError>;

    /// Writes uniform (push constant) bytes starting at byte `first`.
    fn set_uniforms(&mut self, first: u32, data: &[u8]) -> Result<(), CommandError>;

    /// Opens a render pass scope on `target`.
    /// ## Arguments
    /// * `target` - A texture render target or swap chain.
    /// * `render_pass` - An optional pass compatible with the target's; `None` uses the target's own.
    /// * `clear_values` - Empty for default clear values, or one per attachment the pass clears.
    /// * `swap_buffer_index` - The swap-chain image to render into; `None` selects the current one.
    /// ## Errors
    /// * `CommandError::InsideRenderPass` - If a pass is already open.
    /// * `CommandError::Argument` - On an incompatible pass or a clear-value count mismatch.
    fn begin_render_pass(
        &mut self,
        target: &dyn RenderTarget,
        render_pass: Option<&RenderPass>,
        clear_values: &[ClearValue],
        swap_buffer_index: Option<u32>,
    ) -> Result<(), CommandError>;

    /// Closes the render pass scope.
    fn end_render_pass(&mut self) -> Result<(), CommandError>;

    /// Clears the attachments of the open pass selected by `flags`.
    fn clear(&mut self, flags: ClearFlags, value: &ClearValue) -> Result<(), CommandError>;

    /// Clears individual attachments of the open pass.
    fn clear_attachments(&mut self, clears: &[AttachmentClear]) -> Result<(), CommandError>;

    /// Draws `num_vertices` vertices starting at `first_vertex`.
    fn draw(&mut self, num_vertices: u32, first_vertex: u32) -> Result<(), CommandError>;

    /// Draws indexed primitives.
    fn draw_indexed(
        &mut self,
        num_indices: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<(), CommandError>;

    /// Draws `num_instances` instances.
    fn draw_instanced(
        &mut self,
        num_vertices: u32,
        first_vertex: u32,
        num_instances: u32,
        first_instance: u32,
    ) -> Result<(), CommandError>;

    /// Draws `num_instances` instances of indexed primitives.
    fn draw_indexed_instanced(
        &mut self,
        num_indices: u32,
        num_instances: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<(), CommandError>;

    /// Draws with arguments read from `buffer`.
    fn draw_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
    ) -> Result<(), CommandError>;

    /// Draws indexed primitives with arguments read from `buffer`.
    fn draw_indexed_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
    ) -> Result<(), CommandError>;

    /// Dispatches compute work groups.
    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), CommandError>;

    /// Dispatches compute work groups with the counts read from `buffer`.
    fn dispatch_indirect(&mut self, buffer: &Buffer, offset: u64) -> Result<(), CommandError>;

    /// Starts query `index` of `heap`.
    fn begin_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError>;

    /// Ends query `index` of `heap`.
    fn end_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError>;

    /// Opens a named debug group shown in capture tools.
    fn push_debug_group(&mut self, name: &str) -> Result<(), CommandError>;

    /// Closes the innermost debug group.
    fn pop_debug_group(&mut self) -> Result<(), CommandError>;

    /// Records the commands of an executable secondary command buffer.
    /// ## Errors
    /// * `CommandError::Secondary` - If `secondary` is not secondary, is this buffer, or this buffer is secondary.
    fn execute(&mut self, secondary: &dyn CommandBuffer) -> Result<(), CommandError>;

    /// Allows downcasting to the backend's concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to the backend's concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
