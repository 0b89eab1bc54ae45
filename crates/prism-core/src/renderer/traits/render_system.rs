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

use super::{CommandBuffer, CommandQueue, SwapChain};
use crate::platform::Surface;
use crate::renderer::api::command::{CommandBufferDescriptor, Fence, QueryHeap, QueryHeapDescriptor};
use crate::renderer::api::core::{RendererInfo, RenderingCapabilities, Report, SystemId};
use crate::renderer::api::pass::{
    RenderPass, RenderPassDescriptor, RenderTargetDescriptor, SwapChainDescriptor,
    TextureRenderTarget,
};
use crate::renderer::api::pipeline::{
    PipelineCache, PipelineDescriptor, PipelineLayout, PipelineLayoutDescriptor, PipelineState,
    ResourceHeap, ResourceHeapDescriptor,
};
use crate::renderer::api::resource::{
    Buffer, BufferDescriptor, BufferMapping, CpuAccess, ResourceViewDescriptor, Sampler,
    SamplerDescriptor, Texture, TextureDescriptor, TextureRegion,
};
use crate::renderer::api::shader::{Shader, ShaderDescriptor};
use crate::renderer::error::{ResourceError, ShaderError};
use crate::telemetry::ResourceMonitor;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// The factory of one loaded backend.
///
/// Every object a render system creates is owned by it: passing an object to
/// another render system fails with a `BackendMismatch` error. Objects are
/// released when their last handle is dropped.
pub trait RenderSystem: Debug + Send + Sync {
    /// Returns the identification strings of the backend.
    fn renderer_info(&self) -> &RendererInfo;

    /// Returns the capabilities and limits of the backend.
    fn capabilities(&self) -> &RenderingCapabilities;

    /// Returns the report produced while the backend was loaded.
    fn report(&self) -> &Report;

    /// Returns the identity objects created by this system are tagged with.
    fn system_id(&self) -> SystemId;

    /// Creates a buffer.
    /// ## Arguments
    /// * `descriptor` - The size, bind flags and CPU access of the buffer.
    /// * `initial_data` - Optional data to fill the buffer with; must cover the whole size.
    /// ## Returns
    /// A `Result` containing the buffer handle.
    /// ## Errors
    /// * `ResourceError::ResourceCreation` - If the descriptor needs an unsupported feature.
    /// * `ResourceError::Argument` - If the initial data size differs from the buffer size.
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Buffer, ResourceError>;

    /// Writes `data` into `buffer` at `offset`, outside of any command buffer.
    /// ## Errors
    /// * `ResourceError::Argument` - If the range exceeds the buffer.
    fn write_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8])
        -> Result<(), ResourceError>;

    /// Reads `out.len()` bytes of `buffer` at `offset`, blocking until pending writes land.
    fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        out: &mut [u8],
    ) -> Result<(), ResourceError>;

    /// Maps a range of `buffer` for CPU access.
    /// ## Arguments
    /// * `buffer` - The buffer to map; its CPU access flags must allow `access`.
    /// * `access` - The kind of access.
    /// * `offset` - The first byte of the range.
    /// * `size` - The length of the range, or `WHOLE_SIZE`.
    /// ## Errors
    /// * `ResourceError::Argument` - If the buffer is already mapped, the access is not
    ///   allowed by its flags, or the range is out of bounds.
    fn map_buffer(
        &self,
        buffer: &Buffer,
        access: CpuAccess,
        offset: u64,
        size: u64,
    ) -> Result<BufferMapping, ResourceError>;

    /// Ends a mapping, writing the range back for write access.
    fn unmap_buffer(&self, mapping: BufferMapping) -> Result<(), ResourceError>;

    /// Creates a texture.
    /// ## Arguments
    /// * `descriptor` - The type, format, extent and bind flags of the texture.
    /// * `initial_data` - Optional tightly packed texels of mip level 0.
    /// ## Errors
    /// * `ResourceError::ResourceCreation` - If the format or size is not supported.
    /// * `ResourceError::Argument` - If the initial data has the wrong size.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Texture, ResourceError>;

    /// Writes tightly packed texels into a texture region.
    fn write_texture(
        &self,
        texture: &Texture,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Reads a texture region as tightly packed texels into `out`.
    fn read_texture(
        &self,
        texture: &Texture,
        region: &TextureRegion,
        out: &mut [u8],
    ) -> Result<(), ResourceError>;

    /// Creates a sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<Sampler, ResourceError>;

    /// Compiles a shader.
    /// ## Returns
    /// A shader handle. If compilation failed, the handle's report has errors and
    /// any pipeline built from it is unusable.
    /// ## Errors
    /// * `ShaderError::UnsupportedSource` - If the backend does not accept the source language.
    fn create_shader(&self, descriptor: &ShaderDescriptor) -> Result<Shader, ShaderError>;

    /// Creates a pipeline layout.
    /// ## Errors
    /// * `ResourceError::ResourceCreation` - On duplicate slots or unsupported binding types.
    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayout, ResourceError>;

    /// Creates a resource heap.
    /// ## Arguments
    /// * `descriptor` - The layout and size of the heap.
    /// * `initial_views` - Empty, or exactly one view per heap entry.
    /// ## Errors
    /// * `ResourceError::LayoutMismatch` - If a view does not match its layout binding.
    fn create_resource_heap(
        &self,
        descriptor: &ResourceHeapDescriptor,
        initial_views: &[ResourceViewDescriptor],
    ) -> Result<ResourceHeap, ResourceError>;

    /// Overwrites views of `heap` starting at `first`.
    /// ## Returns
    /// The number of views written.
    fn write_resource_heap(
        &self,
        heap: &ResourceHeap,
        first: usize,
        views: &[ResourceViewDescriptor],
    ) -> Result<usize, ResourceError>;

    /// Creates a pipeline cache, restoring the signatures in `initial_blob`.
    fn create_pipeline_cache(&self, initial_blob: &[u8]) -> PipelineCache;

    /// Creates a graphics or compute pipeline state.
    /// ## Arguments
    /// * `descriptor` - The shaders, layout and fixed-function state.
    /// * `cache` - An optional cache consulted before validation.
    /// ## Returns
    /// A pipeline state. If validation failed, its report has errors, its
    /// `error()` is set and binding it fails.
    /// ## Errors
    /// * `ResourceError::BackendMismatch` - If a referenced object belongs to another system.
    fn create_pipeline_state(
        &self,
        descriptor: &PipelineDescriptor,
        cache: Option<&PipelineCache>,
    ) -> Result<PipelineState, ResourceError>;

    /// Creates a render pass.
    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPass, ResourceError>;

    /// Creates a render target from textures.
    /// ## Errors
    /// * `ResourceError::AttachmentMismatch` - If the attachments disagree with the render pass.
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureRenderTarget, ResourceError>;

    /// Creates a swap chain presenting to `surface`.
    fn create_swap_chain(
        &self,
        descriptor: &SwapChainDescriptor,
        surface: Arc<dyn Surface>,
    ) -> Result<Arc<dyn SwapChain>, ResourceError>;

    /// Creates a command buffer in the `Initial` state.
    fn create_command_buffer(
        &self,
        descriptor: &CommandBufferDescriptor,
    ) -> Result<Box<dyn CommandBuffer>, ResourceError>;

    /// Returns the single command queue of the system.
    fn command_queue(&self) -> Arc<dyn CommandQueue>;

    /// Creates an unsignaled fence.
    fn create_fence(&self) -> Fence;

    /// Creates a query heap.
    fn create_query_heap(
        &self,
        descriptor: &QueryHeapDescriptor,
    ) -> Result<QueryHeap, ResourceError>;

    /// Returns a monitor of the memory held by the system's resources, if tracked.
    fn memory_monitor(&self) -> Option<Arc<dyn ResourceMonitor>> {
        None
    }

    /// Allows downcasting to the backend's concrete type.
    fn as_any(&self) -> &dyn Any;
}
