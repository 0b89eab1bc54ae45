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

use super::command::DebugCommandBuffer;
use super::queue::DebugCommandQueue;
use super::swap_chain::DebugSwapChain;
use prism_core::platform::Surface;
use prism_core::renderer::{
    Buffer, BufferDescriptor, BufferMapping, CommandBuffer, CommandBufferDescriptor, CommandQueue,
    CpuAccess, Fence, PipelineCache, PipelineDescriptor, PipelineLayout, PipelineLayoutDescriptor,
    PipelineState, QueryHeap, QueryHeapDescriptor, RenderPass, RenderPassDescriptor,
    RenderSystem, RenderTargetDescriptor, RendererInfo, RenderingCapabilities, Report,
    ResourceError, ResourceHeap, ResourceHeapDescriptor, ResourceViewDescriptor, Sampler,
    SamplerDescriptor, Shader, ShaderDescriptor, ShaderError, SwapChain, SwapChainDescriptor,
    SystemId, Texture, TextureDescriptor, TextureRegion, TextureRenderTarget,
};
use prism_core::telemetry::{ErrorKind, RenderingDebugger, ResourceMonitor, WarningKind};
use std::any::Any;
use std::sync::Arc;

/// Wraps a render system with the validating debug layer.
///
/// Creation failures and objects created with failed reports are posted to
/// the debugger. Command buffers, the command queue and swap chains are
/// returned wrapped in their debug counterparts.
#[derive(Debug)]
pub struct DebugRenderSystem {
    inner: Arc<dyn RenderSystem>,
    debugger: RenderingDebugger,
    queue: Arc<DebugCommandQueue>,
}

impl DebugRenderSystem {
    /// Wraps `inner`, reporting to `debugger`.
    pub fn new(inner: Arc<dyn RenderSystem>, debugger: RenderingDebugger) -> Self {
        let queue = Arc::new(DebugCommandQueue::new(
            inner.command_queue(),
            debugger.clone(),
        ));
        log::info!(
            "Debug layer enabled for render system '{}'",
            inner.renderer_info().renderer_name
        );
        Self {
            inner,
            debugger,
            queue,
        }
    }

    /// The wrapped render system.
    pub fn inner(&self) -> &Arc<dyn RenderSystem> {
        &self.inner
    }

    /// The debugger messages and profiles are reported to.
    pub fn debugger(&self) -> &RenderingDebugger {
        &self.debugger
    }

    fn check<T, E: ToString>(&self, source: &str, result: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &result {
            self.debugger
                .post_error(ErrorKind::InvalidArgument, source, err.to_string());
        }
        result
    }

    fn check_report(&self, source: &str, label: &str, report: &Report) {
        if report.has_errors() {
            self.debugger.post_error(
                ErrorKind::InvalidArgument,
                source,
                format!("'{label}' failed: {}", report.text().trim_end()),
            );
        }
    }

    fn warn_mapped(&self, source: &str, buffer: &Buffer) {
        if buffer.is_mapped() {
            self.debugger.post_warning(
                WarningKind::ImproperState,
                source,
                format!("buffer {} is mapped", buffer.id().0),
            );
        }
    }
}

impl RenderSystem for DebugRenderSystem {
    fn renderer_info(&self) -> &RendererInfo {
        self.inner.renderer_info()
    }

    fn capabilities(&self) -> &RenderingCapabilities {
        self.inner.capabilities()
    }

    fn report(&self) -> &Report {
        self.inner.report()
    }

    fn system_id(&self) -> SystemId {
        self.inner.system_id()
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Buffer, ResourceError> {
        if descriptor.bind_flags.is_empty() && descriptor.cpu_access_flags.is_empty() {
            self.debugger.post_warning(
                WarningKind::ImproperArgument,
                "create_buffer",
                "buffer has neither bind flags nor CPU access and cannot be used",
            );
        }
        self.check(
            "create_buffer",
            self.inner.create_buffer(descriptor, initial_data),
        )
    }

    fn write_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        self.check("write_buffer", self.inner.write_buffer(buffer, offset, data))
    }

    fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        out: &mut [u8],
    ) -> Result<(), ResourceError> {
        self.warn_mapped("read_buffer", buffer);
        self.check("read_buffer", self.inner.read_buffer(buffer, offset, out))
    }

    fn map_buffer(
        &self,
        buffer: &Buffer,
        access: CpuAccess,
        offset: u64,
        size: u64,
    ) -> Result<BufferMapping, ResourceError> {
        self.check(
            "map_buffer",
            self.inner.map_buffer(buffer, access, offset, size),
        )
    }

    fn unmap_buffer(&self, mapping: BufferMapping) -> Result<(), ResourceError> {
        self.check("unmap_buffer", self.inner.unmap_buffer(mapping))
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Texture, ResourceError> {
        self.check(
            "create_texture",
            self.inner.create_texture(descriptor, initial_data),
        )
    }

    fn write_texture(
        &self,
        texture: &Texture,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.check(
            "write_texture",
            self.inner.write_texture(texture, region, data),
        )
    }

    fn read_texture(
        &self,
        texture: &Texture,
        region: &TextureRegion,
        out: &mut [u8],
    ) -> Result<(), ResourceError> {
        self.check("read_texture", self.inner.read_texture(texture, region, out))
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<Sampler, ResourceError> {
        self.check("create_sampler", self.inner.create_sampler(descriptor))
    }

    fn create_shader(&self, descriptor: &ShaderDescriptor) -> Result<Shader, ShaderError> {
        let shader = self.check("create_shader", self.inner.create_shader(descriptor))?;
        self.check_report("create_shader", &descriptor.display_label(), shader.report());
        Ok(shader)
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayout, ResourceError> {
        self.check(
            "create_pipeline_layout",
            self.inner.create_pipeline_layout(descriptor),
        )
    }

    fn create_resource_heap(
        &self,
        descriptor: &ResourceHeapDescriptor,
        initial_views: &[ResourceViewDescriptor],
    ) -> Result<ResourceHeap, ResourceError> {
        self.check(
            "create_resource_heap",
            self.inner.create_resource_heap(descriptor, initial_views),
        )
    }

    fn write_resource_heap(
        &self,
        heap: &ResourceHeap,
        first: usize,
        views: &[ResourceViewDescriptor],
    ) -> Result<usize, ResourceError> {
        if views.is_empty() {
            self.debugger.post_warning(
                WarningKind::PointlessOperation,
                "write_resource_heap",
                "no views are specified",
            );
        }
        self.check(
            "write_resource_heap",
            self.inner.write_resource_heap(heap, first, views),
        )
    }

    fn create_pipeline_cache(&self, initial_blob: &[u8]) -> PipelineCache {
        self.inner.create_pipeline_cache(initial_blob)
    }

    fn create_pipeline_state(
        &self,
        descriptor: &PipelineDescriptor,
        cache: Option<&PipelineCache>,
    ) -> Result<PipelineState, ResourceError> {
        let pipeline = self.check(
            "create_pipeline_state",
            self.inner.create_pipeline_state(descriptor, cache),
        )?;
        self.check_report(
            "create_pipeline_state",
            &pipeline.display_label(),
            pipeline.report(),
        );
        Ok(pipeline)
    }

    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPass, ResourceError> {
        self.check("create_render_pass", self.inner.create_render_pass(descriptor))
    }

    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureRenderTarget, ResourceError> {
        self.check(
            "create_render_target",
            self.inner.create_render_target(descriptor),
        )
    }

    fn create_swap_chain(
        &self,
        descriptor: &SwapChainDescriptor,
        surface: Arc<dyn Surface>,
    ) -> Result<Arc<dyn SwapChain>, ResourceError> {
        let swap_chain = self.check(
            "create_swap_chain",
            self.inner.create_swap_chain(descriptor, surface),
        )?;
        Ok(Arc::new(DebugSwapChain::new(
            swap_chain,
            self.debugger.clone(),
        )))
    }

    fn create_command_buffer(
        &self,
        descriptor: &CommandBufferDescriptor,
    ) -> Result<Box<dyn CommandBuffer>, ResourceError> {
        let inner = self.check(
            "create_command_buffer",
            self.inner.create_command_buffer(descriptor),
        )?;
        Ok(Box::new(DebugCommandBuffer::new(
            inner,
            self.debugger.clone(),
        )))
    }

    fn command_queue(&self) -> Arc<dyn CommandQueue> {
        self.queue.clone()
    }

    fn create_fence(&self) -> Fence {
        self.inner.create_fence()
    }

    fn create_query_heap(
        &self,
        descriptor: &QueryHeapDescriptor,
    ) -> Result<QueryHeap, ResourceError> {
        if descriptor.num_queries == 0 {
            self.debugger.post_warning(
                WarningKind::PointlessOperation,
                "create_query_heap",
                "query heap has no queries",
            );
        }
        self.check("create_query_heap", self.inner.create_query_heap(descriptor))
    }

    fn memory_monitor(&self) -> Option<Arc<dyn ResourceMonitor>> {
        self.inner.memory_monitor()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
