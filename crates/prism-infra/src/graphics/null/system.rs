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

//! The Null render system: a complete, CPU-only backend.

use super::command::NullCommandBuffer;
use super::device::NullDevice;
use super::executor::ExecutionStats;
use super::queue::NullCommandQueue;
use super::storage::NullStorage;
use super::swap_chain::NullSwapChain;
use crate::graphics::shader::NagaShaderCompiler;
use crate::telemetry::{MemoryMonitor, MemoryTracker};
use prism_core::platform::Surface;
use prism_core::renderer::validation::{
    ensure_owned, ensure_pipeline_owned, validate_buffer, validate_pipeline_cached,
    validate_sampler, validate_texture, validate_texture_region,
};
use prism_core::renderer::{
    BackendOwned, Buffer, BufferDescriptor, BufferMapping, ClippingRange, CommandBuffer,
    CommandBufferDescriptor, CommandBufferFlags, CommandQueue, CpuAccess, Fence,
    GraphicsBackendType, LoadError, ObjectKind, PipelineCache, PipelineDescriptor, PipelineLayout,
    PipelineLayoutDescriptor, PipelineState, QueryHeap, QueryHeapDescriptor, RenderPass,
    RenderPassDescriptor, RenderSystem, RenderTargetDescriptor, RendererDeviceType, RendererInfo,
    RenderingCapabilities, RenderingFeatures, RenderingLimits, Report, ResourceError,
    ResourceHeap, ResourceHeapDescriptor, ResourceViewDescriptor, Sampler, SamplerDescriptor,
    ScreenOrigin, Shader, ShaderCompiler, ShaderDescriptor, ShaderError, ShadingLanguage,
    SwapChain, SwapChainDescriptor, SystemId, Texture, TextureDescriptor, TextureFormat,
    TextureRegion, TextureRenderTarget,
};
use prism_core::telemetry::ResourceMonitor;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The name the Null backend is registered under.
pub const NULL_BACKEND_NAME: &str = "Null";

/// The capabilities of the Null backend: every format, no geometry,
/// tessellation or stream-output stages.
pub fn null_capabilities() -> RenderingCapabilities {
    RenderingCapabilities {
        screen_origin: ScreenOrigin::UpperLeft,
        clipping_range: ClippingRange::ZeroToOne,
        shading_languages: vec![ShadingLanguage::Wgsl, ShadingLanguage::Spirv],
        texture_formats: TextureFormat::ALL.to_vec(),
        features: RenderingFeatures::RENDER_TARGETS
            | RenderingFeatures::TEXTURE_3D
            | RenderingFeatures::TEXTURE_CUBE
            | RenderingFeatures::TEXTURE_ARRAY
            | RenderingFeatures::TEXTURE_CUBE_ARRAY
            | RenderingFeatures::MULTISAMPLE_TEXTURES
            | RenderingFeatures::STORAGE_RESOURCES
            | RenderingFeatures::COMPUTE_SHADERS
            | RenderingFeatures::INSTANCING
            | RenderingFeatures::OFFSET_INSTANCING
            | RenderingFeatures::INDIRECT_DRAW
            | RenderingFeatures::VIEWPORT_ARRAYS
            | RenderingFeatures::PIPELINE_CACHES
            | RenderingFeatures::TIMESTAMP_QUERIES
            | RenderingFeatures::OCCLUSION_QUERIES
            | RenderingFeatures::SAMPLER_ANISOTROPY
            | RenderingFeatures::UNIFORMS,
        limits: RenderingLimits {
            line_width_range: [1.0, 1.0],
            max_texture_array_layers: 2048,
            max_color_attachments: 8,
            max_patch_vertices: 0,
            max_1d_texture_size: 16384,
            max_2d_texture_size: 16384,
            max_3d_texture_size: 2048,
            max_cube_texture_size: 2048,
            max_anisotropy: 16,
            max_compute_work_groups: [65535; 3],
            max_compute_work_group_size: [1024, 1024, 64],
            max_viewports: 16,
            max_viewport_size: [16384, 16384],
            max_buffer_size: 1 << 30,
            max_constant_buffer_size: 1 << 16,
            max_uniform_bytes: 128,
            min_constant_buffer_alignment: 256,
            min_storage_buffer_alignment: 16,
            texture_row_pitch_alignment: 1,
        },
    }
}

/// A render system that executes everything on the CPU.
///
/// Buffers and textures live in host memory and command buffers run on a
/// worker thread, so uploads, copies, clears and read-backs behave like on a
/// real device. Rasterization and shader execution are not emulated.
pub struct NullRenderSystem {
    device: NullDevice,
    info: RendererInfo,
    capabilities: RenderingCapabilities,
    report: Report,
    queue: Arc<NullCommandQueue>,
    compiler: Arc<dyn ShaderCompiler>,
    memory: MemoryTracker,
    monitor: Arc<MemoryMonitor>,
}

impl NullRenderSystem {
    /// Creates the system and starts its queue worker.
    /// ## Errors
    /// * `LoadError::Device` - If the worker thread cannot be spawned.
    pub fn new() -> Result<Self, LoadError> {
        let system = SystemId::next();
        let memory = MemoryTracker::new();
        let storage = Arc::new(NullStorage::new(memory.clone()));
        let queue = NullCommandQueue::new(system, Arc::clone(&storage)).map_err(|err| {
            LoadError::Device {
                name: NULL_BACKEND_NAME.into(),
                report: Report::with_error(format!("failed to start the queue worker: {err}")),
            }
        })?;

        let mut report = Report::new();
        report.info("Null render system ready");
        log::info!("Null render system created (system {})", system.0);

        Ok(Self {
            device: NullDevice::new(system, storage),
            info: RendererInfo {
                renderer_name: NULL_BACKEND_NAME.into(),
                device_name: "CPU".into(),
                vendor_name: "Prism".into(),
                shading_language_name: "WGSL".into(),
                backend_type: GraphicsBackendType::Null,
                device_type: RendererDeviceType::Cpu,
            },
            capabilities: null_capabilities(),
            report,
            queue: Arc::new(queue),
            compiler: Arc::new(NagaShaderCompiler::new()),
            monitor: Arc::new(MemoryMonitor::new(
                format!("Null_{}", system.0),
                memory.clone(),
            )),
            memory,
        })
    }

    /// Replaces the shader compiler.
    pub fn with_shader_compiler(mut self, compiler: Arc<dyn ShaderCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Counters of the work the queue has executed.
    pub fn execution_stats(&self) -> ExecutionStats {
        self.queue.stats()
    }

    /// The concrete queue.
    pub fn null_queue(&self) -> &Arc<NullCommandQueue> {
        &self.queue
    }

    fn owned(&self, object: &dyn BackendOwned) -> Result<(), ResourceError> {
        ensure_owned(object, self.device.system())
    }

    fn post_failure<T, E: fmt::Display>(context: &str, result: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &result {
            Report::with_error(err.to_string()).post(context);
        }
        result
    }
}

impl fmt::Debug for NullRenderSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullRenderSystem")
            .field("system", &self.device.system())
            .field("memory", &self.memory.snapshot())
            .field("stats", &self.queue.stats())
            .finish()
    }
}

impl RenderSystem for NullRenderSystem {
    fn renderer_info(&self) -> &RendererInfo {
        &self.info
    }

    fn capabilities(&self) -> &RenderingCapabilities {
        &self.capabilities
    }

    fn report(&self) -> &Report {
        &self.report
    }

    fn system_id(&self) -> SystemId {
        self.device.system()
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Buffer, ResourceError> {
        Self::post_failure(
            "create_buffer",
            validate_buffer(descriptor, &self.capabilities, initial_data),
        )?;
        let buffer = self.device.create_buffer(descriptor, initial_data);
        log::debug!(
            "Created buffer {:?} ({} bytes, {:?})",
            buffer.id(),
            descriptor.size,
            descriptor.bind_flags
        );
        Ok(buffer)
    }

    fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.owned(buffer)?;
        if buffer.is_mapped() {
            return Err(ResourceError::Argument(
                "cannot write a buffer while it is mapped".into(),
            ));
        }
        self.device
            .storage()
            .write_buffer(buffer.raw_id(), offset, data)
    }

    fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        out: &mut [u8],
    ) -> Result<(), ResourceError> {
        self.owned(buffer)?;
        self.queue.wait_idle();
        let data = self
            .device
            .storage()
            .read_buffer(buffer.raw_id(), offset, out.len() as u64)?;
        out.copy_from_slice(&data);
        Ok(())
    }

    fn map_buffer(
        &self,
        buffer: &Buffer,
        access: CpuAccess,
        offset: u64,
        size: u64,
    ) -> Result<BufferMapping, ResourceError> {
        self.owned(buffer)?;
        let descriptor = buffer.descriptor();
        if !descriptor.cpu_access_flags.contains(access.required_flags()) {
            return Err(ResourceError::Argument(format!(
                "{access:?} mapping needs {:?} but the buffer allows {:?}",
                access.required_flags(),
                descriptor.cpu_access_flags
            )));
        }
        let range = descriptor.resolve_range(offset, size).ok_or_else(|| {
            ResourceError::Argument(format!(
                "mapping range [{offset}, +{size}) exceeds buffer of {} bytes",
                descriptor.size
            ))
        })?;
        if !buffer.try_begin_mapping() {
            return Err(ResourceError::Argument("buffer is already mapped".into()));
        }
        let data = if access == CpuAccess::WriteDiscard {
            vec![0u8; (range.end - range.start) as usize]
        } else {
            self.queue.wait_idle();
            match self.device.storage().read_buffer(
                buffer.raw_id(),
                range.start,
                range.end - range.start,
            ) {
                Ok(data) => data,
                Err(err) => {
                    buffer.end_mapping();
                    return Err(err);
                }
            }
        };
        Ok(BufferMapping::new(buffer.clone(), access, range, data))
    }

    fn unmap_buffer(&self, mapping: BufferMapping) -> Result<(), ResourceError> {
        let (buffer, access, range, data) = mapping.into_parts();
        self.owned(&buffer)?;
        let result = if access.writes() {
            self.queue.wait_idle();
            self.device
                .storage()
                .write_buffer(buffer.raw_id(), range.start, &data)
        } else {
            Ok(())
        };
        buffer.end_mapping();
        result
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Texture, ResourceError> {
        Self::post_failure(
            "create_texture",
            validate_texture(descriptor, &self.capabilities, initial_data),
        )?;
        let texture = self.device.create_texture(descriptor, initial_data);
        log::debug!(
            "Created texture {:?} ({:?} {:?} {}x{}x{})",
            texture.id(),
            descriptor.ty,
            descriptor.format,
            descriptor.extent.width,
            descriptor.extent.height,
            descriptor.extent.depth
        );
        Ok(texture)
    }

    fn write_texture(
        &self,
        texture: &Texture,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.owned(texture)?;
        validate_texture_region(texture, region, data.len())?;
        self.device
            .storage()
            .write_texture(texture.raw_id(), region, data)
    }

    fn read_texture(
        &self,
        texture: &Texture,
        region: &TextureRegion,
        out: &mut [u8],
    ) -> Result<(), ResourceError> {
        self.owned(texture)?;
        validate_texture_region(texture, region, out.len())?;
        self.queue.wait_idle();
        let data = self
            .device
            .storage()
            .read_texture(texture.raw_id(), region)?;
        out.copy_from_slice(&data);
        Ok(())
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<Sampler, ResourceError> {
        Self::post_failure(
            "create_sampler",
            validate_sampler(descriptor, &self.capabilities),
        )?;
        Ok(Sampler::new(
            self.device.bind(ObjectKind::Sampler),
            descriptor.clone(),
        ))
    }

    fn create_shader(&self, descriptor: &ShaderDescriptor) -> Result<Shader, ShaderError> {
        let language = descriptor.source.language();
        if !self.compiler.languages().contains(&language) {
            return Err(ShaderError::UnsupportedSource(format!(
                "{language:?} is not accepted by the Null backend"
            )));
        }
        let compiled = self.compiler.compile(descriptor)?;
        if compiled.report.has_errors() {
            compiled
                .report
                .post(&format!("create_shader '{}'", descriptor.display_label()));
        }
        Ok(Shader::new(
            self.device.bind(ObjectKind::Shader),
            descriptor.clone(),
            compiled.reflection,
            compiled.report,
        ))
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayout, ResourceError> {
        Self::post_failure(
            "create_pipeline_layout",
            descriptor.validate(&self.capabilities),
        )?;
        Ok(PipelineLayout::new(
            self.device.bind(ObjectKind::PipelineLayout),
            descriptor.clone(),
        ))
    }

    fn create_resource_heap(
        &self,
        descriptor: &ResourceHeapDescriptor,
        initial_views: &[ResourceViewDescriptor],
    ) -> Result<ResourceHeap, ResourceError> {
        self.owned(&descriptor.pipeline_layout)?;
        for view in initial_views {
            self.owned(&view.resource)?;
        }
        Self::post_failure(
            "create_resource_heap",
            ResourceHeap::new(
                self.device.bind(ObjectKind::ResourceHeap),
                descriptor.clone(),
                initial_views,
            ),
        )
    }

    fn write_resource_heap(
        &self,
        heap: &ResourceHeap,
        first: usize,
        views: &[ResourceViewDescriptor],
    ) -> Result<usize, ResourceError> {
        self.owned(heap)?;
        for view in views {
            self.owned(&view.resource)?;
        }
        // Heap contents are read at record time; pending command lists keep
        // the views they captured.
        Self::post_failure("write_resource_heap", heap.write(first, views))
    }

    fn create_pipeline_cache(&self, initial_blob: &[u8]) -> PipelineCache {
        PipelineCache::new(self.device.bind(ObjectKind::PipelineCache), initial_blob)
    }

    fn create_pipeline_state(
        &self,
        descriptor: &PipelineDescriptor,
        cache: Option<&PipelineCache>,
    ) -> Result<PipelineState, ResourceError> {
        ensure_pipeline_owned(descriptor, self.device.system())?;
        if let Some(cache) = cache {
            self.owned(cache)?;
        }
        let (report, error) = validate_pipeline_cached(descriptor, &self.capabilities, cache);
        let pipeline = PipelineState::new(
            self.device.bind(ObjectKind::PipelineState),
            descriptor.clone(),
            report,
            error,
        );
        if pipeline.report().has_errors() {
            pipeline
                .report()
                .post(&format!("create_pipeline_state '{}'", pipeline.display_label()));
        }
        Ok(pipeline)
    }

    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPass, ResourceError> {
        Self::post_failure(
            "create_render_pass",
            descriptor.validate(&self.capabilities),
        )?;
        Ok(RenderPass::new(
            self.device.bind(ObjectKind::RenderPass),
            descriptor.clone(),
        ))
    }

    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureRenderTarget, ResourceError> {
        self.owned(&descriptor.render_pass)?;
        for attachment in descriptor
            .color_attachments
            .iter()
            .chain(&descriptor.resolve_attachments)
            .chain(&descriptor.depth_stencil_attachment)
        {
            self.owned(&attachment.texture)?;
        }
        Self::post_failure(
            "create_render_target",
            TextureRenderTarget::new(
                self.device.bind(ObjectKind::RenderTarget),
                descriptor.clone(),
            ),
        )
    }

    fn create_swap_chain(
        &self,
        descriptor: &SwapChainDescriptor,
        surface: Arc<dyn Surface>,
    ) -> Result<Arc<dyn SwapChain>, ResourceError> {
        Self::post_failure(
            "create_swap_chain",
            descriptor.validate(&self.capabilities),
        )?;
        let swap_chain = Self::post_failure(
            "create_swap_chain",
            NullSwapChain::new(
                self.device.clone(),
                Arc::clone(&self.queue),
                descriptor,
                surface,
            ),
        )?;
        Ok(Arc::new(swap_chain))
    }

    fn create_command_buffer(
        &self,
        descriptor: &CommandBufferDescriptor,
    ) -> Result<Box<dyn CommandBuffer>, ResourceError> {
        let flags = descriptor.flags;
        if flags.contains(CommandBufferFlags::SECONDARY | CommandBufferFlags::IMMEDIATE_SUBMIT) {
            return Err(ResourceError::Argument(
                "secondary command buffers cannot be submitted immediately".into(),
            ));
        }
        Ok(Box::new(NullCommandBuffer::new(
            self.device.bind(ObjectKind::CommandBuffer),
            descriptor.label.clone(),
            flags,
            self.capabilities.limits.clone(),
            Arc::clone(&self.queue),
        )))
    }

    fn command_queue(&self) -> Arc<dyn CommandQueue> {
        self.queue.clone()
    }

    fn create_fence(&self) -> Fence {
        Fence::new(self.device.bind(ObjectKind::Fence))
    }

    fn create_query_heap(
        &self,
        descriptor: &QueryHeapDescriptor,
    ) -> Result<QueryHeap, ResourceError> {
        if descriptor.num_queries == 0 {
            return Err(ResourceError::Argument(
                "query heaps need at least one query".into(),
            ));
        }
        Ok(QueryHeap::new(
            self.device.bind(ObjectKind::QueryHeap),
            descriptor.clone(),
        ))
    }

    fn memory_monitor(&self) -> Option<Arc<dyn ResourceMonitor>> {
        Some(self.monitor.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
