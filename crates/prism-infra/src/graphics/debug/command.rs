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

use prism_core::math::Offset3D;
use prism_core::renderer::{
    AttachmentClear, BackendOwned, BindFlags, Buffer, ClearFlags, ClearValue, CommandBuffer,
    CommandBufferFlags, CommandBufferState, CommandError, IndexFormat, Nameable, ObjectKind,
    PipelineKind, PipelineState, QueryHeap, RenderPass, RenderTarget, ResourceHeap, Scissor,
    StencilFace, SystemId, Texture, TextureFormat, TextureRegion, Viewport,
};
use prism_core::telemetry::{ErrorKind, ProfileCommandBufferRecord, RenderingDebugger, WarningKind};
use std::any::Any;
use std::fmt;
use std::time::Instant;

/// What the debug layer knows about the open render pass.
#[derive(Debug, Clone)]
struct PassScope {
    color_formats: Vec<TextureFormat>,
    has_depth: bool,
    has_stencil: bool,
}

/// Bindings mirrored from successful calls, reset by `begin`.
#[derive(Debug, Default)]
struct Shadow {
    pass: Option<PassScope>,
    pipeline: Option<PipelineState>,
    vertex_buffers: usize,
    index_format: Option<IndexFormat>,
}

/// A command buffer wrapper that validates every call before forwarding it.
///
/// Errors are reported to the debugger and returned as
/// [`CommandError::Validation`] without reaching the wrapped buffer. Warnings
/// are reported and the call is forwarded. Errors raised by the wrapped buffer
/// are reported as well. While a capture is open every successful call adds a
/// time record and bumps its counter.
pub struct DebugCommandBuffer {
    inner: Box<dyn CommandBuffer>,
    debugger: RenderingDebugger,
    shadow: Shadow,
}

impl DebugCommandBuffer {
    pub(crate) fn new(inner: Box<dyn CommandBuffer>, debugger: RenderingDebugger) -> Self {
        Self {
            inner,
            debugger,
            shadow: Shadow::default(),
        }
    }

    /// The wrapped command buffer.
    pub fn inner(&self) -> &dyn CommandBuffer {
        self.inner.as_ref()
    }

    fn is_secondary(&self) -> bool {
        self.inner.flags().contains(CommandBufferFlags::SECONDARY)
    }

    fn error(&self, kind: ErrorKind, source: &'static str, text: impl Into<String>) -> CommandError {
        let text = text.into();
        self.debugger.post_error(kind, source, text.clone());
        CommandError::Validation(format!("{source}: {text}"))
    }

    fn warn(&self, kind: WarningKind, source: &'static str, text: impl Into<String>) {
        self.debugger.post_warning(kind, source, text);
    }

    fn forward<T>(
        &mut self,
        source: &'static str,
        call: impl FnOnce(&mut dyn CommandBuffer) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let start = Instant::now();
        let result = call(self.inner.as_mut());
        let end = Instant::now();
        match &result {
            Ok(_) => self.debugger.record_time(source, start, end),
            Err(err) => self
                .debugger
                .post_error(error_kind(err), source, err.to_string()),
        }
        result
    }

    fn count(&self, update: impl FnOnce(&mut ProfileCommandBufferRecord)) {
        self.debugger.record(|profile| update(&mut profile.command_buffer));
    }

    fn check_buffer(
        &self,
        source: &'static str,
        buffer: &Buffer,
        flag: BindFlags,
        usage: &str,
    ) -> Result<(), CommandError> {
        if !buffer.bind_flags().contains(flag) {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                source,
                format!("{} was not created with the {usage} bind flag", buffer_label(buffer)),
            ));
        }
        self.warn_mapped(source, buffer);
        Ok(())
    }

    fn warn_mapped(&self, source: &'static str, buffer: &Buffer) {
        if buffer.is_mapped() {
            self.warn(
                WarningKind::ImproperState,
                source,
                format!("{} is mapped while used in a command", buffer_label(buffer)),
            );
        }
    }

    fn check_range(
        &self,
        source: &'static str,
        buffer: &Buffer,
        offset: u64,
        size: u64,
    ) -> Result<(), CommandError> {
        let end = offset.checked_add(size);
        if end.is_some_and(|end| end <= buffer.size()) {
            Ok(())
        } else {
            Err(self.error(
                ErrorKind::InvalidArgument,
                source,
                format!(
                    "range [{offset}, +{size}) exceeds the {} bytes of {}",
                    buffer.size(),
                    buffer_label(buffer)
                ),
            ))
        }
    }

    fn check_texture_region(
        &self,
        source: &'static str,
        texture: &Texture,
        region: &TextureRegion,
    ) -> Result<(), CommandError> {
        if region.fits(texture.descriptor()) {
            Ok(())
        } else {
            Err(self.error(
                ErrorKind::InvalidArgument,
                source,
                format!("region {region:?} exceeds texture {}", texture.id().0),
            ))
        }
    }

    fn check_vertex_input(&self, source: &'static str) -> Result<(), CommandError> {
        let needs_vertices = self
            .shadow
            .pipeline
            .as_ref()
            .is_some_and(PipelineState::has_vertex_input);
        if needs_vertices && self.shadow.vertex_buffers == 0 {
            return Err(self.error(
                ErrorKind::InvalidState,
                source,
                "the bound pipeline reads vertex attributes but no vertex buffer is bound",
            ));
        }
        Ok(())
    }

    fn check_index_buffer(&self, source: &'static str) -> Result<(), CommandError> {
        if self.shadow.index_format.is_none() {
            return Err(self.error(
                ErrorKind::InvalidState,
                source,
                "indexed draw without a bound index buffer",
            ));
        }
        Ok(())
    }

    fn warn_empty_draw(&self, source: &'static str, num_vertices: u32, num_instances: u32) {
        if num_vertices == 0 {
            self.warn(
                WarningKind::PointlessOperation,
                source,
                "no vertices will be generated",
            );
        }
        if num_instances == 0 {
            self.warn(
                WarningKind::PointlessOperation,
                source,
                "no instances will be generated",
            );
        }
    }

    fn check_pipeline_binding(
        &self,
        source: &'static str,
        pipeline: &PipelineState,
    ) -> Result<(), CommandError> {
        match (pipeline.kind(), &self.shadow.pass) {
            (PipelineKind::Graphics, None) if !self.is_secondary() => Err(self.error(
                ErrorKind::InvalidState,
                source,
                "graphics pipeline must be bound inside a render pass",
            )),
            (PipelineKind::Graphics, Some(pass)) => {
                let formats = pipeline.color_formats();
                if formats.is_empty() || formats == pass.color_formats {
                    return Ok(());
                }
                Err(self.error(
                    ErrorKind::InvalidState,
                    source,
                    format!(
                        "pipeline '{}' renders into {} color targets {:?} but the render pass has {} {:?}",
                        pipeline.display_label(),
                        formats.len(),
                        formats,
                        pass.color_formats.len(),
                        pass.color_formats
                    ),
                ))
            }
            (PipelineKind::Compute, Some(_)) => Err(self.error(
                ErrorKind::InvalidState,
                source,
                "compute pipeline must be bound outside a render pass",
            )),
            _ => Ok(()),
        }
    }

    fn check_clear(&self, source: &'static str, flags: ClearFlags) -> Result<(), CommandError> {
        let Some(pass) = &self.shadow.pass else {
            return Ok(());
        };
        if flags.contains(ClearFlags::DEPTH) && !pass.has_depth {
            return Err(self.error(
                ErrorKind::InvalidState,
                source,
                "cannot clear depth with a render target that has no depth attachment",
            ));
        }
        if flags.contains(ClearFlags::STENCIL) && !pass.has_stencil {
            return Err(self.error(
                ErrorKind::InvalidState,
                source,
                "cannot clear stencil with a render target that has no stencil attachment",
            ));
        }
        Ok(())
    }
}

fn buffer_label(buffer: &Buffer) -> String {
    buffer
        .name()
        .or_else(|| buffer.descriptor().label.clone())
        .map(|label| format!("buffer '{label}'"))
        .unwrap_or_else(|| format!("buffer {}", buffer.id().0))
}

fn error_kind(error: &CommandError) -> ErrorKind {
    match error {
        CommandError::Argument(_) | CommandError::BackendMismatch { .. } => {
            ErrorKind::InvalidArgument
        }
        CommandError::UnusablePipeline(_) => ErrorKind::UndefinedBehavior,
        _ => ErrorKind::InvalidState,
    }
}

impl fmt::Debug for DebugCommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugCommandBuffer")
            .field("inner", &self.inner)
            .field("in_render_pass", &self.shadow.pass.is_some())
            .finish()
    }
}

impl Nameable for DebugCommandBuffer {
    fn set_name(&self, name: Option<&str>) {
        self.inner.set_name(name);
    }

    fn name(&self) -> Option<String> {
        self.inner.name()
    }
}

impl BackendOwned for DebugCommandBuffer {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::CommandBuffer
    }

    fn raw_id(&self) -> usize {
        self.inner.raw_id()
    }

    fn system_id(&self) -> SystemId {
        self.inner.system_id()
    }
}

impl CommandBuffer for DebugCommandBuffer {
    fn state(&self) -> CommandBufferState {
        self.inner.state()
    }

    fn flags(&self) -> CommandBufferFlags {
        self.inner.flags()
    }

    fn begin(&mut self) -> Result<(), CommandError> {
        if self.inner.state() == CommandBufferState::Recording {
            return Err(self.error(
                ErrorKind::InvalidState,
                "begin",
                "cannot begin nested recording of command buffer",
            ));
        }
        self.forward("begin", |cb| cb.begin())?;
        self.shadow = Shadow::default();
        Ok(())
    }

    fn end(&mut self) -> Result<(), CommandError> {
        if self.inner.state() != CommandBufferState::Recording {
            return Err(self.error(
                ErrorKind::InvalidState,
                "end",
                "cannot end recording of command buffer while no recording is active",
            ));
        }
        self.forward("end", |cb| cb.end())?;
        self.count(|c| c.encodings += 1);
        Ok(())
    }

    fn update_buffer(&mut self, dst: &Buffer, offset: u64, data: &[u8]) -> Result<(), CommandError> {
        const SOURCE: &str = "update_buffer";
        self.check_range(SOURCE, dst, offset, data.len() as u64)?;
        self.warn_mapped(SOURCE, dst);
        if data.is_empty() {
            self.warn(WarningKind::PointlessOperation, SOURCE, "no data to update");
        }
        self.forward(SOURCE, |cb| cb.update_buffer(dst, offset, data))?;
        self.count(|c| c.buffer_updates += 1);
        Ok(())
    }

    fn copy_buffer(
        &mut self,
        dst: &Buffer,
        dst_offset: u64,
        src: &Buffer,
        src_offset: u64,
        size: u64,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "copy_buffer";
        self.check_range(SOURCE, dst, dst_offset, size)?;
        self.check_range(SOURCE, src, src_offset, size)?;
        if dst == src && src_offset < dst_offset + size && dst_offset < src_offset + size {
            return Err(self.error(
                ErrorKind::UndefinedBehavior,
                SOURCE,
                "source and destination ranges overlap",
            ));
        }
        self.warn_mapped(SOURCE, dst);
        self.warn_mapped(SOURCE, src);
        self.forward(SOURCE, |cb| cb.copy_buffer(dst, dst_offset, src, src_offset, size))?;
        self.count(|c| c.buffer_copies += 1);
        Ok(())
    }

    fn copy_buffer_from_texture(
        &mut self,
        dst: &Buffer,
        dst_offset: u64,
        src: &Texture,
        src_region: &TextureRegion,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "copy_buffer_from_texture";
        self.check_texture_region(SOURCE, src, src_region)?;
        self.check_range(SOURCE, dst, dst_offset, src_region.byte_size(src.format()))?;
        self.warn_mapped(SOURCE, dst);
        self.forward(SOURCE, |cb| {
            cb.copy_buffer_from_texture(dst, dst_offset, src, src_region)
        })?;
        self.count(|c| c.buffer_copies += 1);
        Ok(())
    }

    fn copy_texture_from_buffer(
        &mut self,
        dst: &Texture,
        dst_region: &TextureRegion,
        src: &Buffer,
        src_offset: u64,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "copy_texture_from_buffer";
        self.check_texture_region(SOURCE, dst, dst_region)?;
        self.check_range(SOURCE, src, src_offset, dst_region.byte_size(dst.format()))?;
        self.warn_mapped(SOURCE, src);
        self.forward(SOURCE, |cb| {
            cb.copy_texture_from_buffer(dst, dst_region, src, src_offset)
        })?;
        self.count(|c| c.buffer_copies += 1);
        Ok(())
    }

    fn copy_texture(
        &mut self,
        dst: &Texture,
        dst_mip_level: u32,
        dst_array_layer: u32,
        dst_offset: Offset3D,
        src: &Texture,
        src_region: &TextureRegion,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "copy_texture";
        self.check_texture_region(SOURCE, src, src_region)?;
        if src.format().bytes_per_pixel() != dst.format().bytes_per_pixel() {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                format!(
                    "cannot copy between formats of different texel size ({:?} and {:?})",
                    src.format(),
                    dst.format()
                ),
            ));
        }
        self.forward(SOURCE, |cb| {
            cb.copy_texture(dst, dst_mip_level, dst_array_layer, dst_offset, src, src_region)
        })?;
        self.count(|c| c.texture_copies += 1);
        Ok(())
    }

    fn fill_buffer(
        &mut self,
        dst: &Buffer,
        offset: u64,
        value: u32,
        size: u64,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "fill_buffer";
        let resolved = dst.descriptor().resolve_range(offset, size);
        match resolved {
            Some(range) if (range.end - range.start) % 4 != 0 => {
                return Err(self.error(
                    ErrorKind::InvalidArgument,
                    SOURCE,
                    "buffer fill size is not a multiple of 4",
                ))
            }
            Some(_) => {}
            None => {
                return Err(self.error(
                    ErrorKind::InvalidArgument,
                    SOURCE,
                    format!("fill range exceeds the {} bytes of {}", dst.size(), buffer_label(dst)),
                ))
            }
        }
        self.warn_mapped(SOURCE, dst);
        self.forward(SOURCE, |cb| cb.fill_buffer(dst, offset, value, size))?;
        self.count(|c| c.buffer_fills += 1);
        Ok(())
    }

    fn generate_mips(&mut self, texture: &Texture) -> Result<(), CommandError> {
        if texture.mip_levels() <= 1 {
            self.warn(
                WarningKind::PointlessOperation,
                "generate_mips",
                format!("texture {} has a single mip level", texture.id().0),
            );
        }
        self.forward("generate_mips", |cb| cb.generate_mips(texture))?;
        self.count(|c| c.mip_generations += 1);
        Ok(())
    }

    fn resource_barrier(
        &mut self,
        buffers: &[Buffer],
        textures: &[Texture],
    ) -> Result<(), CommandError> {
        if self.shadow.pass.is_some() {
            return Err(self.error(
                ErrorKind::InvalidState,
                "resource_barrier",
                "cannot insert a resource barrier inside a render pass",
            ));
        }
        if buffers.is_empty() && textures.is_empty() {
            self.warn(
                WarningKind::PointlessOperation,
                "resource_barrier",
                "no resources are specified",
            );
        }
        self.forward("resource_barrier", |cb| cb.resource_barrier(buffers, textures))?;
        self.count(|c| c.resource_barriers += 1);
        Ok(())
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<(), CommandError> {
        const SOURCE: &str = "set_viewports";
        if viewports.is_empty() {
            self.warn(WarningKind::PointlessOperation, SOURCE, "no viewports are specified");
        }
        for viewport in viewports {
            if viewport.width < 0.0 || viewport.height < 0.0 {
                return Err(self.error(
                    ErrorKind::UndefinedBehavior,
                    SOURCE,
                    "viewport of negative width or negative height",
                ));
            }
            if viewport.width == 0.0 || viewport.height == 0.0 {
                self.warn(
                    WarningKind::PointlessOperation,
                    SOURCE,
                    "viewport of empty size (width or height is zero)",
                );
            }
        }
        self.forward(SOURCE, |cb| cb.set_viewports(viewports))
    }

    fn set_scissors(&mut self, scissors: &[Scissor]) -> Result<(), CommandError> {
        if scissors.is_empty() {
            self.warn(
                WarningKind::PointlessOperation,
                "set_scissors",
                "no scissor rectangles are specified",
            );
        }
        self.forward("set_scissors", |cb| cb.set_scissors(scissors))
    }

    fn set_vertex_buffers(&mut self, buffers: &[Buffer]) -> Result<(), CommandError> {
        const SOURCE: &str = "set_vertex_buffers";
        for buffer in buffers {
            self.check_buffer(SOURCE, buffer, BindFlags::VERTEX_BUFFER, "VERTEX_BUFFER")?;
        }
        self.forward(SOURCE, |cb| cb.set_vertex_buffers(buffers))?;
        self.shadow.vertex_buffers = buffers.len();
        self.count(|c| c.vertex_buffer_bindings += 1);
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: &Buffer,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "set_index_buffer";
        self.check_buffer(SOURCE, buffer, BindFlags::INDEX_BUFFER, "INDEX_BUFFER")?;
        if offset % format.size() != 0 {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                format!("index buffer offset {offset} is not aligned to {format:?}"),
            ));
        }
        self.forward(SOURCE, |cb| cb.set_index_buffer(buffer, format, offset))?;
        self.shadow.index_format = Some(format);
        self.count(|c| c.index_buffer_bindings += 1);
        Ok(())
    }

    fn set_resource_heap(
        &mut self,
        heap: &ResourceHeap,
        descriptor_set: u32,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "set_resource_heap";
        let num_sets = heap.num_descriptor_sets();
        if descriptor_set >= num_sets {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                format!("descriptor set {descriptor_set} is out of range for a heap with {num_sets} sets"),
            ));
        }
        if !heap.is_set_complete(descriptor_set) {
            self.warn(
                WarningKind::ImproperState,
                SOURCE,
                format!("descriptor set {descriptor_set} has unwritten views"),
            );
        }
        for resource in heap.views().into_iter().flatten().map(|view| view.resource) {
            if let Some(buffer) = resource.as_buffer() {
                self.warn_mapped(SOURCE, buffer);
            }
        }
        self.forward(SOURCE, |cb| cb.set_resource_heap(heap, descriptor_set))?;
        self.count(|c| c.resource_heap_bindings += 1);
        Ok(())
    }

    fn set_pipeline_state(&mut self, pipeline: &PipelineState) -> Result<(), CommandError> {
        const SOURCE: &str = "set_pipeline_state";
        self.check_pipeline_binding(SOURCE, pipeline)?;
        self.forward(SOURCE, |cb| cb.set_pipeline_state(pipeline))?;
        match pipeline.kind() {
            PipelineKind::Graphics => self.count(|c| c.graphics_pipeline_bindings += 1),
            PipelineKind::Compute => self.count(|c| c.compute_pipeline_bindings += 1),
        }
        self.shadow.pipeline = Some(pipeline.clone());
        Ok(())
    }

    fn set_blend_factor(&mut self, color: [f32; 4]) -> Result<(), CommandError> {
        self.forward("set_blend_factor", |cb| cb.set_blend_factor(color))
    }

    fn set_stencil_reference(
        &mut self,
        reference: u32,
        face: StencilFace,
    ) -> Result<(), CommandError> {
        self.forward("set_stencil_reference", |cb| {
            cb.set_stencil_reference(reference, face)
        })
    }

    fn set_uniforms(&mut self, first: u32, data: &[u8]) -> Result<(), CommandError> {
        const SOURCE: &str = "set_uniforms";
        let Some(pipeline) = &self.shadow.pipeline else {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                "cannot set uniforms without pipeline state",
            ));
        };
        let available = pipeline
            .pipeline_layout()
            .map_or(0, |layout| layout.descriptor().uniform_bytes());
        let end = u64::from(first) + data.len() as u64;
        if end > u64::from(available) {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                format!(
                    "uniform range [{first}, {end}) exceeds the {available} bytes declared by the pipeline layout"
                ),
            ));
        }
        self.forward(SOURCE, |cb| cb.set_uniforms(first, data))?;
        self.count(|c| c.uniform_updates += 1);
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        target: &dyn RenderTarget,
        render_pass: Option<&RenderPass>,
        clear_values: &[ClearValue],
        swap_buffer_index: Option<u32>,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "begin_render_pass";
        if self.shadow.pass.is_some() {
            return Err(self.error(
                ErrorKind::InvalidState,
                SOURCE,
                "cannot begin new render pass while previous render pass is still active",
            ));
        }
        if let (Some(index), Some(swap_chain)) = (swap_buffer_index, target.as_swap_chain()) {
            let count = swap_chain.num_swap_buffers();
            if index >= count {
                return Err(self.error(
                    ErrorKind::InvalidArgument,
                    SOURCE,
                    format!("swap buffer index {index} is out of range for {count} buffers"),
                ));
            }
        }
        let pass = render_pass.cloned().unwrap_or_else(|| target.render_pass());
        let expected = pass.descriptor().num_clear_values();
        if !clear_values.is_empty() && clear_values.len() != expected {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                format!(
                    "{} clear values given but the render pass clears {expected} attachments",
                    clear_values.len()
                ),
            ));
        }
        self.forward(SOURCE, |cb| {
            cb.begin_render_pass(target, render_pass, clear_values, swap_buffer_index)
        })?;
        self.shadow.pass = Some(PassScope {
            color_formats: pass.descriptor().color_formats(),
            has_depth: target.has_depth_attachment(),
            has_stencil: target.has_stencil_attachment(),
        });
        self.count(|c| c.render_pass_sections += 1);
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<(), CommandError> {
        if self.shadow.pass.is_none() {
            return Err(self.error(
                ErrorKind::InvalidState,
                "end_render_pass",
                "cannot end render pass while no render pass is currently active",
            ));
        }
        self.forward("end_render_pass", |cb| cb.end_render_pass())?;
        self.shadow.pass = None;
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags, value: &ClearValue) -> Result<(), CommandError> {
        self.check_clear("clear", flags)?;
        if flags.is_empty() {
            self.warn(WarningKind::PointlessOperation, "clear", "no attachments are selected");
        }
        self.forward("clear", |cb| cb.clear(flags, value))?;
        self.count(|c| c.attachment_clears += 1);
        Ok(())
    }

    fn clear_attachments(&mut self, clears: &[AttachmentClear]) -> Result<(), CommandError> {
        const SOURCE: &str = "clear_attachments";
        for clear in clears {
            if clear.flags.contains(ClearFlags::COLOR) && clear.flags.intersects(ClearFlags::DEPTH_STENCIL) {
                return Err(self.error(
                    ErrorKind::InvalidArgument,
                    SOURCE,
                    "cannot have color attachment and depth-stencil attachment within a single attachment clear",
                ));
            }
            self.check_clear(SOURCE, clear.flags)?;
        }
        self.forward(SOURCE, |cb| cb.clear_attachments(clears))?;
        let n = clears.len() as u32;
        self.count(|c| c.attachment_clears += n);
        Ok(())
    }

    fn draw(&mut self, num_vertices: u32, first_vertex: u32) -> Result<(), CommandError> {
        self.check_vertex_input("draw")?;
        self.warn_empty_draw("draw", num_vertices, 1);
        self.forward("draw", |cb| cb.draw(num_vertices, first_vertex))?;
        self.count(|c| c.draw_commands += 1);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        num_indices: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "draw_indexed";
        self.check_index_buffer(SOURCE)?;
        self.check_vertex_input(SOURCE)?;
        self.warn_empty_draw(SOURCE, num_indices, 1);
        self.forward(SOURCE, |cb| cb.draw_indexed(num_indices, first_index, vertex_offset))?;
        self.count(|c| c.draw_commands += 1);
        Ok(())
    }

    fn draw_instanced(
        &mut self,
        num_vertices: u32,
        first_vertex: u32,
        num_instances: u32,
        first_instance: u32,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "draw_instanced";
        self.check_vertex_input(SOURCE)?;
        self.warn_empty_draw(SOURCE, num_vertices, num_instances);
        self.forward(SOURCE, |cb| {
            cb.draw_instanced(num_vertices, first_vertex, num_instances, first_instance)
        })?;
        self.count(|c| c.draw_commands += 1);
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        num_indices: u32,
        num_instances: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "draw_indexed_instanced";
        self.check_index_buffer(SOURCE)?;
        self.check_vertex_input(SOURCE)?;
        self.warn_empty_draw(SOURCE, num_indices, num_instances);
        self.forward(SOURCE, |cb| {
            cb.draw_indexed_instanced(
                num_indices,
                num_instances,
                first_index,
                vertex_offset,
                first_instance,
            )
        })?;
        self.count(|c| c.draw_commands += 1);
        Ok(())
    }

    fn draw_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "draw_indirect";
        self.check_buffer(SOURCE, buffer, BindFlags::INDIRECT_BUFFER, "INDIRECT_BUFFER")?;
        self.check_vertex_input(SOURCE)?;
        self.forward(SOURCE, |cb| cb.draw_indirect(buffer, offset, num_commands, stride))?;
        self.count(|c| c.draw_commands += 1);
        Ok(())
    }

    fn draw_indexed_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        const SOURCE: &str = "draw_indexed_indirect";
        self.check_buffer(SOURCE, buffer, BindFlags::INDIRECT_BUFFER, "INDIRECT_BUFFER")?;
        self.check_index_buffer(SOURCE)?;
        self.check_vertex_input(SOURCE)?;
        self.forward(SOURCE, |cb| {
            cb.draw_indexed_indirect(buffer, offset, num_commands, stride)
        })?;
        self.count(|c| c.draw_commands += 1);
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), CommandError> {
        if x == 0 || y == 0 || z == 0 {
            self.warn(
                WarningKind::PointlessOperation,
                "dispatch",
                "thread group size has volume of 0 units",
            );
        }
        self.forward("dispatch", |cb| cb.dispatch(x, y, z))?;
        self.count(|c| c.dispatch_commands += 1);
        Ok(())
    }

    fn dispatch_indirect(&mut self, buffer: &Buffer, offset: u64) -> Result<(), CommandError> {
        const SOURCE: &str = "dispatch_indirect";
        self.check_buffer(SOURCE, buffer, BindFlags::INDIRECT_BUFFER, "INDIRECT_BUFFER")?;
        self.forward(SOURCE, |cb| cb.dispatch_indirect(buffer, offset))?;
        self.count(|c| c.dispatch_commands += 1);
        Ok(())
    }

    fn begin_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        self.forward("begin_query", |cb| cb.begin_query(heap, index))?;
        self.count(|c| c.query_sections += 1);
        Ok(())
    }

    fn end_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        self.forward("end_query", |cb| cb.end_query(heap, index))
    }

    fn push_debug_group(&mut self, name: &str) -> Result<(), CommandError> {
        self.forward("push_debug_group", |cb| cb.push_debug_group(name))
    }

    fn pop_debug_group(&mut self) -> Result<(), CommandError> {
        self.forward("pop_debug_group", |cb| cb.pop_debug_group())
    }

    fn execute(&mut self, secondary: &dyn CommandBuffer) -> Result<(), CommandError> {
        const SOURCE: &str = "execute";
        if secondary.raw_id() == self.raw_id() && secondary.system_id() == self.system_id() {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                "command buffer tried to execute itself",
            ));
        }
        if !secondary.flags().contains(CommandBufferFlags::SECONDARY) {
            return Err(self.error(
                ErrorKind::InvalidArgument,
                SOURCE,
                "only command buffers created with SECONDARY can be executed",
            ));
        }
        self.forward(SOURCE, |cb| cb.execute(secondary))?;
        self.count(|c| c.secondary_executions += 1);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self.inner.as_any_mut()
    }
}
