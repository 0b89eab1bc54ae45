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

//! Null backend command buffers: structural checks plus a recorded command list.

use super::queue::NullCommandQueue;
use super::swap_chain::NullSwapChain;
use prism_core::math::{Extent2D, Extent3D, Offset3D};
use prism_core::renderer::{
    AttachmentClear, AttachmentDescriptor, BackendBinding, BackendOwned, Buffer, ClearFlags,
    ClearValue, CommandBuffer, CommandBufferFlags, CommandBufferState, CommandError, IndexFormat,
    LoadOp, MiscFlags, Nameable, ObjectCore, ObjectKind, PipelineState, QueryHeap,
    QueueTimeline, RecordingState, RenderPass, RenderTarget, RenderingLimits, ResourceHeap,
    Scissor, StencilFace, SystemId, Texture, TextureRegion, TextureRenderTarget,
    SwapChain, TextureSubresource, Viewport,
};
use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Byte size of the arguments of one non-indexed indirect draw.
pub(crate) const DRAW_INDIRECT_SIZE: u64 = 16;
/// Byte size of the arguments of one indexed indirect draw.
pub(crate) const DRAW_INDEXED_INDIRECT_SIZE: u64 = 20;
/// Byte size of the arguments of one indirect dispatch.
pub(crate) const DISPATCH_INDIRECT_SIZE: u64 = 12;

/// One subresource of a texture used as a render-pass attachment.
#[derive(Debug, Clone)]
pub(crate) struct AttachmentView {
    pub texture: Texture,
    pub mip_level: u32,
    pub array_layer: u32,
}

impl AttachmentView {
    pub fn whole(texture: Texture) -> Self {
        Self {
            texture,
            mip_level: 0,
            array_layer: 0,
        }
    }

    /// The region of the view covering `area`.
    pub fn region(&self, area: Extent2D) -> TextureRegion {
        TextureRegion {
            subresource: TextureSubresource {
                base_array_layer: self.array_layer,
                num_array_layers: 1,
                base_mip_level: self.mip_level,
                num_mip_levels: 1,
            },
            offset: Offset3D::default(),
            extent: Extent3D::new(area.width, area.height, 1),
        }
    }
}

impl From<&AttachmentDescriptor> for AttachmentView {
    fn from(attachment: &AttachmentDescriptor) -> Self {
        Self {
            texture: attachment.texture.clone(),
            mip_level: attachment.mip_level,
            array_layer: attachment.array_layer,
        }
    }
}

/// The concrete attachments of an open render pass.
#[derive(Debug, Clone)]
pub(crate) struct PassTargets {
    pub resolution: Extent2D,
    pub colors: Vec<AttachmentView>,
    pub resolves: Vec<AttachmentView>,
    pub depth_stencil: Option<AttachmentView>,
}

/// A recorded command, executed later by the queue worker.
#[derive(Debug, Clone)]
pub(crate) enum Command {
    UpdateBuffer {
        dst: Buffer,
        offset: u64,
        data: Vec<u8>,
    },
    CopyBuffer {
        dst: Buffer,
        dst_offset: u64,
        src: Buffer,
        src_offset: u64,
        size: u64,
    },
    CopyBufferFromTexture {
        dst: Buffer,
        dst_offset: u64,
        src: Texture,
        region: TextureRegion,
    },
    CopyTextureFromBuffer {
        dst: Texture,
        region: TextureRegion,
        src: Buffer,
        src_offset: u64,
    },
    CopyTexture {
        dst: Texture,
        dst_region: TextureRegion,
        src: Texture,
        src_region: TextureRegion,
    },
    FillBuffer {
        dst: Buffer,
        range: Range<u64>,
        value: u32,
    },
    GenerateMips {
        texture: Texture,
    },
    BeginRenderPass {
        targets: PassTargets,
    },
    EndRenderPass,
    /// Clears attachments of the open pass. `color: None` selects every color attachment.
    Clear {
        color: Option<u32>,
        flags: ClearFlags,
        value: ClearValue,
    },
    Draw {
        vertices: u64,
        instances: u64,
    },
    DrawIndirect {
        buffer: Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
        indexed: bool,
    },
    Dispatch {
        groups: [u32; 3],
    },
    DispatchIndirect {
        buffer: Buffer,
        offset: u64,
    },
    BeginQuery {
        heap: QueryHeap,
        index: u32,
    },
    EndQuery {
        heap: QueryHeap,
        index: u32,
    },
    Execute(Vec<Command>),
}

/// A command buffer of the Null backend.
///
/// Recording only validates and appends to a command list. Nothing touches
/// resource memory until the list runs on the queue worker.
pub struct NullCommandBuffer {
    core: ObjectCore,
    recording: RecordingState,
    commands: Vec<Command>,
    limits: RenderingLimits,
    immediate: Option<Arc<NullCommandQueue>>,
}

impl NullCommandBuffer {
    pub(crate) fn new(
        binding: BackendBinding,
        label: Option<String>,
        flags: CommandBufferFlags,
        limits: RenderingLimits,
        queue: Arc<NullCommandQueue>,
    ) -> Self {
        let immediate = flags
            .contains(CommandBufferFlags::IMMEDIATE_SUBMIT)
            .then_some(queue);
        Self {
            core: ObjectCore::new(binding, label),
            recording: RecordingState::new(flags),
            commands: Vec::new(),
            limits,
            immediate,
        }
    }

    /// The number of commands recorded since `begin`.
    pub fn num_commands(&self) -> usize {
        self.commands.len()
    }

    /// Checks that the buffer can be submitted and hands out its command list.
    ///
    /// Multi-submit buffers keep their list for later submissions.
    pub(crate) fn prepare_submit(&mut self) -> Result<Vec<Command>, CommandError> {
        self.recording.check_submit()?;
        if self.recording.flags().contains(CommandBufferFlags::MULTI_SUBMIT) {
            Ok(self.commands.clone())
        } else {
            Ok(std::mem::take(&mut self.commands))
        }
    }

    pub(crate) fn mark_pending(&mut self, timeline: &QueueTimeline, ticket: u64) {
        self.recording.mark_pending(timeline, ticket);
    }

    fn owned<T: BackendOwned + ?Sized>(&self, object: &T) -> Result<(), CommandError> {
        if object.system_id() == self.system_id() {
            Ok(())
        } else {
            Err(CommandError::BackendMismatch {
                kind: object.object_kind(),
            })
        }
    }

    fn buffer_range(buffer: &Buffer, offset: u64, size: u64) -> Result<Range<u64>, CommandError> {
        buffer.descriptor().resolve_range(offset, size).ok_or_else(|| {
            CommandError::Argument(format!(
                "range [{offset}, +{size}) exceeds buffer of {} bytes",
                buffer.size()
            ))
        })
    }

    fn texture_region(texture: &Texture, region: &TextureRegion) -> Result<(), CommandError> {
        if region.fits(texture.descriptor()) {
            Ok(())
        } else {
            Err(CommandError::Argument(format!(
                "region {region:?} is outside of the texture"
            )))
        }
    }

    fn resolve_targets(
        target: &dyn RenderTarget,
        swap_buffer_index: Option<u32>,
    ) -> Result<PassTargets, CommandError> {
        let any = target.as_any();
        if let Some(render_target) = any.downcast_ref::<TextureRenderTarget>() {
            let desc = render_target.descriptor();
            return Ok(PassTargets {
                resolution: desc.resolution,
                colors: desc.color_attachments.iter().map(AttachmentView::from).collect(),
                resolves: desc
                    .resolve_attachments
                    .iter()
                    .map(AttachmentView::from)
                    .collect(),
                depth_stencil: desc.depth_stencil_attachment.as_ref().map(AttachmentView::from),
            });
        }
        if let Some(swap_chain) = any.downcast_ref::<NullSwapChain>() {
            let index = swap_buffer_index.unwrap_or_else(|| swap_chain.current_swap_index());
            let image = swap_chain.image(index).ok_or_else(|| {
                CommandError::Argument(format!("swap chain has no image {index}"))
            })?;
            return Ok(PassTargets {
                resolution: target.resolution(),
                colors: vec![AttachmentView::whole(image.color)],
                resolves: Vec::new(),
                depth_stencil: image.depth_stencil.map(AttachmentView::whole),
            });
        }
        Err(CommandError::BackendMismatch {
            kind: target.object_kind(),
        })
    }

    fn record_draw(&mut self, operation: &'static str, vertices: u32, instances: u32) -> Result<(), CommandError> {
        self.recording.check_draw(operation)?;
        self.commands.push(Command::Draw {
            vertices: u64::from(vertices),
            instances: u64::from(instances),
        });
        Ok(())
    }

    fn record_indirect_draw(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
        indexed: bool,
    ) -> Result<(), CommandError> {
        let operation = if indexed { "draw indexed indirect" } else { "draw indirect" };
        self.recording.check_draw(operation)?;
        self.owned(buffer)?;
        let args = if indexed {
            DRAW_INDEXED_INDIRECT_SIZE
        } else {
            DRAW_INDIRECT_SIZE
        };
        if num_commands > 0 {
            let span = u64::from(num_commands - 1) * u64::from(stride) + args;
            Self::buffer_range(buffer, offset, span)?;
        }
        self.commands.push(Command::DrawIndirect {
            buffer: buffer.clone(),
            offset,
            num_commands,
            stride,
            indexed,
        });
        Ok(())
    }
}

impl Nameable for NullCommandBuffer {
    fn set_name(&self, name: Option<&str>) {
        self.core.set_name(name);
    }

    fn name(&self) -> Option<String> {
        self.core.name()
    }
}

impl BackendOwned for NullCommandBuffer {
    fn object_kind(&self) -> ObjectKind {
        self.core.binding().kind()
    }

    fn raw_id(&self) -> usize {
        self.core.binding().id()
    }

    fn system_id(&self) -> SystemId {
        self.core.binding().system()
    }
}

impl fmt::Debug for NullCommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullCommandBuffer")
            .field("id", &self.raw_id())
            .field("state", &self.recording.state())
            .field("flags", &self.recording.flags())
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl CommandBuffer for NullCommandBuffer {
    fn state(&self) -> CommandBufferState {
        self.recording.state()
    }

    fn flags(&self) -> CommandBufferFlags {
        self.recording.flags()
    }

    fn begin(&mut self) -> Result<(), CommandError> {
        self.recording.begin()?;
        self.commands.clear();
        Ok(())
    }

    fn end(&mut self) -> Result<(), CommandError> {
        self.recording.end()?;
        if let Some(queue) = self.immediate.clone() {
            queue.submit_null(self)?;
        }
        Ok(())
    }

    fn update_buffer(&mut self, dst: &Buffer, offset: u64, data: &[u8]) -> Result<(), CommandError> {
        self.recording.check_transfer("update a buffer")?;
        self.owned(dst)?;
        Self::buffer_range(dst, offset, data.len() as u64)?;
        self.commands.push(Command::UpdateBuffer {
            dst: dst.clone(),
            offset,
            data: data.to_vec(),
        });
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
        self.recording.check_transfer("copy a buffer")?;
        self.owned(dst)?;
        self.owned(src)?;
        let range = Self::buffer_range(src, src_offset, size)?;
        let size = range.end - range.start;
        Self::buffer_range(dst, dst_offset, size)?;
        self.commands.push(Command::CopyBuffer {
            dst: dst.clone(),
            dst_offset,
            src: src.clone(),
            src_offset,
            size,
        });
        Ok(())
    }

    fn copy_buffer_from_texture(
        &mut self,
        dst: &Buffer,
        dst_offset: u64,
        src: &Texture,
        src_region: &TextureRegion,
    ) -> Result<(), CommandError> {
        self.recording.check_transfer("copy a texture into a buffer")?;
        self.owned(dst)?;
        self.owned(src)?;
        Self::texture_region(src, src_region)?;
        Self::buffer_range(dst, dst_offset, src_region.byte_size(src.format()))?;
        self.commands.push(Command::CopyBufferFromTexture {
            dst: dst.clone(),
            dst_offset,
            src: src.clone(),
            region: *src_region,
        });
        Ok(())
    }

    fn copy_texture_from_buffer(
        &mut self,
        dst: &Texture,
        dst_region: &TextureRegion,
        src: &Buffer,
        src_offset: u64,
    ) -> Result<(), CommandError> {
        self.recording.check_transfer("copy a buffer into a texture")?;
        self.owned(dst)?;
        self.owned(src)?;
        Self::texture_region(dst, dst_region)?;
        Self::buffer_range(src, src_offset, dst_region.byte_size(dst.format()))?;
        self.commands.push(Command::CopyTextureFromBuffer {
            dst: dst.clone(),
            region: *dst_region,
            src: src.clone(),
            src_offset,
        });
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
        self.recording.check_transfer("copy a texture")?;
        self.owned(dst)?;
        self.owned(src)?;
        if dst.format().bytes_per_pixel() != src.format().bytes_per_pixel() {
            return Err(CommandError::Argument(format!(
                "cannot copy {:?} texels into a {:?} texture",
                src.format(),
                dst.format()
            )));
        }
        Self::texture_region(src, src_region)?;
        let dst_region = TextureRegion {
            subresource: TextureSubresource {
                base_array_layer: dst_array_layer,
                num_array_layers: src_region.subresource.num_array_layers,
                base_mip_level: dst_mip_level,
                num_mip_levels: 1,
            },
            offset: dst_offset,
            extent: src_region.extent,
        };
        Self::texture_region(dst, &dst_region)?;
        self.commands.push(Command::CopyTexture {
            dst: dst.clone(),
            dst_region,
            src: src.clone(),
            src_region: *src_region,
        });
        Ok(())
    }

    fn fill_buffer(
        &mut self,
        dst: &Buffer,
        offset: u64,
        value: u32,
        size: u64,
    ) -> Result<(), CommandError> {
        self.recording.check_transfer("fill a buffer")?;
        self.owned(dst)?;
        let range = Self::buffer_range(dst, offset, size)?;
        self.commands.push(Command::FillBuffer {
            dst: dst.clone(),
            range,
            value,
        });
        Ok(())
    }

    fn generate_mips(&mut self, texture: &Texture) -> Result<(), CommandError> {
        self.recording.check_transfer("generate mips")?;
        self.owned(texture)?;
        let desc = texture.descriptor();
        if !desc.misc_flags.contains(MiscFlags::GENERATE_MIPS) {
            return Err(CommandError::Argument(
                "texture was not created with GENERATE_MIPS".into(),
            ));
        }
        if desc.ty.is_multisample() {
            return Err(CommandError::Argument(
                "multisample textures have no mip chain".into(),
            ));
        }
        self.commands.push(Command::GenerateMips {
            texture: texture.clone(),
        });
        Ok(())
    }

    fn resource_barrier(
        &mut self,
        buffers: &[Buffer],
        textures: &[Texture],
    ) -> Result<(), CommandError> {
        self.recording.check_transfer("insert a resource barrier")?;
        for buffer in buffers {
            self.owned(buffer)?;
        }
        for texture in textures {
            self.owned(texture)?;
        }
        // Commands run in recorded order on a single worker.
        Ok(())
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<(), CommandError> {
        let max = self.limits.max_viewports as usize;
        let bindings = self.recording.bind("set viewports")?;
        if viewports.len() > max {
            return Err(CommandError::Argument(format!(
                "{} viewports exceed the limit of {max}",
                viewports.len()
            )));
        }
        bindings.viewports = viewports.to_vec();
        Ok(())
    }

    fn set_scissors(&mut self, scissors: &[Scissor]) -> Result<(), CommandError> {
        let max = self.limits.max_viewports as usize;
        let bindings = self.recording.bind("set scissors")?;
        if scissors.len() > max {
            return Err(CommandError::Argument(format!(
                "{} scissors exceed the limit of {max}",
                scissors.len()
            )));
        }
        bindings.scissors = scissors.to_vec();
        Ok(())
    }

    fn set_vertex_buffers(&mut self, buffers: &[Buffer]) -> Result<(), CommandError> {
        for buffer in buffers {
            self.owned(buffer)?;
        }
        self.recording.bind("set vertex buffers")?.vertex_buffers = buffers.to_vec();
        Ok(())
    }

    fn set_index_buffer(
        &mut self,
        buffer: &Buffer,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), CommandError> {
        self.owned(buffer)?;
        let bindings = self.recording.bind("set an index buffer")?;
        if offset >= buffer.size() {
            return Err(CommandError::Argument(format!(
                "index buffer offset {offset} is past the end of the buffer"
            )));
        }
        bindings.index_buffer = Some((buffer.clone(), format, offset));
        Ok(())
    }

    fn set_resource_heap(
        &mut self,
        heap: &ResourceHeap,
        descriptor_set: u32,
    ) -> Result<(), CommandError> {
        self.owned(heap)?;
        let bindings = self.recording.bind("set a resource heap")?;
        if descriptor_set >= heap.num_descriptor_sets() {
            return Err(CommandError::Argument(format!(
                "descriptor set {descriptor_set} is out of range for {} sets",
                heap.num_descriptor_sets()
            )));
        }
        bindings.resource_heap = Some((heap.clone(), descriptor_set));
        Ok(())
    }

    fn set_pipeline_state(&mut self, pipeline: &PipelineState) -> Result<(), CommandError> {
        self.owned(pipeline)?;
        self.recording.set_pipeline_state(pipeline)
    }

    fn set_blend_factor(&mut self, color: [f32; 4]) -> Result<(), CommandError> {
        self.recording.bind("set the blend factor")?.blend_factor = color;
        Ok(())
    }

    fn set_stencil_reference(
        &mut self,
        reference: u32,
        face: StencilFace,
    ) -> Result<(), CommandError> {
        self.recording
            .bind("set the stencil reference")?
            .set_stencil_reference(reference, face);
        Ok(())
    }

    fn set_uniforms(&mut self, _first: u32, data: &[u8]) -> Result<(), CommandError> {
        const OP: &str = "set uniforms";
        let bindings = self.recording.bind(OP)?;
        if bindings.pipeline.is_none() {
            return Err(CommandError::NoPipelineBound(OP));
        }
        if data.len() % 4 != 0 {
            return Err(CommandError::Argument(format!(
                "uniform data of {} bytes is not a multiple of 4",
                data.len()
            )));
        }
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        target: &dyn RenderTarget,
        render_pass: Option<&RenderPass>,
        clear_values: &[ClearValue],
        swap_buffer_index: Option<u32>,
    ) -> Result<(), CommandError> {
        self.owned(target)?;
        if let Some(pass) = render_pass {
            self.owned(pass)?;
        }
        let active = self
            .recording
            .begin_render_pass(target, render_pass, clear_values, swap_buffer_index)?
            .clone();
        let targets = match Self::resolve_targets(target, active.swap_buffer_index) {
            Ok(targets) => targets,
            Err(err) => {
                self.recording.end_render_pass()?;
                return Err(err);
            }
        };
        self.commands.push(Command::BeginRenderPass { targets });

        let pass = active.render_pass.descriptor();
        let mut values = clear_values.iter().copied();
        let mut next_value = || values.next().unwrap_or_default();
        for (index, attachment) in pass.color_attachments.iter().enumerate() {
            if attachment.load_op == LoadOp::Clear {
                self.commands.push(Command::Clear {
                    color: Some(index as u32),
                    flags: ClearFlags::COLOR,
                    value: next_value(),
                });
            }
        }
        if pass.clears_depth_stencil() {
            let mut flags = ClearFlags::empty();
            if pass.depth_attachment.is_some_and(|a| a.load_op == LoadOp::Clear) {
                flags |= ClearFlags::DEPTH;
            }
            if pass.stencil_attachment.is_some_and(|a| a.load_op == LoadOp::Clear) {
                flags |= ClearFlags::STENCIL;
            }
            self.commands.push(Command::Clear {
                color: None,
                flags,
                value: next_value(),
            });
        }
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<(), CommandError> {
        self.recording.end_render_pass()?;
        self.commands.push(Command::EndRenderPass);
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags, value: &ClearValue) -> Result<(), CommandError> {
        self.recording.check_in_pass("clear attachments")?;
        self.commands.push(Command::Clear {
            color: None,
            flags,
            value: *value,
        });
        Ok(())
    }

    fn clear_attachments(&mut self, clears: &[AttachmentClear]) -> Result<(), CommandError> {
        self.recording.check_in_pass("clear attachments")?;
        let num_colors = self
            .recording
            .active_pass()
            .map(|pass| pass.num_color_attachments);
        for clear in clears {
            if clear.flags.contains(ClearFlags::COLOR) {
                if let Some(count) = num_colors.filter(|n| clear.color_attachment as usize >= *n) {
                    return Err(CommandError::Argument(format!(
                        "color attachment {} is out of range for {count} attachments",
                        clear.color_attachment
                    )));
                }
            }
        }
        for clear in clears {
            if clear.flags.contains(ClearFlags::COLOR) {
                self.commands.push(Command::Clear {
                    color: Some(clear.color_attachment),
                    flags: ClearFlags::COLOR,
                    value: clear.value,
                });
            }
            let depth_stencil = clear.flags & ClearFlags::DEPTH_STENCIL;
            if !depth_stencil.is_empty() {
                self.commands.push(Command::Clear {
                    color: None,
                    flags: depth_stencil,
                    value: clear.value,
                });
            }
        }
        Ok(())
    }

    fn draw(&mut self, num_vertices: u32, _first_vertex: u32) -> Result<(), CommandError> {
        self.record_draw("draw", num_vertices, 1)
    }

    fn draw_indexed(
        &mut self,
        num_indices: u32,
        _first_index: u32,
        _vertex_offset: i32,
    ) -> Result<(), CommandError> {
        self.record_draw("draw indexed", num_indices, 1)
    }

    fn draw_instanced(
        &mut self,
        num_vertices: u32,
        _first_vertex: u32,
        num_instances: u32,
        _first_instance: u32,
    ) -> Result<(), CommandError> {
        self.record_draw("draw instanced", num_vertices, num_instances)
    }

    fn draw_indexed_instanced(
        &mut self,
        num_indices: u32,
        num_instances: u32,
        _first_index: u32,
        _vertex_offset: i32,
        _first_instance: u32,
    ) -> Result<(), CommandError> {
        self.record_draw("draw indexed instanced", num_indices, num_instances)
    }

    fn draw_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        self.record_indirect_draw(buffer, offset, num_commands, stride, false)
    }

    fn draw_indexed_indirect(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        num_commands: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        self.record_indirect_draw(buffer, offset, num_commands, stride, true)
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), CommandError> {
        self.recording.check_dispatch("dispatch")?;
        self.commands.push(Command::Dispatch { groups: [x, y, z] });
        Ok(())
    }

    fn dispatch_indirect(&mut self, buffer: &Buffer, offset: u64) -> Result<(), CommandError> {
        self.recording.check_dispatch("dispatch indirect")?;
        self.owned(buffer)?;
        Self::buffer_range(buffer, offset, DISPATCH_INDIRECT_SIZE)?;
        self.commands.push(Command::DispatchIndirect {
            buffer: buffer.clone(),
            offset,
        });
        Ok(())
    }

    fn begin_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        self.owned(heap)?;
        self.recording.begin_query(heap, index)?;
        self.commands.push(Command::BeginQuery {
            heap: heap.clone(),
            index,
        });
        Ok(())
    }

    fn end_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        self.owned(heap)?;
        self.recording.end_query(heap, index)?;
        self.commands.push(Command::EndQuery {
            heap: heap.clone(),
            index,
        });
        Ok(())
    }

    fn push_debug_group(&mut self, name: &str) -> Result<(), CommandError> {
        self.recording.push_debug_group()?;
        log::trace!("Debug group '{name}' opened");
        Ok(())
    }

    fn pop_debug_group(&mut self) -> Result<(), CommandError> {
        self.recording.pop_debug_group()
    }

    fn execute(&mut self, secondary: &dyn CommandBuffer) -> Result<(), CommandError> {
        let is_self =
            secondary.raw_id() == self.raw_id() && secondary.system_id() == self.system_id();
        self.recording
            .check_execute(secondary.flags(), secondary.state(), is_self)?;
        self.owned(secondary)?;
        let secondary = secondary
            .as_any()
            .downcast_ref::<NullCommandBuffer>()
            .ok_or(CommandError::BackendMismatch {
                kind: ObjectKind::CommandBuffer,
            })?;
        self.commands.push(Command::Execute(secondary.commands.clone()));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
