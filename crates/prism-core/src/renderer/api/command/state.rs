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

//! The command-buffer state machine shared by every backend.
//!
//! [`RecordingState`] enforces the structural rules of recording: which state
//! each call is legal in, render-pass scoping, pipeline presence for draws and
//! dispatches, primary/secondary composition and scope balance at `end`.
//! Backends embed one and consult it before recording anything.

use super::query::{QueryHeap, QueryHeapId, QueryType};
use super::timeline::QueueTimeline;
use super::types::{ClearValue, CommandBufferFlags, Scissor, Viewport};
use crate::math::Extent2D;
use crate::renderer::api::pass::RenderPass;
use crate::renderer::api::pipeline::{PipelineKind, PipelineState, ResourceHeap, StencilFace};
use crate::renderer::api::resource::Buffer;
use crate::renderer::api::util::IndexFormat;
use crate::renderer::error::CommandError;
use crate::renderer::traits::RenderTarget;

/// The lifecycle state of a command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandBufferState {
    /// Created or completed; `begin` starts a new recording.
    Initial,
    /// Between `begin` and `end`.
    Recording,
    /// Recorded and ready to be submitted or executed.
    Executable,
    /// Submitted and not yet completed by the queue.
    Pending,
}

/// The render pass scope opened by `begin_render_pass`.
#[derive(Debug, Clone)]
pub struct ActivePass {
    /// The render pass the scope follows.
    pub render_pass: RenderPass,
    /// The render area.
    pub resolution: Extent2D,
    /// The number of color attachments of the target.
    pub num_color_attachments: usize,
    /// Whether the target has a depth aspect.
    pub has_depth: bool,
    /// Whether the target has a stencil aspect.
    pub has_stencil: bool,
    /// The swap-chain image rendered into, if the target is a swap chain.
    pub swap_buffer_index: Option<u32>,
}

/// The implicit binding set of a recording. Reset by `begin`.
#[derive(Debug, Clone)]
pub struct BindingSet {
    /// The bound pipeline state.
    pub pipeline: Option<PipelineState>,
    /// Vertex buffers by slot.
    pub vertex_buffers: Vec<Buffer>,
    /// The index buffer, its format and byte offset.
    pub index_buffer: Option<(Buffer, IndexFormat, u64)>,
    /// The resource heap and its descriptor set.
    pub resource_heap: Option<(ResourceHeap, u32)>,
    /// Viewports.
    pub viewports: Vec<Viewport>,
    /// Scissor rectangles.
    pub scissors: Vec<Scissor>,
    /// The dynamic blend constant.
    pub blend_factor: [f32; 4],
    /// Stencil references for front and back faces.
    pub stencil_reference: [u32; 2],
}

impl Default for BindingSet {
    fn default() -> Self {
        Self {
            pipeline: None,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            resource_heap: None,
            viewports: Vec::new(),
            scissors: Vec::new(),
            blend_factor: [0.0; 4],
            stencil_reference: [0; 2],
        }
    }
}

impl BindingSet {
    /// Sets the stencil reference of the selected faces.
    pub fn set_stencil_reference(&mut self, reference: u32, face: StencilFace) {
        match face {
            StencilFace::FrontAndBack => self.stencil_reference = [reference; 2],
            StencilFace::Front => self.stencil_reference[0] = reference,
            StencilFace::Back => self.stencil_reference[1] = reference,
        }
    }

    /// The bound pipeline if it is of `kind`.
    pub fn pipeline_of(&self, kind: PipelineKind) -> Option<&PipelineState> {
        self.pipeline.as_ref().filter(|p| p.kind() == kind)
    }
}

/// Tracks the state machine and binding set of one command buffer.
#[derive(Debug)]
pub struct RecordingState {
    flags: CommandBufferFlags,
    state: CommandBufferState,
    pending: Option<(QueueTimeline, u64)>,
    pass: Option<ActivePass>,
    bindings: BindingSet,
    debug_groups: u32,
    open_queries: Vec<(QueryHeapId, u32)>,
}

impl RecordingState {
    /// A tracker in the `Initial` state.
    pub fn new(flags: CommandBufferFlags) -> Self {
        Self {
            flags,
            state: CommandBufferState::Initial,
            pending: None,
            pass: None,
            bindings: BindingSet::default(),
            debug_groups: 0,
            open_queries: Vec::new(),
        }
    }

    /// The creation flags.
    pub fn flags(&self) -> CommandBufferFlags {
        self.flags
    }

    /// Returns `true` for secondary command buffers.
    pub fn is_secondary(&self) -> bool {
        self.flags.contains(CommandBufferFlags::SECONDARY)
    }

    /// The current state. A pending buffer whose submission completed reports
    /// the state it returns to.
    pub fn state(&self) -> CommandBufferState {
        match (&self.state, &self.pending) {
            (CommandBufferState::Pending, Some((timeline, ticket)))
                if timeline.is_complete(*ticket) =>
            {
                self.state_after_completion()
            }
            (state, _) => *state,
        }
    }

    /// The open render pass scope.
    pub fn active_pass(&self) -> Option<&ActivePass> {
        self.pass.as_ref()
    }

    /// The current binding set.
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// The number of open debug groups.
    pub fn debug_group_depth(&self) -> u32 {
        self.debug_groups
    }

    /// `Initial`/`Executable` to `Recording`. Clears every binding.
    pub fn begin(&mut self) -> Result<(), CommandError> {
        self.settle();
        match self.state {
            CommandBufferState::Recording | CommandBufferState::Pending => {
                Err(CommandError::InvalidState {
                    operation: "begin",
                    state: self.state,
                })
            }
            CommandBufferState::Initial | CommandBufferState::Executable => {
                self.pass = None;
                self.bindings = BindingSet::default();
                self.debug_groups = 0;
                self.open_queries.clear();
                self.state = CommandBufferState::Recording;
                Ok(())
            }
        }
    }

    /// `Recording` to `Executable`. Fails if a render pass, debug group or query is open.
    pub fn end(&mut self) -> Result<(), CommandError> {
        self.require_recording("end")?;
        if self.pass.is_some() {
            return Err(CommandError::UnclosedScope("render pass"));
        }
        if self.debug_groups > 0 {
            return Err(CommandError::UnclosedScope("debug group"));
        }
        if !self.open_queries.is_empty() {
            return Err(CommandError::UnclosedScope("query"));
        }
        self.state = CommandBufferState::Executable;
        Ok(())
    }

    /// Fails unless the buffer is recording.
    pub fn require_recording(&mut self, operation: &'static str) -> Result<(), CommandError> {
        self.settle();
        if self.state == CommandBufferState::Recording {
            Ok(())
        } else {
            Err(CommandError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Checks a binding call and returns the binding set to update.
    pub fn bind(&mut self, operation: &'static str) -> Result<&mut BindingSet, CommandError> {
        self.require_recording(operation)?;
        Ok(&mut self.bindings)
    }

    /// Binds a pipeline state. Pipelines that failed to compile are rejected.
    pub fn set_pipeline_state(&mut self, pipeline: &PipelineState) -> Result<(), CommandError> {
        self.require_recording("set a pipeline state")?;
        pipeline.ensure_usable()?;
        self.bindings.pipeline = Some(pipeline.clone());
        Ok(())
    }

    /// Opens a render pass scope on `target`.
    ///
    /// `render_pass` defaults to the target's own pass and must be compatible
    /// with it. `clear_values` is either empty, meaning default clear values,
    /// or one per attachment with a `Clear` load op. `swap_buffer_index` is
    /// only meaningful for swap chains; `None` selects the current image.
    pub fn begin_render_pass(
        &mut self,
        target: &dyn RenderTarget,
        render_pass: Option<&RenderPass>,
        clear_values: &[ClearValue],
        swap_buffer_index: Option<u32>,
    ) -> Result<&ActivePass, CommandError> {
        const OP: &str = "begin a render pass";
        self.require_recording(OP)?;
        if self.is_secondary() {
            return Err(CommandError::Secondary(
                "secondary command buffers cannot begin render passes".into(),
            ));
        }
        if self.pass.is_some() {
            return Err(CommandError::InsideRenderPass(OP));
        }

        let target_pass = target.render_pass();
        let pass = match render_pass {
            Some(pass) if !pass.is_compatible_with(&target_pass) => {
                return Err(CommandError::Argument(
                    "render pass is not compatible with the render target".into(),
                ))
            }
            Some(pass) => pass.clone(),
            None => target_pass,
        };

        let expected = pass.descriptor().num_clear_values();
        if !clear_values.is_empty() && clear_values.len() != expected {
            return Err(CommandError::Argument(format!(
                "{} clear values given but the render pass clears {expected} attachments",
                clear_values.len()
            )));
        }

        let swap_buffer_index = match (swap_buffer_index, target.as_swap_chain()) {
            (None, Some(swap_chain)) => Some(swap_chain.current_swap_index()),
            (None, None) => None,
            (Some(index), Some(swap_chain)) if index < swap_chain.num_swap_buffers() => Some(index),
            (Some(index), Some(swap_chain)) => {
                return Err(CommandError::Argument(format!(
                    "swap buffer index {index} is out of range for {} buffers",
                    swap_chain.num_swap_buffers()
                )))
            }
            (Some(_), None) => {
                return Err(CommandError::Argument(
                    "a swap buffer index was given for a target that is not a swap chain".into(),
                ))
            }
        };

        Ok(&*self.pass.insert(ActivePass {
            render_pass: pass,
            resolution: target.resolution(),
            num_color_attachments: target.num_color_attachments(),
            has_depth: target.has_depth_attachment(),
            has_stencil: target.has_stencil_attachment(),
            swap_buffer_index,
        }))
    }

    /// Closes the render pass scope.
    pub fn end_render_pass(&mut self) -> Result<ActivePass, CommandError> {
        const OP: &str = "end a render pass";
        self.require_recording(OP)?;
        self.pass.take().ok_or(CommandError::NotInRenderPass(OP))
    }

    /// Checks a draw: a graphics pipeline must be bound and, on primary
    /// buffers, a render pass must be open.
    pub fn check_draw(&mut self, operation: &'static str) -> Result<(), CommandError> {
        self.require_recording(operation)?;
        if self.pass.is_none() && !self.is_secondary() {
            return Err(CommandError::NotInRenderPass(operation));
        }
        if self.bindings.pipeline_of(PipelineKind::Graphics).is_none() {
            return Err(CommandError::NoPipelineBound(operation));
        }
        Ok(())
    }

    /// Checks a dispatch: a compute pipeline must be bound and no render pass open.
    pub fn check_dispatch(&mut self, operation: &'static str) -> Result<(), CommandError> {
        self.require_recording(operation)?;
        if self.pass.is_some() {
            return Err(CommandError::InsideRenderPass(operation));
        }
        if self.bindings.pipeline_of(PipelineKind::Compute).is_none() {
            return Err(CommandError::NoPipelineBound(operation));
        }
        Ok(())
    }

    /// Checks a command that acts on the attachments of the open pass.
    pub fn check_in_pass(&mut self, operation: &'static str) -> Result<(), CommandError> {
        self.require_recording(operation)?;
        if self.pass.is_none() && !self.is_secondary() {
            return Err(CommandError::NotInRenderPass(operation));
        }
        Ok(())
    }

    /// Checks a resource mutation: legal only outside render passes and only
    /// on primary buffers.
    pub fn check_transfer(&mut self, operation: &'static str) -> Result<(), CommandError> {
        self.require_recording(operation)?;
        if self.pass.is_some() {
            return Err(CommandError::InsideRenderPass(operation));
        }
        if self.is_secondary() {
            return Err(CommandError::Secondary(format!(
                "cannot {operation} in a secondary command buffer"
            )));
        }
        Ok(())
    }

    /// Checks that a buffer with `flags` in `state` can be executed from this one.
    pub fn check_execute(
        &mut self,
        flags: CommandBufferFlags,
        state: CommandBufferState,
        is_self: bool,
    ) -> Result<(), CommandError> {
        self.require_recording("execute a secondary command buffer")?;
        if self.is_secondary() {
            return Err(CommandError::Secondary(
                "only primary command buffers can execute secondary ones".into(),
            ));
        }
        if is_self {
            return Err(CommandError::Secondary(
                "a command buffer cannot execute itself".into(),
            ));
        }
        if !flags.contains(CommandBufferFlags::SECONDARY) {
            return Err(CommandError::Secondary(
                "only command buffers created with SECONDARY can be executed".into(),
            ));
        }
        if state != CommandBufferState::Executable {
            return Err(CommandError::InvalidState {
                operation: "execute",
                state,
            });
        }
        Ok(())
    }

    /// Opens a debug group.
    pub fn push_debug_group(&mut self) -> Result<(), CommandError> {
        self.require_recording("push a debug group")?;
        self.debug_groups += 1;
        Ok(())
    }

    /// Closes the innermost debug group.
    pub fn pop_debug_group(&mut self) -> Result<(), CommandError> {
        const OP: &str = "pop a debug group without a matching push";
        self.require_recording(OP)?;
        if self.debug_groups == 0 {
            return Err(CommandError::InvalidState {
                operation: OP,
                state: self.state,
            });
        }
        self.debug_groups -= 1;
        Ok(())
    }

    /// Starts query `index` of `heap`.
    pub fn begin_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        self.require_recording("begin a query")?;
        Self::check_query_index(heap, index)?;
        let key = (heap.id(), index);
        if self.open_queries.contains(&key) {
            return Err(CommandError::Argument(format!("query {index} is already active")));
        }
        self.open_queries.push(key);
        Ok(())
    }

    /// Ends query `index` of `heap`. Timestamp queries need no `begin_query`.
    pub fn end_query(&mut self, heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        self.require_recording("end a query")?;
        Self::check_query_index(heap, index)?;
        let key = (heap.id(), index);
        match self.open_queries.iter().position(|k| *k == key) {
            Some(position) => {
                self.open_queries.swap_remove(position);
                Ok(())
            }
            None if heap.ty() == QueryType::Timestamp => Ok(()),
            None => Err(CommandError::Argument(format!("query {index} is not active"))),
        }
    }

    /// Checks that the buffer can be submitted to a queue.
    pub fn check_submit(&mut self) -> Result<(), CommandError> {
        self.settle();
        if self.is_secondary() {
            return Err(CommandError::Secondary(
                "secondary command buffers are executed, not submitted".into(),
            ));
        }
        if self.state != CommandBufferState::Executable {
            return Err(CommandError::InvalidState {
                operation: "submit",
                state: self.state,
            });
        }
        Ok(())
    }

    /// `Executable` to `Pending` until `ticket` of `timeline` completes.
    pub fn mark_pending(&mut self, timeline: &QueueTimeline, ticket: u64) {
        self.state = CommandBufferState::Pending;
        self.pending = Some((timeline.clone(), ticket));
    }

    fn check_query_index(heap: &QueryHeap, index: u32) -> Result<(), CommandError> {
        if index >= heap.num_queries() {
            return Err(CommandError::Argument(format!(
                "query index {index} is out of range for {} queries",
                heap.num_queries()
            )));
        }
        Ok(())
    }

    fn state_after_completion(&self) -> CommandBufferState {
        if self.flags.contains(CommandBufferFlags::MULTI_SUBMIT) {
            CommandBufferState::Executable
        } else {
            CommandBufferState::Initial
        }
    }

    fn settle(&mut self) {
        let state = self.state();
        if state != self.state {
            self.state = state;
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{BackendBinding, ObjectKind, Report, SystemId};
    use crate::renderer::api::pass::{
        AttachmentDescriptor, AttachmentFormatDescriptor, RenderPassDescriptor,
        RenderTargetDescriptor, TextureRenderTarget,
    };
    use crate::renderer::api::pipeline::{
        ComputePipelineDescriptor, GraphicsPipelineDescriptor, PipelineDescriptor,
    };
    use crate::renderer::api::command::QueryHeapDescriptor;
    use crate::renderer::api::resource::{BindFlags, Texture, TextureDescriptor};
    use crate::renderer::api::util::TextureFormat;
    use crate::renderer::error::PipelineError;

    const SYSTEM: SystemId = SystemId(11);

    fn pass(format: TextureFormat) -> RenderPass {
        RenderPass::new(
            BackendBinding::detached(ObjectKind::RenderPass, 1, SYSTEM),
            RenderPassDescriptor {
                color_attachments: vec![AttachmentFormatDescriptor::cleared(format)],
                ..Default::default()
            },
        )
    }

    fn target() -> TextureRenderTarget {
        let texture = Texture::new(
            BackendBinding::detached(ObjectKind::Texture, 1, SYSTEM),
            TextureDescriptor {
                bind_flags: BindFlags::COLOR_ATTACHMENT,
                extent: crate::math::Extent3D::new(4, 4, 1),
                ..Default::default()
            },
        );
        let mut desc = RenderTargetDescriptor::new(pass(TextureFormat::Rgba8Unorm), Extent2D::new(4, 4));
        desc.color_attachments.push(AttachmentDescriptor::new(texture));
        TextureRenderTarget::new(BackendBinding::detached(ObjectKind::RenderTarget, 1, SYSTEM), desc)
            .unwrap()
    }

    fn pipeline(descriptor: PipelineDescriptor, error: Option<PipelineError>) -> PipelineState {
        let report = match &error {
            Some(e) => Report::with_error(e.to_string()),
            None => Report::new(),
        };
        PipelineState::new(
            BackendBinding::detached(ObjectKind::PipelineState, 1, SYSTEM),
            descriptor,
            report,
            error,
        )
    }

    fn graphics() -> PipelineState {
        pipeline(GraphicsPipelineDescriptor::default().into(), None)
    }

    fn compute() -> PipelineState {
        pipeline(ComputePipelineDescriptor::default().into(), None)
    }

    #[test]
    fn test_recording_calls_outside_begin_end_are_rejected() {
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        assert!(matches!(
            state.check_draw("draw"),
            Err(CommandError::InvalidState {
                state: CommandBufferState::Initial,
                ..
            })
        ));
        assert!(state.bind("set vertex buffers").is_err());
        state.begin().unwrap();
        state.end().unwrap();
        assert_eq!(state.state(), CommandBufferState::Executable);
        assert!(matches!(
            state.set_pipeline_state(&graphics()),
            Err(CommandError::InvalidState {
                state: CommandBufferState::Executable,
                ..
            })
        ));
    }

    #[test]
    fn test_begin_twice_is_invalid() {
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        assert!(matches!(
            state.begin(),
            Err(CommandError::InvalidState { operation: "begin", .. })
        ));
    }

    #[test]
    fn test_end_with_open_pass_is_unclosed_scope() {
        let target = target();
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        state.begin_render_pass(&target, None, &[], None).unwrap();
        assert_eq!(state.end(), Err(CommandError::UnclosedScope("render pass")));
        assert!(matches!(
            state.begin_render_pass(&target, None, &[], None),
            Err(CommandError::InsideRenderPass(_))
        ));
        state.end_render_pass().unwrap();
        assert!(matches!(
            state.end_render_pass(),
            Err(CommandError::NotInRenderPass(_))
        ));
        state.end().unwrap();
    }

    #[test]
    fn test_draw_needs_pass_and_graphics_pipeline() {
        let target = target();
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        state.set_pipeline_state(&graphics()).unwrap();
        assert_eq!(state.check_draw("draw"), Err(CommandError::NotInRenderPass("draw")));
        state.begin_render_pass(&target, None, &[], None).unwrap();
        state.check_draw("draw").unwrap();
        state.set_pipeline_state(&compute()).unwrap();
        assert_eq!(state.check_draw("draw"), Err(CommandError::NoPipelineBound("draw")));
        assert_eq!(
            state.check_dispatch("dispatch"),
            Err(CommandError::InsideRenderPass("dispatch"))
        );
        state.end_render_pass().unwrap();
        state.check_dispatch("dispatch").unwrap();
    }

    #[test]
    fn test_begin_resets_bindings() {
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        state.set_pipeline_state(&compute()).unwrap();
        state.bind("set blend factor").unwrap().blend_factor = [1.0; 4];
        state.end().unwrap();
        state.begin().unwrap();
        assert!(state.bindings().pipeline.is_none());
        assert_eq!(state.bindings().blend_factor, [0.0; 4]);
        assert_eq!(
            state.check_dispatch("dispatch"),
            Err(CommandError::NoPipelineBound("dispatch"))
        );
    }

    #[test]
    fn test_failed_pipeline_cannot_be_bound() {
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        let broken = pipeline(
            GraphicsPipelineDescriptor::default().into(),
            Some(PipelineError::ShaderLink("vertex shader missing".into())),
        );
        assert!(matches!(
            state.set_pipeline_state(&broken),
            Err(CommandError::UnusablePipeline(_))
        ));
    }

    #[test]
    fn test_clear_value_count_must_match() {
        let target = target();
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        let two = [ClearValue::default(); 2];
        assert!(matches!(
            state.begin_render_pass(&target, None, &two, None),
            Err(CommandError::Argument(_))
        ));
        let one = [ClearValue::color([1.0, 0.0, 0.0, 1.0])];
        state.begin_render_pass(&target, None, &one, None).unwrap();
    }

    #[test]
    fn test_incompatible_pass_and_swap_index_on_texture_target() {
        let target = target();
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        let other = pass(TextureFormat::Rgba16Float);
        assert!(matches!(
            state.begin_render_pass(&target, Some(&other), &[], None),
            Err(CommandError::Argument(_))
        ));
        assert!(matches!(
            state.begin_render_pass(&target, None, &[], Some(0)),
            Err(CommandError::Argument(_))
        ));
    }

    #[test]
    fn test_secondary_rules() {
        let target = target();
        let mut secondary = RecordingState::new(CommandBufferFlags::SECONDARY);
        secondary.begin().unwrap();
        assert!(matches!(
            secondary.begin_render_pass(&target, None, &[], None),
            Err(CommandError::Secondary(_))
        ));
        secondary.set_pipeline_state(&graphics()).unwrap();
        secondary.check_draw("draw").unwrap();
        assert!(matches!(
            secondary.check_transfer("copy a buffer"),
            Err(CommandError::Secondary(_))
        ));
        assert!(matches!(
            secondary.check_execute(CommandBufferFlags::SECONDARY, CommandBufferState::Executable, false),
            Err(CommandError::Secondary(_))
        ));
        secondary.end().unwrap();
        assert!(matches!(secondary.check_submit(), Err(CommandError::Secondary(_))));

        let mut primary = RecordingState::new(CommandBufferFlags::empty());
        primary.begin().unwrap();
        primary
            .check_execute(secondary.flags(), secondary.state(), false)
            .unwrap();
        assert!(matches!(
            primary.check_execute(CommandBufferFlags::empty(), CommandBufferState::Executable, false),
            Err(CommandError::Secondary(_))
        ));
        assert!(matches!(
            primary.check_execute(CommandBufferFlags::SECONDARY, CommandBufferState::Recording, false),
            Err(CommandError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_debug_groups_must_balance() {
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        assert!(matches!(
            state.pop_debug_group(),
            Err(CommandError::InvalidState { .. })
        ));
        state.push_debug_group().unwrap();
        assert_eq!(state.end(), Err(CommandError::UnclosedScope("debug group")));
        state.pop_debug_group().unwrap();
        state.end().unwrap();
    }

    #[test]
    fn test_queries_must_close() {
        let heap = QueryHeap::new(
            BackendBinding::detached(ObjectKind::QueryHeap, 1, SYSTEM),
            QueryHeapDescriptor {
                ty: QueryType::Occlusion,
                num_queries: 1,
                ..Default::default()
            },
        );
        let mut state = RecordingState::new(CommandBufferFlags::empty());
        state.begin().unwrap();
        assert!(state.begin_query(&heap, 1).is_err());
        state.begin_query(&heap, 0).unwrap();
        assert!(state.begin_query(&heap, 0).is_err());
        assert_eq!(state.end(), Err(CommandError::UnclosedScope("query")));
        state.end_query(&heap, 0).unwrap();
        assert!(state.end_query(&heap, 0).is_err());
        state.end().unwrap();
    }

    #[test]
    fn test_submission_lifecycle() {
        let timeline = QueueTimeline::new();
        let mut once = RecordingState::new(CommandBufferFlags::empty());
        assert!(matches!(once.check_submit(), Err(CommandError::InvalidState { .. })));
        once.begin().unwrap();
        once.end().unwrap();
        once.check_submit().unwrap();
        let ticket = timeline.next_ticket();
        once.mark_pending(&timeline, ticket);
        assert_eq!(once.state(), CommandBufferState::Pending);
        assert!(matches!(
            once.begin(),
            Err(CommandError::InvalidState {
                state: CommandBufferState::Pending,
                ..
            })
        ));
        timeline.complete(ticket);
        assert_eq!(once.state(), CommandBufferState::Initial);
        assert!(once.check_submit().is_err());
        once.begin().unwrap();

        let mut multi = RecordingState::new(CommandBufferFlags::MULTI_SUBMIT);
        multi.begin().unwrap();
        multi.end().unwrap();
        let ticket = timeline.next_ticket();
        multi.mark_pending(&timeline, ticket);
        timeline.complete(ticket);
        assert_eq!(multi.state(), CommandBufferState::Executable);
        multi.check_submit().unwrap();
    }
}
