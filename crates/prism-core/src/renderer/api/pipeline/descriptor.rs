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

//! Descriptors for graphics and compute pipeline states.

use super::layout::PipelineLayout;
use super::state::{ColorTargetState, DepthStencilState, MultisampleState, PrimitiveState};
use crate::renderer::api::command::{Scissor, Viewport};
use crate::renderer::api::pass::RenderPass;
use crate::renderer::api::resource::VertexBufferLayout;
use crate::renderer::api::shader::Shader;
use crate::renderer::api::util::ShaderStage;

/// A descriptor for a graphics pipeline state.
///
/// Only `vertex_shader` is mandatory. The fragment shader may be omitted for
/// passes without color attachments. When `render_pass` is `None` the color
/// targets are taken from `blend_targets` alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsPipelineDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The binding layout the shaders are checked against.
    pub pipeline_layout: Option<PipelineLayout>,
    /// The render pass the pipeline is compatible with.
    pub render_pass: Option<RenderPass>,
    /// The vertex shader.
    pub vertex_shader: Option<Shader>,
    /// The tessellation control (hull) shader.
    pub tess_control_shader: Option<Shader>,
    /// The tessellation evaluation (domain) shader.
    pub tess_evaluation_shader: Option<Shader>,
    /// The geometry shader.
    pub geometry_shader: Option<Shader>,
    /// The fragment shader.
    pub fragment_shader: Option<Shader>,
    /// Vertex buffer layouts, one per vertex buffer slot.
    pub vertex_buffers: Vec<VertexBufferLayout>,
    /// Primitive assembly and rasterizer state.
    pub primitive: PrimitiveState,
    /// Depth/stencil state. `None` disables both tests.
    pub depth_stencil: Option<DepthStencilState>,
    /// One entry per color attachment.
    pub blend_targets: Vec<ColorTargetState>,
    /// Multisampling state.
    pub multisample: MultisampleState,
    /// Static viewports. Empty means they are set with `set_viewports`.
    pub viewports: Vec<Viewport>,
    /// Static scissors. Empty means they are set with `set_scissors`.
    pub scissors: Vec<Scissor>,
}

impl GraphicsPipelineDescriptor {
    /// A pipeline with a vertex and an optional fragment shader and default state.
    pub fn new(vertex_shader: Shader, fragment_shader: Option<Shader>) -> Self {
        Self {
            vertex_shader: Some(vertex_shader),
            fragment_shader,
            ..Default::default()
        }
    }

    /// The shaders that are present, with the stage each slot expects.
    pub fn shader_slots(&self) -> impl Iterator<Item = (ShaderStage, &Shader)> {
        [
            (ShaderStage::Vertex, &self.vertex_shader),
            (ShaderStage::TessControl, &self.tess_control_shader),
            (ShaderStage::TessEvaluation, &self.tess_evaluation_shader),
            (ShaderStage::Geometry, &self.geometry_shader),
            (ShaderStage::Fragment, &self.fragment_shader),
        ]
        .into_iter()
        .filter_map(|(stage, shader)| shader.as_ref().map(|s| (stage, s)))
    }
}

/// A descriptor for a compute pipeline state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputePipelineDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The binding layout the shader is checked against.
    pub pipeline_layout: Option<PipelineLayout>,
    /// The compute shader.
    pub compute_shader: Option<Shader>,
}

impl ComputePipelineDescriptor {
    /// A compute pipeline for `shader`.
    pub fn new(shader: Shader, pipeline_layout: Option<PipelineLayout>) -> Self {
        Self {
            label: None,
            pipeline_layout,
            compute_shader: Some(shader),
        }
    }
}

/// Whether a pipeline state draws or dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Bound for draws inside render passes.
    Graphics,
    /// Bound for dispatches outside render passes.
    Compute,
}

/// Either kind of pipeline descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineDescriptor {
    /// A graphics pipeline.
    Graphics(GraphicsPipelineDescriptor),
    /// A compute pipeline.
    Compute(ComputePipelineDescriptor),
}

impl PipelineDescriptor {
    /// The kind of pipeline described.
    pub fn kind(&self) -> PipelineKind {
        match self {
            PipelineDescriptor::Graphics(_) => PipelineKind::Graphics,
            PipelineDescriptor::Compute(_) => PipelineKind::Compute,
        }
    }

    /// The debug label.
    pub fn label(&self) -> Option<&str> {
        match self {
            PipelineDescriptor::Graphics(d) => d.label.as_deref(),
            PipelineDescriptor::Compute(d) => d.label.as_deref(),
        }
    }

    /// The pipeline layout.
    pub fn pipeline_layout(&self) -> Option<&PipelineLayout> {
        match self {
            PipelineDescriptor::Graphics(d) => d.pipeline_layout.as_ref(),
            PipelineDescriptor::Compute(d) => d.pipeline_layout.as_ref(),
        }
    }

    /// The graphics descriptor, if this is one.
    pub fn as_graphics(&self) -> Option<&GraphicsPipelineDescriptor> {
        match self {
            PipelineDescriptor::Graphics(d) => Some(d),
            PipelineDescriptor::Compute(_) => None,
        }
    }

    /// The compute descriptor, if this is one.
    pub fn as_compute(&self) -> Option<&ComputePipelineDescriptor> {
        match self {
            PipelineDescriptor::Compute(d) => Some(d),
            PipelineDescriptor::Graphics(_) => None,
        }
    }
}

impl From<GraphicsPipelineDescriptor> for PipelineDescriptor {
    fn from(descriptor: GraphicsPipelineDescriptor) -> Self {
        PipelineDescriptor::Graphics(descriptor)
    }
}

impl From<ComputePipelineDescriptor> for PipelineDescriptor {
    fn from(descriptor: ComputePipelineDescriptor) -> Self {
        PipelineDescriptor::Compute(descriptor)
    }
}
