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

#![allow(dead_code)]

use anyhow::{ensure, Result};
use bytemuck::{Pod, Zeroable};
use prism_core::math::{Extent2D, Extent3D};
use prism_core::renderer::{
    AttachmentDescriptor, AttachmentFormatDescriptor, BindFlags, Buffer, BufferDescriptor,
    GraphicsPipelineDescriptor, PipelineState, RenderPass, RenderPassDescriptor, RenderSystem,
    RenderTargetDescriptor, ShaderDescriptor, ShaderStage, Texture, TextureDescriptor,
    TextureFormat, TextureRenderTarget, VertexBufferLayout, VertexFormat,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const TRIANGLE_WGSL: &str = r#"
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec4<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color;
}
"#;

/// A 2D position followed by an RGBA8 color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [u8; 4],
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5],
        color: [255, 0, 0, 255],
    },
    Vertex {
        position: [0.5, -0.5],
        color: [0, 255, 0, 255],
    },
    Vertex {
        position: [-0.5, -0.5],
        color: [0, 0, 255, 255],
    },
];

pub fn vertex_layout() -> VertexBufferLayout {
    VertexBufferLayout::packed([
        ("position".to_owned(), 0, VertexFormat::Float32x2),
        ("color".to_owned(), 1, VertexFormat::Unorm8x4),
    ])
}

pub fn vertex_buffer(system: &dyn RenderSystem) -> Result<Buffer> {
    let layout = vertex_layout();
    let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE);
    let buffer = system.create_buffer(
        &BufferDescriptor {
            label: Some("triangle vertices".into()),
            size: bytes.len() as u64,
            stride: layout.stride,
            bind_flags: BindFlags::VERTEX_BUFFER,
            vertex_attributes: layout.attributes,
            ..Default::default()
        },
        Some(bytes),
    )?;
    Ok(buffer)
}

pub fn triangle_pipeline(system: &dyn RenderSystem, render_pass: &RenderPass) -> Result<PipelineState> {
    let vs = system.create_shader(
        &ShaderDescriptor::wgsl(ShaderStage::Vertex, TRIANGLE_WGSL, "vs_main")
            .with_label("triangle.vs"),
    )?;
    let fs = system.create_shader(
        &ShaderDescriptor::wgsl(ShaderStage::Fragment, TRIANGLE_WGSL, "fs_main")
            .with_label("triangle.fs"),
    )?;
    ensure!(vs.is_valid(), "{}", vs.report());
    ensure!(fs.is_valid(), "{}", fs.report());

    let mut desc = GraphicsPipelineDescriptor::new(vs, Some(fs));
    desc.label = Some("triangle".into());
    desc.render_pass = Some(render_pass.clone());
    desc.vertex_buffers = vec![vertex_layout()];
    let pipeline = system.create_pipeline_state(&desc.into(), None)?;
    ensure!(pipeline.is_usable(), "{}", pipeline.report());
    Ok(pipeline)
}

/// A single-color render pass that clears its attachment.
pub fn color_pass(system: &dyn RenderSystem, format: TextureFormat) -> Result<RenderPass> {
    Ok(system.create_render_pass(&RenderPassDescriptor {
        color_attachments: vec![AttachmentFormatDescriptor::cleared(format)],
        ..Default::default()
    })?)
}

pub fn color_texture(system: &dyn RenderSystem, format: TextureFormat, size: Extent2D) -> Result<Texture> {
    Ok(system.create_texture(
        &TextureDescriptor {
            format,
            extent: Extent3D::new(size.width, size.height, 1),
            bind_flags: BindFlags::COLOR_ATTACHMENT | BindFlags::SAMPLED | BindFlags::COPY_SRC,
            ..Default::default()
        },
        None,
    )?)
}

/// A render target with one color texture, returned alongside the texture.
pub fn texture_target(
    system: &dyn RenderSystem,
    render_pass: &RenderPass,
    format: TextureFormat,
    size: Extent2D,
) -> Result<(TextureRenderTarget, Texture)> {
    let texture = color_texture(system, format, size)?;
    let mut desc = RenderTargetDescriptor::new(render_pass.clone(), size);
    desc.color_attachments = vec![AttachmentDescriptor::new(texture.clone())];
    Ok((system.create_render_target(&desc)?, texture))
}
