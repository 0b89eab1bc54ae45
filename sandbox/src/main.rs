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

// Prism Sandbox
// Renders a triangle on the Null backend and prints the captured frame profile.

use anyhow::{bail, Context, Result};
use prism_core::config::RenderSystemConfig;
use prism_core::math::Extent2D;
use prism_core::renderer::{
    BindFlags, BufferDescriptor, ClearValue, CommandBufferDescriptor, GraphicsPipelineDescriptor,
    RenderSystem, ShaderDescriptor, ShaderStage, Viewport, VertexBufferLayout, VertexFormat,
    INFINITE_TIMEOUT,
};
use prism_core::telemetry::RenderingDebugger;
use prism_infra::{BackendLoader, HeadlessSurface};
use std::sync::Arc;

const FRAMES: u32 = 3;

const SHADER: &str = r#"
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

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    color: [u8; 4],
}

const VERTICES: &[Vertex] = &[
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

/// Reads the configuration named on the command line, or the defaults.
fn load_config() -> Result<RenderSystemConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading configuration '{path}'"))?;
            RenderSystemConfig::from_ron(&text)?
        }
        None => RenderSystemConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn render(
    system: &dyn RenderSystem,
    config: &RenderSystemConfig,
    debugger: &RenderingDebugger,
) -> Result<()> {
    let size = if config.resolution.width == 0 || config.resolution.height == 0 {
        Extent2D::new(800, 600)
    } else {
        config.resolution
    };
    let surface = Arc::new(HeadlessSurface::new(size));
    let swap_chain = system.create_swap_chain(&config.swap_chain_descriptor(), surface)?;
    let resolution = swap_chain.resolution();

    let layout = VertexBufferLayout::packed([
        ("position".to_owned(), 0, VertexFormat::Float32x2),
        ("color".to_owned(), 1, VertexFormat::Unorm8x4),
    ]);
    let bytes: &[u8] = bytemuck::cast_slice(VERTICES);
    let vertex_buffer = system.create_buffer(
        &BufferDescriptor {
            label: Some("triangle vertices".into()),
            size: bytes.len() as u64,
            stride: layout.stride,
            bind_flags: BindFlags::VERTEX_BUFFER,
            vertex_attributes: layout.attributes.clone(),
            ..Default::default()
        },
        Some(bytes),
    )?;

    let vs = system.create_shader(
        &ShaderDescriptor::wgsl(ShaderStage::Vertex, SHADER, "vs_main").with_label("triangle.vs"),
    )?;
    let fs = system.create_shader(
        &ShaderDescriptor::wgsl(ShaderStage::Fragment, SHADER, "fs_main").with_label("triangle.fs"),
    )?;
    for shader in [&vs, &fs] {
        if !shader.is_valid() {
            bail!("shader compilation failed:\n{}", shader.report());
        }
    }

    let mut pipeline_desc = GraphicsPipelineDescriptor::new(vs, Some(fs));
    pipeline_desc.label = Some("triangle".into());
    pipeline_desc.render_pass = Some(swap_chain.render_pass());
    pipeline_desc.vertex_buffers = vec![layout];
    let pipeline = system.create_pipeline_state(&pipeline_desc.into(), None)?;
    if !pipeline.is_usable() {
        bail!("pipeline is not usable:\n{}", pipeline.report());
    }

    let queue = system.command_queue();
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    let fence = system.create_fence();

    let capture = debugger.begin_capture().context("a capture is already open")?;
    for frame in 0..FRAMES {
        cmd.begin()?;
        cmd.set_vertex_buffer(&vertex_buffer)?;
        cmd.begin_render_pass(
            swap_chain.as_render_target(),
            None,
            &[ClearValue::color([0.1, 0.1, 0.2, 1.0])],
            None,
        )?;
        cmd.set_viewports(&[Viewport::new(resolution.width as f32, resolution.height as f32)])?;
        cmd.set_pipeline_state(&pipeline)?;
        cmd.draw(3, 0)?;
        cmd.end_render_pass()?;
        cmd.end()?;

        queue.submit(cmd.as_mut())?;
        swap_chain.present()?;
        queue.submit_fence(&fence)?;
        if !queue.wait_fence(&fence, INFINITE_TIMEOUT) {
            bail!("frame {frame} never completed");
        }
        log::info!(
            "Frame {frame} presented, next swap buffer {}",
            swap_chain.current_swap_index()
        );
    }
    let profile = capture.finish();

    println!("{}", serde_json::to_string_pretty(&profile)?);
    for message in debugger.messages() {
        log::warn!("{message}");
    }
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let debugger = RenderingDebugger::new();
    let loader = BackendLoader::new();
    log::info!("Available backends: {}", loader.available_backends().join(", "));

    let system = loader.load(&config.render_system_descriptor().with_debugger(debugger.clone()))?;
    let info = system.renderer_info();
    log::info!("Loaded {} on {}", info.renderer_name, info.device_name);

    render(system.as_ref(), &config, &debugger)
}
