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

mod common;

use anyhow::{ensure, Result};
use common::{color_pass, init_logging, texture_target, triangle_pipeline, vertex_buffer};
use prism_core::config::RenderSystemDescriptor;
use prism_core::diagnostics::{self, Severity};
use prism_core::math::Extent2D;
use prism_core::renderer::{
    BindFlags, Buffer, BufferDescriptor, ClearValue, CommandBufferDescriptor, CommandBufferFlags,
    CommandError, LoadError, RenderSystem, ShaderDescriptor, ShaderStage, SwapChainDescriptor,
    TextureFormat, INFINITE_TIMEOUT,
};
use prism_core::telemetry::{ErrorKind, MessageKind, RenderingDebugger, WarningKind};
use prism_infra::{BackendLoader, HeadlessSurface};
use std::sync::{Arc, Mutex};

fn load_debug_system(
    loader: &BackendLoader,
    debugger: &RenderingDebugger,
) -> Result<Arc<dyn RenderSystem>> {
    Ok(loader.load(&RenderSystemDescriptor::new("Null").with_debugger(debugger.clone()))?)
}

fn transfer_buffer(system: &dyn RenderSystem, size: u64) -> Result<Buffer> {
    Ok(system.create_buffer(
        &BufferDescriptor {
            size,
            bind_flags: BindFlags::COPY_SRC | BindFlags::COPY_DST,
            ..Default::default()
        },
        None,
    )?)
}

#[test]
fn test_invalid_transfers_are_rejected_with_messages() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let buffer = transfer_buffer(system.as_ref(), 64)?;

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    let err = cmd.copy_buffer(&buffer, 8, &buffer, 0, 16).unwrap_err();
    assert_eq!(
        err,
        CommandError::Validation("copy_buffer: source and destination ranges overlap".into())
    );
    let err = cmd.fill_buffer(&buffer, 0, 0, 6).unwrap_err();
    assert!(matches!(err, CommandError::Validation(ref text) if text.contains("multiple of 4")));

    // Disjoint ranges of one buffer are fine.
    cmd.copy_buffer(&buffer, 32, &buffer, 0, 16)?;
    cmd.end()?;

    let messages = debugger.messages();
    let overlap = messages
        .iter()
        .find(|m| m.source == "copy_buffer")
        .expect("overlap message");
    assert_eq!(overlap.kind, MessageKind::Error(ErrorKind::UndefinedBehavior));
    assert_eq!(
        overlap.to_string(),
        "error (UndefinedBehavior) in 'copy_buffer': source and destination ranges overlap"
    );
    assert!(messages
        .iter()
        .any(|m| m.source == "fill_buffer" && m.kind == MessageKind::Error(ErrorKind::InvalidArgument)));
    assert!(debugger.has_errors());
    Ok(())
}

#[test]
fn test_draw_needs_vertex_buffer_for_vertex_pipeline() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let pass = color_pass(system.as_ref(), TextureFormat::Rgba8Unorm)?;
    let (target, _) =
        texture_target(system.as_ref(), &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let pipeline = triangle_pipeline(system.as_ref(), &pass)?;
    let vertices = vertex_buffer(system.as_ref())?;

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.begin_render_pass(&target, None, &[], None)?;
    cmd.set_pipeline_state(&pipeline)?;
    let err = cmd.draw(3, 0).unwrap_err();
    assert!(matches!(err, CommandError::Validation(ref text) if text.starts_with("draw: ")));

    cmd.set_vertex_buffer(&vertices)?;
    cmd.draw(3, 0)?;
    cmd.end_render_pass()?;
    cmd.end()?;
    assert!(debugger.messages().iter().any(|m| m.source == "draw"
        && m.kind == MessageKind::Error(ErrorKind::InvalidState)
        && m.text.contains("no vertex buffer is bound")));
    Ok(())
}

#[test]
fn test_barrier_inside_render_pass_is_reported() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let pass = color_pass(system.as_ref(), TextureFormat::Rgba8Unorm)?;
    let (target, texture) =
        texture_target(system.as_ref(), &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.begin_render_pass(&target, None, &[], None)?;
    let err = cmd
        .resource_barrier(&[], std::slice::from_ref(&texture))
        .unwrap_err();
    assert!(matches!(err, CommandError::Validation(ref text) if text.starts_with("resource_barrier: ")));
    cmd.end_render_pass()?;
    cmd.resource_barrier(&[], std::slice::from_ref(&texture))?;
    cmd.end()?;
    assert!(debugger.messages().iter().any(|m| m.source == "resource_barrier"
        && m.kind == MessageKind::Error(ErrorKind::InvalidState)));
    Ok(())
}

#[test]
fn test_repeated_warnings_are_counted_once() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let pass = color_pass(system.as_ref(), TextureFormat::Rgba8Unorm)?;
    let (target, _) =
        texture_target(system.as_ref(), &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let pipeline = triangle_pipeline(system.as_ref(), &pass)?;
    let vertices = vertex_buffer(system.as_ref())?;

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.set_vertex_buffer(&vertices)?;
    cmd.begin_render_pass(&target, None, &[], None)?;
    cmd.set_pipeline_state(&pipeline)?;
    cmd.draw(0, 0)?;
    cmd.draw(0, 0)?;
    cmd.end_render_pass()?;
    cmd.end()?;

    let empty_draws: Vec<_> = debugger
        .messages()
        .into_iter()
        .filter(|m| m.text == "no vertices will be generated")
        .collect();
    assert_eq!(empty_draws.len(), 1);
    assert_eq!(empty_draws[0].occurrences, 2);
    assert_eq!(
        empty_draws[0].kind,
        MessageKind::Warning(WarningKind::PointlessOperation)
    );
    assert!(!debugger.has_errors());
    assert!(!debugger.take_messages().is_empty());
    assert!(debugger.messages().is_empty());
    Ok(())
}

#[test]
fn test_capture_profiles_a_triangle_frame() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let size = Extent2D::new(32, 32);
    let swap_chain = system.create_swap_chain(
        &SwapChainDescriptor {
            resolution: size,
            depth_stencil_format: None,
            ..Default::default()
        },
        Arc::new(HeadlessSurface::new(size)),
    )?;
    let pipeline = triangle_pipeline(system.as_ref(), &swap_chain.render_pass())?;
    let vertices = vertex_buffer(system.as_ref())?;
    let queue = system.command_queue();

    let capture = debugger.begin_capture().expect("no capture is open");
    assert!(debugger.is_capturing());
    assert!(debugger.begin_capture().is_none());

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.set_vertex_buffer(&vertices)?;
    cmd.begin_render_pass(
        swap_chain.as_render_target(),
        None,
        &[ClearValue::color([0.0, 0.0, 0.0, 1.0])],
        None,
    )?;
    cmd.set_pipeline_state(&pipeline)?;
    cmd.draw(3, 0)?;
    cmd.end_render_pass()?;
    cmd.end()?;
    queue.submit(cmd.as_mut())?;
    swap_chain.present()?;
    let fence = system.create_fence();
    queue.submit_fence(&fence)?;
    ensure!(queue.wait_fence(&fence, INFINITE_TIMEOUT), "frame fence never signaled");

    let profile = capture.finish();
    assert!(!debugger.is_capturing());
    let recorded = &profile.command_buffer;
    assert_eq!(recorded.encodings, 1);
    assert_eq!(recorded.vertex_buffer_bindings, 1);
    assert_eq!(recorded.graphics_pipeline_bindings, 1);
    assert_eq!(recorded.render_pass_sections, 1);
    assert_eq!(recorded.draw_commands, 1);
    assert_eq!(recorded.dispatch_commands, 0);
    let queued = &profile.command_queue;
    assert_eq!(queued.buffer_submissions, 1);
    assert_eq!(queued.fence_submissions, 1);
    assert_eq!(queued.fence_waits, 1);
    assert_eq!(queued.presents, 1);
    assert!(profile.time_records.iter().any(|r| r.annotation == "draw"));
    assert!(profile
        .time_records
        .iter()
        .all(|r| r.cpu_start_nanos <= r.cpu_end_nanos));

    // Work after the capture closed is not recorded anywhere.
    let next = debugger.begin_capture().expect("previous capture finished");
    assert_eq!(next.flush().command_buffer.draw_commands, 0);
    Ok(())
}

#[test]
fn test_queue_validates_submissions_and_fences() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let queue = system.command_queue();

    let mut secondary = system.create_command_buffer(&CommandBufferDescriptor {
        flags: CommandBufferFlags::SECONDARY,
        ..Default::default()
    })?;
    secondary.begin()?;
    secondary.end()?;
    assert!(matches!(
        queue.submit(secondary.as_mut()),
        Err(CommandError::Validation(_))
    ));

    let mut unrecorded = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    assert!(matches!(
        queue.submit(unrecorded.as_mut()),
        Err(CommandError::Validation(_))
    ));

    let fence = system.create_fence();
    assert!(!queue.wait_fence(&fence, 0));
    let messages = debugger.messages();
    assert!(messages.iter().any(|m| m.source == "wait_fence"
        && m.kind == MessageKind::Warning(WarningKind::ImproperState)
        && m.text == "waiting on a fence that was never submitted"));
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.source == "submit" && m.kind.severity() == Severity::Error)
            .count(),
        2
    );
    Ok(())
}

#[test]
fn test_failed_shader_compilation_is_reported() -> Result<()> {
    init_logging();
    let loader = BackendLoader::new();
    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;

    let shader = system.create_shader(
        &ShaderDescriptor::wgsl(ShaderStage::Vertex, "fn vs_main( {", "vs_main")
            .with_label("broken.vs"),
    )?;
    assert!(!shader.is_valid());
    assert!(shader.report().has_errors());
    assert!(debugger.messages().iter().any(|m| m.source == "create_shader"
        && m.kind == MessageKind::Error(ErrorKind::InvalidArgument)
        && m.text.starts_with("'broken.vs' failed:")));
    Ok(())
}

#[test]
fn test_messages_reach_diagnostics_callbacks() -> Result<()> {
    init_logging();
    let received = Arc::new(Mutex::new(Vec::<(Severity, String)>::new()));
    let sink = Arc::clone(&received);
    let handle = diagnostics::register_callback(move |severity, message| {
        // Callbacks are process-wide; keep only what this test posts.
        if message.contains("'Glide'") || message.contains("'callback probe'") {
            sink.lock().unwrap().push((severity, message.to_owned()));
        }
    });

    let loader = BackendLoader::new();
    assert!(matches!(
        loader.load(&RenderSystemDescriptor::new("Glide")),
        Err(LoadError::UnknownBackend { .. })
    ));

    let debugger = RenderingDebugger::new();
    let system = load_debug_system(&loader, &debugger)?;
    let buffer = system.create_buffer(
        &BufferDescriptor {
            label: Some("callback probe".into()),
            size: 32,
            bind_flags: BindFlags::COPY_DST,
            ..Default::default()
        },
        None,
    )?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    // Posted once even though the error repeats.
    for _ in 0..3 {
        assert!(cmd.fill_buffer(&buffer, 16, 0, 32).is_err());
    }
    cmd.end()?;
    drop(handle);
    cmd.begin()?;
    assert!(cmd.fill_buffer(&buffer, 0, 0, 64).is_err());
    cmd.end()?;

    let received = received.lock().unwrap();
    assert!(received
        .iter()
        .any(|(severity, text)| *severity == Severity::Error && text.contains("'Glide'")));
    let probes: Vec<_> = received
        .iter()
        .filter(|(_, text)| text.contains("'callback probe'"))
        .collect();
    assert_eq!(probes.len(), 1);
    assert_eq!(
        probes[0].1,
        "error (InvalidArgument) in 'fill_buffer': fill range exceeds the 32 bytes of buffer 'callback probe'"
    );
    Ok(())
}
