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
use prism_core::math::Extent2D;
use prism_core::renderer::{
    BindFlags, Buffer, BufferDescriptor, CommandBuffer, CommandBufferDescriptor,
    CommandBufferFlags, CommandBufferState, CommandError, CommandQueue, ComputePipelineDescriptor,
    QueryHeapDescriptor, QueryType, RenderSystem, ShaderDescriptor, ShaderStage, TextureFormat,
    INFINITE_TIMEOUT,
};
use prism_infra::NullRenderSystem;

fn transfer_buffer(system: &NullRenderSystem, size: u64) -> Result<Buffer> {
    Ok(system.create_buffer(
        &BufferDescriptor {
            size,
            bind_flags: BindFlags::COPY_SRC | BindFlags::COPY_DST,
            ..Default::default()
        },
        None,
    )?)
}

fn submit_and_wait(system: &NullRenderSystem, cmd: &mut dyn CommandBuffer) -> Result<()> {
    let queue = system.command_queue();
    queue.submit(cmd)?;
    let fence = system.create_fence();
    queue.submit_fence(&fence)?;
    ensure!(queue.wait_fence(&fence, INFINITE_TIMEOUT), "fence never signaled");
    Ok(())
}

#[test]
fn test_recording_calls_need_recording_state() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let buffer = transfer_buffer(&system, 16)?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    assert_eq!(cmd.state(), CommandBufferState::Initial);

    let err = cmd.fill_buffer(&buffer, 0, 7, 16).unwrap_err();
    assert!(matches!(
        err,
        CommandError::InvalidState {
            state: CommandBufferState::Initial,
            ..
        }
    ));
    assert!(matches!(cmd.end(), Err(CommandError::InvalidState { .. })));

    cmd.begin()?;
    assert_eq!(cmd.state(), CommandBufferState::Recording);
    assert!(matches!(cmd.begin(), Err(CommandError::InvalidState { .. })));
    cmd.end()?;
    assert_eq!(cmd.state(), CommandBufferState::Executable);
    assert!(matches!(
        cmd.draw(3, 0),
        Err(CommandError::InvalidState {
            state: CommandBufferState::Executable,
            ..
        })
    ));

    submit_and_wait(&system, cmd.as_mut())?;
    assert_eq!(cmd.state(), CommandBufferState::Initial);
    let queue = system.command_queue();
    assert!(matches!(
        queue.submit(cmd.as_mut()),
        Err(CommandError::InvalidState { .. })
    ));
    Ok(())
}

#[test]
fn test_multi_submit_buffer_stays_executable() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let buffer = transfer_buffer(&system, 8)?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::with_flags(
        CommandBufferFlags::MULTI_SUBMIT,
    ))?;
    cmd.begin()?;
    cmd.update_buffer(&buffer, 0, &[1, 2, 3, 4])?;
    cmd.end()?;

    submit_and_wait(&system, cmd.as_mut())?;
    assert_eq!(cmd.state(), CommandBufferState::Executable);
    submit_and_wait(&system, cmd.as_mut())?;
    assert_eq!(system.execution_stats().submissions, 2);

    // Beginning again from Executable discards the recording.
    cmd.begin()?;
    cmd.end()?;
    Ok(())
}

#[test]
fn test_immediate_buffer_submits_at_end() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let buffer = transfer_buffer(&system, 4)?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::with_flags(
        CommandBufferFlags::IMMEDIATE_SUBMIT,
    ))?;
    cmd.begin()?;
    cmd.update_buffer(&buffer, 0, &[9, 8, 7, 6])?;
    cmd.end()?;

    let mut bytes = [0u8; 4];
    system.read_buffer(&buffer, 0, &mut bytes)?;
    assert_eq!(bytes, [9, 8, 7, 6]);
    assert_eq!(system.execution_stats().submissions, 1);
    assert_eq!(cmd.state(), CommandBufferState::Initial);
    Ok(())
}

#[test]
fn test_open_scopes_block_end() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, _) = texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;

    cmd.begin()?;
    assert!(matches!(
        cmd.pop_debug_group(),
        Err(CommandError::InvalidState { .. })
    ));
    cmd.push_debug_group("frame")?;
    assert_eq!(cmd.end(), Err(CommandError::UnclosedScope("debug group")));
    cmd.pop_debug_group()?;

    cmd.begin_render_pass(&target, None, &[], None)?;
    assert_eq!(cmd.end(), Err(CommandError::UnclosedScope("render pass")));
    assert!(matches!(
        cmd.begin_render_pass(&target, None, &[], None),
        Err(CommandError::InsideRenderPass(_))
    ));
    cmd.end_render_pass()?;
    assert!(matches!(
        cmd.end_render_pass(),
        Err(CommandError::NotInRenderPass(_))
    ));

    let heap = system.create_query_heap(&QueryHeapDescriptor {
        ty: QueryType::TimeElapsed,
        num_queries: 2,
        ..Default::default()
    })?;
    cmd.begin_query(&heap, 0)?;
    assert_eq!(cmd.end(), Err(CommandError::UnclosedScope("query")));
    cmd.end_query(&heap, 0)?;
    cmd.end()?;
    Ok(())
}

#[test]
fn test_barriers_and_transfers_stay_outside_render_passes() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, texture) =
        texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let buffer = transfer_buffer(&system, 16)?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;

    cmd.begin()?;
    cmd.resource_barrier(std::slice::from_ref(&buffer), std::slice::from_ref(&texture))?;
    cmd.begin_render_pass(&target, None, &[], None)?;
    assert!(matches!(
        cmd.resource_barrier(std::slice::from_ref(&buffer), &[]),
        Err(CommandError::InsideRenderPass(_))
    ));
    assert!(matches!(
        cmd.resource_barrier(&[], std::slice::from_ref(&texture)),
        Err(CommandError::InsideRenderPass(_))
    ));
    assert!(matches!(
        cmd.fill_buffer(&buffer, 0, 0, 16),
        Err(CommandError::InsideRenderPass(_))
    ));
    cmd.end_render_pass()?;
    cmd.resource_barrier(std::slice::from_ref(&buffer), &[])?;
    cmd.end()?;
    Ok(())
}

#[test]
fn test_draws_need_a_pass_and_a_pipeline() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, _) = texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let pipeline = triangle_pipeline(&system, &pass)?;
    let vertices = vertex_buffer(&system)?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;

    cmd.begin()?;
    assert_eq!(cmd.draw(3, 0), Err(CommandError::NotInRenderPass("draw")));
    cmd.begin_render_pass(&target, None, &[], None)?;
    assert_eq!(cmd.draw(3, 0), Err(CommandError::NoPipelineBound("draw")));
    cmd.set_vertex_buffer(&vertices)?;
    cmd.set_pipeline_state(&pipeline)?;
    cmd.draw_instanced(3, 0, 4, 0)?;
    assert!(matches!(
        cmd.dispatch(1, 1, 1),
        Err(CommandError::InsideRenderPass(_))
    ));
    assert!(matches!(
        cmd.fill_buffer(&vertices, 0, 0, 4),
        Err(CommandError::InsideRenderPass(_))
    ));
    cmd.end_render_pass()?;
    cmd.end()?;

    submit_and_wait(&system, cmd.as_mut())?;
    let stats = system.execution_stats();
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.instances, 4);
    assert_eq!(stats.vertices, 12);
    Ok(())
}

#[test]
fn test_dispatch_with_compute_pipeline() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let shader = system.create_shader(&ShaderDescriptor::wgsl(
        ShaderStage::Compute,
        "@compute @workgroup_size(8, 8, 1)\nfn cs_main() {}\n",
        "cs_main",
    ))?;
    ensure!(shader.is_valid(), "{}", shader.report());
    let pipeline =
        system.create_pipeline_state(&ComputePipelineDescriptor::new(shader, None).into(), None)?;

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    assert_eq!(cmd.dispatch(1, 1, 1), Err(CommandError::NoPipelineBound("dispatch")));
    cmd.set_pipeline_state(&pipeline)?;
    cmd.dispatch(4, 2, 1)?;
    cmd.end()?;
    submit_and_wait(&system, cmd.as_mut())?;

    let stats = system.execution_stats();
    assert_eq!(stats.dispatches, 1);
    assert_eq!(stats.work_groups, 8);
    Ok(())
}

#[test]
fn test_transfers_execute_in_order() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let src = transfer_buffer(&system, 16)?;
    let dst = transfer_buffer(&system, 16)?;
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;

    cmd.begin()?;
    cmd.fill_buffer(&src, 0, 0xAABB_CCDD, 16)?;
    cmd.update_buffer(&src, 4, &[1, 2, 3, 4])?;
    cmd.copy_buffer(&dst, 8, &src, 0, 8)?;
    cmd.end()?;
    submit_and_wait(&system, cmd.as_mut())?;

    let mut bytes = [0u8; 16];
    system.read_buffer(&dst, 0, &mut bytes)?;
    assert_eq!(&bytes[..8], &[0; 8]);
    assert_eq!(&bytes[8..], &[0xDD, 0xCC, 0xBB, 0xAA, 1, 2, 3, 4]);
    Ok(())
}

#[test]
fn test_secondary_buffers_are_executed_not_submitted() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, _) = texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let pipeline = triangle_pipeline(&system, &pass)?;
    let vertices = vertex_buffer(&system)?;

    let mut secondary = system.create_command_buffer(&CommandBufferDescriptor::with_flags(
        CommandBufferFlags::SECONDARY,
    ))?;
    secondary.begin()?;
    secondary.set_vertex_buffer(&vertices)?;
    secondary.set_pipeline_state(&pipeline)?;
    secondary.draw(3, 0)?;
    secondary.end()?;
    assert!(matches!(
        system.command_queue().submit(secondary.as_mut()),
        Err(CommandError::Secondary(_))
    ));

    let mut other = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    other.begin()?;
    other.end()?;

    let mut primary = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    primary.begin()?;
    assert!(matches!(
        primary.execute(other.as_ref()),
        Err(CommandError::Secondary(_))
    ));
    primary.begin_render_pass(&target, None, &[], None)?;
    primary.execute(secondary.as_ref())?;
    primary.execute(secondary.as_ref())?;
    primary.end_render_pass()?;
    primary.end()?;
    submit_and_wait(&system, primary.as_mut())?;

    let stats = system.execution_stats();
    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.draws, 2);
    assert_eq!(secondary.state(), CommandBufferState::Executable);
    Ok(())
}

#[test]
fn test_occlusion_and_timestamp_queries() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, _) = texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(4, 4))?;
    let pipeline = triangle_pipeline(&system, &pass)?;
    let vertices = vertex_buffer(&system)?;
    let occlusion = system.create_query_heap(&QueryHeapDescriptor {
        ty: QueryType::Occlusion,
        num_queries: 1,
        ..Default::default()
    })?;
    let timestamps = system.create_query_heap(&QueryHeapDescriptor {
        ty: QueryType::Timestamp,
        num_queries: 2,
        ..Default::default()
    })?;
    let queue = system.command_queue();
    let mut results = [0u64; 1];
    assert!(!queue.query_result(&occlusion, 0, &mut results));

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    assert!(matches!(
        cmd.begin_query(&occlusion, 1),
        Err(CommandError::Argument(_))
    ));
    assert!(matches!(
        cmd.end_query(&occlusion, 0),
        Err(CommandError::Argument(_))
    ));
    cmd.end_query(&timestamps, 0)?;
    cmd.begin_render_pass(&target, None, &[], None)?;
    cmd.set_vertex_buffer(&vertices)?;
    cmd.set_pipeline_state(&pipeline)?;
    cmd.begin_query(&occlusion, 0)?;
    cmd.draw(3, 0)?;
    cmd.end_query(&occlusion, 0)?;
    cmd.end_render_pass()?;
    cmd.end_query(&timestamps, 1)?;
    cmd.end()?;
    submit_and_wait(&system, cmd.as_mut())?;

    assert!(queue.query_result(&occlusion, 0, &mut results));
    assert_eq!(results, [3]);
    let mut stamps = [0u64; 2];
    assert!(queue.query_result(&timestamps, 0, &mut stamps));
    assert!(stamps[0] > 0 && stamps[0] <= stamps[1]);
    Ok(())
}
