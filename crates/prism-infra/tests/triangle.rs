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
use common::{init_logging, triangle_pipeline, vertex_buffer};
use prism_core::math::Extent2D;
use prism_core::renderer::{
    ClearValue, CommandBufferDescriptor, CommandBufferState, CommandQueue, RenderSystem,
    RenderTarget, SwapChain, SwapChainDescriptor, Viewport, INFINITE_TIMEOUT,
};
use prism_infra::{HeadlessSurface, NullRenderSystem};
use std::sync::Arc;

fn swap_chain(
    system: &NullRenderSystem,
    size: Extent2D,
    swap_buffers: u32,
) -> Result<Arc<dyn SwapChain>> {
    let surface = Arc::new(HeadlessSurface::new(size));
    Ok(system.create_swap_chain(
        &SwapChainDescriptor {
            resolution: size,
            depth_stencil_format: None,
            swap_buffers,
            ..Default::default()
        },
        surface,
    )?)
}

#[test]
fn test_triangle_frame_reaches_the_queue() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let size = Extent2D::new(64, 48);
    let swap_chain = swap_chain(&system, size, 2)?;
    let vertices = vertex_buffer(&system)?;
    assert_eq!(vertices.descriptor().stride, 12);

    let pipeline = triangle_pipeline(&system, &swap_chain.render_pass())?;
    let queue = system.command_queue();
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;

    cmd.begin()?;
    cmd.set_vertex_buffer(&vertices)?;
    cmd.begin_render_pass(
        swap_chain.as_render_target(),
        None,
        &[ClearValue::color([0.1, 0.1, 0.2, 1.0])],
        None,
    )?;
    cmd.set_viewports(&[Viewport::new(size.width as f32, size.height as f32)])?;
    cmd.set_pipeline_state(&pipeline)?;
    cmd.draw(3, 0)?;
    cmd.end_render_pass()?;
    cmd.end()?;
    assert_eq!(cmd.state(), CommandBufferState::Executable);

    queue.submit(cmd.as_mut())?;
    swap_chain.present()?;
    let fence = system.create_fence();
    queue.submit_fence(&fence)?;
    ensure!(queue.wait_fence(&fence, INFINITE_TIMEOUT), "frame fence never signaled");

    let stats = system.execution_stats();
    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.vertices, 3);
    assert_eq!(stats.render_passes, 1);
    assert_eq!(stats.presents, 1);
    assert_eq!(stats.fences_signaled, 1);
    assert_eq!(swap_chain.current_swap_index(), 1);
    assert_eq!(cmd.state(), CommandBufferState::Initial);
    Ok(())
}

#[test]
fn test_swap_index_follows_presents() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let swap_chain = swap_chain(&system, Extent2D::new(16, 16), 3)?;
    assert_eq!(swap_chain.num_swap_buffers(), 3);
    assert_eq!(swap_chain.current_swap_index(), 0);

    for presents in 1..=7u32 {
        swap_chain.present()?;
        assert_eq!(swap_chain.current_swap_index(), presents % 3);
    }
    system.command_queue().wait_idle();
    assert_eq!(system.execution_stats().presents, 7);
    Ok(())
}

#[test]
fn test_fences_signal_in_submission_order() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let queue = system.command_queue();

    let never_submitted = system.create_fence();
    assert!(!queue.wait_fence(&never_submitted, 0));
    assert!(!never_submitted.is_signaled());

    let fences: Vec<_> = (0..4).map(|_| system.create_fence()).collect();
    for fence in &fences {
        queue.submit_fence(fence)?;
    }
    ensure!(queue.wait_fence(&fences[3], INFINITE_TIMEOUT), "last fence never signaled");
    for fence in &fences {
        assert!(fence.is_signaled());
    }

    // A fence resubmitted after signaling waits for the new work.
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.end()?;
    queue.submit(cmd.as_mut())?;
    queue.submit_fence(&fences[0])?;
    ensure!(queue.wait_fence(&fences[0], INFINITE_TIMEOUT), "resubmitted fence never signaled");
    assert_eq!(cmd.state(), CommandBufferState::Initial);
    assert_eq!(system.execution_stats().fences_signaled, 5);
    Ok(())
}

#[test]
fn test_present_waits_for_vertical_blank_with_vsync() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let surface = Arc::new(HeadlessSurface::new(Extent2D::new(8, 8)).with_refresh_rate(200.0));
    let swap_chain = system.create_swap_chain(
        &SwapChainDescriptor {
            resolution: Extent2D::new(8, 8),
            vsync_interval: 1,
            ..Default::default()
        },
        surface,
    )?;
    assert_eq!(swap_chain.vsync_interval(), 1);

    let start = std::time::Instant::now();
    swap_chain.present()?;
    assert!(start.elapsed() >= std::time::Duration::from_millis(4));
    // The present marker completed before the blank.
    assert_eq!(system.execution_stats().presents, 1);

    swap_chain.set_vsync_interval(0);
    assert_eq!(swap_chain.vsync_interval(), 0);
    Ok(())
}
