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
use common::{color_pass, color_texture, init_logging, texture_target};
use prism_core::math::{Extent2D, Extent3D};
use prism_core::platform::Surface;
use prism_core::renderer::{
    AttachmentDescriptor, AttachmentFormatDescriptor, BindFlags, ClearFlags, ClearValue,
    CommandBufferDescriptor, CommandError, CommandQueue, RenderError, RenderPassDescriptor,
    RenderSystem, RenderTarget, RenderTargetDescriptor, ResourceError, SwapChain,
    SwapChainDescriptor, Texture, TextureDescriptor, TextureFormat, TextureRegion, TextureType,
    INFINITE_TIMEOUT,
};
use prism_infra::{HeadlessSurface, NullRenderSystem};
use std::sync::Arc;

fn read_texels(system: &NullRenderSystem, texture: &Texture) -> Result<Vec<u8>> {
    let region = TextureRegion::whole_level(texture.descriptor(), 0);
    let mut texels = vec![0u8; region.byte_size(texture.format()) as usize];
    system.read_texture(texture, &region, &mut texels)?;
    Ok(texels)
}

#[test]
fn test_render_pass_must_match_the_target() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, _) = texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(8, 8))?;

    // Load ops do not take part in compatibility.
    let loading = system.create_render_pass(&RenderPassDescriptor {
        color_attachments: vec![AttachmentFormatDescriptor::new(TextureFormat::Rgba8Unorm)],
        ..Default::default()
    })?;
    assert!(loading.is_compatible_with(&pass));
    let other_format = color_pass(&system, TextureFormat::Bgra8Unorm)?;
    assert!(!other_format.is_compatible_with(&pass));

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.begin_render_pass(&target, Some(&loading), &[], None)?;
    cmd.end_render_pass()?;
    assert!(matches!(
        cmd.begin_render_pass(&target, Some(&other_format), &[], None),
        Err(CommandError::Argument(_))
    ));
    assert!(matches!(
        cmd.begin_render_pass(&target, None, &[ClearValue::default(); 2], None),
        Err(CommandError::Argument(_))
    ));
    assert!(matches!(
        cmd.begin_render_pass(&target, None, &[], Some(0)),
        Err(CommandError::Argument(_))
    ));
    cmd.end()?;
    Ok(())
}

#[test]
fn test_attachments_must_match_the_render_pass() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let size = Extent2D::new(8, 8);
    let pass = color_pass(&system, TextureFormat::Bgra8Unorm)?;
    let wrong_format = color_texture(&system, TextureFormat::Rgba8Unorm, size)?;

    let mut desc = RenderTargetDescriptor::new(pass.clone(), size);
    desc.color_attachments = vec![AttachmentDescriptor::new(wrong_format)];
    assert!(matches!(
        system.create_render_target(&desc),
        Err(ResourceError::AttachmentMismatch(_))
    ));

    desc.color_attachments.clear();
    assert!(matches!(
        system.create_render_target(&desc),
        Err(ResourceError::AttachmentMismatch(_))
    ));

    let depth_pass = system.create_render_pass(&RenderPassDescriptor {
        color_attachments: vec![AttachmentFormatDescriptor::cleared(TextureFormat::Bgra8Unorm)],
        depth_attachment: Some(AttachmentFormatDescriptor::cleared(TextureFormat::Depth32Float)),
        ..Default::default()
    })?;
    let mut desc = RenderTargetDescriptor::new(depth_pass, size);
    desc.color_attachments = vec![AttachmentDescriptor::new(color_texture(
        &system,
        TextureFormat::Bgra8Unorm,
        size,
    )?)];
    assert!(matches!(
        system.create_render_target(&desc),
        Err(ResourceError::AttachmentMismatch(_))
    ));

    let depth = system.create_texture(
        &TextureDescriptor {
            format: TextureFormat::Depth32Float,
            extent: Extent3D::new(size.width, size.height, 1),
            bind_flags: BindFlags::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        },
        None,
    )?;
    desc.depth_stencil_attachment = Some(AttachmentDescriptor::new(depth));
    let target = system.create_render_target(&desc)?;
    assert!(target.has_depth_attachment());
    assert!(!target.has_stencil_attachment());
    assert_eq!(target.resolution(), size);
    Ok(())
}

#[test]
fn test_clears_write_texels() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let pass = color_pass(&system, TextureFormat::Rgba8Unorm)?;
    let (target, texture) =
        texture_target(&system, &pass, TextureFormat::Rgba8Unorm, Extent2D::new(2, 2))?;

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.begin_render_pass(&target, None, &[ClearValue::color([1.0, 0.0, 0.0, 1.0])], None)?;
    cmd.end_render_pass()?;
    cmd.end()?;
    system.command_queue().submit(cmd.as_mut())?;
    assert_eq!(read_texels(&system, &texture)?, [255u8, 0, 0, 255].repeat(4));

    // Empty clear values fall back to the defaults; explicit clears follow.
    cmd.begin()?;
    cmd.begin_render_pass(&target, None, &[], None)?;
    assert_eq!(read_texels(&system, &texture)?, [255u8, 0, 0, 255].repeat(4));
    cmd.clear(ClearFlags::COLOR, &ClearValue::color([0.0, 0.0, 1.0, 1.0]))?;
    cmd.end_render_pass()?;
    cmd.end()?;
    let queue = system.command_queue();
    queue.submit(cmd.as_mut())?;
    queue.wait_idle();
    assert_eq!(read_texels(&system, &texture)?, [0u8, 0, 255, 255].repeat(4));
    Ok(())
}

#[test]
fn test_multisampled_pass_resolves_into_single_sample_texture() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let size = Extent2D::new(4, 4);
    let pass = system.create_render_pass(&RenderPassDescriptor {
        color_attachments: vec![AttachmentFormatDescriptor::cleared(TextureFormat::Rgba8Unorm)],
        samples: 4,
        ..Default::default()
    })?;
    let multisampled = system.create_texture(
        &TextureDescriptor {
            ty: TextureType::Texture2DMS,
            format: TextureFormat::Rgba8Unorm,
            extent: Extent3D::new(size.width, size.height, 1),
            bind_flags: BindFlags::COLOR_ATTACHMENT,
            samples: 4,
            ..Default::default()
        },
        None,
    )?;
    let resolved = color_texture(&system, TextureFormat::Rgba8Unorm, size)?;

    let mut desc = RenderTargetDescriptor::new(pass, size);
    desc.color_attachments = vec![AttachmentDescriptor::new(multisampled)];
    desc.resolve_attachments = vec![AttachmentDescriptor::new(resolved.clone())];
    let target = system.create_render_target(&desc)?;
    assert_eq!(target.samples(), 4);

    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.begin_render_pass(&target, None, &[ClearValue::color([0.0, 1.0, 0.0, 1.0])], None)?;
    cmd.end_render_pass()?;
    cmd.end()?;
    let queue = system.command_queue();
    queue.submit(cmd.as_mut())?;
    let fence = system.create_fence();
    queue.submit_fence(&fence)?;
    ensure!(queue.wait_fence(&fence, INFINITE_TIMEOUT), "fence never signaled");
    assert_eq!(read_texels(&system, &resolved)?, [0u8, 255, 0, 255].repeat(16));
    Ok(())
}

/// A surface reporting whatever refresh rate the display driver hands back.
struct ReportedRateSurface(f32);

impl Surface for ReportedRateSurface {
    fn process_events(&self) -> bool {
        true
    }

    fn content_size(&self) -> Extent2D {
        Extent2D::new(8, 8)
    }

    fn subscribe_resize(&self) -> flume::Receiver<Extent2D> {
        flume::unbounded().1
    }

    fn refresh_rate(&self) -> Option<f32> {
        Some(self.0)
    }
}

#[test]
fn test_vsync_present_ignores_unusable_refresh_rates() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    for hz in [0.0, -60.0, f32::NAN, f32::INFINITY] {
        let surface = Arc::new(ReportedRateSurface(hz));
        let swap_chain = system.create_swap_chain(&SwapChainDescriptor::default(), surface)?;
        swap_chain.set_vsync_interval(1);
        swap_chain.present()?;
        swap_chain.present()?;
    }
    Ok(())
}

#[test]
fn test_swap_chain_follows_surface_resizes() -> Result<()> {
    init_logging();
    let system = NullRenderSystem::new()?;
    let surface = Arc::new(HeadlessSurface::new(Extent2D::new(32, 32)));
    let swap_chain = system.create_swap_chain(&SwapChainDescriptor::default(), surface.clone())?;
    // A zero resolution takes the surface size.
    assert_eq!(swap_chain.resolution(), Extent2D::new(32, 32));
    assert!(swap_chain.has_depth_attachment());

    surface.resize(Extent2D::new(64, 40));
    assert_eq!(swap_chain.resolution(), Extent2D::new(32, 32));
    swap_chain.present()?;
    assert_eq!(swap_chain.resolution(), Extent2D::new(64, 40));

    swap_chain.resize_buffers(Extent2D::new(16, 8))?;
    assert_eq!(swap_chain.descriptor().resolution, Extent2D::new(16, 8));
    assert!(matches!(
        swap_chain.resize_buffers(Extent2D::new(0, 8)),
        Err(RenderError::Surface(_))
    ));

    // Recording against the resized chain uses the new resolution.
    let mut cmd = system.create_command_buffer(&CommandBufferDescriptor::default())?;
    cmd.begin()?;
    cmd.begin_render_pass(swap_chain.as_render_target(), None, &[], None)?;
    cmd.end_render_pass()?;
    assert!(matches!(
        cmd.begin_render_pass(swap_chain.as_render_target(), None, &[], Some(2)),
        Err(CommandError::Argument(_))
    ));
    cmd.end()?;
    system.command_queue().submit(cmd.as_mut())?;
    Ok(())
}
