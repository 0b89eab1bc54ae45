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

use super::device::NullDevice;
use super::queue::NullCommandQueue;
use prism_core::math::{Extent2D, Extent3D};
use prism_core::platform::Surface;
use prism_core::renderer::{
    BackendOwned, BindFlags, Nameable, ObjectCore, ObjectKind, RenderError, RenderPass,
    RenderTarget, ResourceError, SwapChain, SwapChainDescriptor, SystemId, Texture,
    TextureDescriptor, TextureType,
};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// The textures behind one swap-chain image.
#[derive(Debug, Clone)]
pub(crate) struct SwapImage {
    pub color: Texture,
    pub depth_stencil: Option<Texture>,
}

struct SwapState {
    descriptor: SwapChainDescriptor,
    images: Vec<SwapImage>,
    current: u32,
}

/// A swap chain of the Null backend, backed by ordinary textures.
///
/// Presenting queues a marker after all submitted work and advances the swap
/// index. With a vsync interval and a surface that reports a refresh rate,
/// `present` blocks until the marker completes and the vertical blanks pass.
pub struct NullSwapChain {
    core: ObjectCore,
    device: NullDevice,
    queue: Arc<NullCommandQueue>,
    surface: Arc<dyn Surface>,
    resize_events: flume::Receiver<Extent2D>,
    render_pass: RenderPass,
    state: Mutex<SwapState>,
    vsync_interval: AtomicU32,
}

impl NullSwapChain {
    pub(crate) fn new(
        device: NullDevice,
        queue: Arc<NullCommandQueue>,
        descriptor: &SwapChainDescriptor,
        surface: Arc<dyn Surface>,
    ) -> Result<Self, ResourceError> {
        let mut descriptor = descriptor.clone();
        if descriptor.resolution.is_empty() {
            descriptor.resolution = surface.content_size();
        }
        if descriptor.resolution.is_empty() {
            return Err(ResourceError::Argument(
                "swap chain resolution is zero and the surface has no content".into(),
            ));
        }
        let render_pass = RenderPass::new(
            device.bind(ObjectKind::RenderPass),
            descriptor.render_pass_descriptor(),
        );
        let images = create_images(&device, &descriptor);
        log::info!(
            "Created swap chain {}x{} with {} buffers ({:?})",
            descriptor.resolution.width,
            descriptor.resolution.height,
            images.len(),
            descriptor.color_format
        );
        Ok(Self {
            core: ObjectCore::new(device.bind(ObjectKind::SwapChain), descriptor.label.clone()),
            resize_events: surface.subscribe_resize(),
            vsync_interval: AtomicU32::new(descriptor.vsync_interval),
            state: Mutex::new(SwapState {
                descriptor,
                images,
                current: 0,
            }),
            device,
            queue,
            surface,
            render_pass,
        })
    }

    /// The textures of image `index`.
    pub(crate) fn image(&self, index: u32) -> Option<SwapImage> {
        self.lock().images.get(index as usize).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, SwapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn create_images(device: &NullDevice, descriptor: &SwapChainDescriptor) -> Vec<SwapImage> {
    let extent = Extent3D::new(descriptor.resolution.width, descriptor.resolution.height, 1);
    let ty = if descriptor.samples > 1 {
        TextureType::Texture2DMS
    } else {
        TextureType::Texture2D
    };
    (0..descriptor.swap_buffers)
        .map(|i| SwapImage {
            color: device.create_texture(
                &TextureDescriptor {
                    label: Some(format!("swap chain color {i}")),
                    ty,
                    format: descriptor.color_format,
                    extent,
                    mip_levels: 1,
                    samples: descriptor.samples,
                    bind_flags: BindFlags::COLOR_ATTACHMENT | BindFlags::SAMPLED | BindFlags::COPY_SRC,
                    ..Default::default()
                },
                None,
            ),
            depth_stencil: descriptor.depth_stencil_format.map(|format| {
                device.create_texture(
                    &TextureDescriptor {
                        label: Some(format!("swap chain depth-stencil {i}")),
                        ty,
                        format,
                        extent,
                        mip_levels: 1,
                        samples: descriptor.samples,
                        bind_flags: BindFlags::DEPTH_STENCIL_ATTACHMENT,
                        ..Default::default()
                    },
                    None,
                )
            }),
        })
        .collect()
}

impl fmt::Debug for NullSwapChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("NullSwapChain")
            .field("id", &self.raw_id())
            .field("resolution", &state.descriptor.resolution)
            .field("swap_buffers", &state.images.len())
            .field("current", &state.current)
            .finish()
    }
}

impl Nameable for NullSwapChain {
    fn set_name(&self, name: Option<&str>) {
        self.core.set_name(name);
    }

    fn name(&self) -> Option<String> {
        self.core.name()
    }
}

impl BackendOwned for NullSwapChain {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::SwapChain
    }

    fn raw_id(&self) -> usize {
        self.core.binding().id()
    }

    fn system_id(&self) -> SystemId {
        self.device.system()
    }
}

impl RenderTarget for NullSwapChain {
    fn resolution(&self) -> Extent2D {
        self.lock().descriptor.resolution
    }

    fn samples(&self) -> u32 {
        self.lock().descriptor.samples
    }

    fn num_color_attachments(&self) -> usize {
        1
    }

    fn has_depth_attachment(&self) -> bool {
        self.lock()
            .descriptor
            .depth_stencil_format
            .is_some_and(|f| f.has_depth())
    }

    fn has_stencil_attachment(&self) -> bool {
        self.lock()
            .descriptor
            .depth_stencil_format
            .is_some_and(|f| f.has_stencil())
    }

    fn render_pass(&self) -> RenderPass {
        self.render_pass.clone()
    }

    fn as_swap_chain(&self) -> Option<&dyn SwapChain> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SwapChain for NullSwapChain {
    fn descriptor(&self) -> SwapChainDescriptor {
        let mut descriptor = self.lock().descriptor.clone();
        descriptor.vsync_interval = self.vsync_interval();
        descriptor
    }

    fn num_swap_buffers(&self) -> u32 {
        self.lock().images.len() as u32
    }

    fn current_swap_index(&self) -> u32 {
        self.lock().current
    }

    fn present(&self) -> Result<(), RenderError> {
        if let Some(size) = self.resize_events.try_iter().last() {
            if !size.is_empty() && size != self.resolution() {
                self.resize_buffers(size)?;
            }
        }

        let ticket = self.queue.present();
        {
            let mut state = self.lock();
            let count = state.images.len() as u32;
            state.current = (state.current + 1) % count;
        }

        let interval = self.vsync_interval();
        if interval > 0 {
            // Surfaces without a usable refresh rate present unthrottled.
            if let Some(hz) = self
                .surface
                .refresh_rate()
                .filter(|hz| hz.is_finite() && *hz > 0.0)
            {
                self.queue.timeline().wait(ticket, None);
                thread::sleep(Duration::from_secs_f32(interval as f32 / hz));
            }
        }
        Ok(())
    }

    fn set_vsync_interval(&self, interval: u32) {
        self.vsync_interval.store(interval, Ordering::Relaxed);
    }

    fn vsync_interval(&self) -> u32 {
        self.vsync_interval.load(Ordering::Relaxed)
    }

    fn resize_buffers(&self, resolution: Extent2D) -> Result<(), RenderError> {
        if resolution.is_empty() {
            return Err(RenderError::Surface(format!(
                "cannot resize swap chain to {}x{}",
                resolution.width, resolution.height
            )));
        }
        self.queue.timeline().wait_idle();
        let mut state = self.lock();
        state.descriptor.resolution = resolution;
        state.images = create_images(&self.device, &state.descriptor);
        log::info!(
            "Resized swap chain to {}x{}",
            resolution.width,
            resolution.height
        );
        Ok(())
    }

    fn surface(&self) -> Arc<dyn Surface> {
        Arc::clone(&self.surface)
    }

    fn as_render_target(&self) -> &dyn RenderTarget {
        self
    }
}
