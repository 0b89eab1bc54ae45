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

use prism_core::math::Extent2D;
use prism_core::platform::Surface;
use prism_core::renderer::{
    BackendOwned, Nameable, ObjectKind, RenderError, RenderPass, RenderTarget, SwapChain,
    SwapChainDescriptor, SystemId,
};
use prism_core::telemetry::{ErrorKind, RenderingDebugger, WarningKind};
use std::any::Any;
use std::sync::Arc;

/// A swap chain wrapper that counts presents and reports failures.
#[derive(Debug)]
pub struct DebugSwapChain {
    inner: Arc<dyn SwapChain>,
    debugger: RenderingDebugger,
}

impl DebugSwapChain {
    pub(crate) fn new(inner: Arc<dyn SwapChain>, debugger: RenderingDebugger) -> Self {
        Self { inner, debugger }
    }

    /// The wrapped swap chain.
    pub fn inner(&self) -> &Arc<dyn SwapChain> {
        &self.inner
    }
}

impl Nameable for DebugSwapChain {
    fn set_name(&self, name: Option<&str>) {
        self.inner.set_name(name);
    }

    fn name(&self) -> Option<String> {
        self.inner.name()
    }
}

impl BackendOwned for DebugSwapChain {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::SwapChain
    }

    fn raw_id(&self) -> usize {
        self.inner.raw_id()
    }

    fn system_id(&self) -> SystemId {
        self.inner.system_id()
    }
}

impl RenderTarget for DebugSwapChain {
    fn resolution(&self) -> Extent2D {
        self.inner.resolution()
    }

    fn samples(&self) -> u32 {
        self.inner.samples()
    }

    fn num_color_attachments(&self) -> usize {
        self.inner.num_color_attachments()
    }

    fn has_depth_attachment(&self) -> bool {
        self.inner.has_depth_attachment()
    }

    fn has_stencil_attachment(&self) -> bool {
        self.inner.has_stencil_attachment()
    }

    fn render_pass(&self) -> RenderPass {
        self.inner.render_pass()
    }

    fn as_swap_chain(&self) -> Option<&dyn SwapChain> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }
}

impl SwapChain for DebugSwapChain {
    fn descriptor(&self) -> SwapChainDescriptor {
        self.inner.descriptor()
    }

    fn num_swap_buffers(&self) -> u32 {
        self.inner.num_swap_buffers()
    }

    fn current_swap_index(&self) -> u32 {
        self.inner.current_swap_index()
    }

    fn present(&self) -> Result<(), RenderError> {
        self.inner.present().inspect_err(|err| {
            self.debugger
                .post_error(ErrorKind::InvalidState, "present", err.to_string());
        })?;
        self.debugger.record(|p| p.command_queue.presents += 1);
        Ok(())
    }

    fn set_vsync_interval(&self, interval: u32) {
        self.inner.set_vsync_interval(interval);
    }

    fn vsync_interval(&self) -> u32 {
        self.inner.vsync_interval()
    }

    fn resize_buffers(&self, resolution: Extent2D) -> Result<(), RenderError> {
        if resolution == self.inner.resolution() {
            self.debugger.post_warning(
                WarningKind::PointlessOperation,
                "resize_buffers",
                "swap chain already has the requested resolution",
            );
        }
        self.inner.resize_buffers(resolution).inspect_err(|err| {
            self.debugger
                .post_error(ErrorKind::InvalidArgument, "resize_buffers", err.to_string());
        })
    }

    fn surface(&self) -> Arc<dyn Surface> {
        self.inner.surface()
    }

    fn as_render_target(&self) -> &dyn RenderTarget {
        self
    }
}
