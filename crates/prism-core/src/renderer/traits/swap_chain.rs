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

use super::RenderTarget;
use crate::math::Extent2D;
use crate::platform::Surface;
use crate::renderer::api::pass::SwapChainDescriptor;
use crate::renderer::error::RenderError;
use std::sync::Arc;

/// A presentable render target with `N` buffered images tied to a surface.
///
/// The current swap index starts at 0 and advances to `(index + 1) % N` on
/// every [`SwapChain::present`].
pub trait SwapChain: RenderTarget {
    /// Returns the descriptor the swap chain was created with, with the
    /// resolved resolution and current vsync interval.
    fn descriptor(&self) -> SwapChainDescriptor;

    /// Returns the number of buffered images.
    fn num_swap_buffers(&self) -> u32;

    /// Returns the index of the image the next render pass renders into.
    fn current_swap_index(&self) -> u32;

    /// Makes the current image available to the compositor and advances the
    /// swap index.
    ///
    /// With a vsync interval `n >= 1` this may block until `n` vertical blanks
    /// have passed.
    fn present(&self) -> Result<(), RenderError>;

    /// Sets the number of vertical blanks to wait for on present; 0 disables vsync.
    fn set_vsync_interval(&self, interval: u32);

    /// Returns the vsync interval.
    fn vsync_interval(&self) -> u32;

    /// Recreates the images at a new resolution after the queue is idle.
    fn resize_buffers(&self, resolution: Extent2D) -> Result<(), RenderError>;

    /// Returns the surface the swap chain presents to.
    fn surface(&self) -> Arc<dyn Surface>;

    /// Returns the swap chain as a plain render target.
    fn as_render_target(&self) -> &dyn RenderTarget;
}
