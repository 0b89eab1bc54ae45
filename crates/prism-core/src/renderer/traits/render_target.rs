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

use super::SwapChain;
use crate::math::Extent2D;
use crate::renderer::api::core::{BackendOwned, Nameable};
use crate::renderer::api::pass::RenderPass;
use std::any::Any;
use std::fmt::Debug;

/// Anything a render pass scope can be opened on.
///
/// Implemented by texture render targets and by swap chains.
pub trait RenderTarget: Nameable + BackendOwned + Debug + Send + Sync {
    /// Returns the render area.
    fn resolution(&self) -> Extent2D;

    /// Returns the sample count of the attachments.
    fn samples(&self) -> u32;

    /// Returns the number of color attachments.
    fn num_color_attachments(&self) -> usize;

    /// Returns `true` if the target has an attachment with a depth aspect.
    fn has_depth_attachment(&self) -> bool;

    /// Returns `true` if the target has an attachment with a stencil aspect.
    fn has_stencil_attachment(&self) -> bool;

    /// Returns the render pass the target's attachments follow.
    fn render_pass(&self) -> RenderPass;

    /// Returns the target as a swap chain, if it is one.
    fn as_swap_chain(&self) -> Option<&dyn SwapChain> {
        None
    }

    /// Allows downcasting to the backend's concrete target type.
    fn as_any(&self) -> &dyn Any;
}
