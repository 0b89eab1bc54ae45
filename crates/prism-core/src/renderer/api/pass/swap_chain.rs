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

//! Swap-chain descriptors.

use super::render_pass::{AttachmentFormatDescriptor, RenderPassDescriptor};
use crate::math::Extent2D;
use crate::renderer::api::core::{ObjectKind, RenderingCapabilities};
use crate::renderer::api::util::TextureFormat;
use crate::renderer::error::ResourceError;

/// A descriptor used to create a swap chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwapChainDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The image size. A zero size takes the surface's content size.
    pub resolution: Extent2D,
    /// The color format of the images.
    pub color_format: TextureFormat,
    /// The depth/stencil format, or `None` for color-only swap chains.
    pub depth_stencil_format: Option<TextureFormat>,
    /// The sample count.
    pub samples: u32,
    /// The number of buffered images, at least 1.
    pub swap_buffers: u32,
    /// Vertical blanks to wait for on present; 0 disables vsync.
    pub vsync_interval: u32,
}

impl Default for SwapChainDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            resolution: Extent2D::default(),
            color_format: TextureFormat::Bgra8Unorm,
            depth_stencil_format: Some(TextureFormat::Depth24PlusStencil8),
            samples: 1,
            swap_buffers: 2,
            vsync_interval: 0,
        }
    }
}

impl SwapChainDescriptor {
    /// The render pass every swap-chain image follows: color and depth/stencil
    /// are cleared on load and stored.
    pub fn render_pass_descriptor(&self) -> RenderPassDescriptor {
        let depth = self
            .depth_stencil_format
            .filter(TextureFormat::has_depth)
            .map(AttachmentFormatDescriptor::cleared);
        let stencil = self
            .depth_stencil_format
            .filter(TextureFormat::has_stencil)
            .map(AttachmentFormatDescriptor::cleared);
        RenderPassDescriptor {
            label: self.label.as_ref().map(|l| format!("{l} pass")),
            color_attachments: vec![AttachmentFormatDescriptor::cleared(self.color_format)],
            depth_attachment: depth,
            stencil_attachment: stencil,
            samples: self.samples,
        }
    }

    /// Checks the descriptor against the backend.
    pub fn validate(&self, caps: &RenderingCapabilities) -> Result<(), ResourceError> {
        if self.swap_buffers == 0 {
            return Err(ResourceError::Argument(
                "a swap chain needs at least one buffer".into(),
            ));
        }
        if !self.color_format.is_color() || !caps.supports_format(self.color_format) {
            return Err(ResourceError::ResourceCreation {
                kind: ObjectKind::SwapChain,
                reason: format!("unsupported color format {:?}", self.color_format),
            });
        }
        if let Some(format) = self.depth_stencil_format {
            if format.is_color() || !caps.supports_format(format) {
                return Err(ResourceError::ResourceCreation {
                    kind: ObjectKind::SwapChain,
                    reason: format!("unsupported depth/stencil format {format:?}"),
                });
            }
        }
        self.render_pass_descriptor().validate(caps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::pass::LoadOp;

    #[test]
    fn test_default_pass_clears_everything() {
        let pass = SwapChainDescriptor::default().render_pass_descriptor();
        assert_eq!(pass.color_attachments[0].load_op, LoadOp::Clear);
        assert_eq!(pass.depth_stencil_format(), Some(TextureFormat::Depth24PlusStencil8));
        assert_eq!(pass.num_clear_values(), 2);
    }

    #[test]
    fn test_zero_buffers_rejected() {
        let caps = RenderingCapabilities {
            texture_formats: TextureFormat::ALL.to_vec(),
            ..Default::default()
        };
        let desc = SwapChainDescriptor {
            swap_buffers: 0,
            ..Default::default()
        };
        assert!(matches!(desc.validate(&caps), Err(ResourceError::Argument(_))));
    }
}
