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

//! Texture render targets: concrete textures bound to a render pass's slots.

use super::render_pass::RenderPass;
use crate::impl_backend_object;
use crate::math::Extent2D;
use crate::renderer::api::core::{BackendBinding, BackendOwned, ObjectCore};
use crate::renderer::api::resource::{BindFlags, Texture};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::RenderTarget;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, backend-assigned render target ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub usize);

/// One texture subresource bound as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    /// The attached texture.
    pub texture: Texture,
    /// The mip level rendered into.
    pub mip_level: u32,
    /// The array layer rendered into.
    pub array_layer: u32,
}

impl AttachmentDescriptor {
    /// Attaches mip 0, layer 0 of `texture`.
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            mip_level: 0,
            array_layer: 0,
        }
    }
}

/// A descriptor used to create a [`TextureRenderTarget`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The pass whose attachment signature the target follows.
    pub render_pass: RenderPass,
    /// The render area. Both dimensions must be non-zero.
    pub resolution: Extent2D,
    /// Color attachments in pass slot order.
    pub color_attachments: Vec<AttachmentDescriptor>,
    /// Single-sample textures that multisampled color attachments resolve into.
    /// Empty, or one per color attachment.
    pub resolve_attachments: Vec<AttachmentDescriptor>,
    /// The depth/stencil attachment.
    pub depth_stencil_attachment: Option<AttachmentDescriptor>,
}

impl RenderTargetDescriptor {
    /// A target with no attachments yet.
    pub fn new(render_pass: RenderPass, resolution: Extent2D) -> Self {
        Self {
            label: None,
            render_pass,
            resolution,
            color_attachments: Vec::new(),
            resolve_attachments: Vec::new(),
            depth_stencil_attachment: None,
        }
    }

    /// Checks the bound textures against the render pass.
    ///
    /// Count, format and sample mismatches are [`ResourceError::AttachmentMismatch`];
    /// bad subresources and missing bind flags are [`ResourceError::Argument`].
    pub fn validate(&self) -> Result<(), ResourceError> {
        let pass = self.render_pass.descriptor();
        if self.resolution.is_empty() {
            return Err(ResourceError::Argument(
                "render target resolution must be non-zero".into(),
            ));
        }
        if self.color_attachments.len() != pass.color_attachments.len() {
            return Err(ResourceError::AttachmentMismatch(format!(
                "render pass declares {} color attachments but {} were bound",
                pass.color_attachments.len(),
                self.color_attachments.len()
            )));
        }
        for (i, (attachment, slot)) in self
            .color_attachments
            .iter()
            .zip(&pass.color_attachments)
            .enumerate()
        {
            if attachment.texture.format() != slot.format {
                return Err(ResourceError::AttachmentMismatch(format!(
                    "color attachment {i} is {:?} but the render pass declares {:?}",
                    attachment.texture.format(),
                    slot.format
                )));
            }
            self.check_attachment("color", i, attachment, BindFlags::COLOR_ATTACHMENT, pass.samples)?;
        }

        if !self.resolve_attachments.is_empty() {
            if pass.samples <= 1 {
                return Err(ResourceError::AttachmentMismatch(
                    "resolve attachments need a multisampled render pass".into(),
                ));
            }
            if self.resolve_attachments.len() != self.color_attachments.len() {
                return Err(ResourceError::AttachmentMismatch(format!(
                    "{} resolve attachments for {} color attachments",
                    self.resolve_attachments.len(),
                    self.color_attachments.len()
                )));
            }
            for (i, (resolve, color)) in self
                .resolve_attachments
                .iter()
                .zip(&self.color_attachments)
                .enumerate()
            {
                if resolve.texture.format() != color.texture.format() {
                    return Err(ResourceError::AttachmentMismatch(format!(
                        "resolve attachment {i} format differs from its color attachment"
                    )));
                }
                self.check_attachment("resolve", i, resolve, BindFlags::COLOR_ATTACHMENT, 1)?;
            }
        }

        match (&self.depth_stencil_attachment, pass.depth_stencil_format()) {
            (None, None) => {}
            (Some(_), None) => {
                return Err(ResourceError::AttachmentMismatch(
                    "depth/stencil attachment bound but the render pass declares none".into(),
                ))
            }
            (None, Some(format)) => {
                return Err(ResourceError::AttachmentMismatch(format!(
                    "render pass declares a {format:?} depth/stencil attachment but none was bound"
                )))
            }
            (Some(attachment), Some(format)) => {
                if attachment.texture.format() != format {
                    return Err(ResourceError::AttachmentMismatch(format!(
                        "depth/stencil attachment is {:?} but the render pass declares {format:?}",
                        attachment.texture.format()
                    )));
                }
                self.check_attachment(
                    "depth/stencil",
                    0,
                    attachment,
                    BindFlags::DEPTH_STENCIL_ATTACHMENT,
                    pass.samples,
                )?;
            }
        }

        let system = self.render_pass.system_id();
        let foreign = self
            .color_attachments
            .iter()
            .chain(&self.resolve_attachments)
            .chain(&self.depth_stencil_attachment)
            .find(|a| a.texture.system_id() != system);
        if let Some(attachment) = foreign {
            return Err(ResourceError::BackendMismatch {
                kind: attachment.texture.object_kind(),
            });
        }
        Ok(())
    }

    fn check_attachment(
        &self,
        role: &str,
        index: usize,
        attachment: &AttachmentDescriptor,
        flag: BindFlags,
        samples: u32,
    ) -> Result<(), ResourceError> {
        let desc = attachment.texture.descriptor();
        if !desc.bind_flags.contains(flag) {
            return Err(ResourceError::Argument(format!(
                "{role} attachment {index} texture lacks {flag:?}"
            )));
        }
        if desc.samples.max(1) != samples.max(1) {
            return Err(ResourceError::AttachmentMismatch(format!(
                "{role} attachment {index} has {} samples but {samples} are required",
                desc.samples
            )));
        }
        if attachment.mip_level >= desc.resolved_mip_levels()
            || attachment.array_layer >= desc.array_layers
        {
            return Err(ResourceError::Argument(format!(
                "{role} attachment {index} subresource (mip {}, layer {}) is out of range",
                attachment.mip_level, attachment.array_layer
            )));
        }
        let extent = attachment.texture.mip_extent(attachment.mip_level);
        if extent.width < self.resolution.width || extent.height < self.resolution.height {
            return Err(ResourceError::Argument(format!(
                "{role} attachment {index} is {}x{}, smaller than the {}x{} render area",
                extent.width, extent.height, self.resolution.width, self.resolution.height
            )));
        }
        Ok(())
    }
}

struct TextureRenderTargetInner {
    core: ObjectCore,
    descriptor: RenderTargetDescriptor,
}

/// A reference-counted handle to a render target made of textures.
#[derive(Clone)]
pub struct TextureRenderTarget {
    inner: Arc<TextureRenderTargetInner>,
}

impl TextureRenderTarget {
    /// Validates `descriptor` and wraps it. Called by backends.
    pub fn new(
        binding: BackendBinding,
        descriptor: RenderTargetDescriptor,
    ) -> Result<Self, ResourceError> {
        descriptor.validate()?;
        let name = descriptor.label.clone();
        Ok(Self {
            inner: Arc::new(TextureRenderTargetInner {
                core: ObjectCore::new(binding, name),
                descriptor,
            }),
        })
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> RenderTargetId {
        RenderTargetId(self.inner.core.binding().id())
    }

    /// The descriptor the target was created with.
    pub fn descriptor(&self) -> &RenderTargetDescriptor {
        &self.inner.descriptor
    }
}

impl_backend_object!(TextureRenderTarget);

impl RenderTarget for TextureRenderTarget {
    fn resolution(&self) -> Extent2D {
        self.inner.descriptor.resolution
    }

    fn samples(&self) -> u32 {
        self.inner.descriptor.render_pass.samples()
    }

    fn num_color_attachments(&self) -> usize {
        self.inner.descriptor.color_attachments.len()
    }

    fn has_depth_attachment(&self) -> bool {
        self.inner
            .descriptor
            .depth_stencil_attachment
            .as_ref()
            .is_some_and(|a| a.texture.format().has_depth())
    }

    fn has_stencil_attachment(&self) -> bool {
        self.inner
            .descriptor
            .depth_stencil_attachment
            .as_ref()
            .is_some_and(|a| a.texture.format().has_stencil())
    }

    fn render_pass(&self) -> RenderPass {
        self.inner.descriptor.render_pass.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for TextureRenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureRenderTarget")
            .field("id", &self.id())
            .field("resolution", &self.inner.descriptor.resolution)
            .field("colors", &self.inner.descriptor.color_attachments.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Extent3D;
    use crate::renderer::api::core::{ObjectKind, SystemId};
    use crate::renderer::api::pass::{AttachmentFormatDescriptor, RenderPassDescriptor};
    use crate::renderer::api::resource::TextureDescriptor;
    use crate::renderer::api::util::TextureFormat;

    const SYSTEM: SystemId = SystemId(7);

    fn pass(colors: &[TextureFormat], depth: Option<TextureFormat>) -> RenderPass {
        RenderPass::new(
            BackendBinding::detached(ObjectKind::RenderPass, 1, SYSTEM),
            RenderPassDescriptor {
                color_attachments: colors
                    .iter()
                    .map(|f| AttachmentFormatDescriptor::cleared(*f))
                    .collect(),
                depth_attachment: depth.map(AttachmentFormatDescriptor::cleared),
                ..Default::default()
            },
        )
    }

    fn texture(format: TextureFormat, bind_flags: BindFlags) -> Texture {
        Texture::new(
            BackendBinding::detached(ObjectKind::Texture, 1, SYSTEM),
            TextureDescriptor {
                format,
                bind_flags,
                extent: Extent3D::new(64, 64, 1),
                ..Default::default()
            },
        )
    }

    fn color(format: TextureFormat) -> AttachmentDescriptor {
        AttachmentDescriptor::new(texture(format, BindFlags::COLOR_ATTACHMENT))
    }

    #[test]
    fn test_matching_target_is_accepted() {
        let mut desc = RenderTargetDescriptor::new(
            pass(&[TextureFormat::Rgba8Unorm], Some(TextureFormat::Depth32Float)),
            Extent2D::new(64, 64),
        );
        desc.color_attachments.push(color(TextureFormat::Rgba8Unorm));
        desc.depth_stencil_attachment = Some(AttachmentDescriptor::new(texture(
            TextureFormat::Depth32Float,
            BindFlags::DEPTH_STENCIL_ATTACHMENT,
        )));
        let target =
            TextureRenderTarget::new(BackendBinding::detached(ObjectKind::RenderTarget, 1, SYSTEM), desc)
                .unwrap();
        assert_eq!(target.num_color_attachments(), 1);
        assert!(target.has_depth_attachment());
        assert!(!target.has_stencil_attachment());
    }

    #[test]
    fn test_attachment_count_mismatch() {
        let mut desc = RenderTargetDescriptor::new(
            pass(&[TextureFormat::Rgba8Unorm, TextureFormat::Rgba8Unorm], None),
            Extent2D::new(64, 64),
        );
        desc.color_attachments.push(color(TextureFormat::Rgba8Unorm));
        assert!(matches!(
            desc.validate(),
            Err(ResourceError::AttachmentMismatch(_))
        ));
    }

    #[test]
    fn test_format_mismatch() {
        let mut desc = RenderTargetDescriptor::new(
            pass(&[TextureFormat::Rgba8Unorm], None),
            Extent2D::new(64, 64),
        );
        desc.color_attachments.push(color(TextureFormat::Rgba16Float));
        assert!(matches!(
            desc.validate(),
            Err(ResourceError::AttachmentMismatch(_))
        ));
    }

    #[test]
    fn test_zero_resolution_and_oversized_area() {
        let mut desc = RenderTargetDescriptor::new(
            pass(&[TextureFormat::Rgba8Unorm], None),
            Extent2D::new(0, 64),
        );
        desc.color_attachments.push(color(TextureFormat::Rgba8Unorm));
        assert!(matches!(desc.validate(), Err(ResourceError::Argument(_))));
        desc.resolution = Extent2D::new(128, 64);
        assert!(matches!(desc.validate(), Err(ResourceError::Argument(_))));
    }
}
