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

//! Render passes: attachment formats and load/store behavior, without resources.

use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore, ObjectKind, RenderingCapabilities};
use crate::renderer::api::util::TextureFormat;
use crate::renderer::error::ResourceError;
use std::fmt;
use std::sync::Arc;

/// The maximum number of color attachments a render pass may declare.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// An opaque, backend-assigned render pass ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPassId(pub usize);

/// What happens to an attachment's contents when the pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadOp {
    /// Contents are undefined.
    #[default]
    Undefined,
    /// Previous contents are preserved.
    Load,
    /// Contents are cleared with the value given to `begin_render_pass`.
    Clear,
}

/// What happens to an attachment's contents when the pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    /// Results are written back.
    #[default]
    Store,
    /// Results may be discarded.
    Undefined,
}

/// The format and load/store ops of one attachment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentFormatDescriptor {
    /// The attachment format.
    pub format: TextureFormat,
    /// The load op.
    pub load_op: LoadOp,
    /// The store op.
    pub store_op: StoreOp,
}

impl AttachmentFormatDescriptor {
    /// An attachment that is loaded and stored.
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
        }
    }

    /// An attachment that is cleared and stored.
    pub fn cleared(format: TextureFormat) -> Self {
        Self {
            format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
        }
    }
}

/// A descriptor used to create a [`RenderPass`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderPassDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Color attachment slots, at most [`MAX_COLOR_ATTACHMENTS`].
    pub color_attachments: Vec<AttachmentFormatDescriptor>,
    /// The depth attachment slot.
    pub depth_attachment: Option<AttachmentFormatDescriptor>,
    /// The stencil attachment slot. Shares the depth texture when both are set.
    pub stencil_attachment: Option<AttachmentFormatDescriptor>,
    /// The sample count of every attachment.
    pub samples: u32,
}

impl Default for RenderPassDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            color_attachments: Vec::new(),
            depth_attachment: None,
            stencil_attachment: None,
            samples: 1,
        }
    }
}

impl RenderPassDescriptor {
    /// The number of clear values `begin_render_pass` expects: one per color
    /// attachment with a `Clear` load op, then one for depth/stencil if either clears.
    pub fn num_clear_values(&self) -> usize {
        let colors = self
            .color_attachments
            .iter()
            .filter(|a| a.load_op == LoadOp::Clear)
            .count();
        colors + usize::from(self.clears_depth_stencil())
    }

    /// Returns `true` if the depth or the stencil attachment clears.
    pub fn clears_depth_stencil(&self) -> bool {
        self.depth_attachment
            .iter()
            .chain(self.stencil_attachment.iter())
            .any(|a| a.load_op == LoadOp::Clear)
    }

    /// The color attachment formats in slot order.
    pub fn color_formats(&self) -> Vec<TextureFormat> {
        self.color_attachments.iter().map(|a| a.format).collect()
    }

    /// The depth/stencil format, if the pass has one.
    pub fn depth_stencil_format(&self) -> Option<TextureFormat> {
        self.depth_attachment
            .or(self.stencil_attachment)
            .map(|a| a.format)
    }

    /// Checks the attachment declarations against the backend.
    pub fn validate(&self, caps: &RenderingCapabilities) -> Result<(), ResourceError> {
        let fail = |reason: String| ResourceError::ResourceCreation {
            kind: ObjectKind::RenderPass,
            reason,
        };
        let max = (caps.limits.max_color_attachments as usize).min(MAX_COLOR_ATTACHMENTS);
        if self.color_attachments.len() > max {
            return Err(fail(format!(
                "{} color attachments exceed the limit of {max}",
                self.color_attachments.len()
            )));
        }
        if self.samples == 0 || !self.samples.is_power_of_two() {
            return Err(fail(format!("invalid sample count {}", self.samples)));
        }
        for (i, attachment) in self.color_attachments.iter().enumerate() {
            if !attachment.format.is_color() {
                return Err(fail(format!(
                    "color attachment {i} has non-color format {:?}",
                    attachment.format
                )));
            }
            if !caps.supports_format(attachment.format) {
                return Err(fail(format!(
                    "color format {:?} is not supported",
                    attachment.format
                )));
            }
        }
        if let Some(depth) = &self.depth_attachment {
            if !depth.format.has_depth() {
                return Err(fail(format!(
                    "depth attachment has format {:?} without depth",
                    depth.format
                )));
            }
        }
        if let Some(stencil) = &self.stencil_attachment {
            if !stencil.format.has_stencil() {
                return Err(fail(format!(
                    "stencil attachment has format {:?} without stencil",
                    stencil.format
                )));
            }
            if let Some(depth) = &self.depth_attachment {
                if depth.format != stencil.format {
                    return Err(fail(
                        "depth and stencil attachments must share one format".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

struct RenderPassInner {
    core: ObjectCore,
    descriptor: RenderPassDescriptor,
}

/// A reference-counted handle to an immutable render pass.
#[derive(Clone)]
pub struct RenderPass {
    inner: Arc<RenderPassInner>,
}

impl RenderPass {
    /// Wraps a backend render pass. Called by backends.
    pub fn new(binding: BackendBinding, descriptor: RenderPassDescriptor) -> Self {
        let name = descriptor.label.clone();
        Self {
            inner: Arc::new(RenderPassInner {
                core: ObjectCore::new(binding, name),
                descriptor,
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> RenderPassId {
        RenderPassId(self.inner.core.binding().id())
    }

    /// The descriptor the pass was created with.
    pub fn descriptor(&self) -> &RenderPassDescriptor {
        &self.inner.descriptor
    }

    /// The number of color attachments.
    pub fn num_color_attachments(&self) -> usize {
        self.inner.descriptor.color_attachments.len()
    }

    /// The sample count.
    pub fn samples(&self) -> u32 {
        self.inner.descriptor.samples
    }

    /// Returns `true` if `other` declares the same attachment signature, so
    /// pipelines built for one can render into targets of the other.
    pub fn is_compatible_with(&self, other: &RenderPass) -> bool {
        let (a, b) = (self.descriptor(), other.descriptor());
        a.color_formats() == b.color_formats()
            && a.depth_stencil_format() == b.depth_stencil_format()
            && a.samples == b.samples
    }
}

impl_backend_object!(RenderPass);

impl fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("id", &self.id())
            .field("colors", &self.inner.descriptor.color_formats())
            .field("depth_stencil", &self.inner.descriptor.depth_stencil_format())
            .field("samples", &self.samples())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::SystemId;

    fn caps() -> RenderingCapabilities {
        let mut caps = RenderingCapabilities {
            texture_formats: TextureFormat::ALL.to_vec(),
            ..Default::default()
        };
        caps.limits.max_color_attachments = 8;
        caps
    }

    #[test]
    fn test_clear_value_count() {
        let desc = RenderPassDescriptor {
            color_attachments: vec![
                AttachmentFormatDescriptor::cleared(TextureFormat::Rgba8Unorm),
                AttachmentFormatDescriptor::new(TextureFormat::Rgba8Unorm),
                AttachmentFormatDescriptor::cleared(TextureFormat::Rgba16Float),
            ],
            depth_attachment: Some(AttachmentFormatDescriptor::cleared(
                TextureFormat::Depth32Float,
            )),
            ..Default::default()
        };
        assert_eq!(desc.num_clear_values(), 3);
        assert!(desc.validate(&caps()).is_ok());
    }

    #[test]
    fn test_too_many_color_attachments() {
        let desc = RenderPassDescriptor {
            color_attachments: vec![
                AttachmentFormatDescriptor::new(TextureFormat::Rgba8Unorm);
                MAX_COLOR_ATTACHMENTS + 1
            ],
            ..Default::default()
        };
        assert!(desc.validate(&caps()).is_err());
    }

    #[test]
    fn test_depth_format_in_color_slot() {
        let desc = RenderPassDescriptor {
            color_attachments: vec![AttachmentFormatDescriptor::new(
                TextureFormat::Depth32Float,
            )],
            ..Default::default()
        };
        assert!(desc.validate(&caps()).is_err());
    }

    #[test]
    fn test_compatibility_ignores_load_ops() {
        let make = |load_op| {
            RenderPass::new(
                BackendBinding::detached(ObjectKind::RenderPass, 1, SystemId(1)),
                RenderPassDescriptor {
                    color_attachments: vec![AttachmentFormatDescriptor {
                        format: TextureFormat::Bgra8Unorm,
                        load_op,
                        store_op: StoreOp::Store,
                    }],
                    ..Default::default()
                },
            )
        };
        let cleared = make(LoadOp::Clear);
        let loaded = make(LoadOp::Load);
        assert!(cleared.is_compatible_with(&loaded));
        assert_ne!(cleared, loaded);
    }
}
