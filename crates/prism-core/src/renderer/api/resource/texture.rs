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

//! Defines data structures related to GPU textures.

use super::flags::{BindFlags, MiscFlags};
use crate::impl_backend_object;
use crate::math::{Extent3D, Offset3D};
use crate::renderer::api::core::{BackendBinding, ObjectCore};
use crate::renderer::api::util::TextureFormat;
use std::fmt;
use std::sync::Arc;

/// An opaque, backend-assigned texture ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// The dimensionality and layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    /// A one-dimensional texture.
    Texture1D,
    /// A two-dimensional texture.
    #[default]
    Texture2D,
    /// A three-dimensional texture.
    Texture3D,
    /// A cube texture with six faces.
    TextureCube,
    /// An array of one-dimensional textures.
    Texture1DArray,
    /// An array of two-dimensional textures.
    Texture2DArray,
    /// An array of cube textures.
    TextureCubeArray,
    /// A multisampled two-dimensional texture.
    Texture2DMS,
    /// An array of multisampled two-dimensional textures.
    Texture2DMSArray,
}

impl TextureType {
    /// Returns `true` for array types, including cube textures whose faces are layers.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            TextureType::Texture1DArray
                | TextureType::Texture2DArray
                | TextureType::TextureCube
                | TextureType::TextureCubeArray
                | TextureType::Texture2DMSArray
        )
    }

    /// Returns `true` for cube and cube-array types.
    pub fn is_cube(&self) -> bool {
        matches!(self, TextureType::TextureCube | TextureType::TextureCubeArray)
    }

    /// Returns `true` for multisample types.
    pub fn is_multisample(&self) -> bool {
        matches!(self, TextureType::Texture2DMS | TextureType::Texture2DMSArray)
    }
}

/// Returns the number of mip levels of a full chain for the given extent.
///
/// This is `floor(log2(max(width, height, depth))) + 1`.
pub fn full_mip_count(extent: Extent3D) -> u32 {
    let max = extent.max_dimension().max(1);
    u32::BITS - max.leading_zeros()
}

/// A descriptor used to create a [`Texture`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The texture type.
    pub ty: TextureType,
    /// How the texture may be bound.
    pub bind_flags: BindFlags,
    /// Creation hints.
    pub misc_flags: MiscFlags,
    /// The texel format.
    pub format: TextureFormat,
    /// The size of mip level 0. Unused dimensions are `1`.
    pub extent: Extent3D,
    /// The number of array layers. Cube textures need a multiple of six.
    pub array_layers: u32,
    /// The number of mip levels, or `0` for a full chain.
    pub mip_levels: u32,
    /// The number of samples for multisample textures, `1` otherwise.
    pub samples: u32,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            ty: TextureType::Texture2D,
            bind_flags: BindFlags::SAMPLED | BindFlags::COLOR_ATTACHMENT,
            misc_flags: MiscFlags::FIXED_SAMPLES | MiscFlags::GENERATE_MIPS,
            format: TextureFormat::Rgba8Unorm,
            extent: Extent3D::new(1, 1, 1),
            array_layers: 1,
            mip_levels: 1,
            samples: 1,
        }
    }
}

impl TextureDescriptor {
    /// Returns the number of mip levels, resolving `0` to a full chain.
    ///
    /// Multisample textures always have a single level.
    pub fn resolved_mip_levels(&self) -> u32 {
        if self.ty.is_multisample() {
            1
        } else if self.mip_levels == 0 {
            full_mip_count(self.extent)
        } else {
            self.mip_levels
        }
    }

    /// Returns the byte size of one mip level across all array layers.
    pub fn mip_level_size(&self, level: u32) -> u64 {
        self.extent.mip_extent(level).volume()
            * u64::from(self.array_layers)
            * u64::from(self.format.bytes_per_pixel())
    }

    /// Returns the byte size expected for initial data, which covers mip level 0.
    pub fn initial_data_size(&self) -> u64 {
        self.mip_level_size(0)
    }

    /// Returns the byte size of the whole mip chain across all layers.
    pub fn total_size(&self) -> u64 {
        (0..self.resolved_mip_levels())
            .map(|level| self.mip_level_size(level))
            .sum()
    }
}

/// Selects a range of mip levels and array layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSubresource {
    /// The first array layer.
    pub base_array_layer: u32,
    /// The number of array layers.
    pub num_array_layers: u32,
    /// The first mip level.
    pub base_mip_level: u32,
    /// The number of mip levels.
    pub num_mip_levels: u32,
}

impl Default for TextureSubresource {
    fn default() -> Self {
        Self {
            base_array_layer: 0,
            num_array_layers: 1,
            base_mip_level: 0,
            num_mip_levels: 1,
        }
    }
}

/// A box inside one mip level of a texture, across a range of array layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureRegion {
    /// The mip level and layers addressed; `num_mip_levels` must be `1`.
    pub subresource: TextureSubresource,
    /// The texel offset of the box.
    pub offset: Offset3D,
    /// The size of the box in texels.
    pub extent: Extent3D,
}

impl TextureRegion {
    /// A region covering the whole of mip level `level` for the given texture.
    pub fn whole_level(descriptor: &TextureDescriptor, level: u32) -> Self {
        Self {
            subresource: TextureSubresource {
                base_array_layer: 0,
                num_array_layers: descriptor.array_layers,
                base_mip_level: level,
                num_mip_levels: 1,
            },
            offset: Offset3D::default(),
            extent: descriptor.extent.mip_extent(level),
        }
    }

    /// Returns the byte size of the region for the given format.
    pub fn byte_size(&self, format: TextureFormat) -> u64 {
        self.extent.volume()
            * u64::from(self.subresource.num_array_layers)
            * u64::from(format.bytes_per_pixel())
    }

    /// Returns `true` if the region lies inside the texture.
    pub fn fits(&self, descriptor: &TextureDescriptor) -> bool {
        let sub = &self.subresource;
        if sub.num_mip_levels != 1 || sub.base_mip_level >= descriptor.resolved_mip_levels() {
            return false;
        }
        if sub.base_array_layer + sub.num_array_layers > descriptor.array_layers {
            return false;
        }
        let level = descriptor.extent.mip_extent(sub.base_mip_level);
        let axis = |offset: i32, size: u32, max: u32| {
            offset >= 0 && (offset as u64 + u64::from(size)) <= u64::from(max)
        };
        !self.extent.is_empty()
            && axis(self.offset.x, self.extent.width, level.width)
            && axis(self.offset.y, self.extent.height, level.height)
            && axis(self.offset.z, self.extent.depth, level.depth)
    }
}

/// Describes a reinterpreted view of a texture, used in resource views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewDescriptor {
    /// The view type.
    pub ty: TextureType,
    /// The view format.
    pub format: TextureFormat,
    /// The viewed subresources.
    pub subresource: TextureSubresource,
}

struct TextureInner {
    core: ObjectCore,
    descriptor: TextureDescriptor,
}

/// A reference-counted handle to a texture.
#[derive(Clone)]
pub struct Texture {
    inner: Arc<TextureInner>,
}

impl Texture {
    /// Wraps a backend texture. Called by backends.
    pub fn new(binding: BackendBinding, descriptor: TextureDescriptor) -> Self {
        let name = descriptor.label.clone();
        Self {
            inner: Arc::new(TextureInner {
                core: ObjectCore::new(binding, name),
                descriptor,
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> TextureId {
        TextureId(self.inner.core.binding().id())
    }

    /// The descriptor the texture was created with.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.inner.descriptor
    }

    /// The texel format.
    pub fn format(&self) -> TextureFormat {
        self.inner.descriptor.format
    }

    /// How the texture may be bound.
    pub fn bind_flags(&self) -> BindFlags {
        self.inner.descriptor.bind_flags
    }

    /// The extent of the given mip level.
    pub fn mip_extent(&self, level: u32) -> Extent3D {
        self.inner.descriptor.extent.mip_extent(level)
    }

    /// The number of mip levels, with a full chain resolved.
    pub fn mip_levels(&self) -> u32 {
        self.inner.descriptor.resolved_mip_levels()
    }
}

impl_backend_object!(Texture);

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id())
            .field("name", &self.inner.core.name())
            .field("ty", &self.inner.descriptor.ty)
            .field("format", &self.format())
            .field("extent", &self.inner.descriptor.extent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mip_count() {
        assert_eq!(full_mip_count(Extent3D::new(1, 1, 1)), 1);
        assert_eq!(full_mip_count(Extent3D::new(256, 256, 1)), 9);
        assert_eq!(full_mip_count(Extent3D::new(300, 20, 1)), 9);
        assert_eq!(full_mip_count(Extent3D::new(4, 4, 64)), 7);
    }

    #[test]
    fn test_sizes() {
        let desc = TextureDescriptor {
            extent: Extent3D::new(8, 4, 1),
            mip_levels: 0,
            ..Default::default()
        };
        assert_eq!(desc.resolved_mip_levels(), 4);
        assert_eq!(desc.initial_data_size(), 8 * 4 * 4);
        assert_eq!(desc.total_size(), (32 + 8 + 2 + 1) * 4);
    }

    #[test]
    fn test_region_fits() {
        let desc = TextureDescriptor {
            extent: Extent3D::new(16, 16, 1),
            mip_levels: 2,
            ..Default::default()
        };
        let mut region = TextureRegion::whole_level(&desc, 1);
        assert_eq!(region.extent, Extent3D::new(8, 8, 1));
        assert!(region.fits(&desc));
        region.offset.x = 1;
        assert!(!region.fits(&desc));
        let level2 = TextureRegion::whole_level(&desc, 2);
        assert!(!level2.fits(&desc));
    }
}
