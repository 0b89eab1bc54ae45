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

//! Sampler state objects.

use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore};
use crate::renderer::api::pipeline::CompareFunction;
use std::fmt;
use std::sync::Arc;

/// An opaque, backend-assigned sampler ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

/// Specifies how texture coordinates outside the `[0, 1]` range are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Texture coordinates wrap around.
    #[default]
    Repeat,
    /// Texture coordinates are mirrored on every repeat.
    MirrorRepeat,
    /// Texture coordinates are clamped to the edge texel.
    ClampToEdge,
    /// Texture coordinates outside the range sample the border color.
    ClampToBorder,
    /// Mirrored once around zero, then clamped.
    MirrorOnce,
}

/// Specifies the filtering for magnification, minification and mip selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Linear interpolation between texels.
    #[default]
    Linear,
}

/// A descriptor used to create a [`Sampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Address mode along U.
    pub address_mode_u: AddressMode,
    /// Address mode along V.
    pub address_mode_v: AddressMode,
    /// Address mode along W.
    pub address_mode_w: AddressMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
    /// Whether mip levels are sampled at all.
    pub mip_mapping: bool,
    /// Bias added to the computed mip level.
    pub mip_lod_bias: f32,
    /// Lowest mip level that may be sampled. Must not exceed `lod_max_clamp`.
    pub lod_min_clamp: f32,
    /// Highest mip level that may be sampled.
    pub lod_max_clamp: f32,
    /// Comparison function of a comparison sampler.
    pub compare: Option<CompareFunction>,
    /// Maximum anisotropy; `1` disables anisotropic filtering.
    pub anisotropy_clamp: u16,
    /// Color sampled outside the texture with [`AddressMode::ClampToBorder`].
    pub border_color: [f32; 4],
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            mip_mapping: true,
            mip_lod_bias: 0.0,
            lod_min_clamp: 0.0,
            lod_max_clamp: 1000.0,
            compare: None,
            anisotropy_clamp: 1,
            border_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

struct SamplerInner {
    core: ObjectCore,
    descriptor: SamplerDescriptor,
}

/// A reference-counted handle to an immutable sampler.
#[derive(Clone)]
pub struct Sampler {
    inner: Arc<SamplerInner>,
}

impl Sampler {
    /// Wraps a backend sampler. Called by backends.
    pub fn new(binding: BackendBinding, descriptor: SamplerDescriptor) -> Self {
        let name = descriptor.label.clone();
        Self {
            inner: Arc::new(SamplerInner {
                core: ObjectCore::new(binding, name),
                descriptor,
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> SamplerId {
        SamplerId(self.inner.core.binding().id())
    }

    /// The descriptor the sampler was created with.
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.inner.descriptor
    }
}

impl_backend_object!(Sampler);

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("id", &self.id())
            .field("name", &self.inner.core.name())
            .finish()
    }
}
