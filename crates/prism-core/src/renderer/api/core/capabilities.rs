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

//! Renderer identification, features and numeric limits.
//!
//! Backends differ widely in what they support. Consumers query
//! [`RenderingCapabilities`] before relying on instancing, compute, geometry
//! shaders or stream-out.

use crate::renderer::api::util::{GraphicsBackendType, RendererDeviceType, TextureFormat};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Identification strings of a loaded backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererInfo {
    /// The name of the renderer, e.g. `"Null"` or `"Vulkan 1.3"`.
    pub renderer_name: String,
    /// The name of the device, e.g. `"CPU"`.
    pub device_name: String,
    /// The vendor name.
    pub vendor_name: String,
    /// The name of the native shading language.
    pub shading_language_name: String,
    /// The native API behind the renderer.
    pub backend_type: GraphicsBackendType,
    /// The physical device type.
    pub device_type: RendererDeviceType,
}

/// The origin of screen-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenOrigin {
    /// `(0, 0)` is the upper-left corner (Direct3D, Metal, Vulkan).
    #[default]
    UpperLeft,
    /// `(0, 0)` is the lower-left corner (OpenGL).
    LowerLeft,
}

/// The depth range of normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClippingRange {
    /// Depth ranges from `0` to `1`.
    #[default]
    ZeroToOne,
    /// Depth ranges from `-1` to `1`.
    MinusOneToOne,
}

/// A shading language accepted by the backend's shader compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingLanguage {
    /// WebGPU shading language source.
    Wgsl,
    /// SPIR-V binary modules.
    Spirv,
    /// OpenGL shading language source.
    Glsl,
    /// High-level shading language source.
    Hlsl,
    /// Metal shading language source.
    Metal,
}

bitflags! {
    /// Optional features a backend may or may not support.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderingFeatures: u32 {
        /// Offscreen render targets.
        const RENDER_TARGETS = 1 << 0;
        /// 3D textures.
        const TEXTURE_3D = 1 << 1;
        /// Cube textures.
        const TEXTURE_CUBE = 1 << 2;
        /// 1D and 2D texture arrays.
        const TEXTURE_ARRAY = 1 << 3;
        /// Cube texture arrays.
        const TEXTURE_CUBE_ARRAY = 1 << 4;
        /// Multisample textures.
        const MULTISAMPLE_TEXTURES = 1 << 5;
        /// Storage (read/write) buffers and textures.
        const STORAGE_RESOURCES = 1 << 6;
        /// Geometry shaders.
        const GEOMETRY_SHADERS = 1 << 7;
        /// Tessellation shaders.
        const TESSELLATION_SHADERS = 1 << 8;
        /// Compute shaders.
        const COMPUTE_SHADERS = 1 << 9;
        /// Instanced draws.
        const INSTANCING = 1 << 10;
        /// Instanced draws with a first-instance offset.
        const OFFSET_INSTANCING = 1 << 11;
        /// Indirect draws and dispatches.
        const INDIRECT_DRAW = 1 << 12;
        /// Multiple viewports and scissors per draw.
        const VIEWPORT_ARRAYS = 1 << 13;
        /// Stream-output (transform feedback).
        const STREAM_OUTPUTS = 1 << 14;
        /// Pipeline caches.
        const PIPELINE_CACHES = 1 << 15;
        /// Timestamp queries.
        const TIMESTAMP_QUERIES = 1 << 16;
        /// Occlusion queries.
        const OCCLUSION_QUERIES = 1 << 17;
        /// Anisotropic sampler filtering.
        const SAMPLER_ANISOTROPY = 1 << 18;
        /// Conservative rasterization.
        const CONSERVATIVE_RASTERIZATION = 1 << 19;
        /// Uniform (push constant) blocks in pipeline layouts.
        const UNIFORMS = 1 << 20;
    }
}

/// Numeric limits of a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderingLimits {
    /// The supported line width range.
    pub line_width_range: [f32; 2],
    /// The maximum number of texture array layers.
    pub max_texture_array_layers: u32,
    /// The maximum number of color attachments per render pass.
    pub max_color_attachments: u32,
    /// The maximum number of patch control points.
    pub max_patch_vertices: u32,
    /// The maximum width of 1D textures.
    pub max_1d_texture_size: u32,
    /// The maximum width and height of 2D textures.
    pub max_2d_texture_size: u32,
    /// The maximum extent of 3D textures.
    pub max_3d_texture_size: u32,
    /// The maximum width and height of cube textures.
    pub max_cube_texture_size: u32,
    /// The maximum sampler anisotropy.
    pub max_anisotropy: u32,
    /// The maximum number of compute work groups per dimension.
    pub max_compute_work_groups: [u32; 3],
    /// The maximum compute work group size per dimension.
    pub max_compute_work_group_size: [u32; 3],
    /// The maximum number of simultaneous viewports and scissors.
    pub max_viewports: u32,
    /// The maximum viewport width and height.
    pub max_viewport_size: [u32; 2],
    /// The maximum size of a buffer in bytes.
    pub max_buffer_size: u64,
    /// The maximum size of a constant buffer in bytes.
    pub max_constant_buffer_size: u64,
    /// The maximum number of bytes of uniform (push constant) data per layout.
    pub max_uniform_bytes: u32,
    /// The required offset alignment for constant buffer views.
    pub min_constant_buffer_alignment: u64,
    /// The required offset alignment for storage buffer views.
    pub min_storage_buffer_alignment: u64,
    /// The required row-pitch alignment for buffer/texture copies.
    pub texture_row_pitch_alignment: u64,
}

impl Default for RenderingLimits {
    fn default() -> Self {
        Self {
            line_width_range: [1.0, 1.0],
            max_texture_array_layers: 256,
            max_color_attachments: 4,
            max_patch_vertices: 0,
            max_1d_texture_size: 4096,
            max_2d_texture_size: 4096,
            max_3d_texture_size: 256,
            max_cube_texture_size: 4096,
            max_anisotropy: 1,
            max_compute_work_groups: [0; 3],
            max_compute_work_group_size: [0; 3],
            max_viewports: 1,
            max_viewport_size: [4096, 4096],
            max_buffer_size: 1 << 28,
            max_constant_buffer_size: 1 << 14,
            max_uniform_bytes: 0,
            min_constant_buffer_alignment: 256,
            min_storage_buffer_alignment: 256,
            texture_row_pitch_alignment: 1,
        }
    }
}

/// Everything a backend reports about itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderingCapabilities {
    /// The origin of screen-space coordinates.
    pub screen_origin: ScreenOrigin,
    /// The depth range of normalized device coordinates.
    pub clipping_range: ClippingRange,
    /// Shading languages accepted by the shader compiler.
    pub shading_languages: Vec<ShadingLanguage>,
    /// Texture formats usable for textures and attachments.
    pub texture_formats: Vec<TextureFormat>,
    /// Optional features.
    pub features: RenderingFeatures,
    /// Numeric limits.
    pub limits: RenderingLimits,
}

impl RenderingCapabilities {
    /// Returns `true` if all the given features are supported.
    pub fn supports(&self, features: RenderingFeatures) -> bool {
        self.features.contains(features)
    }

    /// Returns `true` if the format can be used for textures.
    pub fn supports_format(&self, format: TextureFormat) -> bool {
        self.texture_formats.contains(&format)
    }

    /// Returns `true` if the shader compiler accepts the language.
    pub fn supports_language(&self, language: ShadingLanguage) -> bool {
        self.shading_languages.contains(&language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_queries() {
        let caps = RenderingCapabilities {
            features: RenderingFeatures::INSTANCING | RenderingFeatures::COMPUTE_SHADERS,
            texture_formats: vec![TextureFormat::Rgba8Unorm],
            shading_languages: vec![ShadingLanguage::Wgsl],
            ..Default::default()
        };
        assert!(caps.supports(RenderingFeatures::INSTANCING));
        assert!(!caps.supports(RenderingFeatures::INSTANCING | RenderingFeatures::GEOMETRY_SHADERS));
        assert!(caps.supports_format(TextureFormat::Rgba8Unorm));
        assert!(!caps.supports_format(TextureFormat::R8Unorm));
        assert!(caps.supports_language(ShadingLanguage::Wgsl));
    }
}
