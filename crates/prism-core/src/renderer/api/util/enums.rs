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

//! Generic rendering enums.

use serde::{Deserialize, Serialize};

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Returns the size in bytes of a single index.
    pub fn size(&self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// A backend-agnostic representation of a graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsBackendType {
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// Microsoft's DirectX 11 API.
    Dx11,
    /// OpenGL API.
    OpenGL,
    /// The CPU reference backend that executes commands in software.
    Null,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

/// The physical type of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RendererDeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized or software-based GPU.
    VirtualGpu,
    /// A software renderer running on the CPU.
    Cpu,
    /// An unknown or unsupported device type.
    #[default]
    Unknown,
}

/// The programmable stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The tessellation control (hull) stage.
    TessControl,
    /// The tessellation evaluation (domain) stage.
    TessEvaluation,
    /// The geometry shader stage.
    Geometry,
    /// The fragment (or pixel) shader stage.
    Fragment,
    /// The compute shader stage.
    Compute,
}

impl ShaderStage {
    /// Returns `true` for every stage except [`ShaderStage::Compute`].
    pub fn is_graphics(&self) -> bool {
        !matches!(self, ShaderStage::Compute)
    }
}

/// Defines the memory format of texels in a texture or attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    // 8-bit formats
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// One 8-bit unsigned integer component.
    R8Uint,
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit signed normalized components (RGBA).
    Rgba8Snorm,
    /// Four 8-bit unsigned integer components (RGBA).
    Rgba8Uint,
    /// Four 8-bit unsigned normalized components (BGRA). A common swap-chain format.
    Bgra8Unorm,
    /// Four 8-bit unsigned normalized components (BGRA) in the sRGB color space.
    Bgra8UnormSrgb,
    // 16-bit formats
    /// One 16-bit float component.
    R16Float,
    /// One 16-bit unsigned integer component.
    R16Uint,
    /// Two 16-bit float components.
    Rg16Float,
    /// Four 16-bit float components.
    Rgba16Float,
    // 32-bit formats
    /// One 32-bit float component.
    R32Float,
    /// One 32-bit unsigned integer component.
    R32Uint,
    /// One 32-bit signed integer component.
    R32Sint,
    /// Two 32-bit float components.
    Rg32Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// Four 32-bit unsigned integer components.
    Rgba32Uint,
    /// Packed 10-bit RGB with 2-bit alpha, unsigned normalized.
    Rgb10A2Unorm,
    // Depth/stencil formats
    /// A 16-bit unsigned normalized depth format.
    Depth16Unorm,
    /// A 24-bit unsigned normalized depth format with an 8-bit stencil component.
    Depth24PlusStencil8,
    /// A 32-bit float depth format.
    Depth32Float,
    /// A 32-bit float depth format with an 8-bit stencil component.
    Depth32FloatStencil8,
}

impl TextureFormat {
    /// Every format, in declaration order.
    pub const ALL: [TextureFormat; 24] = [
        TextureFormat::R8Unorm,
        TextureFormat::R8Uint,
        TextureFormat::Rg8Unorm,
        TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba8Snorm,
        TextureFormat::Rgba8Uint,
        TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb,
        TextureFormat::R16Float,
        TextureFormat::R16Uint,
        TextureFormat::Rg16Float,
        TextureFormat::Rgba16Float,
        TextureFormat::R32Float,
        TextureFormat::R32Uint,
        TextureFormat::R32Sint,
        TextureFormat::Rg32Float,
        TextureFormat::Rgba32Float,
        TextureFormat::Rgba32Uint,
        TextureFormat::Rgb10A2Unorm,
        TextureFormat::Depth16Unorm,
        TextureFormat::Depth24PlusStencil8,
        TextureFormat::Depth32Float,
        TextureFormat::Depth32FloatStencil8,
    ];

    /// Returns the size in bytes of a single texel for this format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm | TextureFormat::R8Uint => 1,
            TextureFormat::Rg8Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Rgba8Snorm
            | TextureFormat::Rgba8Uint
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::R16Float | TextureFormat::R16Uint => 2,
            TextureFormat::Rg16Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R32Float | TextureFormat::R32Uint | TextureFormat::R32Sint => 4,
            TextureFormat::Rg32Float => 8,
            TextureFormat::Rgba32Float | TextureFormat::Rgba32Uint => 16,
            TextureFormat::Rgb10A2Unorm => 4,
            TextureFormat::Depth16Unorm => 2,
            TextureFormat::Depth24PlusStencil8 => 4,
            TextureFormat::Depth32Float => 4,
            TextureFormat::Depth32FloatStencil8 => 8,
        }
    }

    /// Returns `true` if the format has a depth component.
    pub fn has_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth24PlusStencil8
                | TextureFormat::Depth32Float
                | TextureFormat::Depth32FloatStencil8
        )
    }

    /// Returns `true` if the format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24PlusStencil8 | TextureFormat::Depth32FloatStencil8
        )
    }

    /// Returns `true` for color formats.
    pub fn is_color(&self) -> bool {
        !self.has_depth() && !self.has_stencil()
    }

    /// Returns `true` for formats made of 8-bit unsigned normalized channels.
    pub fn is_unorm8(&self) -> bool {
        matches!(
            self,
            TextureFormat::R8Unorm
                | TextureFormat::Rg8Unorm
                | TextureFormat::Rgba8Unorm
                | TextureFormat::Rgba8UnormSrgb
                | TextureFormat::Bgra8Unorm
                | TextureFormat::Bgra8UnormSrgb
        )
    }

    /// Encodes a normalized RGBA color into the texel bytes of this format.
    ///
    /// Returns `None` for depth/stencil formats.
    pub fn encode_color(&self, color: [f32; 4]) -> Option<Vec<u8>> {
        let unorm8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let bytes = match self {
            TextureFormat::R8Unorm => vec![unorm8(color[0])],
            TextureFormat::R8Uint => vec![color[0].max(0.0) as u8],
            TextureFormat::Rg8Unorm => vec![unorm8(color[0]), unorm8(color[1])],
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => {
                color.iter().map(|c| unorm8(*c)).collect()
            }
            TextureFormat::Rgba8Snorm => color
                .iter()
                .map(|c| ((c.clamp(-1.0, 1.0) * 127.0).round() as i8) as u8)
                .collect(),
            TextureFormat::Rgba8Uint => color.iter().map(|c| c.max(0.0) as u8).collect(),
            TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb => vec![
                unorm8(color[2]),
                unorm8(color[1]),
                unorm8(color[0]),
                unorm8(color[3]),
            ],
            TextureFormat::R16Uint => (color[0].max(0.0) as u16).to_le_bytes().to_vec(),
            TextureFormat::R16Float | TextureFormat::Rg16Float | TextureFormat::Rgba16Float => {
                let channels = (self.bytes_per_pixel() / 2) as usize;
                color[..channels]
                    .iter()
                    .flat_map(|c| f32_to_f16_bits(*c).to_le_bytes())
                    .collect()
            }
            TextureFormat::R32Float => color[0].to_le_bytes().to_vec(),
            TextureFormat::R32Uint => (color[0].max(0.0) as u32).to_le_bytes().to_vec(),
            TextureFormat::R32Sint => (color[0] as i32).to_le_bytes().to_vec(),
            TextureFormat::Rg32Float => color[..2].iter().flat_map(|c| c.to_le_bytes()).collect(),
            TextureFormat::Rgba32Float => color.iter().flat_map(|c| c.to_le_bytes()).collect(),
            TextureFormat::Rgba32Uint => color
                .iter()
                .flat_map(|c| (c.max(0.0) as u32).to_le_bytes())
                .collect(),
            TextureFormat::Rgb10A2Unorm => {
                let q = |v: f32, max: f32| (v.clamp(0.0, 1.0) * max).round() as u32;
                let packed = q(color[0], 1023.0)
                    | (q(color[1], 1023.0) << 10)
                    | (q(color[2], 1023.0) << 20)
                    | (q(color[3], 3.0) << 30);
                packed.to_le_bytes().to_vec()
            }
            _ => return None,
        };
        Some(bytes)
    }

    /// Encodes a depth/stencil clear value into the texel bytes of this format.
    ///
    /// Returns `None` for color formats.
    pub fn encode_depth_stencil(&self, depth: f32, stencil: u32) -> Option<Vec<u8>> {
        let depth = depth.clamp(0.0, 1.0);
        let bytes = match self {
            TextureFormat::Depth16Unorm => ((depth * 65535.0).round() as u16).to_le_bytes().to_vec(),
            TextureFormat::Depth24PlusStencil8 => {
                let d = (depth * 16_777_215.0).round() as u32;
                (d | ((stencil & 0xff) << 24)).to_le_bytes().to_vec()
            }
            TextureFormat::Depth32Float => depth.to_le_bytes().to_vec(),
            TextureFormat::Depth32FloatStencil8 => {
                let mut v = depth.to_le_bytes().to_vec();
                v.extend_from_slice(&[(stencil & 0xff) as u8, 0, 0, 0]);
                v
            }
            _ => return None,
        };
        Some(bytes)
    }
}

fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32 - 127 + 15;
    let mantissa = bits & 0x007f_ffff;
    if exp <= 0 {
        sign
    } else if exp >= 0x1f {
        sign | 0x7c00
    } else {
        sign | ((exp as u16) << 10) | (mantissa >> 13) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_color_matches_texel_size() {
        for format in TextureFormat::ALL.iter().filter(|f| f.is_color()) {
            let bytes = format.encode_color([1.0, 0.5, 0.0, 1.0]).unwrap();
            assert_eq!(bytes.len() as u32, format.bytes_per_pixel(), "{format:?}");
        }
    }

    #[test]
    fn test_encode_depth_stencil_matches_texel_size() {
        for format in TextureFormat::ALL.iter().filter(|f| f.has_depth()) {
            let bytes = format.encode_depth_stencil(1.0, 0).unwrap();
            assert_eq!(bytes.len() as u32, format.bytes_per_pixel(), "{format:?}");
            assert!(format.encode_color([0.0; 4]).is_none());
        }
    }

    #[test]
    fn test_bgra_swizzle() {
        let bytes = TextureFormat::Bgra8Unorm
            .encode_color([1.0, 0.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(bytes, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_half_float_one() {
        assert_eq!(f32_to_f16_bits(1.0), 0x3c00);
        assert_eq!(f32_to_f16_bits(0.0), 0);
    }
}
