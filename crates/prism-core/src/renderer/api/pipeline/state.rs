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

//! Fixed-function state descriptors baked into graphics pipelines.

use super::enums::*;
use crate::renderer::api::util::{IndexFormat, TextureFormat};
use bitflags::bitflags;

/// Describes primitive assembly and rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveState {
    /// The topology of the primitives.
    pub topology: PrimitiveTopology,
    /// The index format enabling primitive restart for strip topologies.
    pub strip_index_format: Option<IndexFormat>,
    /// The vertex winding order that determines the front face.
    pub front_face: FrontFace,
    /// The face culling mode.
    pub cull_mode: CullMode,
    /// The rasterization mode for polygons.
    pub polygon_mode: PolygonMode,
    /// If `true`, disables clipping of fragments based on their depth.
    pub unclipped_depth: bool,
    /// If `true`, enables conservative rasterization.
    pub conservative: bool,
}

impl Default for PrimitiveState {
    fn default() -> Self {
        PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }
}

/// Describes the stencil test and operations for a single face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation to perform if the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation to perform if both tests pass.
    pub depth_pass_op: StencilOperation,
}

/// Describes depth biasing, used to prevent z-fighting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthBiasState {
    /// A constant value added to the depth of each fragment.
    pub constant: i32,
    /// A factor that scales with the fragment's depth slope.
    pub slope_scale: f32,
    /// The maximum bias that can be applied.
    pub clamp: f32,
}

/// Describes the depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    /// The format of the depth/stencil attachment the pipeline renders into.
    pub format: TextureFormat,
    /// If `true`, depth values are written.
    pub depth_write_enabled: bool,
    /// The comparison function of the depth test.
    pub depth_compare: CompareFunction,
    /// If `true`, the stencil test is enabled.
    pub stencil_enabled: bool,
    /// The stencil state for front-facing primitives.
    pub stencil_front: StencilFaceState,
    /// The stencil state for back-facing primitives.
    pub stencil_back: StencilFaceState,
    /// A bitmask for reading from the stencil buffer.
    pub stencil_read_mask: u32,
    /// A bitmask for writing to the stencil buffer.
    pub stencil_write_mask: u32,
    /// The depth bias.
    pub bias: DepthBiasState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            format: TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil_enabled: false,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
            bias: DepthBiasState::default(),
        }
    }
}

/// Describes a complete blend equation for one color component group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendComponent {
    /// The blend factor for the source color.
    pub src_factor: BlendFactor,
    /// The blend factor for the destination color.
    pub dst_factor: BlendFactor,
    /// The operation combining source and destination.
    pub operation: BlendOperation,
}

/// Describes the blend state for a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendState {
    /// The blend equation for the RGB components.
    pub color: BlendComponent,
    /// The blend equation for the alpha component.
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Standard alpha blending.
    pub const ALPHA_BLENDING: BlendState = BlendState {
        color: BlendComponent {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        },
        alpha: BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        },
    };
}

bitflags! {
    /// A bitmask to enable or disable writes to individual color channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        /// Enable writes to the Red channel.
        const R = 0b0001;
        /// Enable writes to the Green channel.
        const G = 0b0010;
        /// Enable writes to the Blue channel.
        const B = 0b0100;
        /// Enable writes to the Alpha channel.
        const A = 0b1000;
        /// Enable writes to all channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

impl Default for ColorWrites {
    fn default() -> Self {
        ColorWrites::ALL
    }
}

/// Describes one color target of a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetState {
    /// The format the target is expected to have.
    pub format: TextureFormat,
    /// The blending state. `None` disables blending.
    pub blend: Option<BlendState>,
    /// Which channels are written.
    pub write_mask: ColorWrites,
}

impl ColorTargetState {
    /// A non-blended target of the given format.
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            blend: None,
            write_mask: ColorWrites::ALL,
        }
    }
}

/// Multisampling of the rendered targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultisampleState {
    /// The number of samples; must equal the render pass sample count.
    pub count: u32,
    /// The sample mask.
    pub mask: u64,
    /// If `true`, alpha-to-coverage is enabled.
    pub alpha_to_coverage_enabled: bool,
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }
}
