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

//! Enums for pipeline configuration.

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Vertices are rendered as a list of isolated points.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices are rendered as a connected line strip.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices are rendered as a connected triangle strip.
    TriangleStrip,
    /// Patches of `n` control points, consumed by tessellation shaders.
    PatchList(u32),
}

impl PrimitiveTopology {
    /// Returns `true` for strip topologies, which may use primitive restart.
    pub fn is_strip(&self) -> bool {
        matches!(self, PrimitiveTopology::LineStrip | PrimitiveTopology::TriangleStrip)
    }

    /// Returns the number of vertices needed for one primitive.
    pub fn vertices_per_primitive(&self) -> u32 {
        match self {
            PrimitiveTopology::PointList => 1,
            PrimitiveTopology::LineList | PrimitiveTopology::LineStrip => 2,
            PrimitiveTopology::TriangleList | PrimitiveTopology::TriangleStrip => 3,
            PrimitiveTopology::PatchList(n) => (*n).max(1),
        }
    }
}

/// Defines which face of a triangle to cull (not render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling is performed.
    #[default]
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    Back,
}

/// Defines which vertex winding order considers a triangle to be "front-facing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding order is the front face.
    #[default]
    Ccw,
    /// Clockwise winding order is the front face.
    Cw,
}

/// Defines how polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Polygons are filled.
    #[default]
    Fill,
    /// Polygons are rendered as outlines (wireframe).
    Line,
    /// Polygon vertices are rendered as points.
    Point,
}

/// The comparison function used for depth and stencil testing and comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// The test passes if the new value is less than the existing value.
    Less,
    /// The test passes if the new value is equal to the existing value.
    Equal,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is greater than the existing value.
    Greater,
    /// The test passes if the new value is not equal to the existing value.
    NotEqual,
    /// The test passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

/// An operation to perform on a stencil buffer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the existing stencil value.
    #[default]
    Keep,
    /// Set the stencil value to 0.
    Zero,
    /// Replace the stencil value with the reference value.
    Replace,
    /// Bitwise invert the stencil value.
    Invert,
    /// Increment the stencil value, clamping at the maximum value.
    IncrementClamp,
    /// Decrement the stencil value, clamping at 0.
    DecrementClamp,
    /// Increment the stencil value, wrapping to 0 on overflow.
    IncrementWrap,
    /// Decrement the stencil value, wrapping to the maximum value on underflow.
    DecrementWrap,
}

/// Selects which face a stencil reference applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilFace {
    /// Front and back faces.
    #[default]
    FrontAndBack,
    /// Front faces only.
    Front,
    /// Back faces only.
    Back,
}

/// A factor in a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// The factor is `0.0`.
    Zero,
    /// The factor is `1.0`.
    #[default]
    One,
    /// The factor is the source color.
    SrcColor,
    /// The factor is `1.0 - src`.
    OneMinusSrcColor,
    /// The factor is the source alpha component (`src.a`).
    SrcAlpha,
    /// The factor is `1.0 - src.a`.
    OneMinusSrcAlpha,
    /// The factor is the destination color.
    DstColor,
    /// The factor is `1.0 - dst`.
    OneMinusDstColor,
    /// The factor is the destination alpha component.
    DstAlpha,
    /// The factor is `1.0 - dst.a`.
    OneMinusDstAlpha,
    /// The factor is the dynamic blend factor set with `set_blend_factor`.
    BlendFactor,
    /// The factor is `1.0 - blend_factor`.
    OneMinusBlendFactor,
}

impl BlendFactor {
    /// Returns `true` if the factor reads the dynamic blend constant.
    pub fn uses_constant(&self) -> bool {
        matches!(self, BlendFactor::BlendFactor | BlendFactor::OneMinusBlendFactor)
    }
}

/// The operation used to combine source and destination colors in a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// The result is `source + destination`.
    #[default]
    Add,
    /// The result is `source - destination`.
    Subtract,
    /// The result is `destination - source`.
    ReverseSubtract,
    /// The result is `min(source, destination)`.
    Min,
    /// The result is `max(source, destination)`.
    Max,
}

/// The data type of a uniform (push constant) declared in a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// A 32-bit float.
    Float1,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// A 32-bit signed integer.
    Int1,
    /// Two 32-bit signed integers.
    Int2,
    /// Four 32-bit signed integers.
    Int4,
    /// A 32-bit unsigned integer.
    UInt1,
    /// Two 32-bit unsigned integers.
    UInt2,
    /// Four 32-bit unsigned integers.
    UInt4,
    /// A 4x4 float matrix.
    Float4x4,
}

impl UniformType {
    /// Returns the size in bytes of one element.
    pub fn size(&self) -> u32 {
        match self {
            UniformType::Float1 | UniformType::Int1 | UniformType::UInt1 => 4,
            UniformType::Float2 | UniformType::Int2 | UniformType::UInt2 => 8,
            UniformType::Float3 => 12,
            UniformType::Float4 | UniformType::Int4 | UniformType::UInt4 => 16,
            UniformType::Float4x4 => 64,
        }
    }
}
