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

//! Vertex attribute formats and vertex buffer layouts.

/// The memory format of a single vertex attribute's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Two 8-bit unsigned integer components.
    Uint8x2,
    /// Four 8-bit unsigned integer components.
    Uint8x4,
    /// Two 8-bit signed integer components.
    Sint8x2,
    /// Four 8-bit signed integer components.
    Sint8x4,
    /// Two 8-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm8x2,
    /// Four 8-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm8x4,
    /// Two 8-bit signed integer components normalized to `[-1.0, 1.0]`.
    Snorm8x2,
    /// Four 8-bit signed integer components normalized to `[-1.0, 1.0]`.
    Snorm8x4,
    /// Two 16-bit unsigned integer components.
    Uint16x2,
    /// Four 16-bit unsigned integer components.
    Uint16x4,
    /// Two 16-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm16x2,
    /// Four 16-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm16x4,
    /// Two 16-bit float components.
    Float16x2,
    /// Four 16-bit float components.
    Float16x4,
    /// One 32-bit float component.
    Float32,
    /// Two 32-bit float components.
    Float32x2,
    /// Three 32-bit float components.
    Float32x3,
    /// Four 32-bit float components.
    Float32x4,
    /// One 32-bit unsigned integer component.
    Uint32,
    /// Two 32-bit unsigned integer components.
    Uint32x2,
    /// Three 32-bit unsigned integer components.
    Uint32x3,
    /// Four 32-bit unsigned integer components.
    Uint32x4,
    /// One 32-bit signed integer component.
    Sint32,
    /// Two 32-bit signed integer components.
    Sint32x2,
    /// Three 32-bit signed integer components.
    Sint32x3,
    /// Four 32-bit signed integer components.
    Sint32x4,
}

/// The scalar type a vertex attribute is presented as to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarClass {
    /// Floating point, including normalized integers.
    Float,
    /// Unsigned integer.
    Uint,
    /// Signed integer.
    Sint,
}

impl VertexFormat {
    /// Returns the size in bytes of this vertex format.
    pub fn size(&self) -> u32 {
        match self {
            VertexFormat::Uint8x2
            | VertexFormat::Sint8x2
            | VertexFormat::Unorm8x2
            | VertexFormat::Snorm8x2 => 2,
            VertexFormat::Uint8x4
            | VertexFormat::Sint8x4
            | VertexFormat::Unorm8x4
            | VertexFormat::Snorm8x4
            | VertexFormat::Uint16x2
            | VertexFormat::Unorm16x2
            | VertexFormat::Float16x2
            | VertexFormat::Float32
            | VertexFormat::Uint32
            | VertexFormat::Sint32 => 4,
            VertexFormat::Uint16x4
            | VertexFormat::Unorm16x4
            | VertexFormat::Float16x4
            | VertexFormat::Float32x2
            | VertexFormat::Uint32x2
            | VertexFormat::Sint32x2 => 8,
            VertexFormat::Float32x3 | VertexFormat::Uint32x3 | VertexFormat::Sint32x3 => 12,
            VertexFormat::Float32x4 | VertexFormat::Uint32x4 | VertexFormat::Sint32x4 => 16,
        }
    }

    /// Returns the number of components.
    pub fn components(&self) -> u32 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Sint32 => 1,
            VertexFormat::Uint8x2
            | VertexFormat::Sint8x2
            | VertexFormat::Unorm8x2
            | VertexFormat::Snorm8x2
            | VertexFormat::Uint16x2
            | VertexFormat::Unorm16x2
            | VertexFormat::Float16x2
            | VertexFormat::Float32x2
            | VertexFormat::Uint32x2
            | VertexFormat::Sint32x2 => 2,
            VertexFormat::Float32x3 | VertexFormat::Uint32x3 | VertexFormat::Sint32x3 => 3,
            _ => 4,
        }
    }

    /// Returns how the shader sees the components.
    pub fn scalar_class(&self) -> ScalarClass {
        match self {
            VertexFormat::Uint8x2
            | VertexFormat::Uint8x4
            | VertexFormat::Uint16x2
            | VertexFormat::Uint16x4
            | VertexFormat::Uint32
            | VertexFormat::Uint32x2
            | VertexFormat::Uint32x3
            | VertexFormat::Uint32x4 => ScalarClass::Uint,
            VertexFormat::Sint8x2
            | VertexFormat::Sint8x4
            | VertexFormat::Sint32
            | VertexFormat::Sint32x2
            | VertexFormat::Sint32x3
            | VertexFormat::Sint32x4 => ScalarClass::Sint,
            _ => ScalarClass::Float,
        }
    }
}

/// Defines how often the GPU advances to the next element in a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// The GPU advances to the next element for each vertex.
    #[default]
    Vertex,
    /// The GPU advances to the next element only for each new instance.
    Instance,
}

/// A single vertex attribute within a vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The semantic name, used for diagnostics and name-based matching.
    pub name: String,
    /// The input location in the vertex shader (e.g. `@location(0)`).
    pub location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The byte offset from the start of the vertex.
    pub offset: u32,
}

impl VertexAttribute {
    /// Creates an attribute.
    pub fn new(name: impl Into<String>, location: u32, format: VertexFormat, offset: u32) -> Self {
        Self {
            name: name.into(),
            location,
            format,
            offset,
        }
    }
}

/// Describes the memory layout of a single vertex buffer slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexBufferLayout {
    /// The byte distance between consecutive elements in the buffer.
    pub stride: u32,
    /// How often the vertex buffer is advanced.
    pub step_mode: VertexStepMode,
    /// The attributes of each element.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBufferLayout {
    /// Builds a per-vertex layout whose attributes are packed in order.
    ///
    /// Offsets are assigned sequentially and the stride is the packed size.
    pub fn packed(attributes: impl IntoIterator<Item = (String, u32, VertexFormat)>) -> Self {
        let mut offset = 0;
        let attributes = attributes
            .into_iter()
            .map(|(name, location, format)| {
                let attr = VertexAttribute::new(name, location, format, offset);
                offset += format.size();
                attr
            })
            .collect();
        Self {
            stride: offset,
            step_mode: VertexStepMode::Vertex,
            attributes,
        }
    }

    /// Returns `true` if every attribute fits inside the stride.
    pub fn is_within_stride(&self) -> bool {
        self.attributes
            .iter()
            .all(|a| a.offset + a.format.size() <= self.stride)
    }
}
