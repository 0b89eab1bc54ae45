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

//! Integer extents and offsets used for texture sizes, surface sizes and copy regions.

use serde::{Deserialize, Serialize};

/// A two-dimensional extent, typically a surface or render-target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new two-dimensional extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A three-dimensional extent, representing width, height and depth.
///
/// For 1D and 2D textures the unused dimensions are `1`. Array layers are
/// stored separately in the texture descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth component of the extent.
    pub depth: u32,
}

impl Extent3D {
    /// Creates a new three-dimensional extent.
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Returns `true` if any dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }

    /// Returns the number of texels covered by this extent.
    pub const fn volume(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }

    /// Returns the largest of the three dimensions.
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height).max(self.depth)
    }

    /// Returns the extent of the given mip level, never smaller than `1` per dimension.
    pub fn mip_extent(&self, level: u32) -> Extent3D {
        let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
        Extent3D::new(shrink(self.width), shrink(self.height), shrink(self.depth))
    }
}

impl From<Extent2D> for Extent3D {
    fn from(value: Extent2D) -> Self {
        Extent3D::new(value.width, value.height, 1)
    }
}

/// A two-dimensional signed offset, used for viewports and scissor rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Offset2D {
    /// The x-coordinate of the offset.
    pub x: i32,
    /// The y-coordinate of the offset.
    pub y: i32,
}

/// A three-dimensional signed offset, used for texture copy regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Offset3D {
    /// The x-coordinate of the offset.
    pub x: i32,
    /// The y-coordinate of the offset.
    pub y: i32,
    /// The z-coordinate of the offset.
    pub z: i32,
}

impl Offset3D {
    /// Creates a new three-dimensional offset.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}
