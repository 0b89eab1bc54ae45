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

//! Bit flags shared across the renderer API.

use super::enums::ShaderStage;
use bitflags::bitflags;

bitflags! {
    /// A set of shader stages a binding or uniform block is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StageFlags: u32 {
        /// The vertex stage.
        const VERTEX = 1 << 0;
        /// The tessellation control stage.
        const TESS_CONTROL = 1 << 1;
        /// The tessellation evaluation stage.
        const TESS_EVALUATION = 1 << 2;
        /// The geometry stage.
        const GEOMETRY = 1 << 3;
        /// The fragment stage.
        const FRAGMENT = 1 << 4;
        /// The compute stage.
        const COMPUTE = 1 << 5;
        /// All graphics stages.
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::TESS_CONTROL.bits()
            | Self::TESS_EVALUATION.bits()
            | Self::GEOMETRY.bits()
            | Self::FRAGMENT.bits();
        /// Every stage.
        const ALL = Self::ALL_GRAPHICS.bits() | Self::COMPUTE.bits();
    }
}

impl From<ShaderStage> for StageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => StageFlags::VERTEX,
            ShaderStage::TessControl => StageFlags::TESS_CONTROL,
            ShaderStage::TessEvaluation => StageFlags::TESS_EVALUATION,
            ShaderStage::Geometry => StageFlags::GEOMETRY,
            ShaderStage::Fragment => StageFlags::FRAGMENT,
            ShaderStage::Compute => StageFlags::COMPUTE,
        }
    }
}
