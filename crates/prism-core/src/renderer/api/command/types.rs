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

//! Plain values consumed by command-buffer recording calls.

use bitflags::bitflags;

bitflags! {
    /// Creation flags of a command buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandBufferFlags: u32 {
        /// The buffer is executed from a primary buffer instead of being submitted.
        const SECONDARY = 1 << 0;
        /// The buffer may be submitted again after completing, without re-recording.
        const MULTI_SUBMIT = 1 << 1;
        /// The buffer is submitted automatically by `end`.
        const IMMEDIATE_SUBMIT = 1 << 2;
    }
}

/// A descriptor used to create a command buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandBufferDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Creation flags.
    pub flags: CommandBufferFlags,
    /// A hint for the number of native buffers to rotate through.
    pub num_native_buffers: u32,
}

impl CommandBufferDescriptor {
    /// A descriptor with the given flags.
    pub fn with_flags(flags: CommandBufferFlags) -> Self {
        Self {
            flags,
            ..Default::default()
        }
    }
}

bitflags! {
    /// Selects the attachments a clear command writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u32 {
        /// Clear color attachments.
        const COLOR = 1 << 0;
        /// Clear the depth aspect.
        const DEPTH = 1 << 1;
        /// Clear the stencil aspect.
        const STENCIL = 1 << 2;
        /// Depth and stencil.
        const DEPTH_STENCIL = Self::DEPTH.bits() | Self::STENCIL.bits();
        /// Everything.
        const ALL = Self::COLOR.bits() | Self::DEPTH_STENCIL.bits();
    }
}

/// Values written by clear load ops and clear commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValue {
    /// The RGBA color.
    pub color: [f32; 4],
    /// The depth value.
    pub depth: f32,
    /// The stencil value.
    pub stencil: u32,
}

impl Default for ClearValue {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 0.0],
            depth: 1.0,
            stencil: 0,
        }
    }
}

impl ClearValue {
    /// A clear value with the given color and default depth/stencil.
    pub fn color(color: [f32; 4]) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }
}

/// Clears one attachment of the active render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentClear {
    /// `COLOR` for a color attachment; `DEPTH` and/or `STENCIL` for the depth/stencil attachment.
    pub flags: ClearFlags,
    /// The color attachment index, ignored for depth/stencil.
    pub color_attachment: u32,
    /// The clear value.
    pub value: ClearValue,
}

/// A viewport transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// The left edge.
    pub x: f32,
    /// The top edge.
    pub y: f32,
    /// The width.
    pub width: f32,
    /// The height.
    pub height: f32,
    /// The minimum depth.
    pub min_depth: f32,
    /// The maximum depth.
    pub max_depth: f32,
}

impl Viewport {
    /// A viewport covering `width` by `height` with the full depth range.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// A scissor rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Scissor {
    /// The left edge.
    pub x: i32,
    /// The top edge.
    pub y: i32,
    /// The width.
    pub width: u32,
    /// The height.
    pub height: u32,
}
