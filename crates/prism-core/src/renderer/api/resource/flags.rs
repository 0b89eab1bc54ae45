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

//! Usage flags shared by buffers and textures.

use bitflags::bitflags;

bitflags! {
    /// How a resource may be bound to the pipeline.
    ///
    /// A resource bound in a role it was not created for (e.g. a buffer without
    /// [`BindFlags::INDEX_BUFFER`] bound as index buffer) is rejected by the
    /// debug layer at bind time and by resource heaps at creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindFlags: u32 {
        /// Bindable as vertex buffer.
        const VERTEX_BUFFER = 1 << 0;
        /// Bindable as index buffer.
        const INDEX_BUFFER = 1 << 1;
        /// Bindable as constant (uniform) buffer.
        const CONSTANT_BUFFER = 1 << 2;
        /// Bindable as stream-output buffer.
        const STREAM_OUTPUT_BUFFER = 1 << 3;
        /// Usable as argument buffer for indirect draws and dispatches.
        const INDIRECT_BUFFER = 1 << 4;
        /// Readable from shaders (sampled texture or read-only buffer).
        const SAMPLED = 1 << 5;
        /// Readable and writable from shaders.
        const STORAGE = 1 << 6;
        /// Usable as color attachment.
        const COLOR_ATTACHMENT = 1 << 7;
        /// Usable as depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 8;
        /// Texture is bound together with a sampler.
        const COMBINED_SAMPLER = 1 << 9;
        /// Source of copy commands.
        const COPY_SRC = 1 << 10;
        /// Destination of copy commands.
        const COPY_DST = 1 << 11;
    }
}

bitflags! {
    /// CPU access a resource is created for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CpuAccessFlags: u32 {
        /// The CPU may read (map for reading, `read_buffer`).
        const READ = 1 << 0;
        /// The CPU may write (map for writing).
        const WRITE = 1 << 1;
    }
}

bitflags! {
    /// Miscellaneous creation hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MiscFlags: u32 {
        /// The resource is updated frequently by the CPU.
        const DYNAMIC_USAGE = 1 << 0;
        /// Multisample textures use fixed sample locations.
        const FIXED_SAMPLES = 1 << 1;
        /// The texture will receive `generate_mips` commands.
        const GENERATE_MIPS = 1 << 2;
        /// The resource is created without initial data, skipping zero-initialization.
        const NO_INITIAL_DATA = 1 << 3;
        /// Storage buffer with an append/consume counter.
        const APPEND = 1 << 4;
        /// Storage buffer with a hidden counter.
        const COUNTER = 1 << 5;
    }
}

/// The access mode of a buffer mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuAccess {
    /// The mapping is only read.
    ReadOnly,
    /// The mapping is only written; previous contents are preserved.
    WriteOnly,
    /// The mapping is only written; previous contents of the range are discarded.
    WriteDiscard,
    /// The mapping is read and written.
    ReadWrite,
}

impl CpuAccess {
    /// The creation flags the buffer needs for this access mode.
    pub fn required_flags(&self) -> CpuAccessFlags {
        match self {
            CpuAccess::ReadOnly => CpuAccessFlags::READ,
            CpuAccess::WriteOnly | CpuAccess::WriteDiscard => CpuAccessFlags::WRITE,
            CpuAccess::ReadWrite => CpuAccessFlags::READ | CpuAccessFlags::WRITE,
        }
    }

    /// Returns `true` if the mapping is written back at unmap.
    pub fn writes(&self) -> bool {
        !matches!(self, CpuAccess::ReadOnly)
    }
}
