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

//! Defines data structures related to GPU buffer resources.

use super::flags::{BindFlags, CpuAccess, CpuAccessFlags, MiscFlags};
use super::vertex::VertexAttribute;
use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore};
use crate::renderer::api::util::TextureFormat;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Size value meaning "from the offset to the end of the buffer".
pub const WHOLE_SIZE: u64 = u64::MAX;

/// An opaque, backend-assigned buffer ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// A descriptor used to create a [`Buffer`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BufferDescriptor {
    /// An optional debug label for the buffer.
    pub label: Option<String>,
    /// The total size of the buffer in bytes. Must be greater than zero.
    pub size: u64,
    /// The size of one element in bytes for structured or vertex buffers, `0` otherwise.
    pub stride: u32,
    /// The element format of typed buffers.
    pub format: Option<TextureFormat>,
    /// How the buffer may be bound.
    pub bind_flags: BindFlags,
    /// CPU access the buffer is created for.
    pub cpu_access_flags: CpuAccessFlags,
    /// Creation hints.
    pub misc_flags: MiscFlags,
    /// The vertex layout of the buffer's elements, if it is a vertex buffer.
    pub vertex_attributes: Vec<VertexAttribute>,
}

impl BufferDescriptor {
    /// Returns the number of elements for strided buffers, or the byte size otherwise.
    pub fn element_count(&self) -> u64 {
        if self.stride > 0 {
            self.size / u64::from(self.stride)
        } else {
            self.size
        }
    }

    /// Resolves `offset..offset+size` against the buffer size, expanding [`WHOLE_SIZE`].
    ///
    /// Returns `None` if the range exceeds the buffer.
    pub fn resolve_range(&self, offset: u64, size: u64) -> Option<Range<u64>> {
        let size = if size == WHOLE_SIZE {
            self.size.checked_sub(offset)?
        } else {
            size
        };
        let end = offset.checked_add(size)?;
        (end <= self.size).then_some(offset..end)
    }
}

struct BufferInner {
    core: ObjectCore,
    descriptor: BufferDescriptor,
    mapped: AtomicBool,
}

/// A reference-counted handle to a buffer.
///
/// Cloning the handle adds a reference. The backend memory is released when
/// the last clone is dropped.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

impl Buffer {
    /// Wraps a backend buffer. Called by backends.
    pub fn new(binding: BackendBinding, descriptor: BufferDescriptor) -> Self {
        let name = descriptor.label.clone();
        Self {
            inner: Arc::new(BufferInner {
                core: ObjectCore::new(binding, name),
                descriptor,
                mapped: AtomicBool::new(false),
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> BufferId {
        BufferId(self.inner.core.binding().id())
    }

    /// The descriptor the buffer was created with.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.inner.descriptor
    }

    /// The size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        self.inner.descriptor.size
    }

    /// How the buffer may be bound.
    pub fn bind_flags(&self) -> BindFlags {
        self.inner.descriptor.bind_flags
    }

    /// Returns `true` while a mapping of this buffer is outstanding.
    pub fn is_mapped(&self) -> bool {
        self.inner.mapped.load(Ordering::Acquire)
    }

    /// Marks the buffer as mapped. Returns `false` if it already was.
    ///
    /// Called by backends when a mapping starts.
    pub fn try_begin_mapping(&self) -> bool {
        self.inner
            .mapped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clears the mapped flag. Called by backends at unmap.
    pub fn end_mapping(&self) {
        self.inner.mapped.store(false, Ordering::Release);
    }
}

impl_backend_object!(Buffer);

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id())
            .field("name", &self.inner.core.name())
            .field("size", &self.size())
            .field("bind_flags", &self.bind_flags())
            .finish()
    }
}

/// A CPU-visible copy of a buffer range, valid until passed back to `unmap_buffer`.
///
/// Reading a write-only mapping or writing a read-only one is not checked;
/// writes to a [`CpuAccess::ReadOnly`] mapping are discarded at unmap.
#[derive(Debug)]
pub struct BufferMapping {
    buffer: Buffer,
    access: CpuAccess,
    range: Range<u64>,
    data: Vec<u8>,
}

impl BufferMapping {
    /// Creates a mapping over `range` holding `data`. Called by backends.
    pub fn new(buffer: Buffer, access: CpuAccess, range: Range<u64>, data: Vec<u8>) -> Self {
        Self {
            buffer,
            access,
            range,
            data,
        }
    }

    /// The mapped buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The access mode of the mapping.
    pub fn access(&self) -> CpuAccess {
        self.access
    }

    /// The mapped byte range.
    pub fn range(&self) -> Range<u64> {
        self.range.clone()
    }

    /// The mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The mapped bytes, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Splits the mapping into its parts. Called by backends at unmap.
    pub fn into_parts(self) -> (Buffer, CpuAccess, Range<u64>, Vec<u8>) {
        (self.buffer, self.access, self.range, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{BackendOwned, Nameable, ObjectKind, SystemId};

    fn buffer(desc: BufferDescriptor) -> Buffer {
        Buffer::new(
            BackendBinding::detached(ObjectKind::Buffer, 4, SystemId(1)),
            desc,
        )
    }

    #[test]
    fn test_descriptor_roundtrip_and_name() {
        let desc = BufferDescriptor {
            label: Some("vertices".into()),
            size: 36,
            stride: 12,
            bind_flags: BindFlags::VERTEX_BUFFER,
            ..Default::default()
        };
        let buf = buffer(desc.clone());
        assert_eq!(buf.descriptor(), &desc);
        assert_eq!(buf.descriptor().element_count(), 3);
        assert_eq!(buf.name().as_deref(), Some("vertices"));
        assert_eq!(buf.object_kind(), ObjectKind::Buffer);
        assert_eq!(buf.id(), BufferId(4));
        assert_eq!(buf.clone(), buf);
    }

    #[test]
    fn test_resolve_range() {
        let desc = BufferDescriptor {
            size: 64,
            ..Default::default()
        };
        assert_eq!(desc.resolve_range(16, WHOLE_SIZE), Some(16..64));
        assert_eq!(desc.resolve_range(0, 64), Some(0..64));
        assert_eq!(desc.resolve_range(60, 8), None);
        assert_eq!(desc.resolve_range(80, WHOLE_SIZE), None);
    }

    #[test]
    fn test_mapping_flag_is_exclusive() {
        let buf = buffer(BufferDescriptor {
            size: 4,
            ..Default::default()
        });
        assert!(buf.try_begin_mapping());
        assert!(!buf.try_begin_mapping());
        buf.end_mapping();
        assert!(!buf.is_mapped());
    }
}
