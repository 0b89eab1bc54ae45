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

//! Backing memory of Null backend objects, keyed by object ID.

use super::image::TextureImage;
use crate::telemetry::{AllocationKind, MemoryTracker};
use prism_core::renderer::{
    MiscFlags, ObjectKind, ObjectReleaser, ResourceError, TextureDescriptor, TextureRegion,
};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Byte arrays for buffers and texel images for textures.
///
/// Handles release their slot through [`ObjectReleaser`]; the queue worker
/// reads and writes the same slots while executing command lists.
#[derive(Debug, Default)]
pub(crate) struct NullStorage {
    next_id: AtomicUsize,
    buffers: Mutex<HashMap<usize, Vec<u8>>>,
    textures: Mutex<HashMap<usize, TextureImage>>,
    memory: MemoryTracker,
}

impl NullStorage {
    pub fn new(memory: MemoryTracker) -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            memory,
            ..Default::default()
        }
    }

    /// Allocates an object ID, unique across all kinds.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn allocate_buffer(&self, id: usize, size: u64, initial_data: Option<&[u8]>) {
        let mut bytes = vec![0u8; size as usize];
        if let Some(data) = initial_data {
            bytes[..data.len()].copy_from_slice(data);
        }
        self.memory.allocate(AllocationKind::Buffer, size);
        self.lock_buffers().insert(id, bytes);
    }

    /// Allocates texture `id`. Initial data covers mip level 0 of every layer;
    /// the other levels are generated from it when the descriptor asks for it.
    pub fn allocate_texture(
        &self,
        id: usize,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) {
        let mut image = TextureImage::new(descriptor);
        if let Some(data) = initial_data {
            image.write_region(&TextureRegion::whole_level(descriptor, 0), data);
            if descriptor.misc_flags.contains(MiscFlags::GENERATE_MIPS) {
                image.generate_mips();
            }
        }
        self.memory
            .allocate(AllocationKind::Texture, image.byte_size());
        self.lock_textures().insert(id, image);
    }

    /// Runs `f` on the bytes of buffer `id`.
    pub fn with_buffer<R>(
        &self,
        id: usize,
        f: impl FnOnce(&mut Vec<u8>) -> R,
    ) -> Result<R, ResourceError> {
        let mut buffers = self.lock_buffers();
        let bytes = buffers.get_mut(&id).ok_or(ResourceError::NotFound {
            kind: ObjectKind::Buffer,
            id,
        })?;
        Ok(f(bytes))
    }

    /// Runs `f` on the image of texture `id`.
    pub fn with_texture<R>(
        &self,
        id: usize,
        f: impl FnOnce(&mut TextureImage) -> R,
    ) -> Result<R, ResourceError> {
        let mut textures = self.lock_textures();
        let image = textures.get_mut(&id).ok_or(ResourceError::NotFound {
            kind: ObjectKind::Texture,
            id,
        })?;
        Ok(f(image))
    }

    pub fn read_buffer(&self, id: usize, offset: u64, size: u64) -> Result<Vec<u8>, ResourceError> {
        self.with_buffer(id, |bytes| {
            Self::byte_range(bytes.len(), offset, size).map(|range| bytes[range].to_vec())
        })?
    }

    pub fn write_buffer(&self, id: usize, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        self.with_buffer(id, |bytes| {
            let range = Self::byte_range(bytes.len(), offset, data.len() as u64)?;
            bytes[range].copy_from_slice(data);
            Ok(())
        })?
    }

    fn byte_range(len: usize, offset: u64, size: u64) -> Result<Range<usize>, ResourceError> {
        offset
            .checked_add(size)
            .filter(|end| *end <= len as u64)
            .map(|end| offset as usize..end as usize)
            .ok_or_else(|| {
                ResourceError::Argument(format!(
                    "range [{offset}, +{size}) exceeds buffer of {len} bytes"
                ))
            })
    }

    pub fn read_texture(&self, id: usize, region: &TextureRegion) -> Result<Vec<u8>, ResourceError> {
        self.with_texture(id, |image| image.read_region(region))
    }

    pub fn write_texture(
        &self,
        id: usize,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.with_texture(id, |image| image.write_region(region, data))
    }

    fn lock_buffers(&self) -> MutexGuard<'_, HashMap<usize, Vec<u8>>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_textures(&self) -> MutexGuard<'_, HashMap<usize, TextureImage>> {
        self.textures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectReleaser for NullStorage {
    fn release(&self, kind: ObjectKind, id: usize) {
        match kind {
            ObjectKind::Buffer => {
                if let Some(bytes) = self.lock_buffers().remove(&id) {
                    self.memory
                        .release(AllocationKind::Buffer, bytes.len() as u64);
                }
            }
            ObjectKind::Texture => {
                if let Some(image) = self.lock_textures().remove(&id) {
                    self.memory
                        .release(AllocationKind::Texture, image.byte_size());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::math::Extent3D;

    #[test]
    fn test_release_frees_memory() {
        let memory = MemoryTracker::new();
        let storage = NullStorage::new(memory.clone());
        let buffer = storage.next_id();
        let data: Vec<u8> = (1..=16).collect();
        storage.allocate_buffer(buffer, 16, Some(&data));
        assert_eq!(storage.read_buffer(buffer, 2, 4).unwrap(), vec![3, 4, 5, 6]);

        let texture = storage.next_id();
        let desc = TextureDescriptor {
            extent: Extent3D::new(2, 2, 1),
            mip_levels: 1,
            ..Default::default()
        };
        storage.allocate_texture(texture, &desc, None);
        assert_eq!(memory.snapshot().current_bytes(), 32);

        storage.release(ObjectKind::Buffer, buffer);
        storage.release(ObjectKind::Texture, texture);
        storage.release(ObjectKind::Sampler, 99);
        assert_eq!(memory.snapshot().current_bytes(), 0);
        assert_eq!(
            storage.read_buffer(buffer, 0, 1),
            Err(ResourceError::NotFound {
                kind: ObjectKind::Buffer,
                id: buffer
            })
        );
    }
}
