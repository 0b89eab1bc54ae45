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

//! The object factory shared by the Null render system and its swap chains.

use super::storage::NullStorage;
use prism_core::renderer::{
    BackendBinding, Buffer, BufferDescriptor, ObjectKind, ObjectReleaser, SystemId, Texture,
    TextureDescriptor,
};
use std::sync::{Arc, Weak};

/// Allocates object IDs and backing memory for one render system.
#[derive(Debug, Clone)]
pub(crate) struct NullDevice {
    system: SystemId,
    storage: Arc<NullStorage>,
}

impl NullDevice {
    pub fn new(system: SystemId, storage: Arc<NullStorage>) -> Self {
        Self { system, storage }
    }

    pub fn system(&self) -> SystemId {
        self.system
    }

    pub fn storage(&self) -> &Arc<NullStorage> {
        &self.storage
    }

    /// Binds a fresh ID of `kind`; dropping the last handle releases its memory.
    pub fn bind(&self, kind: ObjectKind) -> BackendBinding {
        let storage: Weak<NullStorage> = Arc::downgrade(&self.storage);
        let releaser: Weak<dyn ObjectReleaser> = storage;
        BackendBinding::new(kind, self.storage.next_id(), self.system, releaser)
    }

    /// Creates a buffer whose descriptor and initial data were already validated.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor, initial_data: Option<&[u8]>) -> Buffer {
        let binding = self.bind(ObjectKind::Buffer);
        self.storage
            .allocate_buffer(binding.id(), descriptor.size, initial_data);
        Buffer::new(binding, descriptor.clone())
    }

    /// Creates a texture whose descriptor and initial data were already validated.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Texture {
        let binding = self.bind(ObjectKind::Texture);
        self.storage
            .allocate_texture(binding.id(), descriptor, initial_data);
        Texture::new(binding, descriptor.clone())
    }
}
