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

//! Resource views written into resource heaps.

use super::buffer::{Buffer, WHOLE_SIZE};
use super::resource::Resource;
use super::sampler::Sampler;
use super::texture::{Texture, TextureViewDescriptor};
use crate::renderer::api::util::TextureFormat;

/// Selects a sub-range of a buffer, optionally reinterpreted with a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferViewDescriptor {
    /// The element format of typed views.
    pub format: Option<TextureFormat>,
    /// The byte offset of the view.
    pub offset: u64,
    /// The byte size of the view, or [`WHOLE_SIZE`].
    pub size: u64,
}

impl Default for BufferViewDescriptor {
    fn default() -> Self {
        Self {
            format: None,
            offset: 0,
            size: WHOLE_SIZE,
        }
    }
}

/// One entry of a resource heap: a resource plus an optional sub-view.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceViewDescriptor {
    /// The bound resource.
    pub resource: Resource,
    /// Texture sub-view; `None` views the whole texture.
    pub texture_view: Option<TextureViewDescriptor>,
    /// Buffer sub-range; `None` views the whole buffer.
    pub buffer_view: Option<BufferViewDescriptor>,
    /// Initial value of an append/counter storage buffer.
    pub initial_count: u32,
}

impl ResourceViewDescriptor {
    /// A view over the whole resource.
    pub fn new(resource: impl Into<Resource>) -> Self {
        Self {
            resource: resource.into(),
            texture_view: None,
            buffer_view: None,
            initial_count: 0,
        }
    }

    /// A view over a sub-range of a buffer resource.
    pub fn with_buffer_view(mut self, view: BufferViewDescriptor) -> Self {
        self.buffer_view = Some(view);
        self
    }

    /// A reinterpreted view of a texture resource.
    pub fn with_texture_view(mut self, view: TextureViewDescriptor) -> Self {
        self.texture_view = Some(view);
        self
    }
}

impl From<Resource> for ResourceViewDescriptor {
    fn from(value: Resource) -> Self {
        ResourceViewDescriptor::new(value)
    }
}

impl From<Buffer> for ResourceViewDescriptor {
    fn from(value: Buffer) -> Self {
        ResourceViewDescriptor::new(value)
    }
}

impl From<Texture> for ResourceViewDescriptor {
    fn from(value: Texture) -> Self {
        ResourceViewDescriptor::new(value)
    }
}

impl From<Sampler> for ResourceViewDescriptor {
    fn from(value: Sampler) -> Self {
        ResourceViewDescriptor::new(value)
    }
}
