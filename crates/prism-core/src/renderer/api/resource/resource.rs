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

//! The generic resource variant bound through resource heaps and `set_resource`.

use super::buffer::Buffer;
use super::flags::BindFlags;
use super::sampler::Sampler;
use super::texture::Texture;
use crate::renderer::api::core::{BackendOwned, Nameable, ObjectKind, SystemId};
use std::fmt;

/// The discriminant of a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A [`Buffer`].
    Buffer,
    /// A [`Texture`].
    Texture,
    /// A [`Sampler`].
    Sampler,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Buffer => f.write_str("buffer"),
            ResourceKind::Texture => f.write_str("texture"),
            ResourceKind::Sampler => f.write_str("sampler"),
        }
    }
}

/// Any bindable resource.
///
/// Downcasts check the discriminant and return `None` on mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A buffer.
    Buffer(Buffer),
    /// A texture.
    Texture(Texture),
    /// A sampler.
    Sampler(Sampler),
}

impl Resource {
    /// Returns the discriminant.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Buffer(_) => ResourceKind::Buffer,
            Resource::Texture(_) => ResourceKind::Texture,
            Resource::Sampler(_) => ResourceKind::Sampler,
        }
    }

    /// Returns the buffer, if this is one.
    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Resource::Buffer(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the texture, if this is one.
    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            Resource::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the sampler, if this is one.
    pub fn as_sampler(&self) -> Option<&Sampler> {
        match self {
            Resource::Sampler(s) => Some(s),
            _ => None,
        }
    }

    /// The bind flags of buffers and textures. Samplers have none.
    pub fn bind_flags(&self) -> BindFlags {
        match self {
            Resource::Buffer(b) => b.bind_flags(),
            Resource::Texture(t) => t.bind_flags(),
            Resource::Sampler(_) => BindFlags::empty(),
        }
    }

    fn owned(&self) -> &dyn BackendOwned {
        match self {
            Resource::Buffer(b) => b,
            Resource::Texture(t) => t,
            Resource::Sampler(s) => s,
        }
    }
}

impl Nameable for Resource {
    fn set_name(&self, name: Option<&str>) {
        match self {
            Resource::Buffer(b) => b.set_name(name),
            Resource::Texture(t) => t.set_name(name),
            Resource::Sampler(s) => s.set_name(name),
        }
    }

    fn name(&self) -> Option<String> {
        match self {
            Resource::Buffer(b) => b.name(),
            Resource::Texture(t) => t.name(),
            Resource::Sampler(s) => s.name(),
        }
    }
}

impl BackendOwned for Resource {
    fn object_kind(&self) -> ObjectKind {
        self.owned().object_kind()
    }

    fn raw_id(&self) -> usize {
        self.owned().raw_id()
    }

    fn system_id(&self) -> SystemId {
        self.owned().system_id()
    }
}

impl From<Buffer> for Resource {
    fn from(value: Buffer) -> Self {
        Resource::Buffer(value)
    }
}

impl From<Texture> for Resource {
    fn from(value: Texture) -> Self {
        Resource::Texture(value)
    }
}

impl From<Sampler> for Resource {
    fn from(value: Sampler) -> Self {
        Resource::Sampler(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::BackendBinding;
    use crate::renderer::api::resource::{BufferDescriptor, SamplerDescriptor};

    #[test]
    fn test_downcasts_check_discriminant() {
        let buffer = Buffer::new(
            BackendBinding::detached(ObjectKind::Buffer, 1, SystemId(9)),
            BufferDescriptor {
                size: 4,
                bind_flags: BindFlags::CONSTANT_BUFFER,
                ..Default::default()
            },
        );
        let sampler = Sampler::new(
            BackendBinding::detached(ObjectKind::Sampler, 1, SystemId(9)),
            SamplerDescriptor::default(),
        );

        let a = Resource::from(buffer.clone());
        let b = Resource::from(sampler);
        assert_eq!(a.kind(), ResourceKind::Buffer);
        assert_eq!(a.as_buffer(), Some(&buffer));
        assert!(a.as_sampler().is_none());
        assert!(b.as_buffer().is_none());
        assert_eq!(b.bind_flags(), BindFlags::empty());
        assert_eq!(a.object_kind(), ObjectKind::Buffer);
        assert_ne!(a, b);
    }
}
