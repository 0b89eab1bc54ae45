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

//! Pipeline layouts: the declared shape of resource bindings.

use super::enums::UniformType;
use crate::impl_backend_object;
use crate::renderer::api::core::{
    BackendBinding, ObjectCore, ObjectKind, RenderingCapabilities, RenderingFeatures,
};
use crate::renderer::api::resource::{BindFlags, ResourceKind, SamplerDescriptor};
use crate::renderer::api::util::StageFlags;
use crate::renderer::error::ResourceError;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// An opaque, backend-assigned pipeline layout ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineLayoutId(pub usize);

/// A binding slot: a descriptor set (WGSL group, Vulkan set, D3D space) and an index in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BindingSlot {
    /// The slot index within the set.
    pub index: u32,
    /// The descriptor set.
    pub set: u32,
}

impl BindingSlot {
    /// Creates a slot.
    pub const fn new(set: u32, index: u32) -> Self {
        Self { index, set }
    }
}

impl fmt::Display for BindingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set {} slot {}", self.set, self.index)
    }
}

/// The register class a binding occupies.
///
/// Slot indices must be unique within one `(set, namespace)` pair, so a
/// texture and a sampler may share index 0 the way D3D `t0` and `s0` do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingNamespace {
    /// Constant buffers.
    ConstantBuffer,
    /// Read-only buffers and sampled textures.
    ShaderResource,
    /// Storage buffers and textures.
    Storage,
    /// Samplers.
    Sampler,
}

impl BindingNamespace {
    /// Classifies a binding by resource kind and bind flags.
    pub fn classify(kind: ResourceKind, bind_flags: BindFlags) -> Self {
        match kind {
            ResourceKind::Sampler => BindingNamespace::Sampler,
            _ if bind_flags.contains(BindFlags::STORAGE) => BindingNamespace::Storage,
            ResourceKind::Buffer if bind_flags.contains(BindFlags::CONSTANT_BUFFER) => {
                BindingNamespace::ConstantBuffer
            }
            _ => BindingNamespace::ShaderResource,
        }
    }
}

/// One heap binding of a pipeline layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingDescriptor {
    /// The binding name, used in diagnostics.
    pub name: String,
    /// The kind of resource bound here.
    pub kind: ResourceKind,
    /// The role of the resource, e.g. [`BindFlags::CONSTANT_BUFFER`] or [`BindFlags::SAMPLED`].
    pub bind_flags: BindFlags,
    /// The stages that see the binding. Must not be empty.
    pub stages: StageFlags,
    /// The slot.
    pub slot: BindingSlot,
    /// The array size; `0` and `1` both mean a single element.
    pub array_size: u32,
}

impl BindingDescriptor {
    /// Creates a non-array binding.
    pub fn new(
        name: impl Into<String>,
        kind: ResourceKind,
        bind_flags: BindFlags,
        stages: StageFlags,
        slot: BindingSlot,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            bind_flags,
            stages,
            slot,
            array_size: 1,
        }
    }

    /// The namespace of the binding.
    pub fn namespace(&self) -> BindingNamespace {
        BindingNamespace::classify(self.kind, self.bind_flags)
    }

    /// The array size with `0` resolved to `1`.
    pub fn resolved_array_size(&self) -> u32 {
        self.array_size.max(1)
    }
}

/// A sampler baked into the layout instead of bound through a heap.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSamplerDescriptor {
    /// The sampler name.
    pub name: String,
    /// The stages that see the sampler.
    pub stages: StageFlags,
    /// The slot.
    pub slot: BindingSlot,
    /// The sampler state.
    pub sampler: SamplerDescriptor,
}

/// A uniform (push constant) declared by the layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformDescriptor {
    /// The uniform name.
    pub name: String,
    /// The data type.
    pub ty: UniformType,
    /// The array size; `0` and `1` both mean a single element.
    pub array_size: u32,
}

impl UniformDescriptor {
    /// The size of the uniform in bytes.
    pub fn size(&self) -> u32 {
        self.ty.size() * self.array_size.max(1)
    }
}

/// A descriptor used to create a [`PipelineLayout`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineLayoutDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Heap bindings, in the order resource heaps provide their views.
    pub bindings: Vec<BindingDescriptor>,
    /// Samplers baked into the layout.
    pub static_samplers: Vec<StaticSamplerDescriptor>,
    /// Uniforms set with `set_uniforms`, in declaration order.
    pub uniforms: Vec<UniformDescriptor>,
}

impl PipelineLayoutDescriptor {
    /// The total size of all uniforms in bytes.
    pub fn uniform_bytes(&self) -> u32 {
        self.uniforms.iter().map(UniformDescriptor::size).sum()
    }

    /// Checks the declarative invariants of the layout against the backend.
    ///
    /// Stage masks must be non-empty and slots unique per `(set, namespace)`.
    pub fn validate(&self, caps: &RenderingCapabilities) -> Result<(), ResourceError> {
        let fail = |reason: String| ResourceError::ResourceCreation {
            kind: ObjectKind::PipelineLayout,
            reason,
        };

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if binding.stages.is_empty() {
                return Err(fail(format!(
                    "binding '{}' at {} has no stage visibility",
                    binding.name, binding.slot
                )));
            }
            if binding.bind_flags.contains(BindFlags::STORAGE)
                && !caps.supports(RenderingFeatures::STORAGE_RESOURCES)
            {
                return Err(fail(format!(
                    "binding '{}' needs storage resources, which the backend does not support",
                    binding.name
                )));
            }
            if !seen.insert((binding.slot, binding.namespace())) {
                return Err(fail(format!(
                    "binding '{}' reuses {} in the {:?} namespace",
                    binding.name,
                    binding.slot,
                    binding.namespace()
                )));
            }
        }

        for sampler in &self.static_samplers {
            if sampler.stages.is_empty() {
                return Err(fail(format!(
                    "static sampler '{}' has no stage visibility",
                    sampler.name
                )));
            }
            if !seen.insert((sampler.slot, BindingNamespace::Sampler)) {
                return Err(fail(format!(
                    "static sampler '{}' reuses {}",
                    sampler.name, sampler.slot
                )));
            }
        }

        let uniform_bytes = self.uniform_bytes();
        if uniform_bytes > 0 {
            if !caps.supports(RenderingFeatures::UNIFORMS) {
                return Err(fail("uniforms are not supported by the backend".into()));
            }
            if uniform_bytes > caps.limits.max_uniform_bytes {
                return Err(fail(format!(
                    "{uniform_bytes} bytes of uniforms exceed the limit of {}",
                    caps.limits.max_uniform_bytes
                )));
            }
        }
        Ok(())
    }
}

struct PipelineLayoutInner {
    core: ObjectCore,
    descriptor: PipelineLayoutDescriptor,
}

/// A reference-counted handle to an immutable pipeline layout.
#[derive(Clone)]
pub struct PipelineLayout {
    inner: Arc<PipelineLayoutInner>,
}

impl PipelineLayout {
    /// Wraps a backend pipeline layout. Called by backends.
    pub fn new(binding: BackendBinding, descriptor: PipelineLayoutDescriptor) -> Self {
        let name = descriptor.label.clone();
        Self {
            inner: Arc::new(PipelineLayoutInner {
                core: ObjectCore::new(binding, name),
                descriptor,
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> PipelineLayoutId {
        PipelineLayoutId(self.inner.core.binding().id())
    }

    /// The descriptor the layout was created with.
    pub fn descriptor(&self) -> &PipelineLayoutDescriptor {
        &self.inner.descriptor
    }

    /// The heap bindings.
    pub fn bindings(&self) -> &[BindingDescriptor] {
        &self.inner.descriptor.bindings
    }

    /// Finds the heap binding at `slot` in the given namespace.
    pub fn find_binding(
        &self,
        slot: BindingSlot,
        namespace: BindingNamespace,
    ) -> Option<&BindingDescriptor> {
        self.bindings()
            .iter()
            .find(|b| b.slot == slot && b.namespace() == namespace)
    }

    /// Finds the static sampler at `slot`.
    pub fn find_static_sampler(&self, slot: BindingSlot) -> Option<&StaticSamplerDescriptor> {
        self.inner
            .descriptor
            .static_samplers
            .iter()
            .find(|s| s.slot == slot)
    }
}

impl_backend_object!(PipelineLayout);

impl fmt::Debug for PipelineLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("id", &self.id())
            .field("bindings", &self.bindings().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> RenderingCapabilities {
        let mut caps = RenderingCapabilities {
            features: RenderingFeatures::STORAGE_RESOURCES | RenderingFeatures::UNIFORMS,
            ..Default::default()
        };
        caps.limits.max_uniform_bytes = 128;
        caps
    }

    fn texture_at(index: u32) -> BindingDescriptor {
        BindingDescriptor::new(
            "albedo",
            ResourceKind::Texture,
            BindFlags::SAMPLED,
            StageFlags::FRAGMENT,
            BindingSlot::new(0, index),
        )
    }

    #[test]
    fn test_texture_and_sampler_may_share_an_index() {
        let desc = PipelineLayoutDescriptor {
            bindings: vec![
                texture_at(0),
                BindingDescriptor::new(
                    "albedo_sampler",
                    ResourceKind::Sampler,
                    BindFlags::empty(),
                    StageFlags::FRAGMENT,
                    BindingSlot::new(0, 0),
                ),
            ],
            ..Default::default()
        };
        assert!(desc.validate(&caps()).is_ok());
    }

    #[test]
    fn test_duplicate_slot_in_namespace_is_rejected() {
        let desc = PipelineLayoutDescriptor {
            bindings: vec![texture_at(1), texture_at(1)],
            ..Default::default()
        };
        assert!(matches!(
            desc.validate(&caps()),
            Err(ResourceError::ResourceCreation {
                kind: ObjectKind::PipelineLayout,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_stage_mask_is_rejected() {
        let mut binding = texture_at(0);
        binding.stages = StageFlags::empty();
        let desc = PipelineLayoutDescriptor {
            bindings: vec![binding],
            ..Default::default()
        };
        assert!(desc.validate(&caps()).is_err());
    }

    #[test]
    fn test_uniform_limit() {
        let desc = PipelineLayoutDescriptor {
            uniforms: vec![UniformDescriptor {
                name: "model".into(),
                ty: UniformType::Float4x4,
                array_size: 3,
            }],
            ..Default::default()
        };
        assert_eq!(desc.uniform_bytes(), 192);
        assert!(desc.validate(&caps()).is_err());
    }
}
