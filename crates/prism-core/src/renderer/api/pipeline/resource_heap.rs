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

//! Resource heaps: tables of concrete resources laid out after a pipeline layout.
//!
//! A heap holds `n * bindings.len()` views. View `i` is bound against layout
//! binding `i % bindings.len()` in descriptor set `i / bindings.len()`.

use super::layout::{BindingDescriptor, PipelineLayout};
use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, BackendOwned, ObjectCore};
use crate::renderer::api::resource::{Resource, ResourceKind, ResourceViewDescriptor};
use crate::renderer::error::ResourceError;
use bitflags::bitflags;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// An opaque, backend-assigned resource heap ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHeapId(pub usize);

bitflags! {
    /// Barriers inserted automatically when the heap is bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BarrierFlags: u32 {
        /// Storage buffers in the heap get a barrier before use.
        const STORAGE_BUFFER = 1 << 0;
        /// Storage textures in the heap get a barrier before use.
        const STORAGE_TEXTURE = 1 << 1;
        /// Both kinds of storage resources.
        const STORAGE = Self::STORAGE_BUFFER.bits() | Self::STORAGE_TEXTURE.bits();
    }
}

/// A descriptor used to create a [`ResourceHeap`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHeapDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The layout whose heap bindings the views follow.
    pub pipeline_layout: PipelineLayout,
    /// The number of views, or `0` to take the count of the initial views.
    pub num_resource_views: u32,
    /// Automatic barriers.
    pub barrier_flags: BarrierFlags,
}

impl ResourceHeapDescriptor {
    /// A heap sized by its initial views.
    pub fn new(pipeline_layout: PipelineLayout) -> Self {
        Self {
            label: None,
            pipeline_layout,
            num_resource_views: 0,
            barrier_flags: BarrierFlags::empty(),
        }
    }
}

/// Checks one view against the layout binding it lands on.
pub fn validate_view(
    binding: &BindingDescriptor,
    index: usize,
    view: &ResourceViewDescriptor,
) -> Result<(), ResourceError> {
    let resource = &view.resource;
    if resource.kind() != binding.kind {
        return Err(ResourceError::LayoutMismatch(format!(
            "view {index} is a {} but binding '{}' at {} expects a {}",
            resource.kind(),
            binding.name,
            binding.slot,
            binding.kind
        )));
    }
    if !resource.bind_flags().contains(binding.bind_flags) {
        return Err(ResourceError::LayoutMismatch(format!(
            "view {index} ({}) lacks bind flags {:?} required by binding '{}'",
            resource.kind(),
            binding.bind_flags.difference(resource.bind_flags()),
            binding.name
        )));
    }
    match resource {
        Resource::Buffer(buffer) => {
            if let Some(bv) = &view.buffer_view {
                if buffer.descriptor().resolve_range(bv.offset, bv.size).is_none() {
                    return Err(ResourceError::Argument(format!(
                        "view {index} buffer range [{}, +{}) exceeds buffer size {}",
                        bv.offset,
                        bv.size,
                        buffer.size()
                    )));
                }
            }
        }
        Resource::Texture(texture) => {
            if let Some(tv) = &view.texture_view {
                let sub = &tv.subresource;
                let desc = texture.descriptor();
                if sub.base_mip_level + sub.num_mip_levels > desc.resolved_mip_levels()
                    || sub.base_array_layer + sub.num_array_layers > desc.array_layers
                {
                    return Err(ResourceError::Argument(format!(
                        "view {index} texture subresource is out of range"
                    )));
                }
            }
        }
        Resource::Sampler(_) => {}
    }
    Ok(())
}

/// Checks `views` written at `first` against the layout of a heap of `capacity` views.
pub fn validate_views(
    layout: &PipelineLayout,
    capacity: usize,
    first: usize,
    views: &[ResourceViewDescriptor],
) -> Result<(), ResourceError> {
    let bindings = layout.bindings();
    if bindings.is_empty() {
        return Err(ResourceError::LayoutMismatch(
            "pipeline layout declares no heap bindings".into(),
        ));
    }
    let end = first
        .checked_add(views.len())
        .filter(|end| *end <= capacity)
        .ok_or_else(|| {
            ResourceError::Argument(format!(
                "writing {} views at {first} exceeds heap size {capacity}",
                views.len()
            ))
        })?;
    for (index, view) in (first..end).zip(views) {
        if view.resource.system_id() != layout.system_id() {
            return Err(ResourceError::BackendMismatch {
                kind: view.resource.object_kind(),
            });
        }
        validate_view(&bindings[index % bindings.len()], index, view)?;
    }
    Ok(())
}

struct ResourceHeapInner {
    core: ObjectCore,
    descriptor: ResourceHeapDescriptor,
    views: RwLock<Vec<Option<ResourceViewDescriptor>>>,
}

/// A reference-counted handle to a resource heap.
#[derive(Clone)]
pub struct ResourceHeap {
    inner: Arc<ResourceHeapInner>,
}

impl ResourceHeap {
    /// Validates the views against the layout and creates the heap. Called by backends.
    ///
    /// The view count must be a non-zero multiple of the layout's binding count.
    /// If initial views are supplied their count must equal the heap size.
    pub fn new(
        binding: BackendBinding,
        descriptor: ResourceHeapDescriptor,
        initial_views: &[ResourceViewDescriptor],
    ) -> Result<Self, ResourceError> {
        let layout = &descriptor.pipeline_layout;
        let per_set = layout.bindings().len();
        let capacity = if descriptor.num_resource_views == 0 {
            initial_views.len()
        } else {
            descriptor.num_resource_views as usize
        };
        if per_set == 0 {
            return Err(ResourceError::LayoutMismatch(
                "pipeline layout declares no heap bindings".into(),
            ));
        }
        if capacity == 0 || capacity % per_set != 0 {
            return Err(ResourceError::LayoutMismatch(format!(
                "{capacity} resource views is not a non-zero multiple of the {per_set} layout bindings"
            )));
        }
        if !initial_views.is_empty() && initial_views.len() != capacity {
            return Err(ResourceError::LayoutMismatch(format!(
                "{} initial views supplied for a heap of {capacity}",
                initial_views.len()
            )));
        }
        validate_views(layout, capacity, 0, initial_views)?;

        let mut views = vec![None; capacity];
        for (slot, view) in views.iter_mut().zip(initial_views) {
            *slot = Some(view.clone());
        }
        let name = descriptor.label.clone();
        Ok(Self {
            inner: Arc::new(ResourceHeapInner {
                core: ObjectCore::new(binding, name),
                descriptor,
                views: RwLock::new(views),
            }),
        })
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> ResourceHeapId {
        ResourceHeapId(self.inner.core.binding().id())
    }

    /// The descriptor the heap was created with.
    pub fn descriptor(&self) -> &ResourceHeapDescriptor {
        &self.inner.descriptor
    }

    /// The layout the heap follows.
    pub fn pipeline_layout(&self) -> &PipelineLayout {
        &self.inner.descriptor.pipeline_layout
    }

    /// The total number of views.
    pub fn num_views(&self) -> usize {
        self.read_views().len()
    }

    /// The number of descriptor sets, i.e. views divided by layout bindings.
    pub fn num_descriptor_sets(&self) -> u32 {
        let per_set = self.pipeline_layout().bindings().len().max(1);
        (self.num_views() / per_set) as u32
    }

    /// A snapshot of all views. Unwritten entries are `None`.
    pub fn views(&self) -> Vec<Option<ResourceViewDescriptor>> {
        self.read_views().clone()
    }

    /// The resource currently at view `index`.
    pub fn resource(&self, index: usize) -> Option<Resource> {
        self.read_views()
            .get(index)
            .and_then(|v| v.as_ref())
            .map(|v| v.resource.clone())
    }

    /// Returns `true` if every view of `set` has been written.
    pub fn is_set_complete(&self, set: u32) -> bool {
        let per_set = self.pipeline_layout().bindings().len();
        let start = set as usize * per_set;
        self.read_views()
            .get(start..start + per_set)
            .is_some_and(|views| views.iter().all(Option::is_some))
    }

    /// The resource kinds present in `set`, used by validation layers.
    pub fn set_kinds(&self, set: u32) -> Vec<Option<ResourceKind>> {
        let per_set = self.pipeline_layout().bindings().len();
        let start = set as usize * per_set;
        self.read_views()
            .get(start..start + per_set)
            .map(|views| {
                views
                    .iter()
                    .map(|v| v.as_ref().map(|v| v.resource.kind()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Overwrites views starting at `first` without recreating the heap.
    ///
    /// All views are validated before any is written. Returns the number of
    /// views written.
    pub fn write(
        &self,
        first: usize,
        views: &[ResourceViewDescriptor],
    ) -> Result<usize, ResourceError> {
        let mut slots = self
            .inner
            .views
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        validate_views(self.pipeline_layout(), slots.len(), first, views)?;
        for (slot, view) in slots[first..].iter_mut().zip(views) {
            *slot = Some(view.clone());
        }
        Ok(views.len())
    }

    fn read_views(&self) -> std::sync::RwLockReadGuard<'_, Vec<Option<ResourceViewDescriptor>>> {
        self.inner
            .views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl_backend_object!(ResourceHeap);

impl fmt::Debug for ResourceHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHeap")
            .field("id", &self.id())
            .field("views", &self.num_views())
            .field("sets", &self.num_descriptor_sets())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{ObjectKind, SystemId};
    use crate::renderer::api::pipeline::{
        BindingDescriptor, BindingSlot, PipelineLayoutDescriptor,
    };
    use crate::renderer::api::resource::{
        BindFlags, Buffer, BufferDescriptor, BufferViewDescriptor, Sampler, SamplerDescriptor,
    };
    use crate::renderer::api::util::StageFlags;

    const SYSTEM: SystemId = SystemId(42);

    fn layout(bindings: Vec<BindingDescriptor>) -> PipelineLayout {
        PipelineLayout::new(
            BackendBinding::detached(ObjectKind::PipelineLayout, 1, SYSTEM),
            PipelineLayoutDescriptor {
                bindings,
                ..Default::default()
            },
        )
    }

    fn cbuffer(id: usize) -> Buffer {
        Buffer::new(
            BackendBinding::detached(ObjectKind::Buffer, id, SYSTEM),
            BufferDescriptor {
                size: 64,
                bind_flags: BindFlags::CONSTANT_BUFFER,
                ..Default::default()
            },
        )
    }

    fn constant_binding(index: u32) -> BindingDescriptor {
        BindingDescriptor::new(
            format!("cb{index}"),
            ResourceKind::Buffer,
            BindFlags::CONSTANT_BUFFER,
            StageFlags::VERTEX,
            BindingSlot::new(0, index),
        )
    }

    fn heap_binding(id: usize) -> BackendBinding {
        BackendBinding::detached(ObjectKind::ResourceHeap, id, SYSTEM)
    }

    #[test]
    fn test_partial_rewrite_keeps_other_views() {
        let layout = layout(vec![constant_binding(0)]);
        let (r1, r2, r3, r4) = (cbuffer(1), cbuffer(2), cbuffer(3), cbuffer(4));
        let heap = ResourceHeap::new(
            heap_binding(1),
            ResourceHeapDescriptor::new(layout),
            &[r1.clone().into(), r2.into(), r3.clone().into()],
        )
        .unwrap();
        assert_eq!(heap.num_descriptor_sets(), 3);

        assert_eq!(heap.write(1, &[r4.clone().into()]).unwrap(), 1);
        assert_eq!(heap.resource(0), Some(Resource::Buffer(r1)));
        assert_eq!(heap.resource(1), Some(Resource::Buffer(r4)));
        assert_eq!(heap.resource(2), Some(Resource::Buffer(r3)));
    }

    #[test]
    fn test_kind_mismatch_is_layout_error() {
        let layout = layout(vec![BindingDescriptor::new(
            "albedo",
            ResourceKind::Texture,
            BindFlags::SAMPLED,
            StageFlags::FRAGMENT,
            BindingSlot::new(0, 0),
        )]);
        let sampler = Sampler::new(
            BackendBinding::detached(ObjectKind::Sampler, 1, SYSTEM),
            SamplerDescriptor::default(),
        );
        let err = ResourceHeap::new(
            heap_binding(2),
            ResourceHeapDescriptor::new(layout),
            &[sampler.into()],
        )
        .unwrap_err();
        assert!(matches!(err, ResourceError::LayoutMismatch(_)), "{err}");
    }

    #[test]
    fn test_count_must_be_multiple_of_bindings() {
        let layout = layout(vec![constant_binding(0), constant_binding(1)]);
        let err = ResourceHeap::new(
            heap_binding(3),
            ResourceHeapDescriptor::new(layout),
            &[cbuffer(1).into(), cbuffer(2).into(), cbuffer(3).into()],
        )
        .unwrap_err();
        assert!(matches!(err, ResourceError::LayoutMismatch(_)));
    }

    #[test]
    fn test_empty_heap_then_fill() {
        let layout = layout(vec![constant_binding(0), constant_binding(1)]);
        let mut desc = ResourceHeapDescriptor::new(layout);
        desc.num_resource_views = 4;
        let heap = ResourceHeap::new(heap_binding(4), desc, &[]).unwrap();
        assert!(!heap.is_set_complete(0));
        heap.write(0, &[cbuffer(1).into(), cbuffer(2).into()]).unwrap();
        assert!(heap.is_set_complete(0));
        assert!(!heap.is_set_complete(1));
        assert!(heap.write(3, &[cbuffer(3).into(), cbuffer(4).into()]).is_err());
    }

    #[test]
    fn test_missing_bind_flag_and_bad_range() {
        let layout = layout(vec![constant_binding(0)]);
        let vertex_only = Buffer::new(
            BackendBinding::detached(ObjectKind::Buffer, 9, SYSTEM),
            BufferDescriptor {
                size: 16,
                bind_flags: BindFlags::VERTEX_BUFFER,
                ..Default::default()
            },
        );
        let mut desc = ResourceHeapDescriptor::new(layout);
        desc.num_resource_views = 1;
        let heap = ResourceHeap::new(heap_binding(5), desc, &[]).unwrap();
        assert!(matches!(
            heap.write(0, &[vertex_only.into()]),
            Err(ResourceError::LayoutMismatch(_))
        ));
        let view = ResourceViewDescriptor::new(cbuffer(7)).with_buffer_view(BufferViewDescriptor {
            offset: 48,
            size: 32,
            format: None,
        });
        assert!(matches!(
            heap.write(0, &[view]),
            Err(ResourceError::Argument(_))
        ));
    }
}
