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

//! Shared ownership plumbing for every object a render system creates.
//!
//! Handles are reference counted (`Clone` adds a reference). The backend object
//! behind a handle is released exactly once, when the last clone is dropped,
//! through the [`ObjectReleaser`] of the system that created it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, Weak};

/// The kind of a backend object, used for release routing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A linear memory buffer.
    Buffer,
    /// A texture image.
    Texture,
    /// A sampler state object.
    Sampler,
    /// A compiled shader.
    Shader,
    /// A pipeline layout.
    PipelineLayout,
    /// A baked pipeline state.
    PipelineState,
    /// A pipeline cache.
    PipelineCache,
    /// A resource heap.
    ResourceHeap,
    /// A render pass declaration.
    RenderPass,
    /// A texture render target.
    RenderTarget,
    /// A presentable swap chain.
    SwapChain,
    /// A command buffer.
    CommandBuffer,
    /// A fence.
    Fence,
    /// A query heap.
    QueryHeap,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identifies one render system instance.
///
/// Objects remember the system that created them so that passing an object to a
/// different system is detected instead of aliasing an unrelated backend slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub usize);

impl SystemId {
    /// Allocates a process-unique system ID.
    pub fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        SystemId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Implemented by backends to free the native object behind a handle.
pub trait ObjectReleaser: Send + Sync {
    /// Releases the backend object `id` of the given kind.
    fn release(&self, kind: ObjectKind, id: usize);
}

/// Ties a handle to the backend slot it owns.
///
/// Dropping the binding calls [`ObjectReleaser::release`] once. If the system
/// is already gone the release is skipped, as its storage went with it.
pub struct BackendBinding {
    kind: ObjectKind,
    id: usize,
    system: SystemId,
    releaser: Weak<dyn ObjectReleaser>,
}

impl BackendBinding {
    /// Creates a binding released through `releaser`.
    pub fn new(
        kind: ObjectKind,
        id: usize,
        system: SystemId,
        releaser: Weak<dyn ObjectReleaser>,
    ) -> Self {
        Self {
            kind,
            id,
            system,
            releaser,
        }
    }

    /// Creates a binding for an object that has no backend storage to free.
    pub fn detached(kind: ObjectKind, id: usize, system: SystemId) -> Self {
        let releaser: Weak<dyn ObjectReleaser> = Weak::<NoRelease>::new();
        Self::new(kind, id, system, releaser)
    }

    /// The kind of the bound object.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The backend-assigned object ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The system that created the object.
    pub fn system(&self) -> SystemId {
        self.system
    }
}

impl fmt::Debug for BackendBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendBinding")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("system", &self.system)
            .finish()
    }
}

impl Drop for BackendBinding {
    fn drop(&mut self) {
        if let Some(releaser) = self.releaser.upgrade() {
            log::debug!("Releasing {} {}", self.kind, self.id);
            releaser.release(self.kind, self.id);
        }
    }
}

struct NoRelease;

impl ObjectReleaser for NoRelease {
    fn release(&self, _kind: ObjectKind, _id: usize) {}
}

/// Debug name storage plus backend binding, embedded in every handle.
#[derive(Debug)]
pub struct ObjectCore {
    binding: BackendBinding,
    name: RwLock<Option<String>>,
}

impl ObjectCore {
    /// Creates the shared core of a handle, with an optional initial debug name.
    pub fn new(binding: BackendBinding, name: Option<String>) -> Self {
        Self {
            binding,
            name: RwLock::new(name),
        }
    }

    /// The backend binding of the object.
    pub fn binding(&self) -> &BackendBinding {
        &self.binding
    }

    /// Replaces the debug name.
    pub fn set_name(&self, name: Option<&str>) {
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = name.map(str::to_owned);
    }

    /// Returns a copy of the debug name.
    pub fn name(&self) -> Option<String> {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An object that carries a mutable debug name.
pub trait Nameable {
    /// Sets (or clears) the debug name shown in diagnostics and capture tools.
    fn set_name(&self, name: Option<&str>);
    /// Returns the current debug name.
    fn name(&self) -> Option<String>;
}

/// An object owned by exactly one render system.
pub trait BackendOwned {
    /// The kind of the object.
    fn object_kind(&self) -> ObjectKind;
    /// The backend-assigned ID, unique per kind within the owning system.
    fn raw_id(&self) -> usize;
    /// The system that created the object.
    fn system_id(&self) -> SystemId;
}

/// Implements [`Nameable`], [`BackendOwned`] and pointer equality for a handle
/// type of the form `struct X { inner: Arc<XInner> }` where `XInner` has a
/// `core: ObjectCore` field.
#[macro_export]
#[doc(hidden)]
macro_rules! impl_backend_object {
    ($handle:ty) => {
        impl $crate::renderer::api::core::Nameable for $handle {
            fn set_name(&self, name: Option<&str>) {
                self.inner.core.set_name(name);
            }

            fn name(&self) -> Option<String> {
                self.inner.core.name()
            }
        }

        impl $crate::renderer::api::core::BackendOwned for $handle {
            fn object_kind(&self) -> $crate::renderer::api::core::ObjectKind {
                self.inner.core.binding().kind()
            }

            fn raw_id(&self) -> usize {
                self.inner.core.binding().id()
            }

            fn system_id(&self) -> $crate::renderer::api::core::SystemId {
                self.inner.core.binding().system()
            }
        }

        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                std::sync::Arc::ptr_eq(&self.inner, &other.inner)
            }
        }

        impl Eq for $handle {}
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(ObjectKind, usize)>>);

    impl ObjectReleaser for Recorder {
        fn release(&self, kind: ObjectKind, id: usize) {
            self.0.lock().unwrap().push((kind, id));
        }
    }

    #[test]
    fn test_binding_releases_exactly_once() {
        let recorder = Arc::new(Recorder::default());
        let weak: Weak<dyn ObjectReleaser> = {
            let as_dyn: Arc<dyn ObjectReleaser> = recorder.clone();
            Arc::downgrade(&as_dyn)
        };
        let core = Arc::new(ObjectCore::new(
            BackendBinding::new(ObjectKind::Buffer, 7, SystemId(1), weak),
            None,
        ));
        let second = Arc::clone(&core);
        drop(core);
        assert!(recorder.0.lock().unwrap().is_empty());
        drop(second);
        assert_eq!(*recorder.0.lock().unwrap(), vec![(ObjectKind::Buffer, 7)]);
    }

    #[test]
    fn test_binding_outliving_system_is_silent() {
        let recorder: Arc<dyn ObjectReleaser> = Arc::new(Recorder::default());
        let binding =
            BackendBinding::new(ObjectKind::Texture, 1, SystemId(2), Arc::downgrade(&recorder));
        drop(recorder);
        drop(binding);
    }

    #[test]
    fn test_object_core_name_roundtrip() {
        let core = ObjectCore::new(
            BackendBinding::detached(ObjectKind::Sampler, 3, SystemId(3)),
            Some("linear".to_owned()),
        );
        assert_eq!(core.name().as_deref(), Some("linear"));
        core.set_name(None);
        assert_eq!(core.name(), None);
    }
}
