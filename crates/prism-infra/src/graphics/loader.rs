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

//! Resolves backend names to render systems.

use super::debug::DebugRenderSystem;
use super::null::{NullRenderSystem, NULL_BACKEND_NAME};
use prism_core::config::RenderSystemDescriptor;
use prism_core::renderer::{LoadError, RenderSystem, Report};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Creates a render system for a descriptor.
pub type BackendFactory =
    Arc<dyn Fn(&RenderSystemDescriptor) -> Result<Arc<dyn RenderSystem>, LoadError> + Send + Sync>;

/// Backends whose names are known but that are not part of this build.
const UNAVAILABLE_BACKENDS: &[&str] = &["Vulkan", "Direct3D11", "Direct3D12", "OpenGL", "Metal"];

enum Entry {
    Available(BackendFactory),
    Unavailable,
}

struct Registered {
    name: String,
    entry: Entry,
}

struct ActiveSystem {
    name: String,
    system: Weak<dyn RenderSystem>,
}

/// A registry of backends that loads at most one live render system.
///
/// Names are matched case-insensitively. The Null backend is always
/// registered; the names of native backends are known but report
/// [`LoadError::BackendUnavailable`].
pub struct BackendLoader {
    backends: BTreeMap<String, Registered>,
    active: Mutex<Option<ActiveSystem>>,
}

impl BackendLoader {
    /// A loader with the built-in backends.
    pub fn new() -> Self {
        let mut loader = Self {
            backends: BTreeMap::new(),
            active: Mutex::new(None),
        };
        for name in UNAVAILABLE_BACKENDS {
            loader.insert(name, Entry::Unavailable);
        }
        loader.register(NULL_BACKEND_NAME, |_| {
            let system: Arc<dyn RenderSystem> = Arc::new(NullRenderSystem::new()?);
            Ok(system)
        });
        loader
    }

    /// Registers or replaces a backend under `name`.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&RenderSystemDescriptor) -> Result<Arc<dyn RenderSystem>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(name, Entry::Available(Arc::new(factory)));
    }

    /// The names of the backends that can be loaded.
    pub fn available_backends(&self) -> Vec<String> {
        self.backends
            .values()
            .filter(|b| matches!(b.entry, Entry::Available(_)))
            .map(|b| b.name.clone())
            .collect()
    }

    /// Returns `true` if a render system loaded by this loader is still alive.
    pub fn is_active(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|active| active.system.strong_count() > 0)
    }

    /// Loads the backend named by `descriptor`.
    ///
    /// The system is wrapped in the debug layer when the descriptor asks for
    /// it. Failures are posted to the diagnostics callbacks.
    /// ## Errors
    /// * `LoadError::UnknownBackend` - If no backend has the name.
    /// * `LoadError::BackendUnavailable` - If the backend is not part of this build.
    /// * `LoadError::BackendAlreadyActive` - If a previously loaded system is still alive.
    /// * `LoadError::Device` - If the backend failed to initialize.
    pub fn load(
        &self,
        descriptor: &RenderSystemDescriptor,
    ) -> Result<Arc<dyn RenderSystem>, LoadError> {
        let result = self.try_load(descriptor);
        if let Err(err) = &result {
            let report = err.report().cloned().unwrap_or_else(|| Report::with_error(err.to_string()));
            report.post(&format!("Loading render system '{}'", descriptor.backend));
        }
        result
    }

    fn try_load(
        &self,
        descriptor: &RenderSystemDescriptor,
    ) -> Result<Arc<dyn RenderSystem>, LoadError> {
        let requested = descriptor.backend.trim();
        let Some(registered) = self.backends.get(&requested.to_lowercase()) else {
            let mut report = Report::new();
            report.error(format!("no render system is named '{requested}'"));
            report.info(format!("available: {}", self.available_backends().join(", ")));
            return Err(LoadError::UnknownBackend {
                name: requested.to_owned(),
                report,
            });
        };
        let factory = match &registered.entry {
            Entry::Available(factory) => Arc::clone(factory),
            Entry::Unavailable => {
                let mut report = Report::new();
                report.error(format!(
                    "render system '{}' was not compiled into this build",
                    registered.name
                ));
                return Err(LoadError::BackendUnavailable {
                    name: registered.name.clone(),
                    report,
                });
            }
        };

        let mut active = self.lock_active();
        if let Some(current) = active.as_ref().filter(|a| a.system.strong_count() > 0) {
            return Err(LoadError::BackendAlreadyActive {
                active: current.name.clone(),
            });
        }

        let mut system = factory(descriptor)?;
        if descriptor.wants_debug_layer() {
            let debugger = descriptor.debugger.clone().unwrap_or_default();
            system = Arc::new(DebugRenderSystem::new(system, debugger));
        }
        log::info!(
            "Loaded render system '{}' ({} on {})",
            registered.name,
            system.renderer_info().renderer_name,
            system.renderer_info().device_name
        );
        *active = Some(ActiveSystem {
            name: registered.name.clone(),
            system: Arc::downgrade(&system),
        });
        Ok(system)
    }

    fn insert(&mut self, name: &str, entry: Entry) {
        self.backends.insert(
            name.to_lowercase(),
            Registered {
                name: name.to_owned(),
                entry,
            },
        );
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveSystem>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BackendLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BackendLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendLoader")
            .field("backends", &self.backends.values().map(|b| &b.name).collect::<Vec<_>>())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::config::RenderSystemFlags;

    #[test]
    fn test_names_are_case_insensitive() {
        let loader = BackendLoader::new();
        let system = loader.load(&RenderSystemDescriptor::new("null")).unwrap();
        assert_eq!(system.renderer_info().renderer_name, "Null");
        assert!(system.as_any().is::<NullRenderSystem>());
    }

    #[test]
    fn test_unknown_and_unavailable_backends() {
        let loader = BackendLoader::new();
        let err = loader.load(&RenderSystemDescriptor::new("Glide")).unwrap_err();
        assert!(matches!(err, LoadError::UnknownBackend { ref name, .. } if name == "Glide"));
        assert!(err.report().unwrap().has_errors());

        let err = loader.load(&RenderSystemDescriptor::new("vulkan")).unwrap_err();
        assert!(matches!(err, LoadError::BackendUnavailable { ref name, .. } if name == "Vulkan"));
        assert_eq!(loader.available_backends(), vec!["Null".to_owned()]);
    }

    #[test]
    fn test_second_load_waits_for_release() {
        let loader = BackendLoader::new();
        let first = loader.load(&RenderSystemDescriptor::new("Null")).unwrap();
        let err = loader.load(&RenderSystemDescriptor::new("Null")).unwrap_err();
        assert_eq!(
            err,
            LoadError::BackendAlreadyActive {
                active: "Null".into()
            }
        );
        assert!(loader.is_active());

        drop(first);
        assert!(!loader.is_active());
        assert!(loader.load(&RenderSystemDescriptor::new("Null")).is_ok());
    }

    #[test]
    fn test_debug_flag_wraps_system() {
        let loader = BackendLoader::new();
        let descriptor = RenderSystemDescriptor::new("Null").with_flags(RenderSystemFlags::DEBUG);
        let system = loader.load(&descriptor).unwrap();
        let debug = system.as_any().downcast_ref::<DebugRenderSystem>().unwrap();
        assert!(debug.inner().as_any().is::<NullRenderSystem>());
    }

    #[test]
    fn test_custom_backend_factory() {
        let mut loader = BackendLoader::new();
        loader.register("Reference", |_| {
            Err(LoadError::Device {
                name: "Reference".into(),
                report: Report::with_error("no device"),
            })
        });
        let err = loader.load(&RenderSystemDescriptor::new("REFERENCE")).unwrap_err();
        assert!(matches!(err, LoadError::Device { .. }));
        assert!(!loader.is_active());
    }
}
