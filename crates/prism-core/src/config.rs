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

//! Render system configuration: the loader input and a RON-backed settings file.

use crate::math::Extent2D;
use crate::renderer::api::pass::SwapChainDescriptor;
use crate::telemetry::RenderingDebugger;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The environment variable that overrides the configured backend name.
pub const BACKEND_ENV_VAR: &str = "PRISM_BACKEND";

bitflags! {
    /// Options applied when a backend is loaded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderSystemFlags: u32 {
        /// Wraps the render system in the validating debug layer.
        const DEBUG = 1 << 0;
    }
}

/// Everything the backend loader needs to create a render system.
#[derive(Debug, Clone, Default)]
pub struct RenderSystemDescriptor {
    /// The backend name, matched case-insensitively, e.g. `"Null"`.
    pub backend: String,
    /// Load options.
    pub flags: RenderSystemFlags,
    /// A debugger to report validation messages and profiles to.
    pub debugger: Option<RenderingDebugger>,
}

impl RenderSystemDescriptor {
    /// A descriptor for `backend` with no flags and no debugger.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Default::default()
        }
    }

    /// Attaches a debugger, which also enables the debug layer.
    pub fn with_debugger(mut self, debugger: RenderingDebugger) -> Self {
        self.debugger = Some(debugger);
        self
    }

    /// Sets the load flags.
    pub fn with_flags(mut self, flags: RenderSystemFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns `true` if the debug layer should wrap the system.
    pub fn wants_debug_layer(&self) -> bool {
        self.flags.contains(RenderSystemFlags::DEBUG) || self.debugger.is_some()
    }
}

/// An error raised while reading or writing a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The RON text could not be parsed.
    #[error("Invalid render system configuration: {0}")]
    Parse(String),
    /// The configuration could not be written as RON.
    #[error("Failed to write render system configuration: {0}")]
    Serialize(String),
}

/// User-facing render settings, usually read from a `.ron` file.
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSystemConfig {
    /// The backend to load.
    pub backend: String,
    /// Enables the debug layer.
    pub debug: bool,
    /// The number of swap-chain images.
    pub swap_buffers: u32,
    /// Vertical blanks to wait for on present.
    pub vsync_interval: u32,
    /// The swap-chain resolution; zero takes the surface size.
    pub resolution: Extent2D,
    /// The swap-chain sample count.
    pub samples: u32,
}

impl Default for RenderSystemConfig {
    fn default() -> Self {
        Self {
            backend: "Null".to_owned(),
            debug: false,
            swap_buffers: 2,
            vsync_interval: 1,
            resolution: Extent2D::new(800, 600),
            samples: 1,
        }
    }
}

impl RenderSystemConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Writes the configuration as pretty-printed RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Applies the `PRISM_BACKEND` environment override.
    pub fn with_env_overrides(self) -> Self {
        self.with_backend_override(std::env::var(BACKEND_ENV_VAR).ok())
    }

    /// Replaces the backend name if `backend` is a non-empty name.
    pub fn with_backend_override(mut self, backend: Option<String>) -> Self {
        if let Some(name) = backend.filter(|n| !n.trim().is_empty()) {
            log::info!("Backend overridden to '{name}'");
            self.backend = name.trim().to_owned();
        }
        self
    }

    /// The loader input described by this configuration.
    pub fn render_system_descriptor(&self) -> RenderSystemDescriptor {
        let flags = if self.debug {
            RenderSystemFlags::DEBUG
        } else {
            RenderSystemFlags::empty()
        };
        RenderSystemDescriptor::new(self.backend.clone()).with_flags(flags)
    }

    /// The swap chain described by this configuration.
    pub fn swap_chain_descriptor(&self) -> SwapChainDescriptor {
        SwapChainDescriptor {
            resolution: self.resolution,
            samples: self.samples,
            swap_buffers: self.swap_buffers,
            vsync_interval: self.vsync_interval,
            ..Default::default()
        }
    }
}
