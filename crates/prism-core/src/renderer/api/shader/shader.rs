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

//! Shader descriptors and the shader handle.

use super::reflection::ShaderReflection;
use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore, Report, ShadingLanguage};
use crate::renderer::api::util::ShaderStage;
use crate::renderer::error::ShaderError;
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

/// An opaque, backend-assigned shader ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub usize);

/// The program text or binary a shader is compiled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// WGSL source text.
    Wgsl(String),
    /// A precompiled SPIR-V module.
    SpirV(Vec<u8>),
}

impl ShaderSource {
    /// The language of the source.
    pub fn language(&self) -> ShadingLanguage {
        match self {
            ShaderSource::Wgsl(_) => ShadingLanguage::Wgsl,
            ShaderSource::SpirV(_) => ShadingLanguage::Spirv,
        }
    }
}

bitflags! {
    /// Options passed to the shader compiler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderCompileFlags: u32 {
        /// Keep debug information.
        const DEBUG = 1 << 0;
        /// Optimize the compiled code.
        const OPTIMIZE = 1 << 1;
        /// Skip validation of the parsed module.
        const NO_VALIDATION = 1 << 2;
    }
}

/// A descriptor used to create a [`Shader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The single stage this shader object is compiled for.
    pub stage: ShaderStage,
    /// The program source.
    pub source: ShaderSource,
    /// The entry point function name.
    pub entry_point: String,
    /// Compiler options.
    pub flags: ShaderCompileFlags,
}

impl ShaderDescriptor {
    /// Creates a descriptor for WGSL source.
    pub fn wgsl(stage: ShaderStage, source: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            label: None,
            stage,
            source: ShaderSource::Wgsl(source.into()),
            entry_point: entry_point.into(),
            flags: ShaderCompileFlags::empty(),
        }
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The label used in diagnostics.
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{:?}:{}", self.stage, self.entry_point))
    }
}

struct ShaderInner {
    core: ObjectCore,
    descriptor: ShaderDescriptor,
    reflection: Option<ShaderReflection>,
    report: Report,
}

/// A reference-counted handle to a compiled shader.
///
/// A shader whose compilation failed is still a valid handle, but its report
/// has errors, it has no reflection and pipeline creation rejects it.
#[derive(Clone)]
pub struct Shader {
    inner: Arc<ShaderInner>,
}

impl Shader {
    /// Wraps a backend shader and its compile result. Called by backends.
    pub fn new(
        binding: BackendBinding,
        descriptor: ShaderDescriptor,
        reflection: Option<ShaderReflection>,
        report: Report,
    ) -> Self {
        let name = descriptor.label.clone();
        Self {
            inner: Arc::new(ShaderInner {
                core: ObjectCore::new(binding, name),
                descriptor,
                reflection,
                report,
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> ShaderId {
        ShaderId(self.inner.core.binding().id())
    }

    /// The descriptor the shader was created with.
    pub fn descriptor(&self) -> &ShaderDescriptor {
        &self.inner.descriptor
    }

    /// The stage of the shader.
    pub fn stage(&self) -> ShaderStage {
        self.inner.descriptor.stage
    }

    /// The compiler report.
    pub fn report(&self) -> &Report {
        &self.inner.report
    }

    /// Returns `true` if compilation succeeded.
    pub fn is_valid(&self) -> bool {
        !self.inner.report.has_errors() && self.inner.reflection.is_some()
    }

    /// The reflected interface. Fails if compilation failed.
    pub fn reflect(&self) -> Result<&ShaderReflection, ShaderError> {
        match &self.inner.reflection {
            Some(reflection) if !self.inner.report.has_errors() => Ok(reflection),
            _ => Err(ShaderError::CompilationFailed {
                label: self.inner.descriptor.display_label(),
                details: self.inner.report.to_string(),
            }),
        }
    }
}

impl_backend_object!(Shader);

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id())
            .field("stage", &self.stage())
            .field("entry_point", &self.inner.descriptor.entry_point)
            .field("valid", &self.is_valid())
            .finish()
    }
}
