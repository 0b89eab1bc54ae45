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

//! The baked pipeline state handle.

use super::descriptor::{PipelineDescriptor, PipelineKind};
use super::layout::PipelineLayout;
use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore, Report};
use crate::renderer::api::util::TextureFormat;
use crate::renderer::error::{CommandError, PipelineError};
use std::fmt;
use std::sync::Arc;

/// An opaque, backend-assigned pipeline state ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineStateId(pub usize);

struct PipelineStateInner {
    core: ObjectCore,
    descriptor: PipelineDescriptor,
    report: Report,
    error: Option<PipelineError>,
}

/// A reference-counted handle to an immutable pipeline state.
///
/// Creation always yields a handle. If validation or compilation failed the
/// report has errors, [`PipelineState::error`] holds the first failure and
/// binding the pipeline fails with [`CommandError::UnusablePipeline`].
#[derive(Clone)]
pub struct PipelineState {
    inner: Arc<PipelineStateInner>,
}

impl PipelineState {
    /// Wraps a backend pipeline and its compile result. Called by backends.
    pub fn new(
        binding: BackendBinding,
        descriptor: PipelineDescriptor,
        report: Report,
        error: Option<PipelineError>,
    ) -> Self {
        let name = descriptor.label().map(str::to_owned);
        Self {
            inner: Arc::new(PipelineStateInner {
                core: ObjectCore::new(binding, name),
                descriptor,
                report,
                error,
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> PipelineStateId {
        PipelineStateId(self.inner.core.binding().id())
    }

    /// The descriptor the pipeline was created with.
    pub fn descriptor(&self) -> &PipelineDescriptor {
        &self.inner.descriptor
    }

    /// Graphics or compute.
    pub fn kind(&self) -> PipelineKind {
        self.inner.descriptor.kind()
    }

    /// The validation and compilation report.
    pub fn report(&self) -> &Report {
        &self.inner.report
    }

    /// The first creation failure, if any.
    pub fn error(&self) -> Option<&PipelineError> {
        self.inner.error.as_ref()
    }

    /// Returns `true` if the pipeline compiled and may be bound.
    pub fn is_usable(&self) -> bool {
        self.inner.error.is_none() && !self.inner.report.has_errors()
    }

    /// Fails with [`CommandError::UnusablePipeline`] if creation failed.
    pub fn ensure_usable(&self) -> Result<(), CommandError> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(CommandError::UnusablePipeline(self.display_label()))
        }
    }

    /// The pipeline layout, if one was given.
    pub fn pipeline_layout(&self) -> Option<&PipelineLayout> {
        self.inner.descriptor.pipeline_layout()
    }

    /// The color formats the pipeline renders into, taken from its render
    /// pass or, without one, from its blend targets. Empty for compute pipelines.
    pub fn color_formats(&self) -> Vec<TextureFormat> {
        match &self.inner.descriptor {
            PipelineDescriptor::Graphics(d) => match &d.render_pass {
                Some(pass) => pass.descriptor().color_formats(),
                None => d.blend_targets.iter().map(|t| t.format).collect(),
            },
            PipelineDescriptor::Compute(_) => Vec::new(),
        }
    }

    /// Returns `true` if draws with this pipeline read vertex buffers.
    pub fn has_vertex_input(&self) -> bool {
        self.inner
            .descriptor
            .as_graphics()
            .is_some_and(|d| d.vertex_buffers.iter().any(|b| !b.attributes.is_empty()))
    }

    /// The label used in diagnostics.
    pub fn display_label(&self) -> String {
        self.inner
            .core
            .name()
            .unwrap_or_else(|| format!("{:?} pipeline {}", self.kind(), self.id().0))
    }
}

impl_backend_object!(PipelineState);

impl fmt::Debug for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineState")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("usable", &self.is_usable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{ObjectKind, SystemId};
    use crate::renderer::api::pipeline::ComputePipelineDescriptor;

    #[test]
    fn test_failed_pipeline_is_unusable() {
        let pipeline = PipelineState::new(
            BackendBinding::detached(ObjectKind::PipelineState, 4, SystemId(1)),
            ComputePipelineDescriptor::default().into(),
            Report::with_error("compute shader is missing"),
            Some(PipelineError::InvalidDescriptor("compute shader is missing".into())),
        );
        assert!(!pipeline.is_usable());
        assert_eq!(
            pipeline.ensure_usable(),
            Err(CommandError::UnusablePipeline("Compute pipeline 4".into()))
        );
        assert!(pipeline.color_formats().is_empty());
    }
}
