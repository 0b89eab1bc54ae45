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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::command::CommandBufferState;
use crate::renderer::api::core::{ObjectKind, Report};
use thiserror::Error;

/// An error raised by the creation or CPU access of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The descriptor requests something the active backend cannot provide.
    #[error("Failed to create {kind}: {reason}")]
    ResourceCreation {
        /// The kind of object being created.
        kind: ObjectKind,
        /// Why the backend refused the descriptor.
        reason: String,
    },
    /// An argument is malformed, e.g. initial data of the wrong size.
    #[error("Invalid argument: {0}")]
    Argument(String),
    /// The object is unknown to the backend, usually because it was released.
    #[error("{kind} {id} not found")]
    NotFound {
        /// The kind of the missing object.
        kind: ObjectKind,
        /// The backend-assigned ID.
        id: usize,
    },
    /// Resource views disagree with the pipeline layout they are bound against.
    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),
    /// Render target attachments disagree with the render pass.
    #[error("Attachment mismatch: {0}")]
    AttachmentMismatch(String),
    /// The object was created by a different render system instance.
    #[error("{kind} belongs to a different render system")]
    BackendMismatch {
        /// The kind of the foreign object.
        kind: ObjectKind,
    },
}

/// An error related to shader compilation and reflection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    /// The shader failed to compile; details are in its report.
    #[error("Shader compilation failed for '{label}': {details}")]
    CompilationFailed {
        /// A descriptive label for the shader.
        label: String,
        /// The compiler output.
        details: String,
    },
    /// The entry point does not exist in the module for the requested stage.
    #[error("Invalid entry point '{entry_point}' for shader '{label}'")]
    InvalidEntryPoint {
        /// A descriptive label for the shader.
        label: String,
        /// The entry point name that was not found.
        entry_point: String,
    },
    /// The source language is not accepted by the compiler.
    #[error("Unsupported shader source: {0}")]
    UnsupportedSource(String),
}

/// An error related to the creation or use of a pipeline state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A shader failed to compile or the shader set does not link.
    #[error("Shader link error: {0}")]
    ShaderLink(String),
    /// The pipeline layout does not cover what the shaders reflect.
    #[error("Pipeline layout mismatch: {0}")]
    LayoutMismatch(String),
    /// The render pass and the pipeline's color/depth targets disagree.
    #[error("Render pass mismatch: {0}")]
    AttachmentMismatch(String),
    /// The descriptor itself is invalid.
    #[error("Invalid pipeline descriptor: {0}")]
    InvalidDescriptor(String),
}

/// A structural error against the command-buffer state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The operation is not legal in the current state.
    #[error("Cannot {operation} while command buffer is {state:?}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the buffer was in.
        state: CommandBufferState,
    },
    /// `end` was called with a render pass or debug group still open.
    #[error("Cannot end command buffer with an open {0}")]
    UnclosedScope(&'static str),
    /// An argument is malformed, e.g. a clear-value count mismatch.
    #[error("Invalid argument: {0}")]
    Argument(String),
    /// The operation needs an open render pass.
    #[error("Cannot {0} outside of a render pass")]
    NotInRenderPass(&'static str),
    /// The operation is not allowed inside a render pass.
    #[error("Cannot {0} inside a render pass")]
    InsideRenderPass(&'static str),
    /// A draw or dispatch was issued without a pipeline of the matching kind.
    #[error("Cannot {0} without a bound pipeline state")]
    NoPipelineBound(&'static str),
    /// The pipeline state failed to compile and cannot be bound.
    #[error("Pipeline state '{0}' failed to compile and cannot be used")]
    UnusablePipeline(String),
    /// Primary/secondary command buffer rules were violated.
    #[error("Secondary command buffer misuse: {0}")]
    Secondary(String),
    /// The object was created by a different render system instance.
    #[error("{kind} belongs to a different render system")]
    BackendMismatch {
        /// The kind of the foreign object.
        kind: ObjectKind,
    },
    /// The debug layer rejected the command.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// An error raised while loading a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No backend is registered under the name.
    #[error("Unknown render system '{name}'")]
    UnknownBackend {
        /// The requested name.
        name: String,
        /// The load report.
        report: Report,
    },
    /// The backend is known but not built into this binary.
    #[error("Render system '{name}' is not available in this build")]
    BackendUnavailable {
        /// The requested name.
        name: String,
        /// The load report.
        report: Report,
    },
    /// The loader already has a live render system.
    #[error("Render system '{active}' is still active; release it before loading another")]
    BackendAlreadyActive {
        /// The name of the live system.
        active: String,
    },
    /// The backend failed to initialize its device.
    #[error("Render system '{name}' failed to initialize: {report}")]
    Device {
        /// The requested name.
        name: String,
        /// The load report.
        report: Report,
    },
}

impl LoadError {
    /// The diagnostic report attached to the failure, if any.
    pub fn report(&self) -> Option<&Report> {
        match self {
            LoadError::UnknownBackend { report, .. }
            | LoadError::BackendUnavailable { report, .. }
            | LoadError::Device { report, .. } => Some(report),
            LoadError::BackendAlreadyActive { .. } => None,
        }
    }
}

/// A high-level error that can occur anywhere in the rendering subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A resource error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
    /// A shader error.
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),
    /// A pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    /// A command recording error.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
    /// A backend load error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    /// The presentation surface is gone or unusable.
    #[error("Surface error: {0}")]
    Surface(String),
}
