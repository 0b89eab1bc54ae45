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

use crate::renderer::api::core::{Report, ShadingLanguage};
use crate::renderer::api::shader::{ShaderDescriptor, ShaderReflection};
use crate::renderer::error::ShaderError;
use std::fmt::Debug;

/// The result of compiling one shader descriptor.
#[derive(Debug, Clone, Default)]
pub struct CompiledShader {
    /// The reflection of the entry point, if compilation succeeded.
    pub reflection: Option<ShaderReflection>,
    /// Compiler diagnostics.
    pub report: Report,
}

/// Turns shader source into something a backend can execute.
pub trait ShaderCompiler: Debug + Send + Sync {
    /// The source languages the compiler accepts.
    fn languages(&self) -> &[ShadingLanguage];

    /// Compiles and reflects the entry point of `descriptor`.
    /// ## Returns
    /// A `CompiledShader` whose report has errors if the source does not
    /// compile or the entry point is missing.
    /// ## Errors
    /// * `ShaderError::UnsupportedSource` - If the source language is not accepted.
    fn compile(&self, descriptor: &ShaderDescriptor) -> Result<CompiledShader, ShaderError>;
}
