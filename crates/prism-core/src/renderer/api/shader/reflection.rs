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

//! What a compiled shader requires from the pipeline: vertex inputs, resource
//! bindings and uniform blocks.

use crate::renderer::api::pipeline::BindingSlot;
use crate::renderer::api::resource::{BindFlags, ResourceKind, ScalarClass};
use crate::renderer::api::util::{ShaderStage, StageFlags};

/// A stage input or output variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReflectedAttribute {
    /// The variable name, if the compiler kept it.
    pub name: String,
    /// The location index.
    pub location: u32,
    /// The scalar type of the components.
    pub class: ScalarClass,
    /// The number of components.
    pub components: u32,
}

/// A resource binding the shader reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReflectedBinding {
    /// The variable name, if the compiler kept it.
    pub name: String,
    /// The binding slot (set/group and index).
    pub slot: BindingSlot,
    /// The kind of resource expected at the slot.
    pub kind: ResourceKind,
    /// The bind flags the bound resource needs.
    pub bind_flags: BindFlags,
    /// The stage that uses the binding.
    pub stages: StageFlags,
    /// The array size, `1` for non-array bindings.
    pub array_size: u32,
}

/// A block of uniform (push constant) data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReflectedUniformBlock {
    /// The block name.
    pub name: String,
    /// The size of the block in bytes.
    pub size: u32,
}

/// The reflected interface of one shader entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReflection {
    /// The stage of the entry point.
    pub stage: ShaderStage,
    /// The entry point name.
    pub entry_point: String,
    /// Stage inputs; for vertex shaders these are the vertex attributes.
    pub inputs: Vec<ReflectedAttribute>,
    /// Stage outputs; for fragment shaders these are the color targets.
    pub outputs: Vec<ReflectedAttribute>,
    /// Resource bindings used by the entry point.
    pub bindings: Vec<ReflectedBinding>,
    /// Uniform blocks used by the entry point.
    pub uniforms: Vec<ReflectedUniformBlock>,
    /// The work group size of compute shaders.
    pub work_group_size: Option<[u32; 3]>,
}

impl ShaderReflection {
    /// An empty reflection for the given stage and entry point.
    pub fn new(stage: ShaderStage, entry_point: impl Into<String>) -> Self {
        Self {
            stage,
            entry_point: entry_point.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            bindings: Vec::new(),
            uniforms: Vec::new(),
            work_group_size: None,
        }
    }

    /// Finds the input at `location`.
    pub fn input(&self, location: u32) -> Option<&ReflectedAttribute> {
        self.inputs.iter().find(|a| a.location == location)
    }

    /// Finds the binding at `slot`.
    pub fn binding(&self, slot: BindingSlot) -> Option<&ReflectedBinding> {
        self.bindings.iter().find(|b| b.slot == slot)
    }

    /// The total uniform bytes used by the entry point.
    pub fn uniform_bytes(&self) -> u32 {
        self.uniforms.iter().map(|u| u.size).sum()
    }
}
