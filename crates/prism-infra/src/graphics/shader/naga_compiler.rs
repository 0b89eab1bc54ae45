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

//! A [`ShaderCompiler`] built on naga: parses WGSL or SPIR-V, validates the
//! module and reflects the requested entry point.

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{AddressSpace, ArraySize, Binding, Handle, ImageClass, Module, ScalarKind, Type, TypeInner};
use prism_core::renderer::{
    BindFlags, BindingSlot, CompiledShader, ReflectedAttribute, ReflectedBinding,
    ReflectedUniformBlock, Report, ResourceKind, ScalarClass, ShaderCompileFlags, ShaderCompiler,
    ShaderDescriptor, ShaderError, ShaderReflection, ShaderSource, ShaderStage, ShadingLanguage,
};

const LANGUAGES: &[ShadingLanguage] = &[ShadingLanguage::Wgsl, ShadingLanguage::Spirv];

/// Compiles WGSL and SPIR-V shaders with naga.
///
/// naga has no tessellation or geometry stages; shaders for them always fail
/// with an error in their report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NagaShaderCompiler;

impl NagaShaderCompiler {
    /// Creates a compiler.
    pub fn new() -> Self {
        Self
    }

    fn parse(source: &ShaderSource) -> Result<Module, String> {
        match source {
            ShaderSource::Wgsl(text) => {
                naga::front::wgsl::parse_str(text).map_err(|e| e.emit_to_string(text))
            }
            ShaderSource::SpirV(bytes) => {
                naga::front::spv::parse_u8_slice(bytes, &naga::front::spv::Options::default())
                    .map_err(|e| e.to_string())
            }
        }
    }
}

fn naga_stage(stage: ShaderStage) -> Option<naga::ShaderStage> {
    match stage {
        ShaderStage::Vertex => Some(naga::ShaderStage::Vertex),
        ShaderStage::Fragment => Some(naga::ShaderStage::Fragment),
        ShaderStage::Compute => Some(naga::ShaderStage::Compute),
        ShaderStage::TessControl | ShaderStage::TessEvaluation | ShaderStage::Geometry => None,
    }
}

impl ShaderCompiler for NagaShaderCompiler {
    fn languages(&self) -> &[ShadingLanguage] {
        LANGUAGES
    }

    fn compile(&self, descriptor: &ShaderDescriptor) -> Result<CompiledShader, ShaderError> {
        let label = descriptor.display_label();
        let mut report = Report::new();
        let failed = |report: Report| Ok(CompiledShader {
            reflection: None,
            report,
        });

        let Some(stage) = naga_stage(descriptor.stage) else {
            report.error(format!(
                "{label}: {:?} shaders are not supported",
                descriptor.stage
            ));
            return failed(report);
        };

        let module = match Self::parse(&descriptor.source) {
            Ok(module) => module,
            Err(details) => {
                report.error(
                    ShaderError::CompilationFailed {
                        label: label.clone(),
                        details,
                    }
                    .to_string(),
                );
                return failed(report);
            }
        };

        let flags = if descriptor.flags.contains(ShaderCompileFlags::NO_VALIDATION) {
            ValidationFlags::empty()
        } else {
            ValidationFlags::all()
        };
        let info = match Validator::new(flags, Capabilities::all()).validate(&module) {
            Ok(info) => info,
            Err(err) => {
                let details = match &descriptor.source {
                    ShaderSource::Wgsl(text) => err.emit_to_string(text),
                    ShaderSource::SpirV(_) => err.as_inner().to_string(),
                };
                report.error(
                    ShaderError::CompilationFailed {
                        label: label.clone(),
                        details,
                    }
                    .to_string(),
                );
                return failed(report);
            }
        };

        let Some(index) = module
            .entry_points
            .iter()
            .position(|ep| ep.name == descriptor.entry_point && ep.stage == stage)
        else {
            report.error(
                ShaderError::InvalidEntryPoint {
                    label,
                    entry_point: descriptor.entry_point.clone(),
                }
                .to_string(),
            );
            return failed(report);
        };

        let reflection = reflect(&module, &info, index, descriptor.stage);
        log::debug!(
            "Compiled shader '{label}': {} inputs, {} outputs, {} bindings",
            reflection.inputs.len(),
            reflection.outputs.len(),
            reflection.bindings.len()
        );
        Ok(CompiledShader {
            reflection: Some(reflection),
            report,
        })
    }
}

fn reflect(module: &Module, info: &ModuleInfo, index: usize, stage: ShaderStage) -> ShaderReflection {
    let entry = &module.entry_points[index];
    let mut reflection = ShaderReflection::new(stage, entry.name.clone());

    for argument in &entry.function.arguments {
        collect_locations(
            module,
            argument.name.as_deref(),
            argument.ty,
            argument.binding.as_ref(),
            &mut reflection.inputs,
        );
    }
    if let Some(result) = &entry.function.result {
        collect_locations(module, None, result.ty, result.binding.as_ref(), &mut reflection.outputs);
    }
    reflection.inputs.sort_by_key(|a| a.location);
    reflection.outputs.sort_by_key(|a| a.location);

    let usage = info.get_entry_point(index);
    for (handle, global) in module.global_variables.iter() {
        if usage[handle].is_empty() {
            continue;
        }
        let name = global.name.clone().unwrap_or_default();
        if global.space == AddressSpace::PushConstant {
            let size = module.types[global.ty].inner.size(module.to_ctx());
            reflection.uniforms.push(ReflectedUniformBlock { name, size });
            continue;
        }
        let Some(binding) = &global.binding else {
            continue;
        };
        let (inner, array_size) = match module.types[global.ty].inner {
            TypeInner::BindingArray { base, size } => (
                &module.types[base].inner,
                match size {
                    ArraySize::Constant(n) => n.get(),
                    _ => 0,
                },
            ),
            ref inner => (inner, 1),
        };
        let (kind, bind_flags) = match (global.space, inner) {
            (AddressSpace::Uniform, _) => (ResourceKind::Buffer, BindFlags::CONSTANT_BUFFER),
            (AddressSpace::Storage { .. }, _) => (ResourceKind::Buffer, BindFlags::STORAGE),
            (
                AddressSpace::Handle,
                TypeInner::Image {
                    class: ImageClass::Storage { .. },
                    ..
                },
            ) => (ResourceKind::Texture, BindFlags::STORAGE),
            (AddressSpace::Handle, TypeInner::Image { .. }) => {
                (ResourceKind::Texture, BindFlags::SAMPLED)
            }
            (AddressSpace::Handle, TypeInner::Sampler { .. }) => {
                (ResourceKind::Sampler, BindFlags::empty())
            }
            _ => continue,
        };
        reflection.bindings.push(ReflectedBinding {
            name,
            slot: BindingSlot::new(binding.group, binding.binding),
            kind,
            bind_flags,
            stages: stage.into(),
            array_size,
        });
    }
    reflection.bindings.sort_by_key(|b| b.slot);

    if stage == ShaderStage::Compute {
        reflection.work_group_size = Some(entry.workgroup_size);
    }
    reflection
}

/// Gathers `@location` variables, descending into structs without a binding.
fn collect_locations(
    module: &Module,
    name: Option<&str>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<ReflectedAttribute>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            if let Some((class, components)) = scalar_shape(&module.types[ty].inner) {
                out.push(ReflectedAttribute {
                    name: name.unwrap_or_default().to_owned(),
                    location: *location,
                    class,
                    components,
                });
            }
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn scalar_shape(inner: &TypeInner) -> Option<(ScalarClass, u32)> {
    let class = |kind: ScalarKind| match kind {
        ScalarKind::Sint => ScalarClass::Sint,
        ScalarKind::Uint | ScalarKind::Bool => ScalarClass::Uint,
        _ => ScalarClass::Float,
    };
    match *inner {
        TypeInner::Scalar(scalar) => Some((class(scalar.kind), 1)),
        TypeInner::Vector { size, scalar } => Some((class(scalar.kind), size as u32)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip = vec4<f32>(input.position, 0.0, 1.0);
    out.color = input.color;
    return out;
}

@group(0) @binding(0) var albedo: texture_2d<f32>;
@group(0) @binding(1) var albedo_sampler: sampler;

@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color * textureSample(albedo, albedo_sampler, vec2<f32>(0.5, 0.5));
}
"#;

    #[test]
    fn test_vertex_inputs_are_reflected() {
        let compiled = NagaShaderCompiler::new()
            .compile(&ShaderDescriptor::wgsl(ShaderStage::Vertex, TRIANGLE, "vs_main"))
            .unwrap();
        assert!(!compiled.report.has_errors(), "{}", compiled.report);
        let reflection = compiled.reflection.unwrap();
        assert_eq!(reflection.inputs.len(), 2);
        assert_eq!(reflection.inputs[0].name, "position");
        assert_eq!(reflection.inputs[0].components, 2);
        assert_eq!(reflection.inputs[1].location, 1);
        assert_eq!(reflection.inputs[1].components, 4);
        assert_eq!(reflection.outputs.len(), 1);
        assert!(reflection.bindings.is_empty());
    }

    #[test]
    fn test_fragment_bindings_are_reflected() {
        let compiled = NagaShaderCompiler::new()
            .compile(&ShaderDescriptor::wgsl(ShaderStage::Fragment, TRIANGLE, "fs_main"))
            .unwrap();
        let reflection = compiled.reflection.unwrap();
        assert_eq!(reflection.bindings.len(), 2);
        assert_eq!(reflection.bindings[0].kind, ResourceKind::Texture);
        assert_eq!(reflection.bindings[0].bind_flags, BindFlags::SAMPLED);
        assert_eq!(reflection.bindings[1].kind, ResourceKind::Sampler);
        assert_eq!(reflection.bindings[1].slot, BindingSlot::new(0, 1));
    }

    #[test]
    fn test_compute_work_group_size() {
        let source = r#"
@group(0) @binding(0) var<storage, read_write> data: array<u32>;

@compute @workgroup_size(8, 4, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    data[id.x] = id.x;
}
"#;
        let compiled = NagaShaderCompiler::new()
            .compile(&ShaderDescriptor::wgsl(ShaderStage::Compute, source, "main"))
            .unwrap();
        let reflection = compiled.reflection.unwrap();
        assert_eq!(reflection.work_group_size, Some([8, 4, 1]));
        assert_eq!(reflection.bindings[0].bind_flags, BindFlags::STORAGE);
    }

    #[test]
    fn test_failures_land_in_the_report() {
        let compiler = NagaShaderCompiler::new();

        let syntax = compiler
            .compile(&ShaderDescriptor::wgsl(ShaderStage::Vertex, "fn broken(", "main"))
            .unwrap();
        assert!(syntax.report.has_errors());
        assert!(syntax.reflection.is_none());

        let missing = compiler
            .compile(&ShaderDescriptor::wgsl(ShaderStage::Fragment, TRIANGLE, "vs_main"))
            .unwrap();
        assert!(missing.report.text().contains("Invalid entry point 'vs_main'"));

        let geometry = compiler
            .compile(&ShaderDescriptor::wgsl(ShaderStage::Geometry, TRIANGLE, "vs_main"))
            .unwrap();
        assert!(geometry.report.has_errors());
    }
}
