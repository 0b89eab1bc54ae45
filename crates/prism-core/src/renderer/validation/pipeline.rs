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

//! Creation-time validation of pipeline states.
//!
//! Validation never fails the creation call itself: it produces a [`Report`]
//! and the first [`PipelineError`], both stored on the resulting pipeline.

use super::ensure_owned;
use crate::renderer::api::core::{RenderingCapabilities, RenderingFeatures, Report, SystemId};
use crate::renderer::api::pipeline::{
    BindingNamespace, ComputePipelineDescriptor, GraphicsPipelineDescriptor, PipelineCache,
    PipelineDescriptor, PipelineLayout,
};
use crate::renderer::api::shader::{Shader, ShaderReflection};
use crate::renderer::api::util::{ShaderStage, StageFlags};
use crate::renderer::error::{PipelineError, ResourceError};

/// Fails with `BackendMismatch` if any object referenced by `descriptor`
/// belongs to another system.
pub fn ensure_pipeline_owned(
    descriptor: &PipelineDescriptor,
    system: SystemId,
) -> Result<(), ResourceError> {
    if let Some(layout) = descriptor.pipeline_layout() {
        ensure_owned(layout, system)?;
    }
    match descriptor {
        PipelineDescriptor::Graphics(desc) => {
            if let Some(pass) = &desc.render_pass {
                ensure_owned(pass, system)?;
            }
            for (_, shader) in desc.shader_slots() {
                ensure_owned(shader, system)?;
            }
        }
        PipelineDescriptor::Compute(desc) => {
            if let Some(shader) = &desc.compute_shader {
                ensure_owned(shader, system)?;
            }
        }
    }
    Ok(())
}

/// Validates `descriptor`, consulting `cache` first.
///
/// A cached signature skips validation. A descriptor that validates cleanly
/// is added to the cache.
pub fn validate_pipeline_cached(
    descriptor: &PipelineDescriptor,
    caps: &RenderingCapabilities,
    cache: Option<&PipelineCache>,
) -> (Report, Option<PipelineError>) {
    let signature = cache.map(|_| PipelineCache::signature(descriptor));
    if let (Some(cache), Some(signature)) = (cache, signature.as_deref()) {
        if cache.lookup(signature) {
            let mut report = Report::new();
            report.info("pipeline state restored from cache");
            return (report, None);
        }
    }
    let (report, error) = validate_pipeline(descriptor, caps);
    if let (Some(cache), Some(signature), None) = (cache, signature, &error) {
        cache.insert(signature);
    }
    (report, error)
}

/// Validates a pipeline descriptor against the backend capabilities.
pub fn validate_pipeline(
    descriptor: &PipelineDescriptor,
    caps: &RenderingCapabilities,
) -> (Report, Option<PipelineError>) {
    let mut report = Report::new();
    let result = match descriptor {
        PipelineDescriptor::Graphics(desc) => validate_graphics(desc, caps),
        PipelineDescriptor::Compute(desc) => validate_compute(desc, caps),
    };
    match result {
        Ok(()) => (report, None),
        Err(err) => {
            report.error(err.to_string());
            (report, Some(err))
        }
    }
}

fn validate_graphics(
    desc: &GraphicsPipelineDescriptor,
    caps: &RenderingCapabilities,
) -> Result<(), PipelineError> {
    let vertex = desc.vertex_shader.as_ref().ok_or_else(|| {
        PipelineError::InvalidDescriptor("graphics pipelines need a vertex shader".into())
    })?;

    let mut reflections = Vec::new();
    for (stage, shader) in desc.shader_slots() {
        if shader.stage() != stage {
            return Err(PipelineError::InvalidDescriptor(format!(
                "{:?} shader bound to the {stage:?} slot",
                shader.stage()
            )));
        }
        match stage {
            ShaderStage::Geometry if !caps.supports(RenderingFeatures::GEOMETRY_SHADERS) => {
                return Err(PipelineError::InvalidDescriptor(
                    "geometry shaders are not supported".into(),
                ))
            }
            ShaderStage::TessControl | ShaderStage::TessEvaluation
                if !caps.supports(RenderingFeatures::TESSELLATION_SHADERS) =>
            {
                return Err(PipelineError::InvalidDescriptor(
                    "tessellation shaders are not supported".into(),
                ))
            }
            _ => {}
        }
        reflections.push(compiled(shader)?);
    }
    if desc.tess_control_shader.is_some() != desc.tess_evaluation_shader.is_some() {
        return Err(PipelineError::ShaderLink(
            "tessellation needs both a control and an evaluation shader".into(),
        ));
    }

    for layout in &desc.vertex_buffers {
        if !layout.is_within_stride() {
            return Err(PipelineError::InvalidDescriptor(format!(
                "a vertex attribute ends past the stride of {} bytes",
                layout.stride
            )));
        }
    }
    check_vertex_inputs(desc, compiled(vertex)?)?;
    for pair in reflections.windows(2) {
        check_stage_interface(pair[0], pair[1])?;
    }
    for reflection in &reflections {
        check_layout(desc.pipeline_layout.as_ref(), reflection)?;
    }
    check_targets(desc, reflections.last().copied(), caps)?;
    Ok(())
}

fn validate_compute(
    desc: &ComputePipelineDescriptor,
    caps: &RenderingCapabilities,
) -> Result<(), PipelineError> {
    if !caps.supports(RenderingFeatures::COMPUTE_SHADERS) {
        return Err(PipelineError::InvalidDescriptor(
            "compute shaders are not supported".into(),
        ));
    }
    let shader = desc.compute_shader.as_ref().ok_or_else(|| {
        PipelineError::InvalidDescriptor("compute pipelines need a compute shader".into())
    })?;
    if shader.stage() != ShaderStage::Compute {
        return Err(PipelineError::InvalidDescriptor(format!(
            "{:?} shader bound to the compute slot",
            shader.stage()
        )));
    }
    let reflection = compiled(shader)?;
    if let Some(size) = reflection.work_group_size {
        let max = caps.limits.max_compute_work_group_size;
        if size.iter().zip(max).any(|(s, m)| *s > m) {
            return Err(PipelineError::InvalidDescriptor(format!(
                "work group size {size:?} exceeds the limit of {max:?}"
            )));
        }
    }
    check_layout(desc.pipeline_layout.as_ref(), reflection)
}

fn compiled(shader: &Shader) -> Result<&ShaderReflection, PipelineError> {
    shader.reflect().map_err(|_| {
        PipelineError::ShaderLink(format!(
            "{:?} shader '{}' failed to compile",
            shader.stage(),
            shader.descriptor().display_label()
        ))
    })
}

fn check_vertex_inputs(
    desc: &GraphicsPipelineDescriptor,
    vertex: &ShaderReflection,
) -> Result<(), PipelineError> {
    for input in &vertex.inputs {
        let attribute = desc
            .vertex_buffers
            .iter()
            .flat_map(|layout| &layout.attributes)
            .find(|a| a.location == input.location)
            .ok_or_else(|| {
                PipelineError::ShaderLink(format!(
                    "vertex input '{}' at location {} is not fed by any vertex buffer",
                    input.name, input.location
                ))
            })?;
        if attribute.format.scalar_class() != input.class
            || attribute.format.components() < input.components
        {
            return Err(PipelineError::ShaderLink(format!(
                "vertex attribute '{}' ({:?}) does not match shader input '{}' at location {}",
                attribute.name, attribute.format, input.name, input.location
            )));
        }
    }
    Ok(())
}

fn check_stage_interface(
    producer: &ShaderReflection,
    consumer: &ShaderReflection,
) -> Result<(), PipelineError> {
    for input in &consumer.inputs {
        let output = producer
            .outputs
            .iter()
            .find(|o| o.location == input.location)
            .ok_or_else(|| {
                PipelineError::ShaderLink(format!(
                    "{:?} input '{}' at location {} is not written by the {:?} stage",
                    consumer.stage, input.name, input.location, producer.stage
                ))
            })?;
        if output.class != input.class || output.components < input.components {
            return Err(PipelineError::ShaderLink(format!(
                "{:?} output '{}' and {:?} input '{}' at location {} have different types",
                producer.stage, output.name, consumer.stage, input.name, input.location
            )));
        }
    }
    Ok(())
}

fn check_layout(
    layout: Option<&PipelineLayout>,
    reflection: &ShaderReflection,
) -> Result<(), PipelineError> {
    let stage = StageFlags::from(reflection.stage);
    for binding in &reflection.bindings {
        let namespace = BindingNamespace::classify(binding.kind, binding.bind_flags);
        let covered = layout.is_some_and(|layout| {
            let dynamic = layout
                .find_binding(binding.slot, namespace)
                .is_some_and(|b| {
                    b.kind == binding.kind
                        && b.stages.contains(stage)
                        && b.resolved_array_size() >= binding.array_size.max(1)
                });
            let fixed = namespace == BindingNamespace::Sampler
                && layout
                    .descriptor()
                    .static_samplers
                    .iter()
                    .any(|s| s.slot == binding.slot && s.stages.contains(stage));
            dynamic || fixed
        });
        if !covered {
            return Err(PipelineError::LayoutMismatch(format!(
                "{:?} shader uses {} '{}' at {}, which the pipeline layout does not provide",
                reflection.stage, binding.kind, binding.name, binding.slot
            )));
        }
    }
    let needed = reflection.uniform_bytes();
    let available = layout.map_or(0, |l| l.descriptor().uniform_bytes());
    if needed > available {
        return Err(PipelineError::LayoutMismatch(format!(
            "{:?} shader needs {needed} bytes of uniforms, the layout declares {available}",
            reflection.stage
        )));
    }
    Ok(())
}

fn check_targets(
    desc: &GraphicsPipelineDescriptor,
    last_stage: Option<&ShaderReflection>,
    caps: &RenderingCapabilities,
) -> Result<(), PipelineError> {
    if desc.viewports.len() as u32 > caps.limits.max_viewports
        || desc.scissors.len() as u32 > caps.limits.max_viewports
    {
        return Err(PipelineError::InvalidDescriptor(format!(
            "more than {} static viewports or scissors",
            caps.limits.max_viewports
        )));
    }
    let Some(pass) = &desc.render_pass else {
        if desc.fragment_shader.is_none() && !desc.blend_targets.is_empty() {
            return Err(PipelineError::ShaderLink(format!(
                "{} blend targets but no fragment shader writes them",
                desc.blend_targets.len()
            )));
        }
        return Ok(());
    };
    let pass_desc = pass.descriptor();
    let pass_colors = pass_desc.color_formats();
    // Only depth-only passes may run without a fragment shader.
    if desc.fragment_shader.is_none() && !pass_colors.is_empty() {
        return Err(PipelineError::ShaderLink(format!(
            "no fragment shader for a render pass with {} color attachments",
            pass_colors.len()
        )));
    }
    if !desc.blend_targets.is_empty() {
        if desc.blend_targets.len() != pass_colors.len() {
            return Err(PipelineError::AttachmentMismatch(format!(
                "{} blend targets for a render pass with {} color attachments",
                desc.blend_targets.len(),
                pass_colors.len()
            )));
        }
        for (index, (target, format)) in desc.blend_targets.iter().zip(&pass_colors).enumerate() {
            if target.format != *format {
                return Err(PipelineError::AttachmentMismatch(format!(
                    "blend target {index} is {:?} but the render pass attachment is {format:?}",
                    target.format
                )));
            }
        }
    }
    if let Some(fragment) = last_stage.filter(|r| r.stage == ShaderStage::Fragment) {
        if let Some(output) = fragment
            .outputs
            .iter()
            .find(|o| o.location as usize >= pass_colors.len())
        {
            return Err(PipelineError::AttachmentMismatch(format!(
                "fragment output '{}' at location {} has no color attachment",
                output.name, output.location
            )));
        }
    }
    match (&desc.depth_stencil, pass_desc.depth_stencil_format()) {
        (Some(state), Some(format)) if state.format != format => {
            return Err(PipelineError::AttachmentMismatch(format!(
                "depth/stencil state is {:?} but the render pass attachment is {format:?}",
                state.format
            )))
        }
        (Some(_), None) => {
            return Err(PipelineError::AttachmentMismatch(
                "depth/stencil state given for a render pass without depth/stencil".into(),
            ))
        }
        _ => {}
    }
    if desc.multisample.count != pass.samples() {
        return Err(PipelineError::AttachmentMismatch(format!(
            "pipeline uses {} samples, the render pass {}",
            desc.multisample.count,
            pass.samples()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{BackendBinding, ObjectKind};
    use crate::renderer::api::pass::{AttachmentFormatDescriptor, RenderPass, RenderPassDescriptor};
    use crate::renderer::api::pipeline::{
        BindingDescriptor, BindingSlot, ColorTargetState, DepthStencilState,
        PipelineLayoutDescriptor,
    };
    use crate::renderer::api::resource::{
        BindFlags, ResourceKind, ScalarClass, VertexBufferLayout, VertexFormat,
    };
    use crate::renderer::api::shader::{ReflectedAttribute, ReflectedBinding, ShaderDescriptor};
    use crate::renderer::api::util::TextureFormat;

    const SYSTEM: SystemId = SystemId(11);

    fn shader(stage: ShaderStage, reflection: ShaderReflection) -> Shader {
        Shader::new(
            BackendBinding::detached(ObjectKind::Shader, 1, SYSTEM),
            ShaderDescriptor::wgsl(stage, "", "main"),
            Some(reflection),
            Report::new(),
        )
    }

    fn attr(name: &str, location: u32, class: ScalarClass, components: u32) -> ReflectedAttribute {
        ReflectedAttribute {
            name: name.into(),
            location,
            class,
            components,
        }
    }

    fn triangle() -> GraphicsPipelineDescriptor {
        let mut vs = ShaderReflection::new(ShaderStage::Vertex, "main");
        vs.inputs = vec![
            attr("position", 0, ScalarClass::Float, 2),
            attr("color", 1, ScalarClass::Float, 4),
        ];
        vs.outputs = vec![attr("color", 0, ScalarClass::Float, 4)];
        let mut fs = ShaderReflection::new(ShaderStage::Fragment, "main");
        fs.inputs = vec![attr("color", 0, ScalarClass::Float, 4)];
        fs.outputs = vec![attr("target", 0, ScalarClass::Float, 4)];

        let mut desc = GraphicsPipelineDescriptor::new(
            shader(ShaderStage::Vertex, vs),
            Some(shader(ShaderStage::Fragment, fs)),
        );
        desc.vertex_buffers = vec![VertexBufferLayout::packed([
            ("position".to_owned(), 0, VertexFormat::Float32x2),
            ("color".to_owned(), 1, VertexFormat::Unorm8x4),
        ])];
        desc.render_pass = Some(RenderPass::new(
            BackendBinding::detached(ObjectKind::RenderPass, 1, SYSTEM),
            RenderPassDescriptor {
                color_attachments: vec![AttachmentFormatDescriptor::cleared(
                    TextureFormat::Bgra8Unorm,
                )],
                ..Default::default()
            },
        ));
        desc.blend_targets = vec![ColorTargetState::new(TextureFormat::Bgra8Unorm)];
        desc
    }

    fn caps() -> RenderingCapabilities {
        RenderingCapabilities::default()
    }

    #[test]
    fn test_triangle_pipeline_is_valid() {
        let (report, error) = validate_pipeline(&triangle().into(), &caps());
        assert!(error.is_none(), "{report}");
        assert!(!report.has_errors());
    }

    #[test]
    fn test_missing_vertex_attribute_is_a_link_error() {
        let mut desc = triangle();
        desc.vertex_buffers[0].attributes.pop();
        let (report, error) = validate_pipeline(&desc.into(), &caps());
        assert!(matches!(error, Some(PipelineError::ShaderLink(_))));
        assert!(report.has_errors());
    }

    #[test]
    fn test_blend_target_format_must_match_pass() {
        let mut desc = triangle();
        desc.blend_targets = vec![ColorTargetState::new(TextureFormat::Rgba16Float)];
        let (_, error) = validate_pipeline(&desc.into(), &caps());
        assert!(matches!(error, Some(PipelineError::AttachmentMismatch(_))));
    }

    #[test]
    fn test_fragment_shader_is_optional_only_for_depth_only_passes() {
        let mut desc = triangle();
        desc.fragment_shader = None;
        let (report, error) = validate_pipeline(&desc.clone().into(), &caps());
        assert!(matches!(error, Some(PipelineError::ShaderLink(_))));
        assert!(report.has_errors());

        // Without a pass, the blend targets stand in for the color attachments.
        desc.render_pass = None;
        let (_, error) = validate_pipeline(&desc.clone().into(), &caps());
        assert!(matches!(error, Some(PipelineError::ShaderLink(_))));

        desc.blend_targets.clear();
        desc.render_pass = Some(RenderPass::new(
            BackendBinding::detached(ObjectKind::RenderPass, 2, SYSTEM),
            RenderPassDescriptor {
                depth_attachment: Some(AttachmentFormatDescriptor::cleared(
                    TextureFormat::Depth32Float,
                )),
                ..Default::default()
            },
        ));
        desc.depth_stencil = Some(DepthStencilState::default());
        let (report, error) = validate_pipeline(&desc.into(), &caps());
        assert!(error.is_none(), "{report}");
    }

    #[test]
    fn test_uncovered_binding_is_a_layout_mismatch() {
        let mut fs = ShaderReflection::new(ShaderStage::Fragment, "main");
        fs.bindings = vec![ReflectedBinding {
            name: "albedo".into(),
            slot: BindingSlot::new(0, 0),
            kind: ResourceKind::Texture,
            bind_flags: BindFlags::SAMPLED,
            stages: StageFlags::FRAGMENT,
            array_size: 1,
        }];
        let mut desc = triangle();
        desc.fragment_shader = Some(shader(ShaderStage::Fragment, fs));
        let (_, error) = validate_pipeline(&desc.clone().into(), &caps());
        assert!(matches!(error, Some(PipelineError::LayoutMismatch(_))));

        desc.pipeline_layout = Some(PipelineLayout::new(
            BackendBinding::detached(ObjectKind::PipelineLayout, 1, SYSTEM),
            PipelineLayoutDescriptor {
                bindings: vec![BindingDescriptor::new(
                    "albedo",
                    ResourceKind::Texture,
                    BindFlags::SAMPLED,
                    StageFlags::FRAGMENT,
                    BindingSlot::new(0, 0),
                )],
                ..Default::default()
            },
        ));
        let (report, error) = validate_pipeline(&desc.into(), &caps());
        assert!(error.is_none(), "{report}");
    }

    #[test]
    fn test_failed_shader_and_cache() {
        let failed = Shader::new(
            BackendBinding::detached(ObjectKind::Shader, 9, SYSTEM),
            ShaderDescriptor::wgsl(ShaderStage::Vertex, "fn", "main"),
            None,
            Report::with_error("unexpected end of input"),
        );
        let desc: PipelineDescriptor = GraphicsPipelineDescriptor::new(failed, None).into();
        let (_, error) = validate_pipeline(&desc, &caps());
        assert!(matches!(error, Some(PipelineError::ShaderLink(_))));

        let cache = PipelineCache::new(
            BackendBinding::detached(ObjectKind::PipelineCache, 1, SYSTEM),
            &[],
        );
        let good: PipelineDescriptor = triangle().into();
        let (_, error) = validate_pipeline_cached(&good, &caps(), Some(&cache));
        assert!(error.is_none());
        assert_eq!(cache.len(), 1);
        let (report, _) = validate_pipeline_cached(&good, &caps(), Some(&cache));
        assert_eq!(cache.hits(), 1);
        assert!(report.text().contains("cache"));
    }

    #[test]
    fn test_foreign_shader_is_rejected() {
        let desc: PipelineDescriptor = triangle().into();
        assert!(ensure_pipeline_owned(&desc, SYSTEM).is_ok());
        assert_eq!(
            ensure_pipeline_owned(&desc, SystemId(12)),
            Err(ResourceError::BackendMismatch {
                kind: ObjectKind::RenderPass
            })
        );
    }
}
