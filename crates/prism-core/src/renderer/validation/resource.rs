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

//! Creation-time checks of buffer, texture and sampler descriptors.
//!
//! Every backend runs these before allocating anything, so descriptor errors
//! surface identically regardless of the native API.

use crate::renderer::api::core::{
    BackendOwned, ObjectKind, RenderingCapabilities, RenderingFeatures, SystemId,
};
use crate::renderer::api::resource::{
    full_mip_count, BindFlags, BufferDescriptor, MiscFlags, SamplerDescriptor, Texture,
    TextureDescriptor, TextureRegion, TextureType,
};
use crate::renderer::error::ResourceError;

/// Fails with `BackendMismatch` unless `object` was created by `system`.
pub fn ensure_owned(object: &dyn BackendOwned, system: SystemId) -> Result<(), ResourceError> {
    if object.system_id() == system {
        Ok(())
    } else {
        Err(ResourceError::BackendMismatch {
            kind: object.object_kind(),
        })
    }
}

fn unsupported(kind: ObjectKind, reason: impl Into<String>) -> ResourceError {
    ResourceError::ResourceCreation {
        kind,
        reason: reason.into(),
    }
}

/// Checks a buffer descriptor and its optional initial data.
pub fn validate_buffer(
    desc: &BufferDescriptor,
    caps: &RenderingCapabilities,
    initial_data: Option<&[u8]>,
) -> Result<(), ResourceError> {
    const KIND: ObjectKind = ObjectKind::Buffer;
    if desc.size == 0 {
        return Err(ResourceError::Argument("buffer size must be non-zero".into()));
    }
    if desc.size > caps.limits.max_buffer_size {
        return Err(unsupported(
            KIND,
            format!(
                "{} bytes exceed the maximum buffer size of {}",
                desc.size, caps.limits.max_buffer_size
            ),
        ));
    }
    let flags = desc.bind_flags;
    if flags.contains(BindFlags::STORAGE) && !caps.supports(RenderingFeatures::STORAGE_RESOURCES) {
        return Err(unsupported(KIND, "storage buffers are not supported"));
    }
    if flags.contains(BindFlags::STREAM_OUTPUT_BUFFER)
        && !caps.supports(RenderingFeatures::STREAM_OUTPUTS)
    {
        return Err(unsupported(KIND, "stream-output buffers are not supported"));
    }
    if flags.contains(BindFlags::INDIRECT_BUFFER) && !caps.supports(RenderingFeatures::INDIRECT_DRAW)
    {
        return Err(unsupported(KIND, "indirect argument buffers are not supported"));
    }
    if flags.contains(BindFlags::CONSTANT_BUFFER)
        && desc.size > caps.limits.max_constant_buffer_size
    {
        return Err(unsupported(
            KIND,
            format!(
                "constant buffer of {} bytes exceeds the limit of {}",
                desc.size, caps.limits.max_constant_buffer_size
            ),
        ));
    }
    if flags.intersects(BindFlags::COLOR_ATTACHMENT | BindFlags::DEPTH_STENCIL_ATTACHMENT) {
        return Err(ResourceError::Argument(
            "buffers cannot be render target attachments".into(),
        ));
    }
    if flags.contains(BindFlags::SAMPLED) && desc.format.is_none() && desc.stride == 0 {
        return Err(ResourceError::Argument(
            "sampled buffers need a texel format or a structure stride".into(),
        ));
    }
    if desc.misc_flags.intersects(MiscFlags::APPEND | MiscFlags::COUNTER)
        && !flags.contains(BindFlags::STORAGE)
    {
        return Err(ResourceError::Argument(
            "append and counter buffers must be storage buffers".into(),
        ));
    }
    if desc.stride > 0 {
        if desc.size % u64::from(desc.stride) != 0 {
            return Err(ResourceError::Argument(format!(
                "buffer size {} is not a multiple of the stride {}",
                desc.size, desc.stride
            )));
        }
        if let Some(attr) = desc
            .vertex_attributes
            .iter()
            .find(|a| a.offset + a.format.size() > desc.stride)
        {
            return Err(ResourceError::Argument(format!(
                "vertex attribute '{}' ends past the stride of {} bytes",
                attr.name, desc.stride
            )));
        }
    }
    if let Some(data) = initial_data {
        if data.len() as u64 != desc.size {
            return Err(ResourceError::Argument(format!(
                "{} bytes of initial data for a buffer of {} bytes",
                data.len(),
                desc.size
            )));
        }
    }
    Ok(())
}

/// Checks a texture descriptor and its optional initial data.
pub fn validate_texture(
    desc: &TextureDescriptor,
    caps: &RenderingCapabilities,
    initial_data: Option<&[u8]>,
) -> Result<(), ResourceError> {
    const KIND: ObjectKind = ObjectKind::Texture;
    let extent = desc.extent;
    let limits = &caps.limits;
    if extent.is_empty() || desc.array_layers == 0 {
        return Err(ResourceError::Argument(format!(
            "texture extent {}x{}x{} with {} layers is empty",
            extent.width, extent.height, extent.depth, desc.array_layers
        )));
    }
    if !caps.supports_format(desc.format) {
        return Err(unsupported(
            KIND,
            format!("format {:?} is not supported", desc.format),
        ));
    }

    let require = |feature: RenderingFeatures, what: &str| {
        if caps.supports(feature) {
            Ok(())
        } else {
            Err(unsupported(KIND, format!("{what} are not supported")))
        }
    };
    let within = |size: u32, max: u32| {
        if size > max {
            Err(unsupported(
                KIND,
                format!("{size} texels exceed the {:?} size limit of {max}", desc.ty),
            ))
        } else {
            Ok(())
        }
    };

    match desc.ty {
        TextureType::Texture1D | TextureType::Texture1DArray => {
            if extent.height != 1 || extent.depth != 1 {
                return Err(ResourceError::Argument(
                    "1D textures must have a height and depth of 1".into(),
                ));
            }
            within(extent.width, limits.max_1d_texture_size)?;
        }
        TextureType::Texture2D
        | TextureType::Texture2DArray
        | TextureType::Texture2DMS
        | TextureType::Texture2DMSArray => {
            if extent.depth != 1 {
                return Err(ResourceError::Argument(
                    "2D textures must have a depth of 1".into(),
                ));
            }
            within(extent.width.max(extent.height), limits.max_2d_texture_size)?;
        }
        TextureType::Texture3D => {
            require(RenderingFeatures::TEXTURE_3D, "3D textures")?;
            within(extent.max_dimension(), limits.max_3d_texture_size)?;
        }
        TextureType::TextureCube | TextureType::TextureCubeArray => {
            require(RenderingFeatures::TEXTURE_CUBE, "cube textures")?;
            if extent.width != extent.height || extent.depth != 1 {
                return Err(ResourceError::Argument(
                    "cube textures must have square faces and a depth of 1".into(),
                ));
            }
            if desc.array_layers % 6 != 0 {
                return Err(ResourceError::Argument(format!(
                    "cube textures need a multiple of 6 layers, got {}",
                    desc.array_layers
                )));
            }
            within(extent.width, limits.max_cube_texture_size)?;
        }
    }

    if desc.ty == TextureType::TextureCubeArray {
        require(RenderingFeatures::TEXTURE_CUBE_ARRAY, "cube texture arrays")?;
    } else if desc.ty.is_array() && !desc.ty.is_cube() {
        require(RenderingFeatures::TEXTURE_ARRAY, "texture arrays")?;
    }
    if desc.ty.is_array() {
        if desc.array_layers > limits.max_texture_array_layers {
            return Err(unsupported(
                KIND,
                format!(
                    "{} array layers exceed the limit of {}",
                    desc.array_layers, limits.max_texture_array_layers
                ),
            ));
        }
    } else if desc.array_layers != 1 {
        return Err(ResourceError::Argument(format!(
            "{:?} textures have exactly one array layer",
            desc.ty
        )));
    }

    if desc.ty.is_multisample() {
        require(RenderingFeatures::MULTISAMPLE_TEXTURES, "multisample textures")?;
        if desc.samples < 2 || !desc.samples.is_power_of_two() {
            return Err(ResourceError::Argument(format!(
                "multisample textures need a power-of-two sample count above 1, got {}",
                desc.samples
            )));
        }
    } else if desc.samples != 1 {
        return Err(ResourceError::Argument(format!(
            "{:?} textures have a single sample",
            desc.ty
        )));
    }

    if desc.mip_levels > full_mip_count(extent) {
        return Err(ResourceError::Argument(format!(
            "{} mip levels requested, at most {} possible",
            desc.mip_levels,
            full_mip_count(extent)
        )));
    }
    if desc.bind_flags.contains(BindFlags::COLOR_ATTACHMENT) && !desc.format.is_color() {
        return Err(ResourceError::Argument(format!(
            "{:?} cannot be a color attachment",
            desc.format
        )));
    }
    if desc.bind_flags.contains(BindFlags::DEPTH_STENCIL_ATTACHMENT) && desc.format.is_color() {
        return Err(ResourceError::Argument(format!(
            "{:?} cannot be a depth/stencil attachment",
            desc.format
        )));
    }
    if desc.bind_flags.contains(BindFlags::STORAGE) {
        require(RenderingFeatures::STORAGE_RESOURCES, "storage textures")?;
    }
    if let Some(data) = initial_data {
        let expected = desc.initial_data_size();
        if data.len() as u64 != expected {
            return Err(ResourceError::Argument(format!(
                "{} bytes of initial data, mip level 0 needs {expected}",
                data.len()
            )));
        }
    }
    Ok(())
}

/// Checks a sampler descriptor.
pub fn validate_sampler(
    desc: &SamplerDescriptor,
    caps: &RenderingCapabilities,
) -> Result<(), ResourceError> {
    if desc.anisotropy_clamp == 0 {
        return Err(ResourceError::Argument(
            "anisotropy clamp must be at least 1".into(),
        ));
    }
    if desc.anisotropy_clamp > 1 {
        if !caps.supports(RenderingFeatures::SAMPLER_ANISOTROPY) {
            return Err(unsupported(
                ObjectKind::Sampler,
                "anisotropic filtering is not supported",
            ));
        }
        if u32::from(desc.anisotropy_clamp) > caps.limits.max_anisotropy {
            return Err(unsupported(
                ObjectKind::Sampler,
                format!(
                    "anisotropy {} exceeds the limit of {}",
                    desc.anisotropy_clamp, caps.limits.max_anisotropy
                ),
            ));
        }
    }
    if desc.lod_min_clamp > desc.lod_max_clamp {
        return Err(ResourceError::Argument(format!(
            "LOD range {}..{} is inverted",
            desc.lod_min_clamp, desc.lod_max_clamp
        )));
    }
    Ok(())
}

/// Checks a region access of `texture` against `data_len` bytes of texel data.
pub fn validate_texture_region(
    texture: &Texture,
    region: &TextureRegion,
    data_len: usize,
) -> Result<(), ResourceError> {
    if !region.fits(texture.descriptor()) {
        return Err(ResourceError::Argument(format!(
            "region {region:?} is outside of the texture"
        )));
    }
    let expected = region.byte_size(texture.format());
    if data_len as u64 != expected {
        return Err(ResourceError::Argument(format!(
            "{data_len} bytes given, the region holds {expected}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Extent3D;
    use crate::renderer::api::core::BackendBinding;
    use crate::renderer::api::resource::Buffer;
    use crate::renderer::api::util::TextureFormat;

    fn caps() -> RenderingCapabilities {
        RenderingCapabilities {
            texture_formats: TextureFormat::ALL.to_vec(),
            features: RenderingFeatures::TEXTURE_ARRAY | RenderingFeatures::TEXTURE_CUBE,
            ..Default::default()
        }
    }

    #[test]
    fn test_buffer_checks() {
        let caps = caps();
        let mut desc = BufferDescriptor {
            size: 36,
            stride: 12,
            bind_flags: BindFlags::VERTEX_BUFFER,
            ..Default::default()
        };
        assert!(validate_buffer(&desc, &caps, Some(&[0; 36])).is_ok());
        assert!(matches!(
            validate_buffer(&desc, &caps, Some(&[0; 40])),
            Err(ResourceError::Argument(_))
        ));
        assert!(matches!(
            validate_buffer(&desc, &caps, Some(&[0; 12])),
            Err(ResourceError::Argument(_))
        ));
        desc.bind_flags |= BindFlags::STORAGE;
        assert!(matches!(
            validate_buffer(&desc, &caps, None),
            Err(ResourceError::ResourceCreation {
                kind: ObjectKind::Buffer,
                ..
            })
        ));
        desc.bind_flags = BindFlags::VERTEX_BUFFER;
        desc.size = 40;
        assert!(validate_buffer(&desc, &caps, None).is_err());
    }

    #[test]
    fn test_texture_checks() {
        let caps = caps();
        let mut desc = TextureDescriptor {
            extent: Extent3D::new(64, 64, 1),
            ..Default::default()
        };
        assert!(validate_texture(&desc, &caps, None).is_ok());

        desc.ty = TextureType::Texture3D;
        desc.extent.depth = 4;
        assert!(matches!(
            validate_texture(&desc, &caps, None),
            Err(ResourceError::ResourceCreation { .. })
        ));

        desc.ty = TextureType::TextureCube;
        desc.extent.depth = 1;
        assert!(validate_texture(&desc, &caps, None).is_err());
        desc.array_layers = 6;
        assert!(validate_texture(&desc, &caps, None).is_ok());

        desc.ty = TextureType::Texture2D;
        desc.array_layers = 1;
        desc.format = TextureFormat::Depth32Float;
        assert!(matches!(
            validate_texture(&desc, &caps, None),
            Err(ResourceError::Argument(_))
        ));
    }

    #[test]
    fn test_initial_texture_data_must_match_level_zero() {
        let desc = TextureDescriptor {
            extent: Extent3D::new(2, 2, 1),
            ..Default::default()
        };
        assert!(validate_texture(&desc, &caps(), Some(&[0; 16])).is_ok());
        assert!(validate_texture(&desc, &caps(), Some(&[0; 12])).is_err());
    }

    #[test]
    fn test_sampler_anisotropy_needs_feature() {
        let desc = SamplerDescriptor {
            anisotropy_clamp: 8,
            ..Default::default()
        };
        assert!(validate_sampler(&desc, &caps()).is_err());
        assert!(validate_sampler(&SamplerDescriptor::default(), &caps()).is_ok());
    }

    #[test]
    fn test_ownership() {
        let buffer = Buffer::new(
            BackendBinding::detached(ObjectKind::Buffer, 1, SystemId(5)),
            BufferDescriptor::default(),
        );
        assert!(ensure_owned(&buffer, SystemId(5)).is_ok());
        assert_eq!(
            ensure_owned(&buffer, SystemId(6)),
            Err(ResourceError::BackendMismatch {
                kind: ObjectKind::Buffer
            })
        );
    }
}
