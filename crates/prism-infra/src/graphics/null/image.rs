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

//! Host-memory texel storage for the Null backend.
//!
//! Each mip level is one tightly packed allocation ordered by array layer,
//! then depth slice, then row, then texel.

use prism_core::math::{Extent2D, Extent3D};
use prism_core::renderer::{TextureDescriptor, TextureFormat, TextureRegion};
use std::ops::Range;

/// The texels of one texture.
#[derive(Debug, Clone)]
pub(crate) struct TextureImage {
    format: TextureFormat,
    extent: Extent3D,
    layers: u32,
    levels: Vec<Vec<u8>>,
}

impl TextureImage {
    /// Allocates zeroed storage for every mip level of `descriptor`.
    pub fn new(descriptor: &TextureDescriptor) -> Self {
        let levels = (0..descriptor.resolved_mip_levels())
            .map(|level| vec![0u8; descriptor.mip_level_size(level) as usize])
            .collect();
        Self {
            format: descriptor.format,
            extent: descriptor.extent,
            layers: descriptor.array_layers.max(1),
            levels,
        }
    }

    /// The total number of bytes held.
    pub fn byte_size(&self) -> u64 {
        self.levels.iter().map(|l| l.len() as u64).sum()
    }

    fn bpp(&self) -> usize {
        self.format.bytes_per_pixel() as usize
    }

    fn texel_offset(&self, level: u32, layer: u32, x: u32, y: u32, z: u32) -> usize {
        let e = self.extent.mip_extent(level);
        let index = ((u64::from(layer) * u64::from(e.depth) + u64::from(z)) * u64::from(e.height)
            + u64::from(y))
            * u64::from(e.width)
            + u64::from(x);
        index as usize * self.bpp()
    }

    /// Visits every row of `region` with the byte range it covers in the level
    /// and in a tightly packed copy of the region.
    fn for_each_row(&self, region: &TextureRegion, mut visit: impl FnMut(Range<usize>, Range<usize>)) {
        let sub = &region.subresource;
        let row_bytes = region.extent.width as usize * self.bpp();
        let mut packed = 0;
        for layer in sub.base_array_layer..sub.base_array_layer + sub.num_array_layers {
            for z in 0..region.extent.depth {
                for y in 0..region.extent.height {
                    let start = self.texel_offset(
                        sub.base_mip_level,
                        layer,
                        region.offset.x as u32,
                        region.offset.y as u32 + y,
                        region.offset.z as u32 + z,
                    );
                    visit(start..start + row_bytes, packed..packed + row_bytes);
                    packed += row_bytes;
                }
            }
        }
    }

    /// Copies `region` out as tightly packed texels. The region must fit.
    pub fn read_region(&self, region: &TextureRegion) -> Vec<u8> {
        let mut out = vec![0u8; region.byte_size(self.format) as usize];
        let level = &self.levels[region.subresource.base_mip_level as usize];
        self.for_each_row(region, |texels, packed| {
            out[packed].copy_from_slice(&level[texels]);
        });
        out
    }

    /// Writes tightly packed texels into `region`. The region must fit and
    /// `data` must hold exactly its bytes.
    pub fn write_region(&mut self, region: &TextureRegion, data: &[u8]) {
        let mut rows = Vec::new();
        self.for_each_row(region, |texels, packed| rows.push((texels, packed)));
        let level = &mut self.levels[region.subresource.base_mip_level as usize];
        for (texels, packed) in rows {
            level[texels].copy_from_slice(&data[packed]);
        }
    }

    /// Writes `texel` over the top-left `area` of one layer of one level.
    ///
    /// Only the bytes in `mask` of each texel are replaced, which lets depth
    /// and stencil aspects of a combined format be cleared independently.
    pub fn fill(&mut self, level: u32, layer: u32, area: Extent2D, texel: &[u8], mask: Range<usize>) {
        let Some(extent) = (level < self.levels.len() as u32).then(|| self.extent.mip_extent(level))
        else {
            return;
        };
        if layer >= self.layers.max(extent.depth) {
            return;
        }
        let width = area.width.min(extent.width);
        let height = area.height.min(extent.height);
        let bpp = self.bpp();
        let mut starts = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                // 3D attachments address a depth slice instead of a layer.
                let (l, z) = if self.layers > 1 { (layer, 0) } else { (0, layer) };
                starts.push(self.texel_offset(level, l, x, y, z));
            }
        }
        let bytes = &mut self.levels[level as usize];
        for start in starts {
            let texel_range = start + mask.start..start + mask.end.min(bpp);
            bytes[texel_range.clone()].copy_from_slice(&texel[mask.start..mask.end.min(bpp)]);
        }
    }

    /// Rebuilds levels `1..` from level 0.
    ///
    /// 8-bit unorm formats are averaged over 2x2 texels; other formats take the
    /// nearest texel.
    pub fn generate_mips(&mut self) {
        let bpp = self.bpp();
        let box_filter = self.format.is_unorm8();
        for level in 1..self.levels.len() as u32 {
            let src_extent = self.extent.mip_extent(level - 1);
            let dst_extent = self.extent.mip_extent(level);
            let mut dst = vec![0u8; self.levels[level as usize].len()];
            for layer in 0..self.layers {
                for z in 0..dst_extent.depth {
                    let sz = (z * 2).min(src_extent.depth - 1);
                    for y in 0..dst_extent.height {
                        for x in 0..dst_extent.width {
                            let out = self.texel_offset(level, layer, x, y, z);
                            let sx = (x * 2).min(src_extent.width - 1);
                            let sy = (y * 2).min(src_extent.height - 1);
                            if box_filter {
                                let taps = [
                                    (sx, sy),
                                    ((sx + 1).min(src_extent.width - 1), sy),
                                    (sx, (sy + 1).min(src_extent.height - 1)),
                                    (
                                        (sx + 1).min(src_extent.width - 1),
                                        (sy + 1).min(src_extent.height - 1),
                                    ),
                                ];
                                for channel in 0..bpp {
                                    let sum: u32 = taps
                                        .iter()
                                        .map(|&(tx, ty)| {
                                            let at = self.texel_offset(level - 1, layer, tx, ty, sz);
                                            u32::from(self.levels[level as usize - 1][at + channel])
                                        })
                                        .sum();
                                    dst[out + channel] = ((sum + 2) / 4) as u8;
                                }
                            } else {
                                let at = self.texel_offset(level - 1, layer, sx, sy, sz);
                                dst[out..out + bpp]
                                    .copy_from_slice(&self.levels[level as usize - 1][at..at + bpp]);
                            }
                        }
                    }
                }
            }
            self.levels[level as usize] = dst;
        }
    }
}

/// The bytes of a depth/stencil texel holding the requested aspects.
pub(crate) fn depth_stencil_mask(format: TextureFormat, depth: bool, stencil: bool) -> Range<usize> {
    let bpp = format.bytes_per_pixel() as usize;
    let stencil_at = match format {
        TextureFormat::Depth24PlusStencil8 => Some(3),
        TextureFormat::Depth32FloatStencil8 => Some(4),
        _ => None,
    };
    match (stencil_at, depth, stencil) {
        (Some(at), true, false) => 0..at,
        (Some(at), false, true) => at..at + 1,
        (None, false, _) => 0..0,
        _ => 0..bpp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::math::Offset3D;
    use prism_core::renderer::{TextureSubresource, TextureType};

    fn descriptor(extent: Extent3D, mip_levels: u32) -> TextureDescriptor {
        TextureDescriptor {
            ty: TextureType::Texture2D,
            extent,
            mip_levels,
            ..Default::default()
        }
    }

    #[test]
    fn test_region_write_then_read() {
        let desc = descriptor(Extent3D::new(4, 4, 1), 1);
        let mut image = TextureImage::new(&desc);
        let region = TextureRegion {
            subresource: TextureSubresource::default(),
            offset: Offset3D::new(1, 2, 0),
            extent: Extent3D::new(2, 1, 1),
        };
        let texels = [1u8, 2, 3, 4, 5, 6, 7, 8];
        image.write_region(&region, &texels);
        assert_eq!(image.read_region(&region), texels);

        let whole = image.read_region(&TextureRegion::whole_level(&desc, 0));
        let row2 = &whole[2 * 16..3 * 16];
        assert_eq!(&row2[4..12], &texels);
        assert!(row2[..4].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_box_filter_mips() {
        let desc = descriptor(Extent3D::new(2, 2, 1), 0);
        let mut image = TextureImage::new(&desc);
        image.write_region(
            &TextureRegion::whole_level(&desc, 0),
            &[0, 0, 0, 255, 100, 0, 0, 255, 200, 0, 0, 255, 100, 0, 0, 255],
        );
        image.generate_mips();
        let top = image.read_region(&TextureRegion::whole_level(&desc, 1));
        assert_eq!(top, vec![100, 0, 0, 255]);
    }

    #[test]
    fn test_depth_only_clear_keeps_stencil() {
        let format = TextureFormat::Depth24PlusStencil8;
        let desc = TextureDescriptor {
            format,
            extent: Extent3D::new(1, 1, 1),
            mip_levels: 1,
            ..Default::default()
        };
        let mut image = TextureImage::new(&desc);
        let all = format.encode_depth_stencil(0.0, 7).unwrap();
        image.fill(0, 0, Extent2D::new(1, 1), &all, 0..4);
        let depth_only = format.encode_depth_stencil(1.0, 0).unwrap();
        image.fill(0, 0, Extent2D::new(1, 1), &depth_only, depth_stencil_mask(format, true, false));
        let texel = image.read_region(&TextureRegion::whole_level(&desc, 0));
        assert_eq!(texel, vec![0xff, 0xff, 0xff, 7]);
    }
}
