// ============================================
// Deformation Uniforms - Данные для шейдера terrain
// ============================================

use bytemuck::{Pod, Zeroable};

use super::grid::{AccumulationGrid, Cell};

/// Формат текстуры деформации: R = depth, G = age
pub const DEFORMATION_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;

/// Uniform-блок для выборки деформации в вершинном шейдере
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DeformationUniforms {
    pub center: [f32; 2],
    pub half_extent: f32,
    /// 0 = деформации нет, шейдер не смещает вершины
    pub enabled: u32,
}

impl DeformationUniforms {
    pub fn disabled() -> Self {
        Self::zeroed()
    }

    pub fn from_grid(grid: &AccumulationGrid) -> Self {
        let center = grid.center();
        Self {
            center: [center.x, center.y],
            half_extent: grid.half_extent(),
            enabled: 1,
        }
    }
}

/// Описание текстуры под сетку заданного размера
pub fn texture_descriptor(resolution: u32) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some("Deformation Grid"),
        size: wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEFORMATION_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

/// Байт на строку при загрузке сетки в текстуру
#[inline]
pub fn bytes_per_row(resolution: u32) -> u32 {
    resolution * std::mem::size_of::<Cell>() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultraviolet::Vec2;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<DeformationUniforms>(), 16);
        assert_eq!(DeformationUniforms::disabled().enabled, 0);

        let grid = AccumulationGrid::new(8, Vec2::new(3.0, 4.0), 300.0);
        let u = DeformationUniforms::from_grid(&grid);
        assert_eq!(u.center, [3.0, 4.0]);
        assert_eq!(u.half_extent, 300.0);
        assert_eq!(u.enabled, 1);
    }

    #[test]
    fn test_texture_matches_texels() {
        let grid = AccumulationGrid::new(64, Vec2::zero(), 10.0);
        let desc = texture_descriptor(grid.resolution());
        assert_eq!(desc.size.width, 64);
        assert_eq!(desc.format, DEFORMATION_TEXTURE_FORMAT);
        assert_eq!(bytes_per_row(64) as usize * 64, grid.as_texels().len());
    }
}
