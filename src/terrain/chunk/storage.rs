// ============================================
// Terrain Storage - Источник базовых мешей чанков
// ============================================

use ultraviolet::{Vec2, Vec3};

use super::noise::fbm2d;
use crate::terrain::subdivision::{ChunkMesh, Topology};

/// Хранилище terrain, из которого строятся меши чанков.
/// `center` и `size` в ячейках, результат в мировых единицах
pub trait TerrainStorage: Send + Sync {
    /// Размер ячейки в мировых единицах
    fn cell_world_size(&self) -> f32;

    fn build_chunk_mesh(&self, size: f32, center: Vec2, lod: u8) -> ChunkMesh;
}

/// Процедурный heightfield на value noise
#[derive(Clone, Debug)]
pub struct HeightfieldStorage {
    pub seed: u32,
    pub cell_world_size: f32,
    /// Вершин на сторону чанка при lod = 0
    pub vertices_per_side: u32,
    pub height_scale: f32,
    /// Длина волны рельефа в мировых единицах
    pub feature_size: f32,
    pub octaves: u32,
}

impl Default for HeightfieldStorage {
    fn default() -> Self {
        Self {
            seed: 12345,
            cell_world_size: 8192.0,
            vertices_per_side: 17,
            height_scale: 1500.0,
            feature_size: 6000.0,
            octaves: 4,
        }
    }
}

impl HeightfieldStorage {
    pub fn new(seed: u32, cell_world_size: f32) -> Self {
        Self { seed, cell_world_size, ..Default::default() }
    }

    pub fn with_vertices_per_side(mut self, count: u32) -> Self {
        self.vertices_per_side = count.max(2);
        self
    }

    /// Высота в мировой точке
    pub fn height(&self, x: f32, y: f32) -> f32 {
        let inv = 1.0 / self.feature_size.max(1e-3);
        fbm2d(self.seed, x * inv, y * inv, self.octaves) * self.height_scale
    }

    /// Нормаль по центральным разностям
    fn normal(&self, x: f32, y: f32, step: f32) -> Vec3 {
        let dx = self.height(x + step, y) - self.height(x - step, y);
        let dy = self.height(x, y + step) - self.height(x, y - step);
        Vec3::new(-dx, -dy, 2.0 * step).normalized()
    }

    fn color(&self, height: f32) -> [u8; 4] {
        // Низины темнее, вершины белые
        let t = (height / self.height_scale.max(1e-3)).clamp(0.0, 1.0);
        let v = (150.0 + t * 105.0) as u8;
        [v, v, v.saturating_add(8), 255]
    }
}

impl TerrainStorage for HeightfieldStorage {
    fn cell_world_size(&self) -> f32 {
        self.cell_world_size
    }

    fn build_chunk_mesh(&self, size: f32, center: Vec2, lod: u8) -> ChunkMesh {
        let quads = ((self.vertices_per_side.max(2) - 1) >> lod.min(31)).max(1);
        let side = quads + 1;
        let extent = size * self.cell_world_size;
        let origin = center * self.cell_world_size - Vec2::broadcast(extent * 0.5);
        let step = extent / quads as f32;

        let count = (side * side) as usize;
        let mut positions = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for j in 0..side {
            for i in 0..side {
                let x = origin.x + i as f32 * step;
                let y = origin.y + j as f32 * step;
                let h = self.height(x, y);

                positions.push([x, y, h]);
                normals.push(self.normal(x, y, step * 0.5).into());
                uvs.push([i as f32 / quads as f32, j as f32 / quads as f32]);
                colors.push(self.color(h));
            }
        }

        let mut indices = Vec::with_capacity((quads * quads * 6) as usize);
        for j in 0..quads {
            for i in 0..quads {
                let a = j * side + i;
                let b = a + 1;
                let c = a + side;
                let d = c + 1;
                indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }

        ChunkMesh {
            positions,
            normals,
            uvs,
            colors: Some(colors),
            topology: Topology::IndexedTriangles(indices),
        }
    }
}
