// ============================================
// Chunk Mesh - Геометрия чанка terrain
// ============================================
// Атрибуты хранятся раздельно (SoA), перед загрузкой на GPU
// собираются в интерливинг ChunkVertex.

/// Топология примитивов
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Плоский список: каждые 3 вершины = треугольник
    Triangles,
    /// Индексированный список треугольников
    IndexedTriangles(Vec<u32>),
    TriangleStrip,
    Lines,
    Points,
}

impl Topology {
    pub fn name(&self) -> &'static str {
        match self {
            Topology::Triangles => "triangles",
            Topology::IndexedTriangles(_) => "indexed triangles",
            Topology::TriangleStrip => "triangle strip",
            Topology::Lines => "lines",
            Topology::Points => "points",
        }
    }
}

/// Меш чанка
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Цвет вершин (необязателен)
    pub colors: Option<Vec<[u8; 4]>>,
    pub topology: Topology,
}

impl ChunkMesh {
    /// Пустой плоский список треугольников
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: None,
            topology: Topology::Triangles,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Число треугольников (0 для нетреугольных топологий)
    pub fn triangle_count(&self) -> usize {
        match &self.topology {
            Topology::Triangles => self.positions.len() / 3,
            Topology::IndexedTriangles(indices) => indices.len() / 3,
            _ => 0,
        }
    }

    /// Индексы вершин треугольника
    pub fn triangle(&self, i: usize) -> Option<[usize; 3]> {
        match &self.topology {
            Topology::Triangles => {
                let b = i * 3;
                (b + 2 < self.positions.len()).then(|| [b, b + 1, b + 2])
            }
            Topology::IndexedTriangles(indices) => {
                let t = indices.get(i * 3..i * 3 + 3)?;
                Some([t[0] as usize, t[1] as usize, t[2] as usize])
            }
            _ => None,
        }
    }

    /// Интерливинг для вершинного буфера. Без цвета вершины белые
    pub fn to_vertices(&self) -> Vec<ChunkVertex> {
        (0..self.positions.len())
            .map(|i| ChunkVertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
                uv: self.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                color: self
                    .colors
                    .as_ref()
                    .and_then(|c| c.get(i).copied())
                    .unwrap_or([255; 4]),
            })
            .collect()
    }

    /// Индексы для draw_indexed (плоский список -> 0..n)
    pub fn indices(&self) -> Vec<u32> {
        match &self.topology {
            Topology::IndexedTriangles(indices) => indices.clone(),
            _ => (0..self.positions.len() as u32).collect(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct ChunkVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

impl ChunkVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ChunkVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> ChunkMesh {
        ChunkMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            colors: None,
            topology: Topology::IndexedTriangles(vec![0, 1, 2, 0, 2, 3]),
        }
    }

    #[test]
    fn test_triangle_access() {
        let mesh = quad();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangle(1), Some([0, 2, 3]));
        assert_eq!(mesh.triangle(2), None);
        assert_eq!(ChunkMesh::empty().triangle_count(), 0);
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<ChunkVertex>(), 36);
        let layout = ChunkVertex::desc();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.len(), 4);

        let vertices = quad().to_vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[2].uv, [1.0, 1.0]);
        assert_eq!(vertices[2].color, [255; 4]);
        assert_eq!(quad().indices(), vec![0, 1, 2, 0, 2, 3]);
    }
}
