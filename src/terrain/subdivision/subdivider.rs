// ============================================
// Mesh Subdivider - Рекурсивное деление треугольников
// ============================================
// Каждый уровень делит треугольник на 4 по серединам рёбер.
// Уровень L даёт 4^L треугольников на исходный.
//
//        a
//       / \
//     ab---ca
//     / \ / \
//    b---bc--c

use std::fmt;

use rayon::prelude::*;
use ultraviolet::{Vec2, Vec3};

use super::mesh::{ChunkMesh, Topology};

/// Максимальный уровень подразбиения
pub const MAX_SUBDIVISION_LEVEL: u32 = 4;

/// Ошибки подразбиения. Вызывающий оставляет исходный меш
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdivideError {
    InvalidLevel(u32),
    UnsupportedTopology(&'static str),
    MissingAttribute(&'static str),
    AttributeLengthMismatch,
    IndexOutOfRange,
}

impl fmt::Display for SubdivideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubdivideError::InvalidLevel(level) => {
                write!(f, "invalid subdivision level {} (must be 0-{})", level, MAX_SUBDIVISION_LEVEL)
            }
            SubdivideError::UnsupportedTopology(name) => {
                write!(f, "unsupported topology '{}' (only triangle lists)", name)
            }
            SubdivideError::MissingAttribute(name) => write!(f, "missing vertex attribute '{}'", name),
            SubdivideError::AttributeLengthMismatch => write!(f, "vertex attribute lengths differ"),
            SubdivideError::IndexOutOfRange => write!(f, "triangle index out of range"),
        }
    }
}

impl std::error::Error for SubdivideError {}

/// Вершина треугольника со всеми атрибутами
#[derive(Clone, Copy, Debug)]
struct Corner {
    position: Vec3,
    normal: Vec3,
    uv: Vec2,
    color: [u8; 4],
}

impl Corner {
    fn midpoint(a: &Corner, b: &Corner) -> Corner {
        let sum = a.normal + b.normal;
        // Противоположные нормали: берём нормаль первой вершины
        let normal = if sum.mag_sq() > 1e-12 { sum.normalized() } else { a.normal };

        Corner {
            position: (a.position + b.position) * 0.5,
            normal,
            uv: (a.uv + b.uv) * 0.5,
            color: [
                average(a.color[0], b.color[0]),
                average(a.color[1], b.color[1]),
                average(a.color[2], b.color[2]),
                average(a.color[3], b.color[3]),
            ],
        }
    }
}

#[inline]
fn average(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16) / 2) as u8
}

#[inline]
fn unit_normal(n: [f32; 3]) -> Vec3 {
    let n = Vec3::from(n);
    if n.mag_sq() > 1e-12 {
        n.normalized()
    } else {
        Vec3::unit_z()
    }
}

/// Рекурсивное деление одного треугольника
fn split(tri: [Corner; 3], level: u32, out: &mut Vec<[Corner; 3]>) {
    if level == 0 {
        out.push(tri);
        return;
    }

    let [a, b, c] = tri;
    let ab = Corner::midpoint(&a, &b);
    let bc = Corner::midpoint(&b, &c);
    let ca = Corner::midpoint(&c, &a);

    split([a, ab, ca], level - 1, out);
    split([ab, b, bc], level - 1, out);
    split([ca, bc, c], level - 1, out);
    split([ab, bc, ca], level - 1, out);
}

/// Проверка меша перед делением
fn validate(mesh: &ChunkMesh) -> Result<(), SubdivideError> {
    match &mesh.topology {
        Topology::Triangles => {}
        Topology::IndexedTriangles(indices) => {
            let count = mesh.positions.len();
            if indices.iter().any(|&i| i as usize >= count) {
                return Err(SubdivideError::IndexOutOfRange);
            }
        }
        other => return Err(SubdivideError::UnsupportedTopology(other.name())),
    }

    let count = mesh.positions.len();
    if count > 0 {
        if mesh.normals.is_empty() {
            return Err(SubdivideError::MissingAttribute("normals"));
        }
        if mesh.uvs.is_empty() {
            return Err(SubdivideError::MissingAttribute("uvs"));
        }
    }
    if mesh.normals.len() != count || mesh.uvs.len() != count {
        return Err(SubdivideError::AttributeLengthMismatch);
    }
    if mesh.colors.as_ref().is_some_and(|c| c.len() != count) {
        return Err(SubdivideError::AttributeLengthMismatch);
    }
    Ok(())
}

/// Подразбить меш до `level`. Результат всегда плоский список треугольников.
/// Уровень 0 возвращает копию без изменений
pub fn subdivide(mesh: &ChunkMesh, level: u32) -> Result<ChunkMesh, SubdivideError> {
    if level > MAX_SUBDIVISION_LEVEL {
        return Err(SubdivideError::InvalidLevel(level));
    }
    if level == 0 {
        return Ok(mesh.clone());
    }
    validate(mesh)?;

    let corner = |i: usize| Corner {
        position: Vec3::from(mesh.positions[i]),
        normal: unit_normal(mesh.normals[i]),
        uv: Vec2::from(mesh.uvs[i]),
        color: mesh.colors.as_ref().map_or([255; 4], |c| c[i]),
    };

    let per_triangle = 4usize.pow(level);
    let triangles: Vec<Vec<[Corner; 3]>> = (0..mesh.triangle_count())
        .into_par_iter()
        .map(|t| {
            let mut out = Vec::with_capacity(per_triangle);
            if let Some([i0, i1, i2]) = mesh.triangle(t) {
                split([corner(i0), corner(i1), corner(i2)], level, &mut out);
            }
            out
        })
        .collect();

    let vertex_count = mesh.triangle_count() * per_triangle * 3;
    let mut result = ChunkMesh {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        colors: mesh.colors.as_ref().map(|_| Vec::with_capacity(vertex_count)),
        topology: Topology::Triangles,
    };

    for corner in triangles.iter().flatten().flatten() {
        result.positions.push(corner.position.into());
        result.normals.push(corner.normal.into());
        result.uvs.push(corner.uv.into());
        if let Some(colors) = result.colors.as_mut() {
            colors.push(corner.color);
        }
    }

    log::debug!(
        "Subdivided {} verts to {} verts (level {})",
        mesh.vertex_count(),
        result.vertex_count(),
        level
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(colors: bool) -> ChunkMesh {
        ChunkMesh {
            positions: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 1.0], [0.0, 2.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0], [0.0, 0.6, 0.8], [0.6, 0.0, 0.8], [0.0, 0.0, 2.0]],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            colors: colors.then(|| vec![[0, 0, 0, 255], [200, 100, 50, 255], [255; 4], [10, 20, 30, 40]]),
            topology: Topology::IndexedTriangles(vec![0, 1, 2, 0, 2, 3]),
        }
    }

    #[test]
    fn test_triangle_count_law() {
        let mesh = quad(true);
        for level in 0..=MAX_SUBDIVISION_LEVEL {
            let out = subdivide(&mesh, level).unwrap();
            assert_eq!(out.triangle_count(), 4usize.pow(level) * mesh.triangle_count());
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let out = subdivide(&quad(false), 3).unwrap();
        assert_eq!(out.topology, Topology::Triangles);
        assert!(out.colors.is_none());
        for n in &out.normals {
            let len = Vec3::from(*n).mag();
            assert!((len - 1.0).abs() < 1e-5, "normal length {}", len);
        }
    }

    #[test]
    fn test_level_one_midpoints() {
        let mesh = ChunkMesh {
            positions: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            colors: Some(vec![[0, 0, 0, 0], [255, 255, 255, 255], [100, 100, 100, 100]]),
            topology: Topology::Triangles,
        };
        let out = subdivide(&mesh, 1).unwrap();
        assert_eq!(out.vertex_count(), 12);

        // Первый подтреугольник: a, ab, ca
        assert_eq!(out.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(out.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(out.positions[2], [0.0, 1.0, 0.0]);
        assert_eq!(out.uvs[1], [0.5, 0.0]);
        let colors = out.colors.unwrap();
        assert_eq!(colors[1], [127, 127, 127, 127]);
        assert_eq!(colors[2], [50, 50, 50, 50]);
    }

    #[test]
    fn test_level_zero_is_exact_copy() {
        let mesh = quad(true);
        assert_eq!(subdivide(&mesh, 0).unwrap(), mesh);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert_eq!(subdivide(&quad(false), 5), Err(SubdivideError::InvalidLevel(5)));

        let mut strip = quad(false);
        strip.topology = Topology::TriangleStrip;
        assert!(matches!(subdivide(&strip, 1), Err(SubdivideError::UnsupportedTopology(_))));

        let mut no_normals = quad(false);
        no_normals.normals.clear();
        assert_eq!(subdivide(&no_normals, 1), Err(SubdivideError::MissingAttribute("normals")));

        let mut no_uvs = quad(false);
        no_uvs.uvs.clear();
        assert_eq!(subdivide(&no_uvs, 2), Err(SubdivideError::MissingAttribute("uvs")));

        let mut bad_index = quad(false);
        bad_index.topology = Topology::IndexedTriangles(vec![0, 1, 9]);
        assert_eq!(subdivide(&bad_index, 1), Err(SubdivideError::IndexOutOfRange));

        let mut short_colors = quad(true);
        if let Some(c) = short_colors.colors.as_mut() {
            c.pop();
        }
        assert_eq!(subdivide(&short_colors, 1), Err(SubdivideError::AttributeLengthMismatch));
    }

    #[test]
    fn test_opposite_normals_do_not_produce_nan() {
        let mesh = ChunkMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0], [0.0, 0.0, -1.0], [0.0, 0.0, 1.0]],
            uvs: vec![[0.0, 0.0]; 3],
            colors: None,
            topology: Topology::Triangles,
        };
        let out = subdivide(&mesh, 2).unwrap();
        assert!(out.normals.iter().all(|n| n.iter().all(|c| c.is_finite())));
    }
}
