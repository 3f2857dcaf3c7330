// ============================================
// Accumulation Grid - Двойной буфер деформации
// ============================================
//
// Квадратное окно мира R x R ячеек вокруг центра.
// Ячейка = (depth, age). Индексация: index = y * R + x.
//
// Буферов всегда два: current (читается снаружи) и standby
// (цель записи следующего оператора). После каждого оператора
// роли меняются местами. Запись в current невозможна.

use bytemuck::{Pod, Zeroable};
use ndshape::{RuntimeShape, Shape};
use ultraviolet::Vec2;

/// Ячейка буфера деформации
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Cell {
    /// Глубина продавливания
    pub depth: f32,
    /// Время, когда depth последний раз подняли штампом
    pub age: f32,
}

impl Cell {
    /// Пустая ячейка. age у пустой ячейки не имеет смысла
    pub const EMPTY: Cell = Cell { depth: 0.0, age: 0.0 };
}

/// Сетка глубин над квадратным окном мира
#[derive(Clone, Debug)]
pub struct AccumulationGrid {
    cells: Vec<Cell>,
    resolution: u32,
    center: Vec2,
    half_extent: f32,
}

/// Предел стороны сетки: индекс ячейки должен влезать в u32
pub const MAX_GRID_RESOLUTION: u32 = 16384;

/// Сторона сетки в допустимых пределах 1..=MAX_GRID_RESOLUTION
pub fn grid_resolution(requested: u32) -> u32 {
    if requested > MAX_GRID_RESOLUTION {
        log::warn!(
            "Grid resolution {} too large, clamped to {}",
            requested, MAX_GRID_RESOLUTION
        );
    }
    requested.clamp(1, MAX_GRID_RESOLUTION)
}

#[inline]
fn cell_count(resolution: u32) -> usize {
    resolution as usize * resolution as usize
}

impl AccumulationGrid {
    pub fn new(resolution: u32, center: Vec2, half_extent: f32) -> Self {
        let resolution = grid_resolution(resolution);
        Self {
            cells: vec![Cell::EMPTY; cell_count(resolution)],
            resolution,
            center,
            half_extent,
        }
    }

    #[inline]
    fn shape(&self) -> RuntimeShape<u32, 2> {
        RuntimeShape::<u32, 2>::new([self.resolution, self.resolution])
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        2.0 * self.half_extent / self.resolution as f32
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        self.shape().linearize([x, y]) as usize
    }

    /// Координаты ячейки по плоскому индексу
    #[inline]
    pub fn coords(&self, index: usize) -> (u32, u32) {
        let [x, y] = self.shape().delinearize(index as u32);
        (x, y)
    }

    #[inline]
    pub fn cell(&self, x: u32, y: u32) -> Cell {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Мировая позиция центра ячейки
    #[inline]
    pub fn cell_world_position(&self, x: u32, y: u32) -> Vec2 {
        let cs = self.cell_size();
        Vec2::new(
            self.center.x - self.half_extent + (x as f32 + 0.5) * cs,
            self.center.y - self.half_extent + (y as f32 + 0.5) * cs,
        )
    }

    /// Мировая позиция -> UV окна (0..1 внутри окна)
    #[inline]
    pub fn world_to_uv(&self, world: Vec2) -> Vec2 {
        let inv = 0.5 / self.half_extent;
        Vec2::new(
            (world.x - self.center.x) * inv + 0.5,
            (world.y - self.center.y) * inv + 0.5,
        )
    }

    /// Лежит ли точка внутри окна (границы включительно)
    #[inline]
    pub fn contains(&self, world: Vec2) -> bool {
        let uv = self.world_to_uv(world);
        (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)
    }

    /// Ячейка, содержащая UV (clamp к краю)
    #[inline]
    pub fn nearest(&self, uv: Vec2) -> Cell {
        let max = self.resolution - 1;
        let x = ((uv.x * self.resolution as f32).floor().max(0.0) as u32).min(max);
        let y = ((uv.y * self.resolution as f32).floor().max(0.0) as u32).min(max);
        self.cell(x, y)
    }

    /// Билинейная выборка по UV. depth интерполируется, age берётся у ближайшей
    pub fn bilinear(&self, uv: Vec2) -> Cell {
        let max = (self.resolution - 1) as i64;
        let tx = uv.x * self.resolution as f32 - 0.5;
        let ty = uv.y * self.resolution as f32 - 0.5;
        let x0 = tx.floor();
        let y0 = ty.floor();
        let fx = tx - x0;
        let fy = ty - y0;

        let clamp = |v: i64| v.clamp(0, max) as u32;
        let (xa, xb) = (clamp(x0 as i64), clamp(x0 as i64 + 1));
        let (ya, yb) = (clamp(y0 as i64), clamp(y0 as i64 + 1));

        let d00 = self.cell(xa, ya).depth;
        let d10 = self.cell(xb, ya).depth;
        let d01 = self.cell(xa, yb).depth;
        let d11 = self.cell(xb, yb).depth;

        let dx0 = d00 + fx * (d10 - d00);
        let dx1 = d01 + fx * (d11 - d01);

        Cell {
            depth: dx0 + fy * (dx1 - dx0),
            age: self.nearest(uv).age,
        }
    }

    /// Глубина в мировой точке (как её читает рендер). Вне окна = 0
    pub fn sample_depth(&self, world: Vec2) -> f32 {
        if !self.contains(world) {
            return 0.0;
        }
        self.bilinear(self.world_to_uv(world)).depth
    }

    /// Максимальная глубина в сетке
    pub fn max_depth(&self) -> f32 {
        self.cells.iter().fold(0.0f32, |acc, c| acc.max(c.depth))
    }

    /// Сырые байты для загрузки в текстуру Rg32Float
    #[inline]
    pub fn as_texels(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Подогнать окно и размер под другую сетку (перед записью в standby)
    pub(crate) fn match_window(&mut self, other: &AccumulationGrid) {
        if self.resolution != other.resolution {
            self.resolution = other.resolution;
            self.cells = vec![Cell::EMPTY; other.cells.len()];
        }
        self.center = other.center;
        self.half_extent = other.half_extent;
    }

    #[inline]
    pub(crate) fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }
}

// ============================================
// Ping-pong buffers
// ============================================

/// Пара сеток current/standby
pub struct DeformationBuffers {
    grids: [AccumulationGrid; 2],
    current: usize,
    generation: u64,
}

impl DeformationBuffers {
    pub fn new(resolution: u32, center: Vec2, half_extent: f32) -> Self {
        let grid = AccumulationGrid::new(resolution, center, half_extent);
        Self {
            grids: [grid.clone(), grid],
            current: 0,
            generation: 0,
        }
    }

    /// Последняя записанная сетка
    #[inline]
    pub fn current(&self) -> &AccumulationGrid {
        &self.grids[self.current]
    }

    /// Сколько раз роли менялись
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Применить оператор: читаем current, пишем standby, затем меняем роли
    pub fn apply<F>(&mut self, op: F)
    where
        F: FnOnce(&AccumulationGrid, &mut AccumulationGrid),
    {
        let (first, second) = self.grids.split_at_mut(1);
        let (src, dst) = if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };
        op(src, dst);
        self.current = 1 - self.current;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_world_position_and_uv() {
        let grid = AccumulationGrid::new(4, Vec2::new(100.0, 50.0), 2.0);
        assert_eq!(grid.cell_size(), 1.0);
        assert_eq!(grid.cell_world_position(0, 0), Vec2::new(98.5, 48.5));
        assert_eq!(grid.cell_world_position(3, 3), Vec2::new(101.5, 51.5));

        let uv = grid.world_to_uv(Vec2::new(100.0, 50.0));
        assert_eq!(uv, Vec2::new(0.5, 0.5));
        assert!(grid.contains(Vec2::new(98.0, 52.0)));
        assert!(!grid.contains(Vec2::new(97.9, 50.0)));
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = AccumulationGrid::new(8, Vec2::zero(), 4.0);
        let idx = grid.index(3, 5);
        assert_eq!(idx, 5 * 8 + 3);
        assert_eq!(grid.coords(idx), (3, 5));
    }

    #[test]
    fn test_sample_outside_window_is_zero() {
        let mut grid = AccumulationGrid::new(4, Vec2::zero(), 2.0);
        for c in grid.cells_mut() {
            c.depth = 5.0;
        }
        assert_eq!(grid.sample_depth(Vec2::new(0.0, 0.0)), 5.0);
        assert_eq!(grid.sample_depth(Vec2::new(10.0, 0.0)), 0.0);
    }

    #[test]
    fn test_bilinear_between_cells() {
        let mut grid = AccumulationGrid::new(2, Vec2::zero(), 1.0);
        let right = grid.index(1, 0);
        grid.cells_mut()[right].depth = 10.0;
        let right_top = grid.index(1, 1);
        grid.cells_mut()[right_top].depth = 10.0;

        // Центры ячеек: x = -0.5 и 0.5, посередине ровно половина
        let mid = grid.bilinear(grid.world_to_uv(Vec2::new(0.0, 0.0)));
        assert!((mid.depth - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_apply_swaps_roles() {
        let mut buffers = DeformationBuffers::new(4, Vec2::zero(), 2.0);
        buffers.apply(|src, dst| {
            dst.match_window(src);
            for (out, c) in dst.cells_mut().iter_mut().zip(src.cells()) {
                *out = Cell { depth: c.depth + 1.0, age: 0.0 };
            }
        });
        assert_eq!(buffers.generation(), 1);
        assert!(buffers.current().cells().iter().all(|c| c.depth == 1.0));

        buffers.apply(|src, dst| {
            dst.match_window(src);
            for (out, c) in dst.cells_mut().iter_mut().zip(src.cells()) {
                *out = Cell { depth: c.depth + 1.0, age: 0.0 };
            }
        });
        assert!(buffers.current().cells().iter().all(|c| c.depth == 2.0));
    }

    #[test]
    fn test_oversized_resolution_is_clamped() {
        assert_eq!(grid_resolution(0), 1);
        assert_eq!(grid_resolution(1024), 1024);
        assert_eq!(grid_resolution(65536), MAX_GRID_RESOLUTION);
        assert_eq!(grid_resolution(u32::MAX), MAX_GRID_RESOLUTION);
        // Произведение считается в usize
        assert_eq!(cell_count(MAX_GRID_RESOLUTION), 1 << 28);
        assert_eq!(AccumulationGrid::new(0, Vec2::zero(), 1.0).cells().len(), 1);
    }

    #[test]
    fn test_texels_are_two_floats_per_cell() {
        let grid = AccumulationGrid::new(16, Vec2::zero(), 8.0);
        assert_eq!(grid.as_texels().len(), 16 * 16 * 8);
    }
}
