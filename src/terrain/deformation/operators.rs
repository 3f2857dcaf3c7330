// ============================================
// Grid Operators - Stamp / Decay / Recenter
// ============================================
//
// Все операторы одной формы: полный проход по сетке,
// src только читается, dst только пишется.
// Строки сетки обрабатываются параллельно (rayon).

use rayon::prelude::*;
use ultraviolet::Vec2;

use super::config::RecenterSampling;
use super::grid::{AccumulationGrid, Cell};

/// Событие продавливания в точке мира
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StampEvent {
    pub position: Vec2,
    pub influence_radius: f32,
    pub max_depth: f32,
    pub time: f32,
}

/// Кубический smoothstep как в GLSL
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Влияние штампа: 1 в центре, 0 за радиусом, плавный спад от r/2 до r
#[inline]
pub fn stamp_influence(radius: f32, dist: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    1.0 - smoothstep(radius * 0.5, radius, dist)
}

/// Продавливание: depth только растёт (max, не сумма)
pub fn stamp(event: &StampEvent, epsilon: f32, src: &AccumulationGrid, dst: &mut AccumulationGrid) {
    dst.match_window(src);
    let res = src.resolution() as usize;

    dst.cells_mut()
        .par_chunks_mut(res)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let old = src.cell(x as u32, y as u32);
                let world = src.cell_world_position(x as u32, y as u32);
                let dist = (world - event.position).mag();
                let influence = stamp_influence(event.influence_radius, dist);

                *out = Cell {
                    depth: old.depth.max(influence * event.max_depth),
                    age: if influence > epsilon { event.time } else { old.age },
                };
            }
        });
}

/// Линейное затухание за decay_duration секунд от момента штампа
pub fn decay(
    current_time: f32,
    decay_duration: f32,
    epsilon: f32,
    src: &AccumulationGrid,
    dst: &mut AccumulationGrid,
) {
    dst.match_window(src);

    dst.cells_mut()
        .par_iter_mut()
        .zip(src.cells().par_iter())
        .for_each(|(out, cell)| {
            *out = decay_cell(*cell, current_time, decay_duration, epsilon);
        });
}

#[inline]
fn decay_cell(cell: Cell, current_time: f32, decay_duration: f32, epsilon: f32) -> Cell {
    // Пустые ячейки не трогаем
    if cell.depth <= epsilon {
        return cell;
    }

    let elapsed = current_time - cell.age;
    let factor = if decay_duration > 0.0 {
        (elapsed / decay_duration).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let mut depth = cell.depth * (1.0 - factor);
    if depth < epsilon {
        depth = 0.0;
    }
    Cell { depth, age: cell.age }
}

/// Перенос содержимого в окно с новым центром.
/// Ячейки за пределами старого окна обнуляются
pub fn recenter(
    new_center: Vec2,
    sampling: RecenterSampling,
    src: &AccumulationGrid,
    dst: &mut AccumulationGrid,
) {
    dst.match_window(src);
    dst.set_center(new_center);

    let res = src.resolution() as usize;
    let cs = src.cell_size();
    let origin = new_center - Vec2::broadcast(src.half_extent());

    dst.cells_mut()
        .par_chunks_mut(res)
        .enumerate()
        .for_each(|(y, row)| {
            let wy = origin.y + (y as f32 + 0.5) * cs;
            for (x, out) in row.iter_mut().enumerate() {
                let world = Vec2::new(origin.x + (x as f32 + 0.5) * cs, wy);
                let uv = src.world_to_uv(world);
                let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);

                *out = if !inside {
                    Cell::EMPTY
                } else {
                    match sampling {
                        RecenterSampling::Nearest => src.nearest(uv),
                        RecenterSampling::Bilinear => src.bilinear(uv),
                    }
                };
            }
        });
}
