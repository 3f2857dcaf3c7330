// ============================================
// Deformation Config - Параметры буфера деформации
// ============================================

use serde::{Deserialize, Serialize};
use ultraviolet::{Vec2, Vec3};

use super::grid::MAX_GRID_RESOLUTION;

/// Какая плоскость считается землёй
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroundPlane {
    /// X = восток, Y = север, Z = вверх
    #[default]
    Xy,
    /// X, Z горизонтальные, Y = вверх
    Xz,
}

impl GroundPlane {
    /// Проекция мировой точки на плоскость земли
    #[inline]
    pub fn project(self, pos: Vec3) -> Vec2 {
        match self {
            GroundPlane::Xy => Vec2::new(pos.x, pos.y),
            GroundPlane::Xz => Vec2::new(pos.x, pos.z),
        }
    }
}

/// Способ выборки старого окна при перецентровке
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecenterSampling {
    #[default]
    Nearest,
    Bilinear,
}

/// Настройки движка деформации
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformationConfig {
    /// Ячеек на сторону сетки
    pub resolution: u32,
    /// Половина стороны окна в мировых единицах
    pub half_extent: f32,
    /// Насколько референсная точка может уйти от центра окна до перецентровки
    pub recenter_threshold: f32,
    /// Время полного восстановления поверхности (сек)
    pub decay_duration: f32,
    /// Как часто применять затухание (сек)
    pub decay_tick_interval: f32,
    /// Максимальная пауза между штампами стоящего актёра (сек)
    pub max_stamp_wait: f32,
    /// Порог "нулевой" глубины и влияния
    pub epsilon: f32,
    pub recenter_sampling: RecenterSampling,
    pub ground_plane: GroundPlane,
}

impl Default for DeformationConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            half_extent: 300.0,
            recenter_threshold: 50.0,
            decay_duration: 120.0,
            decay_tick_interval: 0.1,
            max_stamp_wait: 0.5,
            epsilon: 0.01,
            recenter_sampling: RecenterSampling::Nearest,
            ground_plane: GroundPlane::Xy,
        }
    }
}

impl DeformationConfig {
    /// Размер ячейки в мировых единицах
    #[inline]
    pub fn cell_size(&self) -> f32 {
        2.0 * self.half_extent / self.resolution.clamp(1, MAX_GRID_RESOLUTION) as f32
    }
}
