// ============================================
// Chunk Builder - Создание мешей чанков с подразбиением
// ============================================
//
// Путь создания чанка:
// 1. Базовый меш из хранилища
// 2. Расстояние от актёра до ближайшего края чанка (0 внутри)
// 3. Уровень из трекера (только для маленьких чанков)
// 4. subdivide -> запись в трекер; при ошибке исходный меш

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use super::key::ChunkKey;
use super::storage::TerrainStorage;
use crate::terrain::subdivision::{subdivide, ChunkMesh, SubdivisionConfig, SubdivisionTracker};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Размер ячейки в мировых единицах
    pub cell_world_size: f32,
    /// Чанки крупнее (в ячейках) не подразбиваются
    pub max_subdivided_chunk_size: f32,
    /// Сдвиг актёра, после которого кэш чанков сбрасывается
    pub cache_clear_threshold: f32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            cell_world_size: 8192.0,
            max_subdivided_chunk_size: 1.0,
            cache_clear_threshold: 128.0,
        }
    }
}

/// Запрос на создание чанка. center и size в ячейках
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkRequest {
    pub size: f32,
    pub center: Vec2,
    pub lod: u8,
    pub lod_flags: u32,
}

impl ChunkRequest {
    pub fn new(size: f32, center: Vec2, lod: u8) -> Self {
        Self { size, center, lod, lod_flags: 0 }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        ChunkKey::new(self.center, self.lod, self.lod_flags)
    }
}

/// Готовый чанк
#[derive(Clone, Debug)]
pub struct BuiltChunk {
    pub key: ChunkKey,
    pub mesh: ChunkMesh,
    /// Применённый уровень подразбиения (0 = базовый меш)
    pub subdivision_level: u32,
    pub distance_to_edge: f32,
}

/// Расстояние от точки до квадрата чанка (0 внутри)
pub fn distance_to_chunk_edge(point: Vec2, world_center: Vec2, half_size: f32) -> f32 {
    let dx = ((point.x - world_center.x).abs() - half_size).max(0.0);
    let dy = ((point.y - world_center.y).abs() - half_size).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

/// План подразбиения одного чанка
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubdivisionPlan {
    pub level: u32,
    pub distance_to_edge: f32,
    pub world_center: Vec2,
}

pub struct ChunkBuilder<S: TerrainStorage> {
    storage: S,
    tracker: SubdivisionTracker,
    config: ChunkConfig,
    reference: Vec2,
}

impl<S: TerrainStorage> ChunkBuilder<S> {
    pub fn new(storage: S, subdivision: &SubdivisionConfig, config: ChunkConfig) -> Self {
        Self {
            storage,
            tracker: SubdivisionTracker::new(subdivision),
            config,
            reference: Vec2::zero(),
        }
    }

    /// Новая позиция актёра (горизонтальная). Двигает одометр трекера
    pub fn set_reference_position(&mut self, reference: Vec2) {
        self.reference = reference;
        self.tracker.update(reference);
    }

    #[inline]
    pub fn reference_position(&self) -> Vec2 {
        self.reference
    }

    pub fn tracker(&self) -> &SubdivisionTracker {
        &self.tracker
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn plan_level(&self, request: &ChunkRequest) -> SubdivisionPlan {
        let cell_size = self.storage.cell_world_size();
        let world_center = request.center * cell_size;
        let half_size = request.size * cell_size * 0.5;
        let distance_to_edge = distance_to_chunk_edge(self.reference, world_center, half_size);

        let level = if request.size <= self.config.max_subdivided_chunk_size {
            self.tracker.get_subdivision_level(request.center, distance_to_edge)
        } else {
            0
        };

        SubdivisionPlan { level, distance_to_edge, world_center }
    }

    /// Создать чанк и запомнить его уровень
    pub fn build(&mut self, request: &ChunkRequest) -> BuiltChunk {
        let plan = self.plan_level(request);
        let chunk = build_planned(&self.storage, request, &plan);
        self.mark(request, &plan, &chunk);
        chunk
    }

    /// Пакетная сборка: меши параллельно, трекер последовательно
    pub fn build_batch(&mut self, requests: &[ChunkRequest]) -> Vec<BuiltChunk> {
        let plans: Vec<SubdivisionPlan> = requests.iter().map(|r| self.plan_level(r)).collect();

        let storage = &self.storage;
        let chunks: Vec<BuiltChunk> = requests
            .par_iter()
            .zip(plans.par_iter())
            .map(|(request, plan)| build_planned(storage, request, plan))
            .collect();

        for ((request, plan), chunk) in requests.iter().zip(&plans).zip(&chunks) {
            self.mark(request, plan, chunk);
        }
        chunks
    }

    fn mark(&mut self, request: &ChunkRequest, plan: &SubdivisionPlan, chunk: &BuiltChunk) {
        if chunk.subdivision_level > 0 {
            self.tracker
                .mark_chunk_subdivided(request.center, chunk.subdivision_level, plan.world_center);
        }
    }
}

fn build_planned<S: TerrainStorage>(storage: &S, request: &ChunkRequest, plan: &SubdivisionPlan) -> BuiltChunk {
    let base = storage.build_chunk_mesh(request.size, request.center, request.lod);

    let (mesh, level) = if plan.level == 0 {
        (base, 0)
    } else {
        match subdivide(&base, plan.level) {
            Ok(mesh) => {
                log::debug!(
                    "Subdivided chunk ({}, {}) at distance {:.0} (level {})",
                    request.center.x, request.center.y, plan.distance_to_edge, plan.level
                );
                (mesh, plan.level)
            }
            Err(e) => {
                log::warn!(
                    "Chunk ({}, {}) subdivision failed: {}, using base mesh",
                    request.center.x, request.center.y, e
                );
                (base, 0)
            }
        }
    };

    BuiltChunk {
        key: request.key(),
        mesh,
        subdivision_level: level,
        distance_to_edge: plan.distance_to_edge,
    }
}
