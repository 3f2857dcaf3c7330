// ============================================
// App - Демо: актёр идёт по снегу и грязи
// ============================================
// Без окна: фиксированный шаг симуляции, результаты в лог.

use std::collections::HashSet;

use ultraviolet::{Vec2, Vec3};

use super::config::EngineConfig;
use crate::terrain::chunk::{ChunkBuilder, ChunkCache, ChunkKey, ChunkRequest, HeightfieldStorage};
use crate::terrain::deformation::{bytes_per_row, texture_descriptor, DeformationManager, OperatorStats};
use crate::terrain::subdivision::{ChunkMesh, ChunkVertex};

const TICK: f32 = 1.0 / 60.0;
const DEMO_SEED: u32 = 12345;
/// Размер демо-чанков в ячейках
const DEMO_CHUNK_SIZE: f32 = 0.125;

/// Параметры прогулки
#[derive(Clone, Copy, Debug)]
pub struct WalkSettings {
    pub ticks: u32,
    /// Скорость актёра (единиц в секунду)
    pub speed: f32,
    /// Как часто запрашивать чанки вокруг актёра (в тиках)
    pub chunk_interval: u32,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self { ticks: 600, speed: 240.0, chunk_interval: 30 }
    }
}

/// Итоги прогона
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub operators: OperatorStats,
    pub chunks_built: usize,
    pub chunks_subdivided: usize,
    /// Чанки, выброшенные из кэша при выходе из 3x3
    pub chunks_evicted: usize,
    pub cache_clears: u64,
    /// Сколько байт сетки ушло бы в текстуру (каждый тик с окном)
    pub grid_upload_bytes: usize,
    /// Вершинные и индексные буферы построенных чанков
    pub mesh_upload_bytes: usize,
    pub max_depth: f32,
    pub final_position: Vec3,
}

/// Позиция актёра на тике: прямая с лёгкой волной
fn actor_position(tick: u32, speed: f32) -> Vec3 {
    let t = tick as f32 * TICK;
    Vec3::new(t * speed, (t * 0.7).sin() * 40.0, 0.0)
}

/// Чанки 3x3 вокруг актёра
fn chunk_requests(position: Vec2, cell_world_size: f32) -> Vec<ChunkRequest> {
    let cells = position / cell_world_size;
    let cx = (cells.x / DEMO_CHUNK_SIZE).floor();
    let cy = (cells.y / DEMO_CHUNK_SIZE).floor();

    let mut requests = Vec::with_capacity(9);
    for dy in -1..=1 {
        for dx in -1..=1 {
            let center = Vec2::new(
                (cx + dx as f32 + 0.5) * DEMO_CHUNK_SIZE,
                (cy + dy as f32 + 0.5) * DEMO_CHUNK_SIZE,
            );
            requests.push(ChunkRequest::new(DEMO_CHUNK_SIZE, center, 0));
        }
    }
    requests
}

/// Байт в вершинном и индексном буферах меша
fn mesh_upload_bytes(mesh: &ChunkMesh) -> usize {
    let vertices = mesh.to_vertices();
    let indices = mesh.indices();
    bytemuck::cast_slice::<ChunkVertex, u8>(&vertices).len()
        + bytemuck::cast_slice::<u32, u8>(&indices).len()
}

/// Выбросить из кэша всё, что не запрошено. Возвращает число выброшенных
fn evict_unrequested(cache: &mut ChunkCache, requests: &[ChunkRequest]) -> usize {
    let wanted: HashSet<ChunkKey> = requests.iter().map(ChunkRequest::key).collect();
    let before = cache.len();
    cache.retain(|key| wanted.contains(key));
    before - cache.len()
}

pub fn run(config: EngineConfig, walk: WalkSettings) -> RunReport {
    let storage = HeightfieldStorage::new(DEMO_SEED, config.chunks.cell_world_size);
    let mut builder = ChunkBuilder::new(storage, &config.subdivision, config.chunks.clone());
    let mut cache = ChunkCache::new(config.chunks.cache_clear_threshold);

    let surfaces = config.surface_table();
    log::info!("{} surface types, default '{}'", surfaces.entries().len(), config.default_surface);

    // Первые 400 единиц снег, дальше грязь
    let mut manager = DeformationManager::new(config.deformation.clone(), surfaces)
        .with_classifier(Box::new(|pos: Vec3| {
            if pos.x < 400.0 { "tx_snow_01".to_string() } else { "tx_mud_02".to_string() }
        }));

    let ground = config.deformation.ground_plane;
    let mut report = RunReport::default();

    for tick in 0..walk.ticks {
        let position = actor_position(tick, walk.speed);
        let position_2d = ground.project(position);

        manager.update(TICK, position);
        builder.set_reference_position(position_2d);
        cache.set_reference_position(position_2d);

        if let Some(window) = manager.sample_window() {
            let texture = texture_descriptor(window.grid.resolution());
            report.grid_upload_bytes += bytes_per_row(texture.size.width) as usize * texture.size.height as usize;
        }

        if tick % walk.chunk_interval.max(1) != 0 {
            continue;
        }

        let requests = chunk_requests(position_2d, config.chunks.cell_world_size);
        let missing: Vec<ChunkRequest> = requests
            .iter()
            .filter(|r| cache.get(&r.key()).is_none())
            .copied()
            .collect();

        for chunk in builder.build_batch(&missing) {
            report.chunks_built += 1;
            if chunk.subdivision_level > 0 {
                report.chunks_subdivided += 1;
            }
            report.mesh_upload_bytes += mesh_upload_bytes(&chunk.mesh);
            cache.insert(chunk);
        }
        report.chunks_evicted += evict_unrequested(&mut cache, &requests);

        if let Some(window) = manager.sample_window() {
            log::debug!(
                "Tick {}: window ({:.0}, {:.0}), depth under actor {:.1}, {} chunks cached",
                tick,
                window.center.x,
                window.center.y,
                window.depth_at(position_2d),
                cache.len()
            );
        }
    }

    report.operators = manager.stats();
    report.cache_clears = cache.stats().clears;
    report.max_depth = manager.sample_window().map_or(0.0, |w| w.grid.max_depth());
    report.final_position = actor_position(walk.ticks.saturating_sub(1), walk.speed);

    log::info!(
        "Done: {} recenters, {} stamps, {} decays; {} chunks built ({} subdivided, {} evicted), {} cache clears",
        report.operators.recenters,
        report.operators.stamps,
        report.operators.decays,
        report.chunks_built,
        report.chunks_subdivided,
        report.chunks_evicted,
        report.cache_clears
    );
    log::info!(
        "Uploads: {} KiB grid, {} KiB chunk meshes",
        report.grid_upload_bytes / 1024,
        report.mesh_upload_bytes / 1024
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::deformation::DeformationConfig;
    use crate::terrain::subdivision::{LevelStep, SubdivisionConfig};

    #[test]
    fn test_short_walk() {
        let config = EngineConfig {
            deformation: DeformationConfig { resolution: 64, ..Default::default() },
            subdivision: SubdivisionConfig {
                steps: vec![
                    LevelStep { max_distance: 128.0, level: 2 },
                    LevelStep { max_distance: 384.0, level: 1 },
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        let walk = WalkSettings { ticks: 120, speed: 240.0, chunk_interval: 20 };
        let report = run(config, walk);

        assert!(report.operators.stamps > 0);
        assert!(report.operators.recenters > 0);
        assert!(report.chunks_built >= 9);
        assert!(report.chunks_subdivided > 0);
        assert!(report.cache_clears > 0);
        assert!(report.max_depth > 0.0 && report.max_depth <= 100.0);

        // Окно есть с первого тика: 64x64 ячейки по 8 байт каждый тик
        assert_eq!(report.grid_upload_bytes, 120 * 64 * 64 * 8);
        assert!(report.mesh_upload_bytes > 0);
    }

    #[test]
    fn test_mesh_upload_bytes() {
        let mut mesh = ChunkMesh::empty();
        mesh.positions = vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        // 3 вершины по 36 байт + 3 индекса по 4
        assert_eq!(mesh_upload_bytes(&mesh), 3 * 36 + 3 * 4);
        assert_eq!(mesh_upload_bytes(&ChunkMesh::empty()), 0);
    }

    #[test]
    fn test_chunks_outside_neighbourhood_are_evicted() {
        let config = EngineConfig::default();
        let cell = config.chunks.cell_world_size;
        let storage = HeightfieldStorage::new(DEMO_SEED, cell).with_vertices_per_side(2);
        let mut builder = ChunkBuilder::new(storage, &config.subdivision, config.chunks.clone());
        let mut cache = ChunkCache::new(config.chunks.cache_clear_threshold);

        let here = chunk_requests(Vec2::new(100.0, 100.0), cell);
        for chunk in builder.build_batch(&here) {
            cache.insert(chunk);
        }
        assert_eq!(evict_unrequested(&mut cache, &here), 0);
        assert_eq!(cache.len(), 9);

        // Шаг на один чанк вправо: левый столбец уходит
        let chunk_world = DEMO_CHUNK_SIZE * cell;
        let there = chunk_requests(Vec2::new(100.0 + chunk_world, 100.0), cell);
        assert_eq!(evict_unrequested(&mut cache, &there), 3);
        assert_eq!(cache.len(), 6);
        assert_eq!(there.iter().filter(|r| cache.get(&r.key()).is_some()).count(), 6);
    }

    #[test]
    fn test_chunk_requests_surround_actor() {
        let requests = chunk_requests(Vec2::new(1500.0, -10.0), 8192.0);
        assert_eq!(requests.len(), 9);
        // Центральный чанк содержит актёра
        let center = requests[4].center * 8192.0;
        let half = DEMO_CHUNK_SIZE * 8192.0 * 0.5;
        assert!((center.x - 1500.0).abs() <= half);
        assert!((center.y + 10.0).abs() <= half);
    }
}
