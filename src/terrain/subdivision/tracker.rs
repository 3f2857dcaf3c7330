// ============================================
// Subdivision Tracker - Уровень подразбиения чанков
// ============================================
//
// Уровень = max(мгновенный, запомненный)
// - мгновенный: ступенчатая таблица по расстоянию до края чанка
// - запомненный: последний записанный уровень, который падает
//   на 1 за каждые trail_distance_per_level пройденного пути.
//
// Память считается по пройденному пути, а не по времени:
// стоящий актёр не теряет плотную сетку под собой, а за
// идущим остаётся хвост из подразбитых чанков.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

/// Ключ по центру чанка (побитовое сравнение координат)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CenterKey {
    x: u32,
    y: u32,
}

impl CenterKey {
    #[inline]
    pub fn new(center: Vec2) -> Self {
        // + 0.0 превращает -0.0 в 0.0
        Self {
            x: (center.x + 0.0).to_bits(),
            y: (center.y + 0.0).to_bits(),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(f32::from_bits(self.x), f32::from_bits(self.y))
    }
}

/// Ступень таблицы: ближе max_distance -> level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelStep {
    pub max_distance: f32,
    pub level: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionConfig {
    pub steps: Vec<LevelStep>,
    /// Сколько пройти, чтобы запомненный уровень упал на 1
    pub trail_distance_per_level: f32,
    pub max_level: u32,
}

impl Default for SubdivisionConfig {
    fn default() -> Self {
        Self {
            steps: vec![
                LevelStep { max_distance: 128.0, level: 4 },
                LevelStep { max_distance: 384.0, level: 3 },
                LevelStep { max_distance: 768.0, level: 2 },
                LevelStep { max_distance: 1536.0, level: 1 },
            ],
            trail_distance_per_level: 256.0,
            max_level: 4,
        }
    }
}

/// Память о подразбитом чанке
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubdivisionRecord {
    pub level: u32,
    pub world_center: Vec2,
    /// Показание одометра в момент записи
    pub recorded_at: f64,
}

pub struct SubdivisionTracker {
    steps: Vec<LevelStep>,
    trail_distance_per_level: f32,
    max_level: u32,
    records: HashMap<CenterKey, SubdivisionRecord>,
    /// Одометр в f64: растёт всю сессию, f32 перестаёт видеть мелкие шаги
    distance_traveled: f64,
    last_reference: Option<Vec2>,
}

impl SubdivisionTracker {
    pub fn new(config: &SubdivisionConfig) -> Self {
        Self {
            steps: normalize_steps(&config.steps, config.max_level),
            trail_distance_per_level: config.trail_distance_per_level,
            max_level: config.max_level,
            records: HashMap::new(),
            distance_traveled: 0.0,
            last_reference: None,
        }
    }

    /// Продвинуть одометр и выбросить забытые записи
    pub fn update(&mut self, reference: Vec2) {
        if let Some(last) = self.last_reference {
            let moved = (reference - last).mag();
            if moved <= 0.0 {
                return;
            }
            self.distance_traveled += moved as f64;
        }
        self.last_reference = Some(reference);

        let before = self.records.len();
        let traveled = self.distance_traveled;
        let per_level = self.trail_distance_per_level;
        self.records
            .retain(|_, record| decayed_level(record, traveled, per_level) > 0);

        let pruned = before - self.records.len();
        if pruned > 0 {
            log::debug!("Subdivision tracker: forgot {} chunks, {} remain", pruned, self.records.len());
        }
    }

    /// Уровень по таблице, без памяти
    pub fn instant_level(&self, distance_to_edge: f32) -> u32 {
        self.steps
            .iter()
            .find(|step| distance_to_edge < step.max_distance)
            .map_or(0, |step| step.level)
    }

    /// Запомненный уровень чанка с учётом пройденного пути
    pub fn remembered_level(&self, chunk_center: Vec2) -> u32 {
        self.records
            .get(&CenterKey::new(chunk_center))
            .map_or(0, |r| decayed_level(r, self.distance_traveled, self.trail_distance_per_level))
    }

    pub fn get_subdivision_level(&self, chunk_center: Vec2, distance_to_edge: f32) -> u32 {
        self.instant_level(distance_to_edge)
            .max(self.remembered_level(chunk_center))
    }

    /// Запомнить уровень чанка. Уровень 0 не записывается.
    /// Запись обновляется только если новый уровень выше запомненного:
    /// перестройка чанка на том же уровне не продлевает хвост.
    pub fn mark_chunk_subdivided(&mut self, chunk_center: Vec2, level: u32, world_center: Vec2) {
        let level = level.min(self.max_level);
        if level == 0 {
            return;
        }

        let key = CenterKey::new(chunk_center);
        if let Some(existing) = self.records.get(&key) {
            if level <= decayed_level(existing, self.distance_traveled, self.trail_distance_per_level) {
                return;
            }
        }

        self.records.insert(
            key,
            SubdivisionRecord {
                level,
                world_center,
                recorded_at: self.distance_traveled,
            },
        );
    }

    pub fn record(&self, chunk_center: Vec2) -> Option<&SubdivisionRecord> {
        self.records.get(&CenterKey::new(chunk_center))
    }

    #[inline]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    #[inline]
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

}

impl Default for SubdivisionTracker {
    fn default() -> Self {
        Self::new(&SubdivisionConfig::default())
    }
}

fn decayed_level(record: &SubdivisionRecord, traveled: f64, per_level: f32) -> u32 {
    if per_level <= 0.0 {
        return 0;
    }
    let elapsed = (traveled - record.recorded_at).max(0.0);
    let drop = (elapsed / per_level as f64).floor().min(u32::MAX as f64) as u32;
    record.level.saturating_sub(drop)
}

/// По возрастанию дистанции, уровни не растут с расстоянием
fn normalize_steps(steps: &[LevelStep], max_level: u32) -> Vec<LevelStep> {
    let mut sorted: Vec<LevelStep> = steps
        .iter()
        .filter(|s| !s.max_distance.is_nan())
        .map(|s| LevelStep { max_distance: s.max_distance, level: s.level.min(max_level) })
        .collect();
    sorted.sort_by(|a, b| a.max_distance.total_cmp(&b.max_distance));

    let mut ceiling = max_level;
    for step in &mut sorted {
        if step.level > ceiling {
            log::warn!(
                "Subdivision step {} -> {} exceeds nearer step, clamped to {}",
                step.max_distance, step.level, ceiling
            );
            step.level = ceiling;
        }
        ceiling = step.level;
    }
    sorted
}
