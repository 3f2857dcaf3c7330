// ============================================
// Surface Params - Параметры по типу поверхности
// ============================================
// Снег, пепел, грязь... у каждого свой след.
// Тег поверхности приходит от внешнего классификатора.

use serde::{Deserialize, Serialize};

/// Параметры следа для поверхности
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParams {
    /// Радиус следа в мировых единицах
    pub footprint_radius: f32,
    /// Максимальная глубина
    pub max_depth: f32,
    /// Дистанция между штампами
    pub stamp_interval_distance: f32,
}

impl SurfaceParams {
    /// Снег: широкий след по пояс
    pub const SNOW: SurfaceParams = SurfaceParams {
        footprint_radius: 60.0,
        max_depth: 100.0,
        stamp_interval_distance: 2.0,
    };
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self::SNOW
    }
}

/// Запись таблицы: тег совпадает, если pattern является его подстрокой
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceEntry {
    pub pattern: String,
    pub footprint_radius: f32,
    pub max_depth: f32,
    pub stamp_interval_distance: f32,
}

impl SurfaceEntry {
    pub fn new(pattern: &str, footprint_radius: f32, max_depth: f32, stamp_interval_distance: f32) -> Self {
        Self {
            pattern: pattern.to_string(),
            footprint_radius,
            max_depth,
            stamp_interval_distance,
        }
    }

    #[inline]
    pub fn params(&self) -> SurfaceParams {
        SurfaceParams {
            footprint_radius: self.footprint_radius,
            max_depth: self.max_depth,
            stamp_interval_distance: self.stamp_interval_distance,
        }
    }
}

/// Упорядоченная таблица поверхностей с записью по умолчанию
#[derive(Clone, Debug)]
pub struct SurfaceTable {
    entries: Vec<SurfaceEntry>,
    default_params: SurfaceParams,
}

impl SurfaceTable {
    /// `default_pattern` должен совпадать с одной из записей,
    /// иначе по умолчанию используется снег
    pub fn new(entries: Vec<SurfaceEntry>, default_pattern: &str) -> Self {
        let default_params = entries
            .iter()
            .find(|e| e.pattern == default_pattern)
            .map(SurfaceEntry::params)
            .unwrap_or_else(|| {
                log::warn!("Default surface '{}' not in table, using snow", default_pattern);
                SurfaceParams::SNOW
            });
        Self { entries, default_params }
    }

    /// Встроенная таблица
    pub fn builtin() -> Self {
        Self::new(builtin_entries(), "snow")
    }

    /// Первая запись, чей pattern входит в тег
    pub fn find(&self, tag: &str) -> Option<&SurfaceEntry> {
        self.entries.iter().find(|e| tag.contains(e.pattern.as_str()))
    }

    /// Параметры для тега (неизвестный тег -> запись по умолчанию)
    pub fn lookup(&self, tag: &str) -> SurfaceParams {
        self.find(tag).map(SurfaceEntry::params).unwrap_or(self.default_params)
    }

    #[inline]
    pub fn default_params(&self) -> SurfaceParams {
        self.default_params
    }

    pub fn entries(&self) -> &[SurfaceEntry] {
        &self.entries
    }
}

impl Default for SurfaceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Встроенные поверхности (radius, depth, interval)
pub fn builtin_entries() -> Vec<SurfaceEntry> {
    vec![
        SurfaceEntry::new("snow", 60.0, 100.0, 2.0),
        SurfaceEntry::new("ash", 30.0, 60.0, 3.0),
        SurfaceEntry::new("mud", 15.0, 30.0, 5.0),
        SurfaceEntry::new("dirt", 20.0, 40.0, 4.0),
        SurfaceEntry::new("sand", 25.0, 50.0, 3.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_substring() {
        let table = SurfaceTable::builtin();
        assert_eq!(table.lookup("tx_ash_01").max_depth, 60.0);
        assert_eq!(table.lookup("mudflat").footprint_radius, 15.0);
        assert_eq!(table.lookup("snow").stamp_interval_distance, 2.0);
    }

    #[test]
    fn test_unknown_tag_falls_back_to_default() {
        let table = SurfaceTable::builtin();
        assert_eq!(table.lookup("cobblestone"), SurfaceParams::SNOW);

        let sandy = SurfaceTable::new(builtin_entries(), "sand");
        assert_eq!(sandy.lookup("grass").max_depth, 50.0);
    }

    #[test]
    fn test_missing_default_uses_snow() {
        let table = SurfaceTable::new(vec![SurfaceEntry::new("mud", 1.0, 2.0, 3.0)], "lava");
        assert_eq!(table.default_params(), SurfaceParams::SNOW);
        assert_eq!(table.lookup("mud").max_depth, 2.0);
    }
}
