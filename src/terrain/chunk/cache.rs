// ============================================
// Chunk Cache - Кэш готовых мешей чанков
// ============================================
// Уровень подразбиения решается при создании чанка, поэтому
// после заметного сдвига актёра кэш сбрасывается целиком.

use std::collections::HashMap;
use std::sync::Arc;

use ultraviolet::Vec2;

use super::builder::BuiltChunk;
use super::key::ChunkKey;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
}

pub struct ChunkCache {
    entries: HashMap<ChunkKey, Arc<BuiltChunk>>,
    clear_threshold: f32,
    last_clear_position: Option<Vec2>,
    stats: CacheStats,
}

impl ChunkCache {
    pub fn new(clear_threshold: f32) -> Self {
        Self {
            entries: HashMap::new(),
            clear_threshold,
            last_clear_position: None,
            stats: CacheStats::default(),
        }
    }

    /// Сообщить позицию актёра. true = кэш сброшен
    pub fn set_reference_position(&mut self, position: Vec2) -> bool {
        let Some(last) = self.last_clear_position else {
            self.last_clear_position = Some(position);
            return false;
        };

        let moved = (position - last).mag();
        if moved <= self.clear_threshold {
            return false;
        }

        log::info!(
            "Actor moved {:.0} units, clearing {} cached chunks to update subdivisions",
            moved,
            self.entries.len()
        );
        self.clear();
        self.last_clear_position = Some(position);
        true
    }

    pub fn get(&mut self, key: &ChunkKey) -> Option<Arc<BuiltChunk>> {
        let chunk = self.entries.get(key).cloned();
        if chunk.is_some() {
            self.stats.hits += 1;
        }
        chunk
    }

    /// Взять из кэша или построить и сохранить
    pub fn get_or_insert_with<F>(&mut self, key: ChunkKey, build: F) -> Arc<BuiltChunk>
    where
        F: FnOnce() -> BuiltChunk,
    {
        if let Some(chunk) = self.entries.get(&key) {
            self.stats.hits += 1;
            return chunk.clone();
        }

        self.stats.misses += 1;
        let chunk = Arc::new(build());
        self.entries.insert(key, chunk.clone());
        chunk
    }

    pub fn insert(&mut self, chunk: BuiltChunk) -> Arc<BuiltChunk> {
        let chunk = Arc::new(chunk);
        self.entries.insert(chunk.key, chunk.clone());
        chunk
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ChunkKey) -> bool,
    {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.clears += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::subdivision::ChunkMesh;

    fn chunk(x: f32) -> BuiltChunk {
        BuiltChunk {
            key: ChunkKey::new(Vec2::new(x, 0.5), 0, 0),
            mesh: ChunkMesh::empty(),
            subdivision_level: 0,
            distance_to_edge: 0.0,
        }
    }

    #[test]
    fn test_get_or_insert_builds_once() {
        let mut cache = ChunkCache::new(128.0);
        let key = chunk(0.5).key;
        let mut builds = 0;
        for _ in 0..3 {
            cache.get_or_insert_with(key, || {
                builds += 1;
                chunk(0.5)
            });
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_clears_after_threshold_movement() {
        let mut cache = ChunkCache::new(128.0);
        assert!(!cache.set_reference_position(Vec2::zero()));
        cache.insert(chunk(0.5));
        cache.insert(chunk(1.5));

        // Маленькие шаги копятся от точки последнего сброса
        assert!(!cache.set_reference_position(Vec2::new(100.0, 0.0)));
        assert!(!cache.set_reference_position(Vec2::new(128.0, 0.0)));
        assert_eq!(cache.len(), 2);

        assert!(cache.set_reference_position(Vec2::new(130.0, 0.0)));
        assert!(cache.is_empty());

        cache.insert(chunk(0.5));
        assert!(!cache.set_reference_position(Vec2::new(200.0, 0.0)));
        assert!(cache.get(&chunk(0.5).key).is_some());
    }

    #[test]
    fn test_retain() {
        let mut cache = ChunkCache::new(128.0);
        cache.insert(chunk(0.5));
        cache.insert(chunk(1.5));
        cache.retain(|key| key.center().x < 1.0);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&chunk(0.5).key).is_some());
        assert!(cache.get(&chunk(1.5).key).is_none());
    }
}
