// ============================================
// Chunk Key - Идентификатор меша чанка в кэше
// ============================================

use ultraviolet::Vec2;

use crate::terrain::subdivision::CenterKey;

/// Ключ чанка: центр (в ячейках), LOD и флаги LOD соседей
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ChunkKey {
    pub center: CenterKey,
    pub lod: u8,
    pub lod_flags: u32,
}

impl ChunkKey {
    pub fn new(center: Vec2, lod: u8, lod_flags: u32) -> Self {
        Self { center: CenterKey::new(center), lod, lod_flags }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center.center()
    }
}
