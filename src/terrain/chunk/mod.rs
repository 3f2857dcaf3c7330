// ============================================
// Chunk Module - Создание и кэш чанков terrain
// ============================================

pub mod key;
pub mod noise;
pub mod storage;
pub mod builder;
pub mod cache;

// Re-exports
pub use key::ChunkKey;
pub use storage::{HeightfieldStorage, TerrainStorage};
pub use builder::{distance_to_chunk_edge, BuiltChunk, ChunkBuilder, ChunkConfig, ChunkRequest};
pub use cache::{CacheStats, ChunkCache};
