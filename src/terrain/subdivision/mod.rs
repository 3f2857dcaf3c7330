// ============================================
// Subdivision Module - Плотная сетка рядом с актёром
// ============================================

pub mod mesh;
pub mod subdivider;
pub mod tracker;

// Re-exports
pub use mesh::{ChunkMesh, ChunkVertex, Topology};
pub use subdivider::{subdivide, SubdivideError, MAX_SUBDIVISION_LEVEL};
pub use tracker::{CenterKey, LevelStep, SubdivisionConfig, SubdivisionRecord, SubdivisionTracker};
