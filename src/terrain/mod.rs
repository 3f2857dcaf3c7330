// ============================================
// Terrain Module - Деформация и подразбиение
// ============================================

pub mod deformation;
pub mod subdivision;
pub mod chunk;

// Re-exports
pub use deformation::{DeformationManager, DeformationConfig, GroundPlane};
pub use subdivision::{ChunkMesh, ChunkVertex, SubdivisionTracker, SubdivisionConfig};
pub use chunk::{ChunkBuilder, ChunkCache, ChunkKey, ChunkRequest, TerrainStorage};
