// ============================================
// Snowfield - Деформация поверхности terrain
// ============================================
// Продавливание снега/грязи вокруг актёра и адаптивное
// подразбиение мешей чанков рядом с ним.

pub mod terrain;
pub mod runtime;

// Re-exports
pub use terrain::deformation::{DeformationManager, DeformationWindow, SurfaceParams};
pub use terrain::subdivision::{subdivide, ChunkMesh, SubdivisionTracker};
pub use terrain::chunk::{ChunkBuilder, ChunkCache, ChunkKey};
pub use runtime::{EngineConfig, ConfigError};
