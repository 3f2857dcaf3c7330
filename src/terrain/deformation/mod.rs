// ============================================
// Deformation Module - Следы на снегу и грязи
// ============================================
// Сетка глубин вокруг актёра: штампы, затухание, перенос окна.

pub mod config;
pub mod grid;
pub mod operators;
pub mod scheduler;
pub mod surface;
pub mod uniforms;
pub mod manager;

// Re-exports
pub use config::{DeformationConfig, GroundPlane, RecenterSampling};
pub use grid::{grid_resolution, AccumulationGrid, Cell, DeformationBuffers, MAX_GRID_RESOLUTION};
pub use operators::{decay, recenter, stamp, stamp_influence, StampEvent};
pub use scheduler::{GridOperation, SchedulerState, SchedulerTimings, UpdateScheduler};
pub use surface::{SurfaceEntry, SurfaceParams, SurfaceTable};
pub use uniforms::{bytes_per_row, texture_descriptor, DeformationUniforms, DEFORMATION_TEXTURE_FORMAT};
pub use manager::{
    ActivationPredicate, DeformationManager, DeformationWindow, OperatorStats, SurfaceClassifier,
};
