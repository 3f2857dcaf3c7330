// ============================================
// Runtime Module - Конфигурация и демо-цикл
// ============================================

pub mod app;
pub mod config;

pub use app::{run, RunReport, WalkSettings};
pub use config::{ConfigError, EngineConfig};
