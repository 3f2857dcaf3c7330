// ============================================
// Engine Config - Настройки из JSON файла
// ============================================
// Отсутствующие секции и поля берутся по умолчанию.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::terrain::chunk::ChunkConfig;
use crate::terrain::deformation::surface::builtin_entries;
use crate::terrain::deformation::{DeformationConfig, SurfaceEntry, SurfaceTable};
use crate::terrain::subdivision::SubdivisionConfig;

/// Ошибки загрузки конфигурации
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub deformation: DeformationConfig,
    pub subdivision: SubdivisionConfig,
    pub chunks: ChunkConfig,
    pub surfaces: Vec<SurfaceEntry>,
    /// Запись для неизвестных тегов
    pub default_surface: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deformation: DeformationConfig::default(),
            subdivision: SubdivisionConfig::default(),
            chunks: ChunkConfig::default(),
            surfaces: builtin_entries(),
            default_surface: "snow".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Таблица поверхностей (пустой список -> встроенная)
    pub fn surface_table(&self) -> SurfaceTable {
        if self.surfaces.is_empty() {
            log::warn!("No surfaces configured, using built-in table");
            return SurfaceTable::builtin();
        }
        SurfaceTable::new(self.surfaces.clone(), &self.default_surface)
    }
}
