//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "archipel";

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World layout and island sizing.
    pub world: WorldConfig,
    /// Chunk dimensions.
    pub chunk: ChunkConfig,
    /// Worker pool settings.
    pub scheduler: SchedulerConfig,
    /// Density sampler tunables.
    pub terrain: TerrainConfig,
    /// Decoration placement rules.
    pub decoration: DecorationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed. `0` means "pick one at startup".
    pub seed: i32,
    /// Edge length of one world cell. Every cell holds at most one island.
    pub cell_size: f32,
    /// Smallest horizontal island diameter.
    pub island_size_min: f32,
    /// Largest horizontal island diameter.
    pub island_size_max: f32,
    /// Density threshold at which the surface is extracted.
    pub iso_level: f32,
    /// Noise value above which a world cell contains an island.
    pub island_presence_threshold: f32,
}

/// Chunk dimensions in voxels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkConfig {
    /// Horizontal edge length (x and z).
    pub width: u32,
    /// Vertical edge length.
    pub height: u32,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on concurrently running workers. `0` derives it from the CPU count.
    pub max_workers: u32,
    /// How often the pending queue is re-sorted by viewer distance.
    pub reprioritize_interval_ms: u64,
}

/// Tunable constants of the density sampler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Cave noise above this value is amplified by `cave_strong_gain`.
    pub cave_threshold: f32,
    /// Cave gain above the threshold.
    pub cave_strong_gain: f32,
    /// Cave gain at or below the threshold (also applied to the second octave).
    pub cave_weak_gain: f32,
    /// Multiplier applied to the caldera blob.
    pub caldera_gain: f32,
    /// Multiplier applied to the swamp lowering term.
    pub swamp_gain: f32,
    /// Accumulated density required before hills are added.
    pub hill_threshold: f32,
    /// Fraction of the island half height the density may reach.
    pub fill_ceiling: f32,
}

/// Decoration placement rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecorationConfig {
    /// Minimum y component of a vertex normal for it to count as flat ground.
    pub upward_normal_min: f32,
    /// Minimum distance between two decorations.
    pub min_separation: f32,
    /// Number of model variants per decoration set.
    pub variant_count: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            cell_size: 600.0,
            island_size_min: 80.0,
            island_size_max: 160.0,
            iso_level: 5.0,
            island_presence_threshold: 0.45,
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            reprioritize_interval_ms: 10_000,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cave_threshold: 0.6,
            cave_strong_gain: 50.0,
            cave_weak_gain: 10.0,
            caldera_gain: 1.2,
            swamp_gain: 1.2,
            hill_threshold: 0.1,
            fill_ceiling: 0.95,
        }
    }
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            upward_normal_min: 0.8,
            min_separation: 5.0,
            variant_count: 3,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Normalization ---

impl Config {
    /// Returns a copy with inconsistent values repaired.
    ///
    /// World cells must fit the largest island, the island size range must be
    /// ordered, and chunks need at least one voxel per axis.
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();

        if config.world.island_size_min > config.world.island_size_max {
            std::mem::swap(
                &mut config.world.island_size_min,
                &mut config.world.island_size_max,
            );
        }
        if config.world.cell_size < config.world.island_size_max {
            config.world.cell_size = config.world.island_size_max * 1.5;
            log::warn!(
                "World cell size smaller than the largest island, using {}",
                config.world.cell_size
            );
        }
        config.chunk.width = config.chunk.width.max(1);
        config.decoration.variant_count = config.decoration.variant_count.max(1);
        config.chunk.height = config.chunk.height.max(1);

        config
    }
}

// --- Persistence ---

const CONFIG_FILE: &str = "config.ron";

impl Config {
    /// Platform default config directory (`<os config dir>/archipel`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME))
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `config.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let config = Self::read_file(&path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config to `config_dir/config.ron`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(write_error)
    }

    /// Re-read the file. `Some` carries the new config when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read_file(&config_dir.join(CONFIG_FILE))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Config changed on disk");
        Ok(Some(fresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 40"));
        assert!(ron_str.contains("max_workers: 4"));
        assert!(ron_str.contains("cave_threshold: 0.6"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(world: (seed: 7), chunk: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.terrain, TerrainConfig::default());
        assert_eq!(config.world.cell_size, 600.0);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_normalized_grows_small_cells() {
        let mut config = Config::default();
        config.world.cell_size = 100.0;
        config.world.island_size_max = 160.0;
        let normalized = config.normalized();
        assert_eq!(normalized.world.cell_size, 240.0);
    }

    #[test]
    fn test_normalized_orders_island_range_and_chunk_dims() {
        let mut config = Config::default();
        config.world.island_size_min = 200.0;
        config.world.island_size_max = 50.0;
        config.chunk.width = 0;
        let normalized = config.normalized();
        assert_eq!(normalized.world.island_size_min, 50.0);
        assert_eq!(normalized.world.island_size_max, 200.0);
        assert_eq!(normalized.chunk.width, 1);
        assert_eq!(normalized.chunk.height, 40);
    }

    #[test]
    fn test_normalized_keeps_valid_config() {
        let config = Config::default();
        assert_eq!(config.normalized(), config);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.seed = 1234;
        config.scheduler.max_workers = 8;
        config.terrain.swamp_gain = 2.0;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.chunk.width = 32;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().chunk.width, 32);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.ron"));
    }
}
