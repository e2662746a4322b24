//! Orbis settings, persisted as `config.ron`.
//!
//! Every section falls back to its defaults field by field, so older files
//! keep loading after new settings are added.

use std::path::{Path, PathBuf};

use orbis_terrain::{NoiseLayer, Seed, default_noise_layers};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
const CONFIG_FILE: &str = "config.ron";

/// Written first, then renamed over [`CONFIG_FILE`].
const STAGING_FILE: &str = "config.ron.tmp";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Planet generation settings.
    pub planet: PlanetConfig,
    /// Device-tier hints.
    pub device: DeviceConfig,
    /// Output and scheduling settings.
    pub output: OutputConfig,
    /// Logging.
    pub debug: DebugConfig,
}

/// Planet generation settings, the knobs an inspector panel would expose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Display name, also used as the output file prefix.
    pub name: String,
    /// Terrain seed; numeric text is used verbatim, other text is hashed.
    pub terrain_seed: String,
    /// Mesh density hint forwarded to the mesh provider (3–256).
    pub subdivisions: u32,
    /// Ordered noise layers.
    pub noise_layers: Vec<NoiseLayer>,
    /// Bump map intensity applied by the material.
    pub bump_level: f32,
    /// Pre-blit the previous tier's bump map under the next one.
    pub carry_previous_bump: bool,
    /// Optional pre-baked object-space normal image. `None` bakes the
    /// cube-cross layout procedurally.
    pub normal_source: Option<PathBuf>,
}

impl PlanetConfig {
    /// The seed derived from [`PlanetConfig::terrain_seed`].
    pub fn seed(&self) -> Seed {
        Seed::from_text(&self.terrain_seed)
    }
}

/// Device-tier hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Discrete GPU with enough memory for 2048² textures.
    pub capable_gpu: bool,
    /// Mobile device; caps textures at 512².
    pub mobile: bool,
}

/// Output and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the generated textures are written to.
    pub directory: PathBuf,
    /// Ticks a replaced texture set stays alive before release.
    pub release_grace_ticks: u32,
    /// Interval between scheduler ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// How often `config.ron` is re-read during a bake, in milliseconds.
    pub reload_interval_ms: u64,
    /// Write every tier, not only the final one.
    pub write_intermediate_tiers: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// `EnvFilter` directives, e.g. `"debug"` or `"info,orbis_planet=trace"`.
    pub log_level: String,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            name: "planet".to_string(),
            terrain_seed: "27".to_string(),
            subdivisions: 128,
            noise_layers: default_noise_layers(),
            bump_level: 1.0,
            carry_previous_bump: false,
            normal_source: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("textures"),
            release_grace_ticks: 3,
            tick_interval_ms: 16,
            reload_interval_ms: 500,
            write_intermediate_tiers: false,
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

/// Path of `config.ron` inside `config_dir`.
pub fn config_file(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE)
}

/// Platform config directory for Orbis (e.g. `~/.config/orbis`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("orbis"))
        .ok_or(ConfigError::NoConfigDir)
}

impl Config {
    /// Read `config.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    ///
    /// Runs before logging is initialised, so it reports nothing itself.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_file(config_dir);

        if config_path.exists() {
            Self::read(&config_path)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            Ok(config)
        }
    }

    /// Write `config.ron` into `config_dir`, replacing it in one rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        let staging = config_dir.join(STAGING_FILE);
        std::fs::write(&staging, serialized).map_err(|source| ConfigError::Write {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, &config_path).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Re-read the file; `None` when it still matches `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_file(config_dir))?;

        if &new_config != self {
            log::info!("Config changed on disk");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
